use std::path::{Path, PathBuf};
use strum::{EnumIter, IntoEnumIterator};
use tracing::info;
use crate::env::BuildEnv;
use crate::host::ImageStrategy;
use crate::pac::PacCommand;
use crate::tool::{fotacreate, mkappimg, ToolRunner};
use crate::{BuildError, Result};

pub const FOTA_UNSUPPORTED: &str =
    "FOTA file generation is currently not supported. Please use Linux/Windows system.";

/// Artifacts the pipeline can produce, for registration with an outer build system.
#[derive(Copy, Clone, Debug, Eq, PartialEq, EnumIter)]
pub enum Artifact {
    LinkerScript,
    Package,
    FotaBundle,
}

impl Artifact {
    pub fn all() -> impl Iterator<Item = Self> {
        Self::iter()
    }

    pub fn suffix(self) -> &'static str {
        match self {
            Self::LinkerScript => ".ld",
            Self::Package => ".pac",
            Self::FotaBundle => ".bin",
        }
    }

    /// Name of the builder producing this artifact from its input.
    pub fn builder_name(self) -> &'static str {
        match self {
            Self::LinkerScript => "LinkerScript",
            Self::Package => "ElfToBin",
            Self::FotaBundle => "BinToFOTA",
        }
    }

    pub fn source_suffix(self) -> &'static str {
        match self {
            Self::LinkerScript => ".ld",
            Self::Package => ".elf",
            Self::FotaBundle => ".pac",
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FotaOutcome {
    Created(PathBuf),
    /// The host cannot run the FOTA tool; nothing was written. Carries the message for the user.
    Unsupported(&'static str),
}

/// The build stages, in order: linker script, application image, package, FOTA bundle.
pub struct Pipeline<'a, R: ToolRunner> {
    env: &'a BuildEnv,
    runner: R,
}

fn create_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => std::fs::create_dir_all(dir)
            .map_err(|source| BuildError::Io { path: dir.to_path_buf(), source }),
        _ => Ok(()),
    }
}

impl<'a, R: ToolRunner> Pipeline<'a, R> {
    pub fn new(env: &'a BuildEnv, runner: R) -> Self {
        Self { env, runner }
    }

    /// Preprocess the SDK's linker script template into the build directory.
    pub fn linker_script(&self) -> Result<PathBuf> {
        let out = self.env.linker_script_path();
        create_parent(&out)?;
        self.runner.run(&self.env.toolchain.preprocess_linker_script(&self.env.sdk, &out))?;
        Ok(out)
    }

    /// Produce `<progname>.img` from the linked ELF.
    pub fn firmware_image(&self, elf: &Path) -> Result<PathBuf> {
        let img = self.env.image_path();
        create_parent(&img)?;

        match self.env.image_strategy {
            ImageStrategy::MkAppImg => {
                self.runner.run(&mkappimg(&self.env.sdk, elf, &img))?;
            }
            ImageStrategy::Objcopy => {
                self.runner.run(&self.env.toolchain.objcopy_binary(elf, &img))?;
                logicrom_image::finalize_file(&img)?;
            }
            ImageStrategy::Native => {
                info!("Generating Firmware Image");
                let elf_data = std::fs::read(elf)
                    .map_err(|source| BuildError::Io { path: elf.to_path_buf(), source })?;
                let raw = logicrom_image::elf::flatten(&elf_data)?;
                info!("Binary size: {}", raw.len());
                let image = logicrom_image::finalize(&raw)?;
                std::fs::write(&img, image.as_bytes())
                    .map_err(|source| BuildError::Io { path: img.clone(), source })?;
            }
        }

        Ok(img)
    }

    /// Build the application image and package it with the boot loaders into a `.pac`.
    pub fn package(&self, elf: &Path, pac: &Path) -> Result<PathBuf> {
        let img = self.firmware_image(elf)?;
        create_parent(pac)?;

        let cmd = PacCommand::standard(&self.env.sdk, &self.env.layout, &self.env.progname, &img, pac);
        self.runner.run(&cmd.invocation(&self.env.toolchain, &self.env.sdk))?;
        Ok(pac.to_path_buf())
    }

    /// Wrap a `.pac` into a FOTA update bundle, where the host supports it.
    pub fn fota(&self, pac: &Path, out: &Path) -> Result<FotaOutcome> {
        if !self.env.host.supports_fota() {
            info!("{FOTA_UNSUPPORTED}");
            return Ok(FotaOutcome::Unsupported(FOTA_UNSUPPORTED));
        }

        create_parent(out)?;
        self.runner.run(&fotacreate(&self.env.sdk, pac, out))?;
        Ok(FotaOutcome::Created(out.to_path_buf()))
    }
}
