use std::path::{Path, PathBuf};
use tracing::debug;
use crate::config::{BoardConfig, CoreConfig, FlashLayout};
use crate::flags::{BuildFlags, BuildType};
use crate::host::{HostPlatform, ImageStrategy};
use crate::sdk::SdkLayout;
use crate::tool::Toolchain;
use crate::Result;

pub const LINKER_SCRIPT_NAME: &str = "linkerscript_out.ld";

/// Inputs for [BuildEnv::load], as given on the command line.
#[derive(Clone, Debug)]
pub struct BuildOptions {
    pub framework_dir: PathBuf,
    pub board: PathBuf,
    pub build_dir: PathBuf,
    pub progname: String,
    pub build_type: BuildType,
    pub host: HostPlatform,
    pub image_strategy: Option<ImageStrategy>,
    pub toolchain: Option<Toolchain>,
}

/// Everything a pipeline stage needs, resolved once up front and never mutated afterwards.
#[derive(Clone, Debug)]
pub struct BuildEnv {
    pub host: HostPlatform,
    pub image_strategy: ImageStrategy,
    pub sdk: SdkLayout,
    pub board: BoardConfig,
    pub layout: FlashLayout,
    pub flags: BuildFlags,
    pub toolchain: Toolchain,
    pub build_dir: PathBuf,
    pub progname: String,
}

impl BuildEnv {
    /// Read the board manifest and the SDK's core config. Fails before anything is built if either
    /// is missing or incomplete.
    pub fn load(options: BuildOptions) -> Result<Self> {
        let board = BoardConfig::load(&options.board)?;
        let sdk = SdkLayout::locate(&options.framework_dir, &board.build.core, options.host)?;
        let core_config = CoreConfig::load(&sdk.core_config_path())?;

        let env = Self::new(
            options.host,
            sdk,
            board,
            &core_config,
            &options.build_dir,
            &options.progname,
            options.build_type,
        )?;
        let env = match options.image_strategy {
            Some(strategy) => env.with_image_strategy(strategy),
            None => env,
        };
        Ok(match options.toolchain {
            Some(toolchain) => Self { toolchain, ..env },
            None => env,
        })
    }

    pub fn new(
        host: HostPlatform,
        sdk: SdkLayout,
        board: BoardConfig,
        core_config: &CoreConfig,
        build_dir: &Path,
        progname: &str,
        build_type: BuildType,
    ) -> Result<Self> {
        let layout = core_config.layout()?;
        let flags = BuildFlags::new(&sdk, &board, build_type);
        debug!("flash layout: {layout:x?}");

        Ok(Self {
            host,
            image_strategy: host.default_image_strategy(),
            sdk,
            board,
            layout,
            flags,
            toolchain: Toolchain::for_host(host),
            build_dir: build_dir.to_path_buf(),
            progname: progname.to_string(),
        })
    }

    pub fn with_build_type(&self, build_type: BuildType) -> Self {
        Self { flags: self.flags.with_build_type(build_type), ..self.clone() }
    }

    pub fn with_image_strategy(&self, image_strategy: ImageStrategy) -> Self {
        Self { image_strategy, ..self.clone() }
    }

    pub fn linker_script_path(&self) -> PathBuf {
        self.build_dir.join(LINKER_SCRIPT_NAME)
    }

    /// `<build_dir>/<progname>.img`, the application image handed to pacgen.
    pub fn image_path(&self) -> PathBuf {
        self.build_dir.join(format!("{}.img", self.progname))
    }

    pub fn upload_args(&self) -> Vec<String> {
        self.sdk.upload_args(&self.layout)
    }
}
