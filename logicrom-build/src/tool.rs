use std::ffi::{OsStr, OsString};
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};
use crate::host::HostPlatform;
use crate::sdk::SdkLayout;
use crate::{BuildError, Result};

/// One external command line, built from typed inputs and only turned into argv at the end.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Invocation {
    pub program: OsString,
    pub args: Vec<OsString>,
    pub description: String,
}

impl Invocation {
    pub fn new(program: impl AsRef<OsStr>, description: impl Into<String>) -> Self {
        Self {
            program: program.as_ref().to_os_string(),
            args: Vec::new(),
            description: description.into(),
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args.extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    /// File name of the program, for error messages.
    pub fn tool_name(&self) -> String {
        Path::new(&self.program)
            .file_name()
            .unwrap_or(self.program.as_os_str())
            .to_string_lossy()
            .into_owned()
    }

    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }
}

impl Display for Invocation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program.to_string_lossy())?;
        for arg in &self.args {
            let arg = arg.to_string_lossy();
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " \"{arg}\"")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

/// Runs external tools. Tests substitute a recording implementation.
pub trait ToolRunner {
    fn run(&self, invocation: &Invocation) -> Result<()>;
}

impl<R: ToolRunner + ?Sized> ToolRunner for &R {
    fn run(&self, invocation: &Invocation) -> Result<()> {
        (**self).run(invocation)
    }
}

/// Spawns the tool and waits for it; a non-zero exit fails the build.
#[derive(Copy, Clone, Debug, Default)]
pub struct SystemRunner;

impl ToolRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> Result<()> {
        info!("{}", invocation.description);
        debug!("{invocation}");

        let status = invocation.to_command()
            .status()
            .map_err(|source| BuildError::ToolSpawn { tool: invocation.tool_name(), source })?;

        if status.success() {
            Ok(())
        } else {
            Err(BuildError::ToolFailed { tool: invocation.tool_name(), status })
        }
    }
}

/// The cross compiler and helpers the pipeline calls.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Toolchain {
    pub cc: PathBuf,
    pub objcopy: PathBuf,
    pub python: PathBuf,
}

impl Toolchain {
    pub fn for_host(host: HostPlatform) -> Self {
        Self {
            cc: "arm-none-eabi-gcc".into(),
            objcopy: "arm-none-eabi-objcopy".into(),
            python: host.default_python().into(),
        }
    }

    /// Run the linker script template through the C preprocessor.
    pub fn preprocess_linker_script(&self, sdk: &SdkLayout, out: &Path) -> Invocation {
        let mut include = OsString::from("-I");
        include.push(sdk.chip_lib_dir());

        Invocation::new(&self.cc, format!("Generating LD script {}", out.display()))
            .arg(include)
            .args(["-P", "-x", "c", "-E"])
            .arg(sdk.linker_template())
            .arg("-o")
            .arg(out)
    }

    pub fn objcopy_binary(&self, elf: &Path, out: &Path) -> Invocation {
        Invocation::new(&self.objcopy, "Generating Firmware Image")
            .args(["-O", "binary"])
            .arg(elf)
            .arg(out)
    }
}

pub fn mkappimg(sdk: &SdkLayout, elf: &Path, out: &Path) -> Invocation {
    Invocation::new(sdk.dtools(), "Generating Firmware Image")
        .arg("mkappimg")
        .arg(elf)
        .arg(out)
}

pub fn fotacreate(sdk: &SdkLayout, pac: &Path, out: &Path) -> Invocation {
    let mut sources = pac.as_os_str().to_os_string();
    sources.push(",");
    sources.push(sdk.fota_xml());

    Invocation::new(sdk.dtools(), format!("Generating FOTA firmware {}", out.display()))
        .arg("fotacreate2")
        .arg("--single-pac")
        .arg(sources)
        .arg(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sdk() -> SdkLayout {
        SdkLayout::new("/fw", "rda8910", HostPlatform::Linux)
    }

    fn argv(invocation: &Invocation) -> Vec<String> {
        invocation.args.iter().map(|a| a.to_string_lossy().into_owned()).collect()
    }

    #[test]
    fn linker_script_preprocesses_template() {
        let inv = Toolchain::for_host(HostPlatform::Linux)
            .preprocess_linker_script(&sdk(), Path::new("/build/linkerscript_out.ld"));

        assert_eq!(inv.program, OsString::from("arm-none-eabi-gcc"));
        assert_eq!(argv(&inv), vec![
            "-I/fw/cores/rda8910/logicromsdk/lib/rda8910",
            "-P", "-x", "c", "-E",
            "/fw/cores/rda8910/logicromsdk/lib/rda8910/app_flashimg.ld",
            "-o", "/build/linkerscript_out.ld",
        ]);
    }

    #[test]
    fn fotacreate_joins_pac_and_descriptor() {
        let inv = fotacreate(&sdk(), Path::new("/build/firmware.pac"), Path::new("/build/firmware.bin"));
        assert_eq!(inv.tool_name(), "dtools");
        assert_eq!(argv(&inv), vec![
            "fotacreate2",
            "--single-pac",
            "/build/firmware.pac,/fw/cores/rda8910/logicromsdk/lib/rda8910/fota8910.xml",
            "/build/firmware.bin",
        ]);
    }

    #[test]
    fn mkappimg_takes_elf_and_image() {
        let inv = mkappimg(&sdk(), Path::new("/build/firmware.elf"), Path::new("/build/firmware.img"));
        assert_eq!(argv(&inv), vec!["mkappimg", "/build/firmware.elf", "/build/firmware.img"]);
    }

    #[test]
    fn display_quotes_arguments_with_spaces() {
        let inv = Invocation::new("pacgen", "test").args(["--pversion", "8910 MODULE", ""]);
        assert_eq!(inv.to_string(), "pacgen --pversion \"8910 MODULE\" \"\"");
    }

    #[cfg(unix)]
    #[test]
    fn system_runner_reports_exit_status() {
        assert!(SystemRunner.run(&Invocation::new("true", "ok")).is_ok());
        assert!(matches!(
            SystemRunner.run(&Invocation::new("false", "fail")),
            Err(BuildError::ToolFailed { tool, .. }) if tool == "false"
        ));
    }

    #[test]
    fn system_runner_reports_missing_tool() {
        assert!(matches!(
            SystemRunner.run(&Invocation::new("logicrom-no-such-tool", "missing")),
            Err(BuildError::ToolSpawn { .. })
        ));
    }
}
