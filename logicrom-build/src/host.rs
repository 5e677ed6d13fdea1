//! Host-platform dependent behaviour, resolved once at startup.

use strum::{Display, EnumString};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum HostPlatform {
    Linux,
    Windows,
    #[strum(to_string = "darwin", serialize = "macos")]
    Darwin,
}

/// How the application image is produced from the linked ELF.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Display, EnumString)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum ImageStrategy {
    /// Vendor `dtools mkappimg`.
    #[strum(to_string = "mkappimg")]
    MkAppImg,
    /// `objcopy -O binary`, then finalize the header in process.
    Objcopy,
    /// Flatten the ELF and finalize in process, no external tools.
    Native,
}

impl HostPlatform {
    /// The platform this binary was built for, if the vendor tools support it at all.
    pub fn current() -> Option<Self> {
        match std::env::consts::OS {
            "linux" => Some(Self::Linux),
            "windows" => Some(Self::Windows),
            "macos" => Some(Self::Darwin),
            _ => None,
        }
    }

    /// Name of the directory under `tools/rda8910` holding the `dtools` binary.
    pub fn tools_dir(self) -> &'static str {
        match self {
            Self::Windows => "win32",
            // There are no macOS dtools; the Linux directory is still used for path resolution.
            Self::Linux | Self::Darwin => "linux",
        }
    }

    pub fn default_image_strategy(self) -> ImageStrategy {
        match self {
            Self::Darwin => ImageStrategy::Objcopy,
            Self::Linux | Self::Windows => ImageStrategy::MkAppImg,
        }
    }

    pub fn supports_fota(self) -> bool {
        self != Self::Darwin
    }

    pub fn default_python(self) -> &'static str {
        match self {
            Self::Windows => "python",
            Self::Linux | Self::Darwin => "python3",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_platform_names() {
        assert_eq!("linux".parse::<HostPlatform>().unwrap(), HostPlatform::Linux);
        assert_eq!("Windows".parse::<HostPlatform>().unwrap(), HostPlatform::Windows);
        assert_eq!("macos".parse::<HostPlatform>().unwrap(), HostPlatform::Darwin);
        assert_eq!("darwin".parse::<HostPlatform>().unwrap(), HostPlatform::Darwin);
        assert!("plan9".parse::<HostPlatform>().is_err());
    }

    #[test]
    fn parses_strategy_names() {
        assert_eq!("mkappimg".parse::<ImageStrategy>().unwrap(), ImageStrategy::MkAppImg);
        assert_eq!("native".parse::<ImageStrategy>().unwrap(), ImageStrategy::Native);
        assert_eq!(ImageStrategy::Objcopy.to_string(), "objcopy");
        assert_eq!(HostPlatform::Darwin.to_string(), "darwin");
    }

    #[test]
    fn darwin_uses_objcopy_and_has_no_fota() {
        assert_eq!(HostPlatform::Darwin.default_image_strategy(), ImageStrategy::Objcopy);
        assert!(!HostPlatform::Darwin.supports_fota());
        assert_eq!(HostPlatform::Linux.default_image_strategy(), ImageStrategy::MkAppImg);
        assert!(HostPlatform::Windows.supports_fota());
        assert_eq!(HostPlatform::Windows.tools_dir(), "win32");
    }
}
