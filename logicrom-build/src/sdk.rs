use std::path::{Path, PathBuf};
use crate::config::FlashLayout;
use crate::host::HostPlatform;
use crate::{BuildError, Result};

const CHIP: &str = "rda8910";

/// Paths inside the Arduino framework package and its bundled LogicROM SDK.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SdkLayout {
    framework_dir: PathBuf,
    core: String,
    sdk_dir: PathBuf,
    tools_platform_dir: &'static str,
}

impl SdkLayout {
    /// Resolve the layout without touching the filesystem.
    pub fn new(framework_dir: impl Into<PathBuf>, core: &str, host: HostPlatform) -> Self {
        let framework_dir = framework_dir.into();
        let sdk_dir = framework_dir.join("cores").join(core).join("logicromsdk");
        Self {
            framework_dir,
            core: core.to_string(),
            sdk_dir,
            tools_platform_dir: host.tools_dir(),
        }
    }

    /// Like [SdkLayout::new], but fail if the framework or SDK directory does not exist.
    pub fn locate(framework_dir: impl Into<PathBuf>, core: &str, host: HostPlatform) -> Result<Self> {
        let layout = Self::new(framework_dir, core, host);
        for dir in [&layout.framework_dir, &layout.sdk_dir] {
            if !dir.is_dir() {
                return Err(BuildError::MissingSdkDir(dir.clone()));
            }
        }
        Ok(layout)
    }

    pub fn framework_dir(&self) -> &Path {
        &self.framework_dir
    }

    pub fn sdk_dir(&self) -> &Path {
        &self.sdk_dir
    }

    pub fn core_dir(&self) -> PathBuf {
        self.framework_dir.join("cores").join(&self.core)
    }

    pub fn variant_dir(&self, variant: &str) -> PathBuf {
        self.framework_dir.join("variants").join(variant)
    }

    pub fn framework_libraries_dir(&self) -> PathBuf {
        self.framework_dir.join("libraries")
    }

    pub fn lib_dir(&self) -> PathBuf {
        self.sdk_dir.join("lib")
    }

    /// `lib/rda8910`: linker template, boot loaders, core config and FOTA descriptor.
    pub fn chip_lib_dir(&self) -> PathBuf {
        self.lib_dir().join(CHIP)
    }

    pub fn core_config_path(&self) -> PathBuf {
        self.chip_lib_dir().join("core_config.json")
    }

    pub fn linker_template(&self) -> PathBuf {
        self.chip_lib_dir().join("app_flashimg.ld")
    }

    pub fn fdl1_img(&self) -> PathBuf {
        self.chip_lib_dir().join("fdl1.img")
    }

    pub fn fdl2_img(&self) -> PathBuf {
        self.chip_lib_dir().join("fdl2.img")
    }

    pub fn fota_xml(&self) -> PathBuf {
        self.chip_lib_dir().join("fota8910.xml")
    }

    fn tools_dir(&self) -> PathBuf {
        self.sdk_dir.join("tools").join(CHIP)
    }

    pub fn dtools(&self) -> PathBuf {
        self.tools_dir().join(self.tools_platform_dir).join("dtools")
    }

    pub fn pacgen_script(&self) -> PathBuf {
        self.tools_dir().join("pacgen.py")
    }

    pub fn include_dirs(&self) -> [PathBuf; 2] {
        [self.sdk_dir.join("include"), self.sdk_dir.join("include").join("ril")]
    }

    /// Extra arguments for the uploader: boot loader addresses and images, then the app address.
    pub fn upload_args(&self, layout: &FlashLayout) -> Vec<String> {
        vec![
            layout.fdl1.address.to_string(),
            self.fdl1_img().display().to_string(),
            layout.fdl2.address.to_string(),
            self.fdl2_img().display().to_string(),
            layout.app.address.to_string(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FlashRegion, FlashValue};

    #[test]
    fn paths_follow_framework_layout() {
        let sdk = SdkLayout::new("/fw", "rda8910", HostPlatform::Linux);

        assert_eq!(sdk.sdk_dir(), Path::new("/fw/cores/rda8910/logicromsdk"));
        assert_eq!(sdk.core_config_path(), PathBuf::from("/fw/cores/rda8910/logicromsdk/lib/rda8910/core_config.json"));
        assert_eq!(sdk.dtools(), PathBuf::from("/fw/cores/rda8910/logicromsdk/tools/rda8910/linux/dtools"));
        assert_eq!(sdk.pacgen_script(), PathBuf::from("/fw/cores/rda8910/logicromsdk/tools/rda8910/pacgen.py"));
        assert_eq!(sdk.variant_dir("logicrom_4g"), PathBuf::from("/fw/variants/logicrom_4g"));
    }

    #[test]
    fn windows_uses_win32_tools() {
        let sdk = SdkLayout::new("/fw", "rda8910", HostPlatform::Windows);
        assert!(sdk.dtools().ends_with("tools/rda8910/win32/dtools"));
    }

    #[test]
    fn locate_requires_sdk_dir() {
        let dir = tempfile::tempdir().unwrap();
        match SdkLayout::locate(dir.path(), "rda8910", HostPlatform::Linux) {
            Err(BuildError::MissingSdkDir(path)) => assert!(path.ends_with("logicromsdk")),
            other => panic!("unexpected {other:?}"),
        }

        std::fs::create_dir_all(dir.path().join("cores/rda8910/logicromsdk")).unwrap();
        assert!(SdkLayout::locate(dir.path(), "rda8910", HostPlatform::Linux).is_ok());
    }

    #[test]
    fn upload_args_interleave_addresses_and_loaders() {
        let sdk = SdkLayout::new("/fw", "rda8910", HostPlatform::Linux);
        let region = |address, size| FlashRegion { address: FlashValue(address), size: FlashValue(size) };
        let layout = FlashLayout {
            fdl1: region(0x83_8000, 0x8000),
            fdl2: region(0x81_0000, 0x2_8000),
            app: region(0x6030_0000, 0x10_0000),
        };

        let args = sdk.upload_args(&layout);
        assert_eq!(args[0], "0x838000");
        assert!(args[1].ends_with("fdl1.img"));
        assert_eq!(args[2], "0x810000");
        assert!(args[3].ends_with("fdl2.img"));
        assert_eq!(args[4], "0x60300000");
    }
}
