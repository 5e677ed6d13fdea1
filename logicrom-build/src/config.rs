use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::path::Path;
use serde::Deserialize;
use serde_json::Value;
use crate::{BuildError, Result};

pub const FDL1_IMAGE_START: &str = "CONFIG_FDL1_IMAGE_START";
pub const FDL1_IMAGE_SIZE: &str = "CONFIG_FDL1_IMAGE_SIZE";
pub const FDL2_IMAGE_START: &str = "CONFIG_FDL2_IMAGE_START";
pub const FDL2_IMAGE_SIZE: &str = "CONFIG_FDL2_IMAGE_SIZE";
pub const APPIMG_FLASH_ADDRESS: &str = "CONFIG_APPIMG_FLASH_ADDRESS";
pub const APPIMG_FLASH_SIZE: &str = "CONFIG_APPIMG_FLASH_SIZE";

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let data = std::fs::read(path).map_err(|source| BuildError::Io { path: path.to_path_buf(), source })?;
    serde_json::from_slice(&data).map_err(|source| BuildError::Json { path: path.to_path_buf(), source })
}

/// A flash address or size from the core config.
///
/// The SDK writes these as strings (`"0x60008000"`), but plain JSON integers are accepted too.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct FlashValue(pub u32);

impl FlashValue {
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            Some(hex) => u32::from_str_radix(hex, 16),
            None => s.parse(),
        };
        parsed.ok().map(Self)
    }

    fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Self::parse(s),
            Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()).map(Self),
            _ => None,
        }
    }
}

impl Display for FlashValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct FlashRegion {
    pub address: FlashValue,
    pub size: FlashValue,
}

/// Where the boot loaders and the application image live in flash.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct FlashLayout {
    pub fdl1: FlashRegion,
    pub fdl2: FlashRegion,
    pub app: FlashRegion,
}

/// The SDK's `core_config.json`: a flat map of `CONFIG_*` keys.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(transparent)]
pub struct CoreConfig {
    entries: BTreeMap<String, Value>,
}

impl CoreConfig {
    pub fn load(path: &Path) -> Result<Self> {
        read_json(path)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn flash(&self, key: &str) -> Result<FlashValue> {
        let value = self.get(key).ok_or_else(|| BuildError::MissingConfigKey(key.to_string()))?;
        FlashValue::from_json(value).ok_or_else(|| BuildError::InvalidConfigValue {
            key: key.to_string(),
            value: value.to_string(),
        })
    }

    fn region(&self, address: &str, size: &str) -> Result<FlashRegion> {
        Ok(FlashRegion {
            address: self.flash(address)?,
            size: self.flash(size)?,
        })
    }

    pub fn layout(&self) -> Result<FlashLayout> {
        Ok(FlashLayout {
            fdl1: self.region(FDL1_IMAGE_START, FDL1_IMAGE_SIZE)?,
            fdl2: self.region(FDL2_IMAGE_START, FDL2_IMAGE_SIZE)?,
            app: self.region(APPIMG_FLASH_ADDRESS, APPIMG_FLASH_SIZE)?,
        })
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Deserialize)]
pub struct BoardBuild {
    pub core: String,
    pub variant: String,
    pub f_cpu: String,
    #[serde(default)]
    pub logicromtype: Option<String>,
}

/// A PlatformIO board manifest; only the fields the build uses.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize)]
pub struct BoardConfig {
    pub name: String,
    pub build: BoardBuild,
}

impl BoardConfig {
    pub fn load(path: &Path) -> Result<Self> {
        read_json(path)
    }

    pub fn wants_debug_runtime(&self) -> bool {
        self.build.logicromtype.as_deref() == Some("debug")
    }
}
