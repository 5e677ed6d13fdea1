//! Typed command builder for the vendor `pacgen.py` packaging tool.
//!
//! The tool takes a sequence of sub-commands on one command line: `cfg-init` with product metadata,
//! the two boot loader stages, any number of `cfg-nvitem` and `cfg-image` records, and finally
//! `pac-gen` with the output path. Everything here stays typed until [PacCommand::to_args].

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use crate::config::{FlashLayout, FlashRegion};
use crate::sdk::SdkLayout;
use crate::tool::{Invocation, Toolchain};

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProductInfo {
    pub name: String,
    pub alias: String,
    pub version: String,
    pub image_version: String,
    pub flash_type: u8,
}

impl ProductInfo {
    /// Product metadata the 8910 modem firmware is always packaged with.
    pub fn modem(alias: &str) -> Self {
        Self {
            name: "UIX8910_MODEM".into(),
            alias: alias.into(),
            version: "8910 MODULE".into(),
            image_version: "BP_R1.0.0".into(),
            flash_type: 1,
        }
    }
}

/// A boot loader stage blob.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FdlEntry {
    pub region: FlashRegion,
    pub path: PathBuf,
}

/// A non-volatile item record and how the flasher treats it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NvItem {
    pub name: String,
    pub id: u32,
    pub use_: bool,
    pub replace: bool,
    pub continue_: bool,
    pub backup: bool,
}

impl NvItem {
    /// Used, never replaced, backed up.
    fn preserved(name: &str, id: u32, continue_: bool) -> Self {
        Self {
            name: name.into(),
            id,
            use_: true,
            replace: false,
            continue_,
            backup: true,
        }
    }

    /// Calibration, identity and customer data that must survive a reflash.
    pub fn standard_set() -> Vec<Self> {
        vec![
            Self::preserved("Calibration", 0xFFFF_FFFF, false),
            Self::preserved("GSM Calibration", 0x26d, true),
            Self::preserved("LTE Calibration", 0x26e, false),
            Self::preserved("IMEI", 0xFFFF_FFFF, false),
            Self::preserved("BT_Config", 0x191, true),
            Self::preserved("Customer", 0x27e, true),
        ]
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ImageEntry {
    pub id: String,
    pub region: FlashRegion,
    pub path: PathBuf,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PacCommand {
    pub product: ProductInfo,
    pub host_fdl: FdlEntry,
    pub fdl2: FdlEntry,
    pub nv_items: Vec<NvItem>,
    pub images: Vec<ImageEntry>,
    pub output: PathBuf,
}

macro_rules! argv {
    ($($arg:expr),* $(,)?) => { [$(OsString::from($arg)),*] };
}

fn flag(b: bool) -> &'static str {
    if b { "1" } else { "0" }
}

impl PacCommand {
    /// The standard package: both boot loaders from the SDK, the standard NV items and the
    /// application image at its configured flash region.
    pub fn standard(sdk: &SdkLayout, layout: &FlashLayout, progname: &str, app_image: &Path, output: &Path) -> Self {
        Self {
            product: ProductInfo::modem(progname),
            host_fdl: FdlEntry { region: layout.fdl1, path: sdk.fdl1_img() },
            fdl2: FdlEntry { region: layout.fdl2, path: sdk.fdl2_img() },
            nv_items: NvItem::standard_set(),
            images: vec![ImageEntry {
                id: "APPIMG".into(),
                region: layout.app,
                path: app_image.to_path_buf(),
            }],
            output: output.to_path_buf(),
        }
    }

    pub fn to_args(&self) -> Vec<OsString> {
        let p = &self.product;
        let mut args = Vec::new();
        args.extend(argv![
            "cfg-init",
            "--pname", &p.name,
            "--palias", &p.alias,
            "--pversion", &p.version,
            "--version", &p.image_version,
            "--flashtype", p.flash_type.to_string(),
        ]);

        for (cmd, fdl) in [("cfg-host-fdl", &self.host_fdl), ("cfg-fdl2", &self.fdl2)] {
            args.extend(argv![
                cmd,
                "-a", fdl.region.address.to_string(),
                "-s", fdl.region.size.to_string(),
                "-p", &fdl.path,
            ]);
        }

        for nv in &self.nv_items {
            args.extend(argv![
                "cfg-nvitem",
                "-n", &nv.name,
                "-i", format!("{:#x}", nv.id),
                "--use", flag(nv.use_),
                "--replace", flag(nv.replace),
                "--continue", flag(nv.continue_),
                "--backup", flag(nv.backup),
            ]);
        }

        for image in &self.images {
            args.extend(argv![
                "cfg-image",
                "-i", &image.id,
                "-a", image.region.address.to_string(),
                "-s", image.region.size.to_string(),
                "-p", &image.path,
            ]);
        }

        args.extend(argv!["pac-gen", &self.output]);
        args
    }

    pub fn invocation(&self, toolchain: &Toolchain, sdk: &SdkLayout) -> Invocation {
        Invocation::new(&toolchain.python, format!("Generating {}", self.output.display()))
            .arg(sdk.pacgen_script())
            .args(self.to_args())
    }
}
