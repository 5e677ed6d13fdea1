//! Build configuration and packaging pipeline for LogicROM RDA8910 Arduino firmware.
//!
//! [BuildEnv] is assembled once from the board manifest, the SDK's `core_config.json` and the host
//! platform, and then handed by reference to each [Pipeline] stage. Vendor tools are only ever
//! run through a [ToolRunner].

pub mod config;
pub mod env;
pub mod error;
pub mod flags;
pub mod host;
pub mod pac;
pub mod pipeline;
pub mod sdk;
pub mod tool;

pub use config::{BoardConfig, CoreConfig, FlashLayout, FlashRegion, FlashValue};
pub use env::{BuildEnv, BuildOptions};
pub use error::{BuildError, Result};
pub use flags::{BuildFlags, BuildType, Define};
pub use host::{HostPlatform, ImageStrategy};
pub use pac::PacCommand;
pub use pipeline::{Artifact, FotaOutcome, Pipeline, FOTA_UNSUPPORTED};
pub use sdk::SdkLayout;
pub use tool::{Invocation, SystemRunner, ToolRunner, Toolchain};
