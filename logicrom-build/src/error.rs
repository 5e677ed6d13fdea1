use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;
use logicrom_image::ImageError;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{}: invalid JSON: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("core config is missing required key {0}")]
    MissingConfigKey(String),

    #[error("core config key {key} has invalid value {value}")]
    InvalidConfigValue { key: String, value: String },

    #[error("directory not found: {}", .0.display())]
    MissingSdkDir(PathBuf),

    #[error(transparent)]
    Image(#[from] ImageError),

    #[error("failed to run {tool}: {source}")]
    ToolSpawn {
        tool: String,
        #[source]
        source: io::Error,
    },

    #[error("{tool} failed ({status})")]
    ToolFailed { tool: String, status: ExitStatus },
}

pub type Result<T> = std::result::Result<T, BuildError>;
