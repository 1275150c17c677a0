use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OtcbotError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Repository synchronization failed: {0}")]
    Synchronization(String),

    #[error("Branch reset failed: {0}")]
    Reset(String),

    #[error("Failed to patch '{}': {source}", path.display())]
    PatchIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Publishing failed: {0}")]
    Publish(String),

    #[error("Git operation failed: {0}")]
    GitOperation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl OtcbotError {
    pub(crate) fn patch_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        OtcbotError::PatchIo {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, OtcbotError>;
