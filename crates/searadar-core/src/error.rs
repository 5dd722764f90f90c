//! Error types shared across the radar crates.

use thiserror::Error;

/// Invalid or unreadable radar configuration. A radar built from a
/// configuration that fails validation never starts scanning.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ConfigError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Failure of the signal scoring dispatch. Fatal for the owning radar only.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScorerError {
    /// The worker pool or device could not run the dispatch.
    #[error("scorer dispatch failed: {0}")]
    Dispatch(String),

    /// Output row length does not match the PPI row length.
    #[error("buffer size mismatch: expected {expected}, got {actual}")]
    BufferMismatch { expected: usize, actual: usize },
}

/// Failure on the asynchronous export path. Logged and skipped.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("export for radar {0} was cancelled")]
    Cancelled(u32),

    #[error("scene query for radar {0} timed out")]
    SceneTimeout(u32),

    #[error("scene executor is gone")]
    SceneUnavailable,

    #[error("failed to serialize broadcast message: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Radar registry failures.
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("no radar with id {0}")]
    UnknownRadar(u32),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Scorer(#[from] ScorerError),
}
