use std::path::PathBuf;

use quadsplit_pipeline::ConfigError;

/// Errors that stop a run before any image is processed.
///
/// Per-image problems (unreadable files, failed splits, failed writes)
/// are never errors; they are reported in the batch summary instead.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// The configuration file could not be read.
    #[error("failed to read configuration {path}: {source}")]
    ReadConfig {
        /// File that was requested.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The configuration file is not valid YAML for [`quadsplit_pipeline::Config`].
    #[error("failed to parse configuration {path}: {source}")]
    ParseConfig {
        /// File that was parsed.
        path: PathBuf,
        /// Underlying parse error.
        source: serde_yaml_ng::Error,
    },

    /// The configuration parsed but a value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    /// The input directory does not exist or cannot be listed.
    #[error("cannot read input directory {path}: {source}")]
    InputDir {
        /// Directory that was requested.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The batch summary could not be serialized.
    #[error("failed to serialize batch summary: {0}")]
    Summary(#[from] serde_json::Error),
}
