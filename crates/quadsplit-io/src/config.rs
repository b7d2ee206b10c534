//! YAML configuration loading.

use std::fs;
use std::path::Path;

use quadsplit_pipeline::Config;
use tracing::info;

use crate::error::IoError;

/// Parse a YAML configuration document.
///
/// Missing sections and keys take their defaults; an empty document is
/// the default configuration. `path` only labels errors.
///
/// # Errors
///
/// Returns [`IoError::ParseConfig`] for malformed YAML or mistyped
/// values, and [`IoError::InvalidConfig`] for out-of-range values.
pub fn parse_config(text: &str, path: &Path) -> Result<Config, IoError> {
    let config = if text.trim().is_empty() {
        Config::default()
    } else {
        serde_yaml_ng::from_str(text).map_err(|source| IoError::ParseConfig {
            path: path.to_owned(),
            source,
        })?
    };
    config.validate()?;
    Ok(config)
}

/// Read and parse the configuration file at `path`.
///
/// # Errors
///
/// Returns [`IoError::ReadConfig`] if the file cannot be read, otherwise
/// whatever [`parse_config`] returns.
pub fn load_config(path: &Path) -> Result<Config, IoError> {
    let text = fs::read_to_string(path).map_err(|source| IoError::ReadConfig {
        path: path.to_owned(),
        source,
    })?;
    let config = parse_config(&text, path)?;
    info!(path = %path.display(), "loaded configuration");
    Ok(config)
}
