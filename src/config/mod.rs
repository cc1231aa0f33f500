pub mod scenario;
pub mod simulation;

use std::path::PathBuf;

/// Errors raised while loading a TOML configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid TOML in {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// Every validation failure, one per line.
    #[error("{0}")]
    Invalid(String),
}

impl ConfigError {
    pub(crate) fn from_messages(errors: Vec<String>) -> Result<(), ConfigError> {
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(errors.join("\n")))
        }
    }
}
