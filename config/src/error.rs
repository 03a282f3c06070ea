//! Error types for configuration loading.

use thiserror::Error;

/// Errors that can occur while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// A setting has a value that cannot be used.
    #[error("invalid setting {key}: {reason}")]
    InvalidSetting { key: &'static str, reason: String },

    /// A `.env` file exists but could not be parsed.
    #[error("dotenv error: {0}")]
    DotenvError(#[from] dotenvy::Error),
}

/// Convenience alias for results with [`ConfigError`].
pub type Result<T> = std::result::Result<T, ConfigError>;
