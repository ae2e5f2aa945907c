//! Configuration error types.

/// Result type alias for config operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read a config file.
    #[error("failed to read config file '{path}': {source}")]
    ReadFile {
        path: String,
        source: std::io::Error,
    },

    /// Failed to parse TOML.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Missing required field.
    #[error("missing required field '{field}' in [{section}]")]
    MissingField { field: String, section: String },

    /// A field is present but unusable.
    #[error("invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    /// Failed to read a secret file referenced by the config.
    #[error("failed to read secret file '{path}': {source}")]
    ReadSecret {
        path: String,
        source: std::io::Error,
    },
}

impl ConfigError {
    pub(crate) fn missing(section: &str, field: &str) -> Self {
        ConfigError::MissingField {
            field: field.to_string(),
            section: section.to_string(),
        }
    }
}
