//! Configuration errors.

use crate::validation::{format_validation_errors, ConfigValidationError};
use thiserror::Error;

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A source could not be read or deserialized.
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// The merged configuration failed validation.
    #[error("{}", format_validation_errors(.0))]
    Invalid(Vec<ConfigValidationError>),
}

impl From<Vec<ConfigValidationError>> for ConfigError {
    fn from(errors: Vec<ConfigValidationError>) -> Self {
        Self::Invalid(errors)
    }
}

/// Result alias for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;
