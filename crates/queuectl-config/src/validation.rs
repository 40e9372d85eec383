//! Configuration validation.
//!
//! Collects every problem in one pass so a bad config file reports all of
//! its errors at once.

use crate::AppConfig;
use queuectl_jobs::{BackoffConfig, WorkerConfig};
use std::fmt;

/// Configuration validation error variants.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
    /// Worker count must be at least one.
    ZeroConcurrency,
    /// Timeout or interval must be positive.
    NonPositiveDuration { name: String },
    /// Shell path is empty.
    EmptyShell,
    /// Backoff multiplier below 1.0 would shrink delays.
    InvalidMultiplier { value: f64 },
    /// Initial backoff delay exceeds the cap.
    InvalidBackoffRange { initial_ms: u64, max_ms: u64 },
    /// Log filter is empty.
    EmptyLogFilter,
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroConcurrency => write!(f, "jobs.worker.concurrency must be at least 1"),
            Self::NonPositiveDuration { name } => write!(f, "{name} must be positive"),
            Self::EmptyShell => write!(f, "jobs.worker.shell cannot be empty"),
            Self::InvalidMultiplier { value } => {
                write!(f, "Invalid backoff multiplier: {value} (must be >= 1.0)")
            }
            Self::InvalidBackoffRange { initial_ms, max_ms } => write!(
                f,
                "Backoff initial delay ({initial_ms}ms) cannot exceed max delay ({max_ms}ms)"
            ),
            Self::EmptyLogFilter => write!(f, "logging.filter cannot be empty"),
        }
    }
}

impl std::error::Error for ConfigValidationError {}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validates the entire application configuration.
    ///
    /// Returns Ok(()) if valid, or Err with all validation errors found.
    pub fn validate(config: &AppConfig) -> Result<(), Vec<ConfigValidationError>> {
        let mut errors = Vec::new();

        Self::validate_worker(&config.jobs.worker, &mut errors);
        Self::validate_backoff(&config.jobs.queue.backoff, &mut errors);
        if config.logging.filter.trim().is_empty() {
            errors.push(ConfigValidationError::EmptyLogFilter);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_worker(config: &WorkerConfig, errors: &mut Vec<ConfigValidationError>) {
        if config.concurrency == 0 {
            errors.push(ConfigValidationError::ZeroConcurrency);
        }
        if config.job_timeout_secs == 0 {
            errors.push(ConfigValidationError::NonPositiveDuration {
                name: "jobs.worker.job_timeout_secs".to_string(),
            });
        }
        if config.poll_interval_ms == 0 {
            errors.push(ConfigValidationError::NonPositiveDuration {
                name: "jobs.worker.poll_interval_ms".to_string(),
            });
        }
        if config.shell.trim().is_empty() {
            errors.push(ConfigValidationError::EmptyShell);
        }
    }

    fn validate_backoff(config: &BackoffConfig, errors: &mut Vec<ConfigValidationError>) {
        if config.multiplier.is_nan() || config.multiplier < 1.0 {
            errors.push(ConfigValidationError::InvalidMultiplier {
                value: config.multiplier,
            });
        }
        if config.initial_delay_ms > config.max_delay_ms {
            errors.push(ConfigValidationError::InvalidBackoffRange {
                initial_ms: config.initial_delay_ms,
                max_ms: config.max_delay_ms,
            });
        }
    }
}

/// Formats validation errors for display.
pub fn format_validation_errors(errors: &[ConfigValidationError]) -> String {
    let mut output = String::from("Configuration validation failed:");
    for (i, error) in errors.iter().enumerate() {
        output.push_str(&format!("\n  {}. {}", i + 1, error));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_passes() {
        assert!(ConfigValidator::validate(&AppConfig::default()).is_ok());
    }

    #[test]
    fn test_zero_concurrency() {
        let mut config = AppConfig::default();
        config.jobs.worker.concurrency = 0;

        let errors = ConfigValidator::validate(&config).unwrap_err();
        assert_eq!(errors, vec![ConfigValidationError::ZeroConcurrency]);
    }

    #[test]
    fn test_zero_timeout_and_interval() {
        let mut config = AppConfig::default();
        config.jobs.worker.job_timeout_secs = 0;
        config.jobs.worker.poll_interval_ms = 0;

        let errors = ConfigValidator::validate(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| matches!(
            e,
            ConfigValidationError::NonPositiveDuration { .. }
        )));
    }

    #[test]
    fn test_invalid_multiplier() {
        let mut config = AppConfig::default();
        config.jobs.queue.backoff.multiplier = 0.5;

        let errors = ConfigValidator::validate(&config).unwrap_err();
        assert!(matches!(
            errors[0],
            ConfigValidationError::InvalidMultiplier { .. }
        ));
    }

    #[test]
    fn test_backoff_range() {
        let mut config = AppConfig::default();
        config.jobs.queue.backoff.initial_delay_ms = 5_000;
        config.jobs.queue.backoff.max_delay_ms = 1_000;

        let errors = ConfigValidator::validate(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![ConfigValidationError::InvalidBackoffRange {
                initial_ms: 5_000,
                max_ms: 1_000
            }]
        );
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = AppConfig::default();
        config.jobs.worker.concurrency = 0;
        config.jobs.worker.shell = " ".to_string();
        config.logging.filter = String::new();

        let errors = ConfigValidator::validate(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_format_validation_errors() {
        let output = format_validation_errors(&[
            ConfigValidationError::ZeroConcurrency,
            ConfigValidationError::EmptyShell,
        ]);
        assert!(output.starts_with("Configuration validation failed:"));
        assert!(output.contains("1. jobs.worker.concurrency must be at least 1"));
        assert!(output.contains("2. jobs.worker.shell cannot be empty"));
    }
}
