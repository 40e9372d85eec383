//! Application configuration structures.

use queuectl_jobs::JobsConfig;
use serde::{Deserialize, Serialize};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application name and metadata.
    #[serde(default)]
    pub app: AppMetadata,

    /// Job queue, worker and classifier settings.
    #[serde(default)]
    pub jobs: JobsConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Renders the configuration as TOML.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

/// Application metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppMetadata {
    /// Application name.
    pub name: String,
    /// Application version.
    pub version: String,
    /// Environment (development, test, production).
    pub environment: String,
}

impl Default for AppMetadata {
    fn default() -> Self {
        Self {
            name: "queuectl".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            environment: "development".to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directives used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

fn default_log_filter() -> String {
    "info,queuectl=debug".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.app.name, "queuectl");
        assert_eq!(config.jobs.worker.concurrency, 10);
        assert_eq!(config.jobs.queue.max_retries, 3);
        assert_eq!(config.logging.filter, "info,queuectl=debug");
        assert!(!config.logging.json);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [jobs.queue]
            max_retries = 7

            [logging]
            json = true
            "#,
        )
        .unwrap();

        assert_eq!(config.jobs.queue.max_retries, 7);
        assert_eq!(config.jobs.worker.job_timeout_secs, 30);
        assert!(config.logging.json);
        assert_eq!(config.logging.filter, "info,queuectl=debug");
        assert_eq!(config.app.environment, "development");
    }

    #[test]
    fn test_to_toml_parses_back() {
        let mut config = AppConfig::default();
        config.jobs.worker.shell = "bash".to_string();

        let rendered = config.to_toml().unwrap();
        assert!(rendered.contains("[jobs.worker]"));

        let parsed: AppConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed.jobs.worker.shell, "bash");
    }
}
