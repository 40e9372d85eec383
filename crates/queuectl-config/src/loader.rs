//! Configuration loader with layered sources.

use crate::error::ConfigResult;
use crate::validation::ConfigValidator;
use crate::AppConfig;
use config::{Config, Environment, File};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable selecting the environment-specific config file.
pub const ENVIRONMENT_VAR: &str = "QUEUECTL_ENVIRONMENT";

/// Prefix for environment variable overrides.
pub const ENV_PREFIX: &str = "QUEUECTL";

/// Loads and validates the layered configuration once at startup.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config: AppConfig,
    environment: String,
}

impl ConfigLoader {
    /// Creates a new configuration loader.
    ///
    /// Configuration is loaded from multiple sources in order:
    /// 1. `config/default.toml` - Default values
    /// 2. `config/{environment}.toml` - Environment-specific overrides
    /// 3. `config/local.toml` - Local overrides
    /// 4. Environment variables with `QUEUECTL_` prefix, `__` between
    ///    path segments (`QUEUECTL_JOBS__QUEUE__MAX_RETRIES=5`)
    ///
    /// Missing files are skipped. The environment name comes from
    /// `QUEUECTL_ENVIRONMENT` and defaults to `development`.
    pub fn new(config_dir: impl Into<PathBuf>) -> ConfigResult<Self> {
        // Load .env file if present
        if let Err(e) = dotenvy::dotenv() {
            debug!("No .env file found or error loading it: {}", e);
        }

        let environment =
            std::env::var(ENVIRONMENT_VAR).unwrap_or_else(|_| "development".to_string());
        Self::with_environment(config_dir, environment)
    }

    /// Creates a loader for an explicit environment name.
    pub fn with_environment(
        config_dir: impl Into<PathBuf>,
        environment: impl Into<String>,
    ) -> ConfigResult<Self> {
        let config_dir: PathBuf = config_dir.into();
        let environment = environment.into();
        let config = Self::load_config(&config_dir, &environment)?;

        Ok(Self {
            config,
            environment,
        })
    }

    /// Loads configuration from the default location (`./config`).
    pub fn from_default_location() -> ConfigResult<Self> {
        Self::new("./config")
    }

    /// Returns the loaded configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// The environment this loader was created for.
    pub fn environment(&self) -> &str {
        &self.environment
    }

    fn load_config(config_dir: &Path, environment: &str) -> ConfigResult<AppConfig> {
        info!(environment, config_dir = %config_dir.display(), "Loading configuration");

        let mut builder = Config::builder().set_default("app.environment", environment)?;

        for name in ["default", environment, "local"] {
            let path = config_dir.join(format!("{name}.toml"));
            if path.exists() {
                debug!("Loading config from: {}", path.display());
                builder = builder.add_source(File::from(path.as_path()).required(false));
            }
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("jobs.classifier.failure_keywords"),
        );

        let app_config: AppConfig = builder.build()?.try_deserialize()?;
        ConfigValidator::validate(&app_config)?;

        Ok(app_config)
    }
}
