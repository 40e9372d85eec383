//! Startup utilities.

use queuectl_config::AppConfig;
use tracing::{debug, info, warn};

/// Greeting printed before the first prompt.
pub fn banner() -> String {
    format!(
        "Welcome to QueueCTL v{}\nType 'help' for the list of commands.",
        env!("CARGO_PKG_VERSION")
    )
}

/// Logs the effective configuration for the selected environment.
pub fn log_startup_info(environment: &str, config: &AppConfig) {
    let jobs = &config.jobs;
    info!(
        environment,
        version = %config.app.version,
        "Starting {}",
        config.app.name
    );
    info!(
        concurrency = jobs.worker.concurrency,
        job_timeout_secs = jobs.worker.job_timeout_secs,
        shell = %jobs.worker.shell,
        max_retries = jobs.queue.max_retries,
        backoff = ?jobs.queue.backoff.strategy,
        failure_keywords = jobs.classifier.failure_keywords.len(),
        "Job queue settings"
    );

    match config.to_toml() {
        Ok(rendered) => debug!("Effective configuration:\n{rendered}"),
        Err(e) => warn!(error = %e, "Could not render effective configuration"),
    }
}
