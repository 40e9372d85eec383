//! Job queue configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the job queue system.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobsConfig {
    /// Worker pool configuration.
    #[serde(default)]
    pub worker: WorkerConfig,

    /// Queue configuration.
    #[serde(default)]
    pub queue: QueueConfig,

    /// Outcome classification configuration.
    #[serde(default)]
    pub classifier: ClassifierConfig,
}

/// Worker pool configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Number of workers started when no count is given.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Per-command timeout in seconds.
    #[serde(default = "default_job_timeout")]
    pub job_timeout_secs: u64,

    /// Upper bound on how long an idle worker sleeps before re-checking
    /// the queue, in milliseconds.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// Shell used to run command lines.
    #[serde(default = "default_shell")]
    pub shell: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            job_timeout_secs: default_job_timeout(),
            poll_interval_ms: default_poll_interval(),
            shell: default_shell(),
        }
    }
}

fn default_concurrency() -> usize {
    10
}

fn default_job_timeout() -> u64 {
    30
}

fn default_poll_interval() -> u64 {
    500
}

fn default_shell() -> String {
    "sh".to_string()
}

impl WorkerConfig {
    /// Returns job timeout as Duration.
    pub fn job_timeout(&self) -> Duration {
        Duration::from_secs(self.job_timeout_secs)
    }

    /// Returns poll interval as Duration.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Queue configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Retry budget assigned to newly created jobs.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Maximum number of completed jobs kept (0 = unlimited).
    #[serde(default)]
    pub completed_capacity: usize,

    /// Delay applied before a failed job becomes available again.
    #[serde(default)]
    pub backoff: BackoffConfig,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            completed_capacity: 0,
            backoff: BackoffConfig::default(),
        }
    }
}

fn default_max_retries() -> u32 {
    3
}

/// Backoff strategy between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffStrategy {
    /// Requeue immediately.
    #[default]
    None,
    /// Fixed delay between attempts.
    Fixed,
    /// Exponentially growing delay, capped at the maximum.
    Exponential,
}

/// Backoff configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackoffConfig {
    /// Backoff strategy.
    #[serde(default)]
    pub strategy: BackoffStrategy,

    /// Initial delay in milliseconds.
    #[serde(default = "default_initial_delay")]
    pub initial_delay_ms: u64,

    /// Maximum delay in milliseconds.
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,

    /// Backoff multiplier.
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            strategy: BackoffStrategy::None,
            initial_delay_ms: default_initial_delay(),
            max_delay_ms: default_max_delay(),
            multiplier: default_multiplier(),
        }
    }
}

fn default_initial_delay() -> u64 {
    1000 // 1 second
}

fn default_max_delay() -> u64 {
    60_000 // 1 minute
}

fn default_multiplier() -> f64 {
    2.0
}

/// Outcome classification configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Case-insensitive substrings that mark captured output as a failure.
    /// Empty means exit-code classification only.
    #[serde(default)]
    pub failure_keywords: Vec<String>,
}
