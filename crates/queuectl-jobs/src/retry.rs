//! Retry policy: maps an attempt outcome to the job's next state.

use crate::config::{BackoffConfig, BackoffStrategy};
use crate::job::{Job, JobState};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Classification of a single execution attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The command succeeded.
    Success,
    /// The command failed; carries a human-readable reason.
    Failure(String),
}

impl Outcome {
    /// Returns true for a successful attempt.
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }
}

/// Collection a job is routed to after an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    /// Back to the tail of the main queue.
    MainQueue,
    /// Into the dead letter queue.
    DeadLetter,
    /// Into the completed log.
    Completed,
}

/// Result of applying the retry policy to one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    /// Next job state.
    pub state: JobState,
    /// Destination collection.
    pub target: Target,
    /// Attempt count after this attempt.
    pub attempts: u32,
    /// Delay before the job may be dequeued again.
    pub delay: Duration,
}

/// Retry policy configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Backoff strategy.
    pub strategy: BackoffStrategy,

    /// Initial delay in milliseconds.
    pub initial_delay_ms: u64,

    /// Maximum delay in milliseconds.
    pub max_delay_ms: u64,

    /// Backoff multiplier (exponential only).
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::immediate()
    }
}

impl RetryPolicy {
    /// Creates a policy that requeues failed jobs without delay.
    pub fn immediate() -> Self {
        Self {
            strategy: BackoffStrategy::None,
            initial_delay_ms: 0,
            max_delay_ms: 0,
            multiplier: 1.0,
        }
    }

    /// Creates a fixed delay policy.
    pub fn fixed(delay_ms: u64) -> Self {
        Self {
            strategy: BackoffStrategy::Fixed,
            initial_delay_ms: delay_ms,
            max_delay_ms: delay_ms,
            multiplier: 1.0,
        }
    }

    /// Creates an exponential backoff policy.
    pub fn exponential(initial_delay_ms: u64, max_delay_ms: u64) -> Self {
        Self {
            strategy: BackoffStrategy::Exponential,
            initial_delay_ms,
            max_delay_ms,
            multiplier: 2.0,
        }
    }

    /// Sets the backoff multiplier.
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Decides where `job` goes after an attempt with the given outcome.
    ///
    /// A failing attempt always counts towards the budget; the job is
    /// dead-lettered once `attempts + 1 >= max_retries`.
    pub fn decide(&self, job: &Job, outcome: &Outcome) -> Decision {
        match outcome {
            Outcome::Success => Decision {
                state: JobState::Completed,
                target: Target::Completed,
                attempts: job.attempts,
                delay: Duration::ZERO,
            },
            Outcome::Failure(_) => {
                let attempts = job.attempts.saturating_add(1);
                if job.is_exhausted_at(attempts) {
                    Decision {
                        state: JobState::Dead,
                        target: Target::DeadLetter,
                        attempts,
                        delay: Duration::ZERO,
                    }
                } else {
                    Decision {
                        state: JobState::Failed,
                        target: Target::MainQueue,
                        attempts,
                        delay: self.delay_for_attempt(attempts),
                    }
                }
            }
        }
    }

    /// Calculate the requeue delay after the given number of failed attempts.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        let delay_ms = match self.strategy {
            BackoffStrategy::None => 0,
            BackoffStrategy::Fixed => self.initial_delay_ms,
            BackoffStrategy::Exponential => {
                let exp = i32::try_from(attempt - 1).unwrap_or(i32::MAX);
                let delay = self.initial_delay_ms as f64 * self.multiplier.powi(exp);
                if delay.is_finite() && delay < u64::MAX as f64 {
                    delay as u64
                } else {
                    u64::MAX
                }
            }
        };

        Duration::from_millis(delay_ms.min(self.max_delay_ms))
    }
}

impl From<&BackoffConfig> for RetryPolicy {
    fn from(config: &BackoffConfig) -> Self {
        match config.strategy {
            BackoffStrategy::None => Self::immediate(),
            BackoffStrategy::Fixed => Self::fixed(config.initial_delay_ms),
            BackoffStrategy::Exponential => {
                Self::exponential(config.initial_delay_ms, config.max_delay_ms)
                    .with_multiplier(config.multiplier)
            }
        }
    }
}
