//! Job entity and state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

/// Unique, monotonically increasing job identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(u64);

impl JobId {
    /// Creates a job ID from its raw value.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for JobId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl FromStr for JobId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

/// Job state enumeration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Waiting in the main queue for its first attempt.
    #[default]
    Pending,
    /// Dequeued by a worker and executing.
    Processing,
    /// Finished successfully. Terminal.
    Completed,
    /// Failed at least once, waiting in the main queue for another attempt.
    Failed,
    /// Retry budget exhausted; held in the dead letter queue.
    Dead,
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobState::Pending => write!(f, "pending"),
            JobState::Processing => write!(f, "processing"),
            JobState::Completed => write!(f, "completed"),
            JobState::Failed => write!(f, "failed"),
            JobState::Dead => write!(f, "dead"),
        }
    }
}

/// A unit of work: one shell command line and its lifecycle state.
///
/// Jobs are never mutated in place once they are stored; every transition
/// produces a new value, so snapshots handed out by the store stay valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Job ID.
    pub id: JobId,

    /// Full command line, arguments included.
    pub command: String,

    /// Current state.
    pub state: JobState,

    /// Execution attempts so far.
    pub attempts: u32,

    /// Retry budget captured when the job was created.
    pub max_retries: u32,

    /// When the job was created.
    pub created_at: DateTime<Utc>,

    /// When the job last changed state.
    pub updated_at: DateTime<Utc>,

    /// Earliest time the job may be dequeued.
    pub available_at: DateTime<Utc>,

    /// Error from the last failed attempt.
    pub last_error: Option<String>,
}

impl Job {
    /// Creates a new pending job.
    pub fn new(id: JobId, command: impl Into<String>, max_retries: u32) -> Self {
        let now = Utc::now();
        Self {
            id,
            command: command.into(),
            state: JobState::Pending,
            attempts: 0,
            max_retries,
            created_at: now,
            updated_at: now,
            available_at: now,
            last_error: None,
        }
    }

    /// Returns a copy of this job moved to `state` with a fresh timestamp.
    pub fn transition(&self, state: JobState) -> Self {
        let mut next = self.clone();
        next.state = state;
        next.updated_at = Utc::now();
        next
    }

    /// Returns true if `attempts` uses up the retry budget.
    pub fn is_exhausted_at(&self, attempts: u32) -> bool {
        attempts >= self.max_retries
    }

    /// Returns true if the job may be dequeued at `now`.
    pub fn is_available(&self, now: DateTime<Utc>) -> bool {
        self.available_at <= now
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Job(id={}, command={}, state={}, attempts={}/{})",
            self.id, self.command, self.state, self.attempts, self.max_retries
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_job_is_pending() {
        let job = Job::new(JobId::new(1), "echo hi", 3);
        assert_eq!(job.state, JobState::Pending);
        assert_eq!(job.attempts, 0);
        assert_eq!(job.max_retries, 3);
        assert_eq!(job.created_at, job.updated_at);
        assert!(job.last_error.is_none());
    }

    #[test]
    fn test_transition_leaves_original_untouched() {
        let job = Job::new(JobId::new(1), "true", 3);
        let processing = job.transition(JobState::Processing);

        assert_eq!(job.state, JobState::Pending);
        assert_eq!(processing.state, JobState::Processing);
        assert_eq!(processing.id, job.id);
        assert!(processing.updated_at >= job.updated_at);
    }

    #[test]
    fn test_is_exhausted_at() {
        let job = Job::new(JobId::new(1), "false", 2);
        assert!(!job.is_exhausted_at(1));
        assert!(job.is_exhausted_at(2));
        assert!(job.is_exhausted_at(3));
    }

    #[test]
    fn test_job_id_parse() {
        assert_eq!(" 12 ".parse::<JobId>().unwrap(), JobId::new(12));
        assert!("abc".parse::<JobId>().is_err());
    }

    #[test]
    fn test_state_display_and_serde() {
        assert_eq!(JobState::Dead.to_string(), "dead");
        let json = serde_json::to_string(&JobState::Processing).unwrap();
        assert_eq!(json, "\"processing\"");
    }

    #[test]
    fn test_default_state_is_pending() {
        assert_eq!(JobState::default(), JobState::Pending);
    }

    #[test]
    fn test_job_json_uses_plain_id() {
        let job = Job::new(JobId::new(5), "ls", 1);
        let json = serde_json::to_string(&job).unwrap();
        assert!(json.contains("\"id\":5"));
    }
}
