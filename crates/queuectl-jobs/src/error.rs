//! Job error types.

use crate::job::JobId;
use std::time::Duration;
use thiserror::Error;

/// Result type for job operations.
pub type JobResult<T> = Result<T, JobError>;

/// Job-related errors.
#[derive(Debug, Error)]
pub enum JobError {
    /// Command execution failed.
    #[error("Job execution failed: {0}")]
    ExecutionFailed(String),

    /// Command did not finish within its timeout.
    #[error("Job timed out after {0:?}")]
    Timeout(Duration),

    /// Command could not be started.
    #[error("Failed to launch command: {0}")]
    Launch(String),

    /// Job not found.
    #[error("Job not found: {0}")]
    NotFound(JobId),

    /// Outcome reported for a job that is not being processed.
    #[error("Job {0} is not in flight")]
    NotInFlight(JobId),

    /// Worker error.
    #[error("Worker error: {0}")]
    Worker(String),
}

impl JobError {
    /// Returns true if this error is an execution failure, i.e. a normal
    /// job outcome that goes through the retry policy.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            JobError::ExecutionFailed(_) | JobError::Timeout(_) | JobError::Launch(_)
        )
    }

    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            JobError::ExecutionFailed(_) => "execution_failed",
            JobError::Timeout(_) => "timeout",
            JobError::Launch(_) => "launch",
            JobError::NotFound(_) => "not_found",
            JobError::NotInFlight(_) => "not_in_flight",
            JobError::Worker(_) => "worker",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_retryable_execution_failed() {
        let err = JobError::ExecutionFailed("exit code 1".into());
        assert!(err.is_retryable());
    }

    #[test]
    fn test_is_retryable_timeout() {
        let err = JobError::Timeout(Duration::from_secs(30));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_is_retryable_launch() {
        let err = JobError::Launch("no such file".into());
        assert!(err.is_retryable());
    }

    #[test]
    fn test_is_not_retryable_not_found() {
        let err = JobError::NotFound(JobId::new(7));
        assert!(!err.is_retryable());
        assert!(err.to_string().contains('7'));
    }

    #[test]
    fn test_is_not_retryable_worker() {
        let err = JobError::Worker("worker 3 did not exit cleanly".into());
        assert!(!err.is_retryable());
        assert_eq!(err.kind(), "worker");
    }

    #[test]
    fn test_error_display_timeout() {
        let err = JobError::Timeout(Duration::from_secs(30));
        assert!(err.to_string().contains("30s"));
    }

    #[test]
    fn test_error_display_not_in_flight() {
        let err = JobError::NotInFlight(JobId::new(42));
        assert_eq!(err.to_string(), "Job 42 is not in flight");
    }

    #[test]
    fn test_kind_labels() {
        assert_eq!(JobError::Launch("sh".into()).kind(), "launch");
        assert_eq!(JobError::NotInFlight(JobId::new(1)).kind(), "not_in_flight");
    }
}
