//! Metrics for job queue monitoring.
//!
//! Recorded through the `metrics` facade; nothing is exported unless the
//! host process installs a recorder.

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use std::time::Duration;

/// Metric names for the job queue system.
pub mod names {
    /// Total jobs enqueued.
    pub const JOBS_ENQUEUED_TOTAL: &str = "queuectl_jobs_enqueued_total";
    /// Total jobs dequeued for processing.
    pub const JOBS_DEQUEUED_TOTAL: &str = "queuectl_jobs_dequeued_total";
    /// Total jobs completed successfully.
    pub const JOBS_COMPLETED_TOTAL: &str = "queuectl_jobs_completed_total";
    /// Total failed attempts.
    pub const JOBS_FAILED_TOTAL: &str = "queuectl_jobs_failed_total";
    /// Total jobs requeued after a failed attempt.
    pub const JOBS_RETRIED_TOTAL: &str = "queuectl_jobs_retried_total";
    /// Total jobs sent to dead letter queue.
    pub const JOBS_DEAD_LETTERED_TOTAL: &str = "queuectl_jobs_dead_lettered_total";
    /// Total jobs moved back out of the dead letter queue.
    pub const JOBS_DLQ_RETRIED_TOTAL: &str = "queuectl_jobs_dlq_retried_total";
    /// Total executions that timed out.
    pub const JOBS_TIMED_OUT_TOTAL: &str = "queuectl_jobs_timed_out_total";

    /// Current jobs in the main queue.
    pub const JOBS_PENDING: &str = "queuectl_jobs_pending";
    /// Current in-flight jobs.
    pub const JOBS_PROCESSING: &str = "queuectl_jobs_processing";
    /// Current dead letter queue size.
    pub const JOBS_DEAD_LETTER: &str = "queuectl_jobs_dead_letter";

    /// Job execution duration in seconds.
    pub const JOB_DURATION_SECONDS: &str = "queuectl_job_duration_seconds";

    /// Active workers count.
    pub const WORKERS_ACTIVE: &str = "queuectl_workers_active";
}

/// Register all metric descriptions.
pub fn register_metrics() {
    describe_counter!(names::JOBS_ENQUEUED_TOTAL, "Total number of jobs enqueued");
    describe_counter!(
        names::JOBS_DEQUEUED_TOTAL,
        "Total number of jobs dequeued for processing"
    );
    describe_counter!(
        names::JOBS_COMPLETED_TOTAL,
        "Total number of jobs completed successfully"
    );
    describe_counter!(names::JOBS_FAILED_TOTAL, "Total number of failed attempts");
    describe_counter!(
        names::JOBS_RETRIED_TOTAL,
        "Total number of jobs requeued after a failure"
    );
    describe_counter!(
        names::JOBS_DEAD_LETTERED_TOTAL,
        "Total number of jobs sent to dead letter queue"
    );
    describe_counter!(
        names::JOBS_DLQ_RETRIED_TOTAL,
        "Total number of jobs retried from the dead letter queue"
    );
    describe_counter!(
        names::JOBS_TIMED_OUT_TOTAL,
        "Total number of executions that timed out"
    );

    describe_gauge!(names::JOBS_PENDING, "Current number of queued jobs");
    describe_gauge!(names::JOBS_PROCESSING, "Current number of in-flight jobs");
    describe_gauge!(names::JOBS_DEAD_LETTER, "Current size of dead letter queue");

    describe_histogram!(
        names::JOB_DURATION_SECONDS,
        "Job execution duration in seconds"
    );

    describe_gauge!(names::WORKERS_ACTIVE, "Number of running workers");
}

/// Job metrics recorder.
#[derive(Clone)]
pub struct JobMetrics;

impl JobMetrics {
    /// Record a job enqueued.
    pub fn job_enqueued() {
        counter!(names::JOBS_ENQUEUED_TOTAL).increment(1);
    }

    /// Record a job dequeued.
    pub fn job_dequeued() {
        counter!(names::JOBS_DEQUEUED_TOTAL).increment(1);
    }

    /// Record a job completed.
    pub fn job_completed(duration: Duration) {
        counter!(names::JOBS_COMPLETED_TOTAL).increment(1);
        histogram!(names::JOB_DURATION_SECONDS, "status" => "completed")
            .record(duration.as_secs_f64());
    }

    /// Record a failed attempt.
    pub fn job_failed(error_type: &'static str, duration: Duration) {
        counter!(names::JOBS_FAILED_TOTAL, "error_type" => error_type).increment(1);
        histogram!(names::JOB_DURATION_SECONDS, "status" => "failed")
            .record(duration.as_secs_f64());
    }

    /// Record a job requeued for another attempt.
    pub fn job_retried(attempt: u32) {
        counter!(names::JOBS_RETRIED_TOTAL, "attempt" => attempt.to_string()).increment(1);
    }

    /// Record a job sent to DLQ.
    pub fn job_dead_lettered() {
        counter!(names::JOBS_DEAD_LETTERED_TOTAL).increment(1);
    }

    /// Record a job moved out of the DLQ.
    pub fn job_dlq_retried() {
        counter!(names::JOBS_DLQ_RETRIED_TOTAL).increment(1);
    }

    /// Record a job timeout.
    pub fn job_timed_out() {
        counter!(names::JOBS_TIMED_OUT_TOTAL).increment(1);
    }

    /// Update collection size gauges.
    pub fn update_queue_sizes(pending: usize, processing: usize, dead_letter: usize) {
        gauge!(names::JOBS_PENDING).set(pending as f64);
        gauge!(names::JOBS_PROCESSING).set(processing as f64);
        gauge!(names::JOBS_DEAD_LETTER).set(dead_letter as f64);
    }
}

/// Worker metrics recorder.
#[derive(Clone)]
pub struct WorkerMetrics;

impl WorkerMetrics {
    /// Update running worker count.
    pub fn update_workers(active: usize) {
        gauge!(names::WORKERS_ACTIVE).set(active as f64);
    }
}
