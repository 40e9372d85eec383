//! Thread-safe in-memory job store.
//!
//! The store owns four collections (main queue, in-flight, dead letter,
//! completed) behind a single lock. Every operation that reads and decides,
//! or touches more than one collection, runs under one lock acquisition.
//! Command execution never happens while the lock is held.

use crate::config::QueueConfig;
use crate::error::{JobError, JobResult};
use crate::job::{Job, JobId, JobState};
use crate::metrics::JobMetrics;
use crate::retry::{Outcome, RetryPolicy, Target};
use chrono::{Duration as ChronoDuration, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Snapshot of collection sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QueueStats {
    /// Pending jobs in the main queue.
    pub pending: usize,

    /// Failed jobs waiting in the main queue for another attempt.
    pub failed: usize,

    /// In-flight jobs.
    pub processing: usize,

    /// Dead letter queue size.
    pub dead_letter: usize,

    /// Completed jobs retained.
    pub completed: usize,

    /// Retry budget for newly created jobs.
    pub max_retries: u32,
}

impl QueueStats {
    /// Total jobs across all collections.
    pub fn total(&self) -> usize {
        self.pending + self.failed + self.processing + self.dead_letter + self.completed
    }
}

#[derive(Debug, Default)]
struct Collections {
    main: VecDeque<Job>,
    processing: BTreeMap<JobId, Job>,
    dead_letter: Vec<Job>,
    completed: VecDeque<Job>,
    max_retries: u32,
}

impl Collections {
    fn publish_sizes(&self) {
        JobMetrics::update_queue_sizes(
            self.main.len(),
            self.processing.len(),
            self.dead_letter.len(),
        );
    }
}

/// In-memory job store shared by producers and workers.
pub struct JobStore {
    inner: Mutex<Collections>,
    next_id: AtomicU64,
    available: Notify,
    policy: RetryPolicy,
    completed_capacity: usize,
}

impl JobStore {
    /// Create a store from queue configuration.
    pub fn new(config: &QueueConfig) -> Self {
        Self {
            inner: Mutex::new(Collections {
                max_retries: config.max_retries,
                ..Collections::default()
            }),
            next_id: AtomicU64::new(1),
            available: Notify::new(),
            policy: RetryPolicy::from(&config.backoff),
            completed_capacity: config.completed_capacity,
        }
    }

    fn next_id(&self) -> JobId {
        JobId::new(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Retry budget assigned to newly created jobs.
    pub fn max_retries(&self) -> u32 {
        self.inner.lock().max_retries
    }

    /// Change the retry budget for jobs created from now on. Existing jobs
    /// keep the budget they were created with.
    pub fn set_max_retries(&self, max_retries: u32) {
        self.inner.lock().max_retries = max_retries;
        info!(max_retries, "Max retries updated");
    }

    /// Create a pending job for `command` and append it to the tail of the
    /// main queue.
    ///
    /// ID allocation, budget capture and the append happen under one lock
    /// acquisition, so queue order always matches ID order and the job gets
    /// the budget in force when it was queued.
    pub fn submit(&self, command: impl Into<String>) -> Job {
        let job = {
            let mut inner = self.inner.lock();
            let job = Job::new(self.next_id(), command, inner.max_retries);
            debug!(job_id = %job.id, command = %job.command, "Enqueued job");
            inner.main.push_back(job.clone());
            inner.publish_sizes();
            job
        };
        JobMetrics::job_enqueued();
        self.available.notify_one();
        job
    }

    /// Remove the first available job from the main queue and mark it
    /// in flight. Returns `None` if no job is ready.
    pub fn dequeue(&self) -> Option<Job> {
        let now = Utc::now();
        let mut inner = self.inner.lock();

        let position = inner.main.iter().position(|job| job.is_available(now))?;
        let job = inner.main.remove(position)?.transition(JobState::Processing);
        inner.processing.insert(job.id, job.clone());
        inner.publish_sizes();
        drop(inner);

        JobMetrics::job_dequeued();
        debug!(job_id = %job.id, attempts = job.attempts, "Dequeued job");
        Some(job)
    }

    /// Wait for a job to become available.
    ///
    /// Suspends until an enqueue wakes the caller, re-checking at least every
    /// `poll_interval` so delayed retries are picked up. Returns `None` once
    /// `cancel` fires.
    pub async fn dequeue_wait(
        &self,
        cancel: &CancellationToken,
        poll_interval: Duration,
    ) -> Option<Job> {
        loop {
            if cancel.is_cancelled() {
                return None;
            }

            // Register interest before checking so a concurrent enqueue
            // between the check and the await is not lost.
            let notified = self.available.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(job) = self.dequeue() {
                return Some(job);
            }

            tokio::select! {
                biased;
                () = cancel.cancelled() => return None,
                () = &mut notified => {}
                () = tokio::time::sleep(poll_interval) => {}
            }
        }
    }

    /// Apply the retry policy to an in-flight job and move it to exactly one
    /// of the main queue, the dead letter queue or the completed log.
    ///
    /// Returns the job as stored after the transition.
    pub fn record_outcome(&self, job: &Job, outcome: &Outcome) -> JobResult<Job> {
        let mut inner = self.inner.lock();

        let Some(current) = inner.processing.remove(&job.id) else {
            error!(job_id = %job.id, "Outcome recorded for a job that is not in flight");
            return Err(JobError::NotInFlight(job.id));
        };

        let decision = self.policy.decide(&current, outcome);
        let mut next = current.transition(decision.state);
        next.attempts = decision.attempts;
        if let Outcome::Failure(reason) = outcome {
            next.last_error = Some(reason.clone());
        }

        match decision.target {
            Target::Completed => {
                debug!(job_id = %next.id, "Job completed");
                inner.completed.push_back(next.clone());
                if self.completed_capacity > 0 {
                    while inner.completed.len() > self.completed_capacity {
                        inner.completed.pop_front();
                    }
                }
            }
            Target::MainQueue => {
                next.available_at =
                    next.updated_at + ChronoDuration::from_std(decision.delay).unwrap_or_default();
                warn!(
                    job_id = %next.id,
                    attempts = next.attempts,
                    max_retries = next.max_retries,
                    delay_ms = decision.delay.as_millis() as u64,
                    "Job failed, requeued"
                );
                inner.main.push_back(next.clone());
                JobMetrics::job_retried(next.attempts);
            }
            Target::DeadLetter => {
                warn!(
                    job_id = %next.id,
                    attempts = next.attempts,
                    error = next.last_error.as_deref().unwrap_or_default(),
                    "Job moved to dead letter queue"
                );
                inner.dead_letter.push(next.clone());
                JobMetrics::job_dead_lettered();
            }
        }

        inner.publish_sizes();
        drop(inner);

        if decision.target == Target::MainQueue {
            self.available.notify_one();
        }

        Ok(next)
    }

    /// Snapshot of jobs in the given state.
    pub fn list_by_state(&self, state: JobState) -> Vec<Job> {
        let inner = self.inner.lock();
        match state {
            JobState::Pending | JobState::Failed => inner
                .main
                .iter()
                .filter(|job| job.state == state)
                .cloned()
                .collect(),
            JobState::Processing => inner.processing.values().cloned().collect(),
            JobState::Dead => inner.dead_letter.clone(),
            JobState::Completed => inner.completed.iter().cloned().collect(),
        }
    }

    /// Snapshot of the main queue in dequeue order.
    pub fn queued(&self) -> Vec<Job> {
        self.inner.lock().main.iter().cloned().collect()
    }

    /// Snapshot of the dead letter queue.
    pub fn dead_letter(&self) -> Vec<Job> {
        self.inner.lock().dead_letter.clone()
    }

    /// Snapshot of the completed log, oldest first.
    pub fn completed(&self) -> Vec<Job> {
        self.inner.lock().completed.iter().cloned().collect()
    }

    /// Move a dead job back to the main queue with a fresh retry budget.
    pub fn retry_dead_letter(&self, id: JobId) -> JobResult<Job> {
        let mut inner = self.inner.lock();

        let position = inner
            .dead_letter
            .iter()
            .position(|job| job.id == id)
            .ok_or(JobError::NotFound(id))?;

        let mut job = inner.dead_letter.remove(position).transition(JobState::Pending);
        job.attempts = 0;
        job.available_at = job.updated_at;
        job.last_error = None;

        inner.main.push_back(job.clone());
        inner.publish_sizes();
        drop(inner);

        info!(job_id = %id, "Retrying job from dead letter queue");
        JobMetrics::job_dlq_retried();
        self.available.notify_one();
        Ok(job)
    }

    /// Snapshot of every job: main queue, in flight, dead letter, completed.
    pub fn all_jobs(&self) -> Vec<Job> {
        let inner = self.inner.lock();
        inner
            .main
            .iter()
            .chain(inner.processing.values())
            .chain(inner.dead_letter.iter())
            .chain(inner.completed.iter())
            .cloned()
            .collect()
    }

    /// Find a job by ID in any collection.
    pub fn get(&self, id: JobId) -> Option<Job> {
        let inner = self.inner.lock();
        inner
            .main
            .iter()
            .chain(inner.processing.get(&id))
            .chain(inner.dead_letter.iter())
            .chain(inner.completed.iter())
            .find(|job| job.id == id)
            .cloned()
    }

    /// Collection sizes.
    pub fn stats(&self) -> QueueStats {
        let inner = self.inner.lock();
        let failed = inner
            .main
            .iter()
            .filter(|job| job.state == JobState::Failed)
            .count();

        QueueStats {
            pending: inner.main.len() - failed,
            failed,
            processing: inner.processing.len(),
            dead_letter: inner.dead_letter.len(),
            completed: inner.completed.len(),
            max_retries: inner.max_retries,
        }
    }
}

impl Default for JobStore {
    fn default() -> Self {
        Self::new(&QueueConfig::default())
    }
}
