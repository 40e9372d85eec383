//! Worker pool for processing jobs.

use crate::classifier::{classify_result, ExitCodeClassifier, OutcomeClassifier};
use crate::config::WorkerConfig;
use crate::error::{JobError, JobResult};
use crate::executor::CommandExecutor;
use crate::job::{Job, JobState};
use crate::metrics::{JobMetrics, WorkerMetrics};
use crate::retry::Outcome;
use crate::store::JobStore;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn, Instrument};

/// Worker pool configuration.
#[derive(Debug, Clone)]
pub struct WorkerPoolConfig {
    /// Per-command execution timeout.
    pub job_timeout: Duration,

    /// Upper bound on idle sleep between queue checks.
    pub poll_interval: Duration,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self {
            job_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_millis(500),
        }
    }
}

impl From<&WorkerConfig> for WorkerPoolConfig {
    fn from(config: &WorkerConfig) -> Self {
        Self {
            job_timeout: config.job_timeout(),
            poll_interval: config.poll_interval(),
        }
    }
}

/// Handle to one running worker.
#[derive(Debug)]
pub struct WorkerHandle {
    id: usize,
    handle: JoinHandle<()>,
}

impl WorkerHandle {
    /// Worker ID, unique within its pool.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Returns true once the worker has exited.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the worker to exit.
    pub async fn join(self) -> JobResult<()> {
        let id = self.id;
        self.handle
            .await
            .map_err(|e| JobError::Worker(format!("worker {id} did not exit cleanly: {e}")))
    }
}

#[derive(Debug, Default)]
struct PoolCounters {
    active_workers: AtomicUsize,
    jobs_completed: AtomicU64,
    jobs_failed: AtomicU64,
    jobs_dead_lettered: AtomicU64,
}

/// Worker pool statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerPoolStats {
    /// Workers currently running.
    pub active_workers: usize,

    /// Jobs completed.
    pub jobs_completed: u64,

    /// Failed attempts, including those that dead-lettered their job.
    pub jobs_failed: u64,

    /// Jobs moved to the dead letter queue.
    pub jobs_dead_lettered: u64,
}

/// Pool of concurrent workers draining a [`JobStore`].
///
/// Stopping is cooperative: a worker finishes the command it is running
/// before it notices cancellation and exits.
pub struct WorkerPool {
    store: Arc<JobStore>,
    executor: Arc<dyn CommandExecutor>,
    classifier: Arc<dyn OutcomeClassifier>,
    config: WorkerPoolConfig,
    cancel: Mutex<CancellationToken>,
    next_worker_id: AtomicUsize,
    counters: Arc<PoolCounters>,
}

impl WorkerPool {
    /// Create a new worker pool classifying results by exit code.
    pub fn new(
        store: Arc<JobStore>,
        executor: Arc<dyn CommandExecutor>,
        config: WorkerPoolConfig,
    ) -> Self {
        Self {
            store,
            executor,
            classifier: Arc::new(ExitCodeClassifier),
            config,
            cancel: Mutex::new(CancellationToken::new()),
            next_worker_id: AtomicUsize::new(1),
            counters: Arc::new(PoolCounters::default()),
        }
    }

    /// Replace the outcome classifier.
    pub fn with_classifier(mut self, classifier: Arc<dyn OutcomeClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    /// The store this pool drains.
    pub fn store(&self) -> &Arc<JobStore> {
        &self.store
    }

    /// Spawn `count` workers on the current Tokio runtime.
    ///
    /// All workers started before the next [`stop`](Self::stop) share one
    /// cancellation token. The caller owns the returned handles and should
    /// join them during shutdown.
    pub fn start(&self, count: usize) -> Vec<WorkerHandle> {
        let cancel = self.cancel.lock().clone();

        info!(
            count,
            job_timeout = ?self.config.job_timeout,
            "Starting workers"
        );

        (0..count)
            .map(|_| {
                let id = self.next_worker_id.fetch_add(1, Ordering::Relaxed);
                let worker = Worker {
                    id,
                    store: self.store.clone(),
                    executor: self.executor.clone(),
                    classifier: self.classifier.clone(),
                    config: self.config.clone(),
                    counters: self.counters.clone(),
                };
                let handle = tokio::spawn(
                    worker
                        .run(cancel.clone())
                        .instrument(tracing::info_span!("worker", worker_id = id)),
                );
                WorkerHandle { id, handle }
            })
            .collect()
    }

    /// Signal every running worker to exit after its current job.
    ///
    /// Does not wait; join the handles returned by [`start`](Self::start).
    /// Workers started afterwards get a fresh token.
    pub fn stop(&self) {
        let token = std::mem::replace(&mut *self.cancel.lock(), CancellationToken::new());
        token.cancel();
        info!(
            active_workers = self.counters.active_workers.load(Ordering::SeqCst),
            "Stopping workers"
        );
    }

    /// Wait for every handle, returning the first join error if any.
    pub async fn join_all(handles: Vec<WorkerHandle>) -> JobResult<()> {
        let mut first_error = None;
        for handle in handles {
            if let Err(e) = handle.join().await {
                error!(error = %e, "Worker join failed");
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Get pool statistics.
    pub fn stats(&self) -> WorkerPoolStats {
        WorkerPoolStats {
            active_workers: self.counters.active_workers.load(Ordering::SeqCst),
            jobs_completed: self.counters.jobs_completed.load(Ordering::Relaxed),
            jobs_failed: self.counters.jobs_failed.load(Ordering::Relaxed),
            jobs_dead_lettered: self.counters.jobs_dead_lettered.load(Ordering::Relaxed),
        }
    }
}

struct Worker {
    id: usize,
    store: Arc<JobStore>,
    executor: Arc<dyn CommandExecutor>,
    classifier: Arc<dyn OutcomeClassifier>,
    config: WorkerPoolConfig,
    counters: Arc<PoolCounters>,
}

impl Worker {
    async fn run(self, cancel: CancellationToken) {
        let active = self.counters.active_workers.fetch_add(1, Ordering::SeqCst) + 1;
        WorkerMetrics::update_workers(active);
        debug!(worker_id = self.id, "Worker started");

        while let Some(job) = self
            .store
            .dequeue_wait(&cancel, self.config.poll_interval)
            .await
        {
            self.process(job).await;
        }

        let active = self.counters.active_workers.fetch_sub(1, Ordering::SeqCst) - 1;
        WorkerMetrics::update_workers(active);
        debug!(worker_id = self.id, "Worker stopped");
    }

    async fn process(&self, job: Job) {
        debug!(
            job_id = %job.id,
            command = %job.command,
            attempt = job.attempts + 1,
            "Processing job"
        );

        let started = Instant::now();
        let result = self
            .executor
            .execute(&job.command, self.config.job_timeout)
            .await;
        let elapsed = started.elapsed();

        let outcome = classify_result(self.classifier.as_ref(), &result);
        match (&outcome, &result) {
            (Outcome::Success, _) => JobMetrics::job_completed(elapsed),
            (Outcome::Failure(reason), Err(e)) => {
                if matches!(e, JobError::Timeout(_)) {
                    JobMetrics::job_timed_out();
                }
                if e.is_retryable() {
                    warn!(job_id = %job.id, error = %reason, "Job execution failed");
                } else {
                    error!(job_id = %job.id, error = %reason, kind = e.kind(), "Executor error");
                }
                JobMetrics::job_failed(e.kind(), elapsed);
            }
            (Outcome::Failure(reason), Ok(_)) => {
                warn!(job_id = %job.id, error = %reason, "Job command failed");
                JobMetrics::job_failed("command_failed", elapsed);
            }
        }

        match self.store.record_outcome(&job, &outcome) {
            Ok(recorded) => match recorded.state {
                JobState::Completed => {
                    self.counters.jobs_completed.fetch_add(1, Ordering::Relaxed);
                }
                JobState::Dead => {
                    self.counters.jobs_failed.fetch_add(1, Ordering::Relaxed);
                    self.counters.jobs_dead_lettered.fetch_add(1, Ordering::Relaxed);
                }
                _ => {
                    self.counters.jobs_failed.fetch_add(1, Ordering::Relaxed);
                }
            },
            Err(e) => {
                error!(job_id = %job.id, error = %e, "Failed to record job outcome");
            }
        }
    }
}
