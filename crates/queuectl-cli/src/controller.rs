//! Command dispatch against the job store and worker pool.

use crate::command::{Command, StateFilter, HELP};
use queuectl_jobs::classifier::from_config;
use queuectl_jobs::{
    Job, JobResult, JobStore, JobsConfig, QueueStats, ShellExecutor, WorkerHandle, WorkerPool,
    WorkerPoolConfig,
};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Rendered result of one command.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// A job was created.
    Enqueued(Job),
    /// Every job plus collection counts.
    Status { stats: QueueStats, jobs: Vec<Job> },
    /// A filtered job listing.
    Jobs { title: String, jobs: Vec<Job> },
    /// A dead job was moved back to the main queue.
    Retried(Job),
    /// The retry budget for new jobs changed.
    MaxRetriesSet(u32),
    /// Workers were spawned. `crashed` counts previously started workers
    /// found to have exited abnormally.
    WorkersStarted {
        started: usize,
        running: usize,
        crashed: usize,
    },
    /// Stop was signalled.
    WorkersStopping { running: usize },
    /// Command summary.
    Help,
    /// The prompt should shut down.
    Exit,
    /// The command could not be carried out.
    Error(String),
}

impl Reply {
    /// Returns true if the prompt should shut down.
    pub fn is_exit(&self) -> bool {
        matches!(self, Self::Exit)
    }
}

fn write_jobs(f: &mut fmt::Formatter<'_>, jobs: &[Job]) -> fmt::Result {
    if jobs.is_empty() {
        return write!(f, "\n  (none)");
    }
    for job in jobs {
        write!(f, "\n  {job}")?;
        if let Some(error) = &job.last_error {
            write!(f, " last_error={error}")?;
        }
    }
    Ok(())
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Enqueued(job) => write!(
                f,
                "Enqueued job {}: {} (max retries {})",
                job.id, job.command, job.max_retries
            ),
            Self::Status { stats, jobs } => {
                write!(
                    f,
                    "Jobs: {} total, {} pending, {} failed, {} processing, {} dead, {} completed (max retries {})",
                    stats.total(),
                    stats.pending,
                    stats.failed,
                    stats.processing,
                    stats.dead_letter,
                    stats.completed,
                    stats.max_retries
                )?;
                write_jobs(f, jobs)
            }
            Self::Jobs { title, jobs } => {
                write!(f, "{title}: {}", jobs.len())?;
                write_jobs(f, jobs)
            }
            Self::Retried(job) => write!(f, "Job {} moved back to pending", job.id),
            Self::MaxRetriesSet(n) => write!(f, "Max retries set to {n}"),
            Self::WorkersStarted {
                started,
                running,
                crashed,
            } => {
                write!(f, "Started {started} worker(s), {running} running")?;
                if *crashed > 0 {
                    write!(f, " ({crashed} exited abnormally)")?;
                }
                Ok(())
            }
            Self::WorkersStopping { running } => write!(
                f,
                "Stopping workers, {running} will exit after their current job"
            ),
            Self::Help => f.write_str(HELP),
            Self::Exit => f.write_str("Shutting down"),
            Self::Error(message) => write!(f, "Error: {message}"),
        }
    }
}

/// Owns the store, the pool and every worker handle it has started.
pub struct Controller {
    store: Arc<JobStore>,
    pool: WorkerPool,
    handles: Vec<WorkerHandle>,
    default_workers: usize,
}

impl Controller {
    /// Create a controller around an existing pool.
    pub fn new(pool: WorkerPool, default_workers: usize) -> Self {
        Self {
            store: pool.store().clone(),
            pool,
            handles: Vec::new(),
            default_workers,
        }
    }

    /// Build the store, shell executor, classifier and pool from configuration.
    pub fn from_config(config: &JobsConfig) -> Self {
        let store = Arc::new(JobStore::new(&config.queue));
        let executor = Arc::new(ShellExecutor::new(config.worker.shell.clone()));
        let pool = WorkerPool::new(store, executor, WorkerPoolConfig::from(&config.worker))
            .with_classifier(from_config(&config.classifier));
        Self::new(pool, config.worker.concurrency)
    }

    /// The job store.
    pub fn store(&self) -> &Arc<JobStore> {
        &self.store
    }

    /// Handles of workers that have not exited yet.
    pub fn running_workers(&self) -> usize {
        self.handles.iter().filter(|h| !h.is_finished()).count()
    }

    /// Parse and execute one input line. Blank lines yield `None`.
    pub async fn handle_line(&mut self, line: &str) -> Option<Reply> {
        if line.trim().is_empty() {
            return None;
        }
        let reply = match Command::parse(line) {
            Ok(command) => self.execute(command).await,
            Err(e) => Reply::Error(e.to_string()),
        };
        Some(reply)
    }

    /// Execute a parsed command.
    pub async fn execute(&mut self, command: Command) -> Reply {
        debug!(?command, "Executing command");

        match command {
            Command::Enqueue(request) => Reply::Enqueued(self.store.submit(request.command_line())),
            Command::Status => Reply::Status {
                stats: self.store.stats(),
                jobs: self.store.all_jobs(),
            },
            Command::List(filter) => Reply::Jobs {
                title: format!("{} jobs", capitalize(filter)),
                jobs: self.store.list_by_state(filter.state()),
            },
            Command::DlqList => Reply::Jobs {
                title: "Dead letter queue".to_string(),
                jobs: self.store.dead_letter(),
            },
            Command::DlqRetry(id) => match self.store.retry_dead_letter(id) {
                Ok(job) => Reply::Retried(job),
                Err(e) => Reply::Error(e.to_string()),
            },
            Command::SetMaxRetries(n) => {
                self.store.set_max_retries(n);
                Reply::MaxRetriesSet(n)
            }
            Command::WorkerStart(count) => {
                let count = count.unwrap_or(self.default_workers);
                let crashed = self.reap_finished().await;
                self.handles.extend(self.pool.start(count));
                Reply::WorkersStarted {
                    started: count,
                    running: self.handles.len(),
                    crashed,
                }
            }
            Command::WorkerStop => {
                self.pool.stop();
                Reply::WorkersStopping {
                    running: self.running_workers(),
                }
            }
            Command::Help => Reply::Help,
            Command::Exit => Reply::Exit,
        }
    }

    /// Join every worker that has already exited and drop its handle.
    /// Returns how many of them panicked or were aborted.
    async fn reap_finished(&mut self) -> usize {
        let (finished, running): (Vec<_>, Vec<_>) = std::mem::take(&mut self.handles)
            .into_iter()
            .partition(WorkerHandle::is_finished);
        self.handles = running;

        let mut crashed = 0;
        for handle in finished {
            let worker_id = handle.id();
            if let Err(e) = handle.join().await {
                warn!(worker_id, error = %e, "Worker exited abnormally");
                crashed += 1;
            }
        }
        crashed
    }

    /// Signal every worker to stop and wait for all of them to exit.
    pub async fn shutdown(&mut self) -> JobResult<()> {
        let handles = std::mem::take(&mut self.handles);
        if handles.is_empty() {
            return Ok(());
        }

        info!(workers = handles.len(), "Stopping all workers");
        self.pool.stop();
        WorkerPool::join_all(handles).await?;
        info!("All workers stopped");
        Ok(())
    }
}

fn capitalize(filter: StateFilter) -> String {
    let name = filter.to_string();
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => name,
    }
}
