//! QueueCTL Jobs - In-Process Job Queue
//!
//! An in-memory job queue for shell commands with:
//! - A single-lock job store holding queued, in-flight, dead and completed jobs
//! - A pool of concurrent workers with cooperative cancellation
//! - Bounded retries with optional backoff
//! - Dead letter queue with explicit retry
//! - Pluggable outcome classification (exit code, output keywords)
//!
//! # Architecture
//!
//! ```text
//!  submit ──► ┌──────────────────────── JobStore ───────────────────────┐
//!             │  main queue (FIFO)   processing   dead letter  completed │
//!             └──────┬──────────────────▲───────────────▲──────────▲─────┘
//!                    │ dequeue          │ record_outcome│          │
//!                    ▼                  │               │          │
//!             ┌──────────────── WorkerPool ─────────────┴──────────┘
//!             │  worker 1 .. worker N
//!             │    CommandExecutor (shell, timeout)
//!             │    OutcomeClassifier ──► RetryPolicy
//!             └──────────────────────────────────────────
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use queuectl_jobs::{JobStore, ShellExecutor, WorkerPool, WorkerPoolConfig};
//! use std::sync::Arc;
//!
//! let store = Arc::new(JobStore::default());
//! store.submit("echo hello");
//!
//! let pool = WorkerPool::new(store.clone(), Arc::new(ShellExecutor::default()), WorkerPoolConfig::default());
//! let handles = pool.start(4);
//! // ...
//! pool.stop();
//! WorkerPool::join_all(handles).await?;
//! ```

pub mod classifier;
pub mod config;
pub mod error;
pub mod executor;
pub mod job;
pub mod metrics;
pub mod retry;
pub mod store;
pub mod worker;

pub use classifier::{AllOf, ExitCodeClassifier, KeywordClassifier, OutcomeClassifier};
pub use config::{BackoffConfig, BackoffStrategy, ClassifierConfig, JobsConfig, QueueConfig, WorkerConfig};
pub use error::{JobError, JobResult};
pub use executor::{CommandExecutor, ExecutionOutput, ShellExecutor};
pub use job::{Job, JobId, JobState};
pub use metrics::{register_metrics, JobMetrics, WorkerMetrics};
pub use retry::{Decision, Outcome, RetryPolicy, Target};
pub use store::{JobStore, QueueStats};
pub use worker::{WorkerHandle, WorkerPool, WorkerPoolConfig, WorkerPoolStats};

