//! Shared helpers for worker pool integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use queuectl_jobs::{
    CommandExecutor, ExecutionOutput, JobResult, JobStore, WorkerPool, WorkerPoolConfig,
};
use std::sync::Arc;
use std::time::Duration;

/// Executor that never spawns a process.
///
/// `true` succeeds, `sleep:<ms>` succeeds after sleeping, `echo:<text>`
/// succeeds with `text` on stdout, anything else exits with status 1.
/// Every command it receives is recorded in order.
#[derive(Default)]
pub struct ScriptedExecutor {
    calls: Mutex<Vec<String>>,
}

impl ScriptedExecutor {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self, command: &str) -> usize {
        self.calls.lock().iter().filter(|c| *c == command).count()
    }
}

#[async_trait]
impl CommandExecutor for ScriptedExecutor {
    async fn execute(&self, command: &str, _timeout: Duration) -> JobResult<ExecutionOutput> {
        self.calls.lock().push(command.to_string());

        if let Some(ms) = command.strip_prefix("sleep:") {
            let ms: u64 = ms.parse().unwrap_or(0);
            tokio::time::sleep(Duration::from_millis(ms)).await;
            return Ok(ExecutionOutput::with_exit_code(0));
        }

        if let Some(text) = command.strip_prefix("echo:") {
            return Ok(ExecutionOutput {
                exit_code: Some(0),
                stdout: format!("{text}\n"),
                ..ExecutionOutput::default()
            });
        }

        let code = if command == "true" { 0 } else { 1 };
        Ok(ExecutionOutput::with_exit_code(code))
    }
}

pub fn fast_config() -> WorkerPoolConfig {
    WorkerPoolConfig {
        job_timeout: Duration::from_secs(5),
        poll_interval: Duration::from_millis(20),
    }
}

pub fn pool_with(store: Arc<JobStore>, executor: Arc<dyn CommandExecutor>) -> WorkerPool {
    WorkerPool::new(store, executor, fast_config())
}

/// Poll `condition` until it holds, panicking after five seconds.
pub async fn wait_until(what: &str, condition: impl Fn() -> bool) {
    let result = tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    assert!(result.is_ok(), "timed out waiting for {what}");
}
