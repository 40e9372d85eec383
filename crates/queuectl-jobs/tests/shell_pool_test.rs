//! Worker pool running real shell commands.

#![cfg(unix)]

mod common;

use common::{fast_config, wait_until};
use queuectl_jobs::{JobState, JobStore, ShellExecutor, WorkerPool, WorkerPoolConfig};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_shell_true_and_false() {
    let store = Arc::new(JobStore::default());
    store.set_max_retries(1);
    store.submit("true");
    store.submit("false");

    let pool = WorkerPool::new(store.clone(), Arc::new(ShellExecutor::default()), fast_config());
    let handles = pool.start(1);

    wait_until("both jobs to settle", || {
        store.completed().len() + store.dead_letter().len() == 2
    })
    .await;
    pool.stop();
    WorkerPool::join_all(handles).await.unwrap();

    assert_eq!(store.completed()[0].command, "true");
    let dead = store.dead_letter();
    assert_eq!(dead[0].command, "false");
    assert_eq!(dead[0].last_error.as_deref(), Some("exit code 1"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_shell_command_with_arguments() {
    let store = Arc::new(JobStore::default());
    store.submit("test 3 -gt 2");

    let pool = WorkerPool::new(store.clone(), Arc::new(ShellExecutor::default()), fast_config());
    let handles = pool.start(1);

    wait_until("job to complete", || store.completed().len() == 1).await;
    pool.stop();
    WorkerPool::join_all(handles).await.unwrap();
    assert_eq!(store.completed()[0].state, JobState::Completed);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_shell_timeout_counts_as_failure() {
    let store = Arc::new(JobStore::default());
    store.set_max_retries(1);
    store.submit("sleep 5");

    let config = WorkerPoolConfig {
        job_timeout: Duration::from_millis(100),
        ..fast_config()
    };
    let pool = WorkerPool::new(store.clone(), Arc::new(ShellExecutor::default()), config);
    let handles = pool.start(1);

    wait_until("job to be dead-lettered", || store.dead_letter().len() == 1).await;
    pool.stop();
    WorkerPool::join_all(handles).await.unwrap();

    let dead = store.dead_letter();
    assert_eq!(dead[0].attempts, 1);
    assert!(dead[0].last_error.as_deref().unwrap().contains("timed out"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_missing_shell_dead_letters_job() {
    let store = Arc::new(JobStore::default());
    store.set_max_retries(1);
    store.submit("true");

    let executor = Arc::new(ShellExecutor::new("/nonexistent/queuectl-shell"));
    let pool = WorkerPool::new(store.clone(), executor, fast_config());
    let handles = pool.start(1);

    wait_until("job to be dead-lettered", || store.dead_letter().len() == 1).await;
    pool.stop();
    WorkerPool::join_all(handles).await.unwrap();
    assert!(store.completed().is_empty());
}
