//! Integration tests for the worker pool draining a job store.

mod common;

use common::{pool_with, wait_until, ScriptedExecutor};
use queuectl_jobs::classifier::from_config;
use queuectl_jobs::{ClassifierConfig, JobState, JobStore, WorkerPool};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_one_worker_drains_success_and_failure() {
    let store = Arc::new(JobStore::default());
    store.set_max_retries(1);
    let ok = store.submit("true");
    let bad = store.submit("false");

    let pool = pool_with(store.clone(), ScriptedExecutor::new());
    let handles = pool.start(1);

    wait_until("both jobs to settle", || {
        store.completed().len() + store.dead_letter().len() == 2
    })
    .await;

    pool.stop();
    WorkerPool::join_all(handles).await.unwrap();

    let completed = store.completed();
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0].id, ok.id);

    let dead = store.dead_letter();
    assert_eq!(dead.len(), 1);
    assert_eq!(dead[0].id, bad.id);
    assert_eq!(dead[0].attempts, 1);
    assert_eq!(dead[0].state, JobState::Dead);

    assert!(store.queued().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_failing_job_runs_exactly_max_retries_times() {
    let store = Arc::new(JobStore::default());
    store.set_max_retries(2);
    let job = store.submit("false");

    let executor = ScriptedExecutor::new();
    let pool = pool_with(store.clone(), executor.clone());
    let handles = pool.start(1);

    wait_until("job to be dead-lettered", || !store.dead_letter().is_empty()).await;

    // Give the worker a chance to misbehave before checking call counts.
    tokio::time::sleep(Duration::from_millis(100)).await;
    pool.stop();
    WorkerPool::join_all(handles).await.unwrap();

    assert_eq!(executor.call_count("false"), 2);
    let dead = store.dead_letter();
    assert_eq!(dead[0].id, job.id);
    assert_eq!(dead[0].attempts, 2);
    assert!(store.queued().is_empty());
    assert_eq!(pool.stats().jobs_dead_lettered, 1);
    assert_eq!(pool.stats().jobs_failed, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_succeeding_job_runs_once() {
    let store = Arc::new(JobStore::default());
    let job = store.submit("true");

    let executor = ScriptedExecutor::new();
    let pool = pool_with(store.clone(), executor.clone());
    let handles = pool.start(2);

    wait_until("job to complete", || !store.completed().is_empty()).await;
    pool.stop();
    WorkerPool::join_all(handles).await.unwrap();

    assert_eq!(executor.call_count("true"), 1);
    let completed = store.completed();
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0].id, job.id);
    assert_eq!(completed[0].state, JobState::Completed);
    assert!(store.queued().is_empty());
    assert!(store.dead_letter().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_single_worker_processes_in_fifo_order() {
    let store = Arc::new(JobStore::default());
    for i in 0..5 {
        store.submit(format!("echo:{i}"));
    }

    let executor = ScriptedExecutor::new();
    let pool = pool_with(store.clone(), executor.clone());
    let handles = pool.start(1);

    wait_until("all jobs to complete", || store.completed().len() == 5).await;
    pool.stop();
    WorkerPool::join_all(handles).await.unwrap();

    let expected: Vec<String> = (0..5).map(|i| format!("echo:{i}")).collect();
    assert_eq!(executor.calls(), expected);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_stop_terminates_all_workers() {
    let store = Arc::new(JobStore::default());
    let pool = pool_with(store, ScriptedExecutor::new());
    let handles = pool.start(3);
    assert_eq!(handles.len(), 3);

    wait_until("workers to start", || pool.stats().active_workers == 3).await;
    pool.stop();

    tokio::time::timeout(Duration::from_secs(5), WorkerPool::join_all(handles))
        .await
        .expect("workers should exit after stop")
        .unwrap();
    assert_eq!(pool.stats().active_workers, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_stop_lets_running_command_finish() {
    let store = Arc::new(JobStore::default());
    let job = store.submit("sleep:300");

    let pool = pool_with(store.clone(), ScriptedExecutor::new());
    let handles = pool.start(1);

    wait_until("job to be in flight", || {
        !store.list_by_state(JobState::Processing).is_empty()
    })
    .await;
    pool.stop();
    WorkerPool::join_all(handles).await.unwrap();

    let completed = store.completed();
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0].id, job.id);
    assert!(store.list_by_state(JobState::Processing).is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_stopped_pool_leaves_new_jobs_queued() {
    let store = Arc::new(JobStore::default());
    let pool = pool_with(store.clone(), ScriptedExecutor::new());
    let handles = pool.start(2);
    pool.stop();
    WorkerPool::join_all(handles).await.unwrap();

    store.submit("true");
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(store.list_by_state(JobState::Pending).len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_many_workers_process_every_job_once() {
    let store = Arc::new(JobStore::default());
    for _ in 0..50 {
        store.submit("true");
    }

    let executor = ScriptedExecutor::new();
    let pool = pool_with(store.clone(), executor.clone());
    let handles = pool.start(8);

    wait_until("all jobs to complete", || store.completed().len() == 50).await;
    pool.stop();
    WorkerPool::join_all(handles).await.unwrap();

    assert_eq!(executor.calls().len(), 50);
    let mut ids: Vec<_> = store.completed().iter().map(|j| j.id).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 50);
    assert_eq!(pool.stats().jobs_completed, 50);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_dead_letter_retry_runs_job_again() {
    let store = Arc::new(JobStore::default());
    store.set_max_retries(1);
    let job = store.submit("false");

    let executor = ScriptedExecutor::new();
    let pool = pool_with(store.clone(), executor.clone());
    let handles = pool.start(1);

    wait_until("first dead-lettering", || store.dead_letter().len() == 1).await;
    store.retry_dead_letter(job.id).unwrap();
    wait_until("second execution", || executor.call_count("false") == 2).await;
    wait_until("second dead-lettering", || store.dead_letter().len() == 1).await;

    pool.stop();
    WorkerPool::join_all(handles).await.unwrap();
    assert_eq!(store.dead_letter()[0].attempts, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_keyword_classifier_fails_matching_output() {
    let store = Arc::new(JobStore::default());
    store.set_max_retries(1);
    store.submit("echo:Error: file not exists");
    store.submit("echo:all fine");

    let classifier = from_config(&ClassifierConfig {
        failure_keywords: vec!["failed".into(), "error".into(), "not exists".into()],
    });
    let pool = pool_with(store.clone(), ScriptedExecutor::new()).with_classifier(classifier);
    let handles = pool.start(1);

    wait_until("both jobs to settle", || {
        store.completed().len() + store.dead_letter().len() == 2
    })
    .await;
    pool.stop();
    WorkerPool::join_all(handles).await.unwrap();

    assert_eq!(store.completed()[0].command, "echo:all fine");
    let dead = store.dead_letter();
    assert!(dead[0].last_error.as_deref().unwrap().contains("error"));
}
