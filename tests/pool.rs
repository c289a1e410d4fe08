//! Dispatch and supervision behaviour of the pool end to end.

use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use poolvisor::{LogLevel, PoolConfig, PoolError, TaskError, TaskPriority, TaskStatus, WorkerPool};

fn quiet_pool(workers: usize) -> WorkerPool {
    let mut cfg = PoolConfig::default();
    cfg.workers = workers;
    cfg.log_level = LogLevel::None;
    cfg.console_log = false;
    WorkerPool::with_config(cfg)
}

/// Submits a task that parks until released, and returns once it is running.
fn occupy_worker(pool: &WorkerPool) -> (mpsc::Sender<()>, poolvisor::TaskHandle<()>) {
    let (started_tx, started_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    let handle = pool
        .submit(move || {
            started_tx.send(()).unwrap();
            release_rx.recv().unwrap();
        })
        .unwrap();
    started_rx.recv().unwrap();
    (release_tx, handle)
}

#[test]
fn completes_in_fifo_order_within_priority() {
    let pool = quiet_pool(1);
    let order = Arc::new(Mutex::new(Vec::new()));

    let handles: Vec<_> = (1..=3)
        .map(|n| {
            let order = Arc::clone(&order);
            pool.submit(move || {
                if n == 1 {
                    thread::sleep(Duration::from_millis(50));
                }
                order.lock().unwrap().push(n);
            })
            .unwrap()
        })
        .collect();

    for h in handles {
        h.wait().unwrap();
    }
    assert_eq!(*order.lock().unwrap(), vec![1, 2, 3]);
}

#[test]
fn critical_jumps_the_queue() {
    let pool = quiet_pool(1);
    let order = Arc::new(Mutex::new(Vec::new()));

    let (started_tx, started_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    let o = Arc::clone(&order);
    let medium = pool
        .submit(move || {
            started_tx.send(()).unwrap();
            release_rx.recv().unwrap();
            o.lock().unwrap().push("medium");
        })
        .unwrap();
    started_rx.recv().unwrap();

    let o = Arc::clone(&order);
    let low = pool
        .submit_with_priority(TaskPriority::Low, None, move || {
            o.lock().unwrap().push("low");
        })
        .unwrap();
    let o = Arc::clone(&order);
    let critical = pool
        .submit_with_priority(TaskPriority::Critical, None, move || {
            o.lock().unwrap().push("critical");
        })
        .unwrap();

    release_tx.send(()).unwrap();
    medium.wait().unwrap();
    critical.wait().unwrap();
    low.wait().unwrap();

    assert_eq!(*order.lock().unwrap(), vec!["medium", "critical", "low"]);
}

#[test]
fn deadline_resolves_handle_with_timeout() {
    let pool = quiet_pool(1);
    let deadline = Duration::from_millis(60);

    let handle = pool
        .submit_with_priority(TaskPriority::Medium, Some(deadline), || {
            thread::sleep(Duration::from_millis(400));
        })
        .unwrap();

    assert_eq!(handle.wait(), Err(TaskError::Timeout { timeout: deadline }));
    assert_eq!(pool.timed_out_count(), 1);
    assert_eq!(pool.failed_count(), 0);
    assert_eq!(pool.completed_count(), 0);
}

#[test]
fn timely_supervised_task_completes() {
    let pool = quiet_pool(1);
    let handle = pool
        .submit_with_priority(TaskPriority::High, Some(Duration::from_secs(5)), || 11)
        .unwrap();
    assert_eq!(handle.wait().unwrap(), 11);
    assert_eq!(pool.timed_out_count(), 0);
}

#[test]
fn zero_timeout_means_no_bound() {
    let pool = quiet_pool(1);
    let handle = pool
        .submit_with_priority(TaskPriority::Medium, Some(Duration::ZERO), || {
            thread::sleep(Duration::from_millis(30));
            "unbounded"
        })
        .unwrap();
    assert_eq!(handle.wait().unwrap(), "unbounded");
}

#[test]
fn panic_is_delivered_through_handle() {
    let pool = quiet_pool(1);

    let handle = pool.submit(|| -> u32 { panic!("kaboom") }).unwrap();
    assert_eq!(
        handle.wait(),
        Err(TaskError::Fail {
            reason: "kaboom".into()
        })
    );
    assert_eq!(pool.failed_count(), 1);

    // The worker survives the panic.
    let next = pool.submit(|| 1).unwrap();
    assert_eq!(next.wait().unwrap(), 1);
}

#[test]
fn batch_submission_returns_ordered_handles() {
    let pool = quiet_pool(2);
    let closures: Vec<fn() -> usize> = vec![|| 10, || 20, || 30, || 40];

    let handles = pool
        .submit_batch(closures, TaskPriority::Medium, None)
        .unwrap();
    let values: Vec<usize> = handles.into_iter().map(|h| h.wait().unwrap()).collect();
    assert_eq!(values, vec![10, 20, 30, 40]);
}

#[test]
fn batch_with_prefix_assigns_sequential_ids() {
    let pool = quiet_pool(1);
    let (release, blocker) = occupy_worker(&pool);

    let closures: Vec<fn() -> i32> = vec![|| 1, || 2, || 3];
    let handles = pool
        .submit_batch_with_prefix("job", "batch", closures, TaskPriority::Medium, None)
        .unwrap();

    assert_eq!(pool.status("job-0"), Some(TaskStatus::Waiting));
    assert_eq!(pool.status_string("job-2"), "waiting");

    // The prefix is taken while the batch is pending.
    let dup: Result<Vec<poolvisor::TaskHandle<i32>>, _> = pool.submit_batch_with_prefix(
        "job",
        "batch",
        vec![(|| 0) as fn() -> i32],
        TaskPriority::Medium,
        None,
    );
    assert!(matches!(dup, Err(PoolError::DuplicateId { .. })));

    release.send(()).unwrap();
    blocker.wait().unwrap();
    let values: Vec<i32> = handles.into_iter().map(|h| h.wait().unwrap()).collect();
    assert_eq!(values, vec![1, 2, 3]);
}

#[test]
fn duplicate_id_is_rejected() {
    let pool = quiet_pool(1);
    let (release, blocker) = occupy_worker(&pool);

    let first = pool
        .submit_with_info("etl", "first", TaskPriority::Medium, None, || 1)
        .unwrap();
    let second = pool.submit_with_info("etl", "second", TaskPriority::Medium, None, || 2);
    assert_eq!(second.unwrap_err(), PoolError::DuplicateId { id: "etl".into() });

    release.send(()).unwrap();
    blocker.wait().unwrap();
    assert_eq!(first.wait().unwrap(), 1);
}

#[test]
fn submission_fails_after_shutdown() {
    let pool = quiet_pool(1);
    pool.shutdown();

    assert!(pool.is_stopping());
    let res = pool.submit(|| 1);
    assert_eq!(res.unwrap_err(), PoolError::ShuttingDown);
}

#[test]
fn counters_stay_consistent_under_mixed_outcomes() {
    let pool = quiet_pool(2);

    let ok: Vec<_> = (0..4).map(|_| pool.submit(|| ()).unwrap()).collect();
    let bad = pool.submit(|| -> () { panic!("nope") }).unwrap();
    let slow = pool
        .submit_with_priority(TaskPriority::Low, Some(Duration::from_millis(40)), || {
            thread::sleep(Duration::from_millis(300));
        })
        .unwrap();

    for h in ok {
        h.wait().unwrap();
    }
    assert!(bad.wait().is_err());
    assert!(slow.wait().is_err());
    pool.wait_for_idle();

    assert_eq!(pool.completed_count(), 4);
    assert_eq!(pool.failed_count(), 1);
    assert_eq!(pool.timed_out_count(), 1);
    assert!(pool.completed_count() + pool.failed_count() <= 6);

    let report = pool.metrics_report();
    assert!(report.contains("submitted: 6"));
    assert!(report.contains("completed: 4"));
    assert!(report.contains("failed: 1"));
    assert!(report.contains("timed out: 1"));
}
