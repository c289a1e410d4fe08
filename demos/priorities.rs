//! Priority dispatch on a single worker: criticals overtake queued lows.
//!
//! Run with: `cargo run --example priorities`

use std::time::Duration;

use poolvisor::{LogLevel, PoolConfig, TaskPriority, WorkerPool};

fn main() {
    let mut cfg = PoolConfig::default();
    cfg.workers = 1;
    cfg.log_level = LogLevel::Debug;
    let pool = WorkerPool::with_config(cfg);

    // Keep the single worker busy so the queue builds up.
    let blocker = pool
        .submit(|| std::thread::sleep(Duration::from_millis(200)))
        .unwrap();

    let mut handles = Vec::new();
    for (priority, name) in [
        (TaskPriority::Low, "cleanup"),
        (TaskPriority::Medium, "refresh"),
        (TaskPriority::Critical, "page-oncall"),
        (TaskPriority::Low, "archive"),
        (TaskPriority::High, "rebuild-index"),
    ] {
        let handle = pool
            .submit_with_priority(priority, None, move || {
                println!("running {name} ({priority:?})");
                name
            })
            .unwrap();
        handles.push(handle);
    }

    blocker.wait().unwrap();
    for handle in handles {
        handle.wait().unwrap();
    }
}
