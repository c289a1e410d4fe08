//! Lifecycle controls: pause/resume, elastic resize, cancellation.
//!
//! Run with: `cargo run --example control`

use std::time::Duration;

use poolvisor::{LogLevel, PoolConfig, TaskPriority, WorkerPool};

fn main() {
    let mut cfg = PoolConfig::default();
    cfg.workers = 2;
    cfg.log_level = LogLevel::Info;
    let pool = WorkerPool::with_config(cfg);

    let handles: Vec<_> = (0..6)
        .map(|n| {
            pool.submit(move || {
                std::thread::sleep(Duration::from_millis(80));
                n
            })
            .unwrap()
        })
        .collect();

    pool.pause();
    println!(
        "paused: {} queued, {} active",
        pool.queue_depth(),
        pool.active_worker_count()
    );

    pool.set_max_workers(8).unwrap();
    pool.resize(4).unwrap();
    println!("resized to {} workers", pool.worker_count());

    // A named task we change our mind about while the pool is paused.
    let doomed = pool
        .submit_with_info("doomed", "never runs", TaskPriority::Low, None, || 0)
        .unwrap();
    println!("cancel('doomed') -> {}", pool.cancel("doomed"));
    println!("status('doomed') -> {}", pool.status_string("doomed"));

    pool.resume();
    for handle in handles {
        handle.wait().unwrap();
    }
    println!("doomed handle -> {:?}", doomed.wait());

    pool.wait_for_idle();
    print!("{}", pool.metrics_report());
}
