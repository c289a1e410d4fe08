//! Minimal usage: submit closures, await their handles, print the metrics.
//!
//! Run with: `cargo run --example basic`

use std::time::Duration;

use poolvisor::{LogLevel, PoolConfig, WorkerPool};

fn main() {
    let mut cfg = PoolConfig::default();
    cfg.workers = 4;
    cfg.log_level = LogLevel::Info;
    let pool = WorkerPool::with_config(cfg);

    let handles: Vec<_> = (0..8)
        .map(|n| {
            pool.submit(move || {
                std::thread::sleep(Duration::from_millis(25 * (n % 4)));
                n * n
            })
            .unwrap()
        })
        .collect();

    for (n, handle) in handles.into_iter().enumerate() {
        println!("task {n} -> {}", handle.wait().unwrap());
    }

    pool.wait_for_idle();
    print!("{}", pool.metrics_report());
}
