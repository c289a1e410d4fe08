//! # poolvisor
//!
//! **Poolvisor** is a priority-scheduled worker pool.
//!
//! A fixed-to-elastic set of OS worker threads pulls user closures from a
//! shared priority queue, executes them under per-task timeout supervision,
//! and delivers each outcome through a one-shot result handle. The pool is
//! designed as a building block for batch runners and request-side
//! offloading.
//!
//! ## Features
//!
//! | Area          | Description                                                        | Key types / traits            |
//! |---------------|--------------------------------------------------------------------|-------------------------------|
//! | **Dispatch**  | Strict priority order with FIFO tie-breaking.                      | [`TaskPriority`]              |
//! | **Results**   | One-shot, awaitable handles resolved exactly once.                 | [`TaskHandle`], [`TaskError`] |
//! | **Supervision** | Per-task timeouts without interrupting the closure.              | [`TaskError::Timeout`]        |
//! | **Lifecycle** | Pause, resume, elastic resize, drain, cancel, shutdown.            | [`WorkerPool`]                |
//! | **Observability** | Level-filtered logging and atomic runtime metrics.             | [`LogLevel`], [`PoolConfig`]  |
//! | **Errors**    | Typed errors for pool operations and task failures.                | [`PoolError`], [`TaskError`]  |
//!
//! ```
//! use std::time::Duration;
//! use poolvisor::{LogLevel, PoolConfig, TaskPriority, WorkerPool};
//!
//! let mut cfg = PoolConfig::default();
//! cfg.workers = 2;
//! cfg.log_level = LogLevel::None;
//! let pool = WorkerPool::with_config(cfg);
//!
//! // Plain submission: medium priority, no timeout.
//! let sum = pool.submit(|| (1..=10).sum::<u32>()).unwrap();
//! assert_eq!(sum.wait().unwrap(), 55);
//!
//! // Named, critical, with a deadline.
//! let report = pool
//!     .submit_with_info(
//!         "report",
//!         "daily rollup",
//!         TaskPriority::Critical,
//!         Some(Duration::from_secs(5)),
//!         || "rolled up",
//!     )
//!     .unwrap();
//! assert_eq!(report.wait().unwrap(), "rolled up");
//!
//! pool.wait_for_idle();
//! ```
//!
//! ---

mod config;
mod error;
mod logger;
mod metrics;
mod pool;
mod tasks;

// ---- Public re-exports ----

pub use config::PoolConfig;
pub use error::{PoolError, TaskError};
pub use logger::{LogLevel, Logger};
pub use pool::WorkerPool;
pub use tasks::{TaskHandle, TaskPriority, TaskResult, TaskStatus};
