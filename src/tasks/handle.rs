//! # One-shot result handles.
//!
//! Every submission returns a [`TaskHandle`]: an awaitable receiver that is
//! resolved exactly once with either the closure's value or a [`TaskError`].
//!
//! If the pool discards the task before execution (cancellation, `clear`,
//! shutdown), the unsent sender is dropped and the handle resolves with
//! [`TaskError::Canceled`] instead of blocking forever.
//!
//! ## Example
//! ```
//! use poolvisor::{LogLevel, PoolConfig, WorkerPool};
//!
//! let mut cfg = PoolConfig::default();
//! cfg.workers = 2;
//! cfg.log_level = LogLevel::None;
//! let pool = WorkerPool::with_config(cfg);
//!
//! let handle = pool.submit(|| 6 * 7).unwrap();
//! assert_eq!(handle.wait().unwrap(), 42);
//! ```

use std::fmt;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};

use crate::error::TaskError;

/// Result delivered through a task handle.
pub type TaskResult<R> = Result<R, TaskError>;

/// Creates the one-shot channel backing a handle.
pub(crate) fn result_channel<R>() -> (Sender<TaskResult<R>>, TaskHandle<R>) {
    let (tx, rx) = crossbeam_channel::bounded(1);
    (tx, TaskHandle { rx })
}

/// Awaitable receiver for a single task's outcome.
pub struct TaskHandle<R> {
    rx: Receiver<TaskResult<R>>,
}

impl<R> fmt::Debug for TaskHandle<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskHandle").finish_non_exhaustive()
    }
}

impl<R> TaskHandle<R> {
    /// Blocks until the task resolves and returns its outcome.
    ///
    /// Consumes the handle: a task outcome can be observed at most once.
    pub fn wait(self) -> TaskResult<R> {
        self.rx.recv().unwrap_or(Err(TaskError::Canceled))
    }

    /// Returns the outcome if the task has already resolved.
    pub fn try_wait(&self) -> Option<TaskResult<R>> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(TaskError::Canceled)),
        }
    }

    /// Blocks up to `timeout` for the outcome.
    ///
    /// `None` means the task has not resolved yet; the handle stays usable.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<TaskResult<R>> {
        match self.rx.recv_timeout(timeout) {
            Ok(result) => Some(result),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => Some(Err(TaskError::Canceled)),
        }
    }
}
