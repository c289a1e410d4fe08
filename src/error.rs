//! # Error types used by the pool and by task executions.
//!
//! This module defines two main error enums:
//!
//! - [`PoolError`] errors raised by pool operations themselves (submission,
//!   resize).
//! - [`TaskError`] failures delivered to the submitter through the task's
//!   result handle.
//!
//! Both types provide helper methods `as_label` for logs/metrics.

use std::time::Duration;

use thiserror::Error;

/// # Errors produced by pool operations.
///
/// These fail the calling operation synchronously; the queue is untouched.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// Submission attempted after shutdown began.
    #[error("submit on stopped pool")]
    ShuttingDown,

    /// Attempted to submit a task with an id that is already registered.
    #[error("task '{id}' already exists in registry")]
    DuplicateId {
        /// The duplicate task id.
        id: String,
    },

    /// Attempted to resize a pool that is shutting down.
    #[error("resize on stopped pool")]
    ResizeOnStopped,

    /// Proposed worker ceiling is below the current worker count.
    #[error("max workers {max} below current worker count {current}")]
    MaxBelowCurrent {
        /// The proposed ceiling.
        max: usize,
        /// The current worker count.
        current: usize,
    },
}

impl PoolError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            PoolError::ShuttingDown => "pool_shutting_down",
            PoolError::DuplicateId { .. } => "pool_duplicate_id",
            PoolError::ResizeOnStopped => "pool_resize_on_stopped",
            PoolError::MaxBelowCurrent { .. } => "pool_max_below_current",
        }
    }
}

/// # Failures delivered through a task's result handle.
///
/// A handle resolves exactly once, with either the closure's value or one of
/// these.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// Task execution exceeded its timeout duration.
    ///
    /// The closure itself is *not* interrupted; only the wait on it is.
    #[error("timed out after {timeout:?}")]
    Timeout { timeout: Duration },

    /// The closure panicked during execution.
    #[error("execution failed: {reason}")]
    Fail { reason: String },

    /// The task was discarded before execution (cancelled, cleared, or
    /// dropped at shutdown).
    ///
    /// This is **not an error** in the traditional sense, but signals that
    /// the pool will never produce a value for this handle.
    #[error("task discarded before execution")]
    Canceled,
}

impl TaskError {
    /// Returns a short stable label.
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Timeout { .. } => "task_timeout",
            TaskError::Fail { .. } => "task_failed",
            TaskError::Canceled => "task_canceled",
        }
    }
}
