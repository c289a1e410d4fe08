//! # Task records: identity plus execution status.
//!
//! A [`TaskRecord`] is created by the submission path and shared between the
//! pending queue, the registry (for named tasks), and the worker that
//! eventually executes it. Identity fields are immutable; `status` and
//! `error` are mutated as the task moves through its lifecycle:
//!
//! ```text
//! Waiting ──► Running ──► Completed | Failed
//!    └──────► Canceled                        (terminal, Waiting only)
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

/// Scheduling priority of a task.
///
/// Extraction order is `(priority desc, submission order asc)`: a `Critical`
/// task always runs before a pending `Low` one, and equal priorities run in
/// submission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TaskPriority {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
            TaskPriority::Critical => "critical",
        };
        f.write_str(s)
    }
}

/// Lifecycle status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    /// Queued, not yet picked up by a worker.
    Waiting,
    /// Being executed by a worker.
    Running,
    /// Finished and resolved its handle with a value.
    Completed,
    /// Finished with a failure (panic or timeout).
    Failed,
    /// Cancelled while still waiting; a worker will discard it unexecuted.
    Canceled,
}

impl TaskStatus {
    /// `true` for states a task can never leave.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Canceled
        )
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskStatus::Waiting => "waiting",
            TaskStatus::Running => "running",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
            TaskStatus::Canceled => "canceled",
        };
        f.write_str(s)
    }
}

/// Outcome reported by a task thunk to the executing worker.
///
/// The thunk has already resolved the submitter's handle and bumped the
/// failure counters by the time it returns; the worker only records status
/// and completion metrics.
pub(crate) enum ExecOutcome {
    Completed,
    Failed(String),
    TimedOut(Duration),
}

/// Type-erased, one-shot execution envelope.
pub(crate) type Thunk = Box<dyn FnOnce() -> ExecOutcome + Send + 'static>;

/// A task's shared record.
///
/// Shared as [`SharedRecord`]; the record mutex is only ever taken by a
/// thread that either holds the queue lock or owns the in-flight execution,
/// and always after the queue lock (never the reverse).
pub(crate) struct TaskRecord {
    /// Unique id within the pool; empty for anonymous tasks.
    pub id: String,
    /// Opaque description, used in logs only.
    pub description: String,
    pub priority: TaskPriority,
    /// Submission sequence number, assigned under the queue lock.
    pub seq: u64,
    /// Per-task deadline; `None` means no bound.
    pub timeout: Option<Duration>,
    pub status: TaskStatus,
    /// Failure message; set only when `status` is `Failed`.
    pub error: Option<String>,
    /// Execution envelope; taken exactly once by the worker.
    pub thunk: Option<Thunk>,
}

pub(crate) type SharedRecord = Arc<Mutex<TaskRecord>>;

impl TaskRecord {
    pub fn new(
        id: String,
        description: String,
        priority: TaskPriority,
        seq: u64,
        timeout: Option<Duration>,
        thunk: Thunk,
    ) -> SharedRecord {
        Arc::new(Mutex::new(Self {
            id,
            description,
            priority,
            seq,
            timeout,
            status: TaskStatus::Waiting,
            error: None,
            thunk: Some(thunk),
        }))
    }

    /// Log label: `task 'id' (description)`, or `anonymous task`.
    pub fn label(&self) -> String {
        if self.id.is_empty() && self.description.is_empty() {
            return "anonymous task".to_string();
        }
        let name = if self.id.is_empty() {
            "anonymous task".to_string()
        } else {
            format!("task '{}'", self.id)
        };
        if self.description.is_empty() {
            name
        } else {
            format!("{name} ({})", self.description)
        }
    }
}
