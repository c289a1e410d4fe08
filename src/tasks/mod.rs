//! Task-side building blocks: records, the pending queue, result handles.

mod handle;
mod queue;
mod record;

pub use handle::{TaskHandle, TaskResult};
pub use record::{TaskPriority, TaskStatus};

pub(crate) use handle::result_channel;
pub(crate) use queue::{PendingEntry, PendingQueue};
pub(crate) use record::{ExecOutcome, SharedRecord, TaskRecord, Thunk};
