//! # Run a single task with optional timeout supervision.
//!
//! The submission path erases the user closure behind a uniform thunk built
//! here. The thunk owns the one-shot result sender and is responsible for
//! resolving it exactly once, whatever happens:
//!
//! ```text
//!   ┌──────────────┐
//!   │ user closure │
//!   └──────┬───────┘
//!     make_thunk()
//!          ▼
//!   deadline? ──no──► run on the worker thread
//!       │
//!      yes ─────────► run on an auxiliary thread, wait up to the deadline
//!          ▼
//!   handle resolved (value | Fail | Timeout), counters bumped
//! ```
//!
//! - Panics inside the closure are caught and delivered as
//!   [`TaskError::Fail`] with the panic payload as the reason.
//! - On deadline the handle resolves with [`TaskError::Timeout`] and the
//!   auxiliary thread is detached: the closure keeps running, its eventual
//!   result is ignored.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::RecvTimeoutError;

use crate::error::TaskError;
use crate::logger::Logger;
use crate::metrics::PoolMetrics;
use crate::tasks::{result_channel, ExecOutcome, TaskHandle, Thunk};

/// Builds the execution envelope for one submission.
///
/// Returns the type-erased thunk for the queue and the typed handle for the
/// submitter. The thunk captures only the metrics and logger handles, never
/// the pool itself, so queued tasks cannot keep the pool alive.
pub(crate) fn make_thunk<F, R>(
    f: F,
    timeout: Option<Duration>,
    metrics: Arc<PoolMetrics>,
    logger: Arc<Logger>,
    label: String,
) -> (Thunk, TaskHandle<R>)
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    let (tx, handle) = result_channel::<R>();

    let thunk: Thunk = match timeout {
        None => Box::new(move || match panic::catch_unwind(AssertUnwindSafe(f)) {
            Ok(value) => {
                let _ = tx.send(Ok(value));
                ExecOutcome::Completed
            }
            Err(payload) => {
                let reason = panic_reason(payload);
                metrics.task_failed();
                logger.error(&format!("{label} failed: {reason}"));
                let _ = tx.send(Err(TaskError::Fail {
                    reason: reason.clone(),
                }));
                ExecOutcome::Failed(reason)
            }
        }),
        Some(deadline) => Box::new(move || {
            let (done_tx, done_rx) = crossbeam_channel::bounded(1);
            let spawned = thread::Builder::new()
                .name("poolvisor-task".to_string())
                .spawn(move || {
                    let _ = done_tx.send(panic::catch_unwind(AssertUnwindSafe(f)));
                });

            if let Err(e) = spawned {
                let reason = format!("failed to spawn supervised task thread: {e}");
                metrics.task_failed();
                logger.error(&format!("{label} failed: {reason}"));
                let _ = tx.send(Err(TaskError::Fail {
                    reason: reason.clone(),
                }));
                return ExecOutcome::Failed(reason);
            }

            match done_rx.recv_timeout(deadline) {
                Ok(Ok(value)) => {
                    let _ = tx.send(Ok(value));
                    ExecOutcome::Completed
                }
                Ok(Err(payload)) => {
                    let reason = panic_reason(payload);
                    metrics.task_failed();
                    logger.error(&format!("{label} failed: {reason}"));
                    let _ = tx.send(Err(TaskError::Fail {
                        reason: reason.clone(),
                    }));
                    ExecOutcome::Failed(reason)
                }
                Err(RecvTimeoutError::Timeout) => {
                    // The auxiliary thread keeps running; only the wait ends.
                    metrics.task_timed_out();
                    logger.error(&format!("{label} timed out after {deadline:?}"));
                    let _ = tx.send(Err(TaskError::Timeout { timeout: deadline }));
                    ExecOutcome::TimedOut(deadline)
                }
                Err(RecvTimeoutError::Disconnected) => {
                    let reason = "supervised task thread terminated unexpectedly".to_string();
                    metrics.task_failed();
                    logger.error(&format!("{label} failed: {reason}"));
                    let _ = tx.send(Err(TaskError::Fail {
                        reason: reason.clone(),
                    }));
                    ExecOutcome::Failed(reason)
                }
            }
        }),
    };

    (thunk, handle)
}

/// Extracts a readable message from a panic payload.
fn panic_reason(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::LogLevel;

    fn quiet() -> (Arc<PoolMetrics>, Arc<Logger>) {
        (
            Arc::new(PoolMetrics::new()),
            Arc::new(Logger::new(LogLevel::None, false, None)),
        )
    }

    #[test]
    fn inline_success_resolves_handle() {
        let (metrics, logger) = quiet();
        let (thunk, handle) = make_thunk(|| 41 + 1, None, metrics, logger, "t".into());
        assert!(matches!(thunk(), ExecOutcome::Completed));
        assert_eq!(handle.wait().unwrap(), 42);
    }

    #[test]
    fn inline_panic_becomes_fail() {
        let (metrics, logger) = quiet();
        let (thunk, handle) = make_thunk(
            || -> u32 { panic!("boom") },
            None,
            Arc::clone(&metrics),
            logger,
            "t".into(),
        );
        assert!(matches!(thunk(), ExecOutcome::Failed(_)));
        assert_eq!(
            handle.wait(),
            Err(TaskError::Fail {
                reason: "boom".into()
            })
        );
        assert_eq!(metrics.failed(), 1);
    }

    #[test]
    fn deadline_exceeded_becomes_timeout() {
        let (metrics, logger) = quiet();
        let deadline = Duration::from_millis(20);
        let (thunk, handle) = make_thunk(
            || thread::sleep(Duration::from_millis(300)),
            Some(deadline),
            Arc::clone(&metrics),
            logger,
            "t".into(),
        );
        assert!(matches!(thunk(), ExecOutcome::TimedOut(_)));
        assert_eq!(handle.wait(), Err(TaskError::Timeout { timeout: deadline }));
        assert_eq!(metrics.timed_out(), 1);
        assert_eq!(metrics.failed(), 0);
    }

    #[test]
    fn timely_supervised_run_completes() {
        let (metrics, logger) = quiet();
        let (thunk, handle) = make_thunk(
            || "fast",
            Some(Duration::from_secs(5)),
            metrics,
            logger,
            "t".into(),
        );
        assert!(matches!(thunk(), ExecOutcome::Completed));
        assert_eq!(handle.wait().unwrap(), "fast");
    }
}
