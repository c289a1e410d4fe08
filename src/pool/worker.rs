//! # The dispatcher: per-worker wait / acquire / execute loop.
//!
//! Each worker has a stable slot id assigned at spawn (`0..n`; slots are
//! reused after a resize). The loop blocks on the dispatch condition until
//! the pool stops, the worker is retired, or a task is runnable; then it
//! drains cancelled records from the queue top, takes the first live one,
//! marks it `Running` under the lock, and executes outside it.
//!
//! Workers drive their own exits; the lifecycle controller only sets flags
//! that the acquire phase observes.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use crate::error::TaskError;
use crate::pool::core::Inner;
use crate::tasks::{ExecOutcome, SharedRecord, TaskStatus, Thunk};

/// Spawns one worker thread on the given slot id.
pub(crate) fn spawn(inner: &Arc<Inner>, id: usize) -> thread::JoinHandle<()> {
    let shared = Arc::clone(inner);
    thread::Builder::new()
        .name(format!("poolvisor-worker-{id}"))
        .spawn(move || worker_loop(shared, id))
        .expect("failed to spawn worker thread")
}

enum Fetch {
    /// Stop or retirement observed; leave the loop.
    Exit,
    /// Woken but nothing runnable (all drained or paused mid-acquire).
    Idle,
    /// A live record, already transitioned to `Running`.
    Run(SharedRecord, Thunk),
}

fn worker_loop(inner: Arc<Inner>, id: usize) {
    inner.logger.debug(&format!("worker {id} started"));

    loop {
        match next_task(&inner, id) {
            Fetch::Exit => return,
            Fetch::Idle => continue,
            Fetch::Run(record, thunk) => execute(&inner, id, record, thunk),
        }
    }
}

/// Wait and acquire phases, both under the queue lock.
fn next_task(inner: &Inner, id: usize) -> Fetch {
    let mut state = inner.state.lock();

    inner.dispatch.wait_while(&mut state, |s| {
        !inner.stop.load(Ordering::SeqCst)
            && !s.retiring.contains(&id)
            && (s.paused || s.pending.is_empty())
    });

    // Stop outranks retirement outranks work.
    if inner.stop.load(Ordering::SeqCst) {
        inner
            .logger
            .debug(&format!("worker {id} exiting (pool shutting down)"));
        return Fetch::Exit;
    }
    if state.retiring.remove(&id) {
        // A submit wakeup may have landed here; hand it to a survivor.
        if !state.pending.is_empty() && !state.paused {
            inner.dispatch.notify_one();
        }
        inner
            .logger
            .debug(&format!("worker {id} exiting (pool resized)"));
        return Fetch::Exit;
    }

    while !state.paused {
        let Some(entry) = state.pending.pop_top() else {
            break;
        };
        let record = entry.record;
        let mut rec = record.lock();

        if rec.status == TaskStatus::Canceled {
            inner
                .logger
                .debug(&format!("skipping canceled {}", rec.label()));
            let reaped = rec.id.clone();
            drop(rec);
            // Reaping frees the id for resubmission. Draining a cancelled
            // record can empty the queue without any completion, so
            // idle-waiters get a nudge too.
            state.registry.remove(&reaped);
            inner.drain.notify_all();
            continue;
        }

        rec.status = TaskStatus::Running;
        let thunk = rec.thunk.take();
        let label = rec.label();
        let deadline = rec.timeout;
        let reaped = rec.id.clone();
        drop(rec);

        match thunk {
            Some(thunk) => {
                // Raised while the lock is still held: idle-waiters must
                // never observe an empty queue with this task unaccounted.
                inner.metrics.worker_started();
                match deadline {
                    Some(d) => inner
                        .logger
                        .debug(&format!("worker {id} picked up {label} (timeout {d:?})")),
                    None => inner.logger.debug(&format!("worker {id} picked up {label}")),
                }
                return Fetch::Run(record, thunk);
            }
            None => {
                // Unexpected at extraction; discard the record.
                inner
                    .logger
                    .error(&format!("{label} has no executable thunk; discarding"));
                state.registry.remove(&reaped);
            }
        }
    }

    Fetch::Idle
}

/// Execute phase, outside the queue lock.
fn execute(inner: &Inner, id: usize, record: SharedRecord, thunk: Thunk) {
    let start = Instant::now();
    let outcome = thunk();
    let elapsed = start.elapsed();

    let (status, label, error) = {
        let mut rec = record.lock();
        match outcome {
            ExecOutcome::Completed => {
                rec.status = TaskStatus::Completed;
                inner.metrics.task_completed();
            }
            ExecOutcome::Failed(reason) => {
                rec.status = TaskStatus::Failed;
                rec.error = Some(reason);
            }
            ExecOutcome::TimedOut(timeout) => {
                rec.status = TaskStatus::Failed;
                rec.error = Some(TaskError::Timeout { timeout }.to_string());
            }
        }
        (rec.status, rec.label(), rec.error.clone())
    };

    inner.metrics.add_task_time(elapsed);
    inner.metrics.worker_finished();

    {
        let mut state = inner.state.lock();
        let rec = record.lock();
        if !rec.id.is_empty() {
            state.registry.remove(&rec.id);
        }
        drop(rec);
        inner.drain.notify_all();
    }

    let elapsed_ms = elapsed.as_secs_f64() * 1_000.0;
    match error {
        Some(err) => inner.logger.debug(&format!(
            "worker {id} finished {label}: {status} ({elapsed_ms:.3}ms) [{err}]"
        )),
        None => inner.logger.debug(&format!(
            "worker {id} finished {label}: {status} ({elapsed_ms:.3}ms)"
        )),
    }
}
