//! # Lifecycle controls: pause, resume, resize, drain, clear, cancel.
//!
//! None of these touch a worker's phase directly. They mutate flags under
//! the queue lock (`paused`, the retire-set) and signal the dispatch
//! condition; workers observe the flags at their next wait/acquire boundary
//! and converge on their own.

use std::sync::atomic::Ordering;
use std::thread::JoinHandle;

use crate::error::PoolError;
use crate::pool::core::WorkerPool;
use crate::pool::worker;
use crate::tasks::TaskStatus;

impl WorkerPool {
    /// Stops task acquisition. In-flight tasks run to completion; queued
    /// tasks stay queued until [`resume`](Self::resume).
    pub fn pause(&self) {
        let mut state = self.inner.state.lock();
        state.paused = true;
        drop(state);
        self.inner.logger.info("worker pool paused");
    }

    /// Resumes task acquisition and wakes every worker.
    pub fn resume(&self) {
        {
            let mut state = self.inner.state.lock();
            state.paused = false;
        }
        self.inner.logger.info("worker pool resumed");
        self.inner.dispatch.notify_all();
    }

    /// Changes the worker count, clamped to `[0, max_workers]`.
    ///
    /// Growing spawns fresh workers on the next slot ids. Shrinking marks
    /// the tail slots for retirement, wakes the workers, and joins them; a
    /// retiring worker first finishes the task it is executing.
    pub fn resize(&self, n: usize) -> Result<(), PoolError> {
        let mut slots = self.workers.lock();
        let mut state = self.inner.state.lock();

        if self.inner.stop.load(Ordering::SeqCst) {
            self.inner.logger.error("resize on stopped pool");
            return Err(PoolError::ResizeOnStopped);
        }

        let target = n.min(state.max_workers);
        let current = slots.len();
        self.inner.logger.info(&format!(
            "resizing worker pool: {current} -> {target} (max: {})",
            state.max_workers
        ));

        if target > current {
            drop(state);
            for id in current..target {
                slots.push(worker::spawn(&self.inner, id));
            }
        } else if target < current {
            state.retiring.clear();
            state.retiring.extend(target..current);
            drop(state);
            self.inner.dispatch.notify_all();

            let retired: Vec<JoinHandle<()>> = slots.drain(target..).collect();
            for handle in retired {
                let _ = handle.join();
            }
        }

        Ok(())
    }

    /// Raises the worker ceiling. Fails if `max` is below the current
    /// worker count; the ceiling is never lowered implicitly.
    pub fn set_max_workers(&self, max: usize) -> Result<(), PoolError> {
        let slots = self.workers.lock();
        let mut state = self.inner.state.lock();

        let current = slots.len();
        if max < current {
            return Err(PoolError::MaxBelowCurrent { max, current });
        }
        state.max_workers = max;
        self.inner.logger.info(&format!("max workers set to {max}"));
        Ok(())
    }

    /// Blocks until the queue is empty and no worker is executing, or the
    /// pool starts shutting down.
    pub fn wait_for_idle(&self) {
        let mut state = self.inner.state.lock();
        self.inner.drain.wait_while(&mut state, |s| {
            !self.inner.stop.load(Ordering::SeqCst)
                && !(s.pending.is_empty() && self.inner.metrics.active_workers() == 0)
        });
    }

    /// Discards every queued task and empties the registry. In-flight tasks
    /// are unaffected.
    ///
    /// Handles of discarded tasks resolve with
    /// [`TaskError::Canceled`](crate::TaskError::Canceled).
    pub fn clear(&self) {
        let cleared = {
            let mut state = self.inner.state.lock();
            let n = state.pending.len();
            state.pending.clear();
            state.registry.clear();
            self.inner.drain.notify_all();
            n
        };
        self.inner
            .logger
            .info(&format!("cleared task queue: {cleared} tasks removed"));
    }

    /// Cancels the named task iff it is still waiting.
    ///
    /// Returns `false` (with an error log) for unknown ids and for tasks
    /// that are running or already terminal. A cancelled record stays
    /// registered until a worker drains it, after which the id is reusable.
    pub fn cancel(&self, id: &str) -> bool {
        let state = self.inner.state.lock();

        let Some(record) = state.registry.get(id) else {
            self.inner
                .logger
                .error(&format!("cannot cancel unknown task '{id}'"));
            return false;
        };

        let mut rec = record.lock();
        match rec.status {
            TaskStatus::Waiting => {
                rec.status = TaskStatus::Canceled;
                drop(rec);
                self.inner.logger.info(&format!("canceled task '{id}'"));
                true
            }
            TaskStatus::Running => {
                self.inner
                    .logger
                    .error(&format!("cannot cancel running task '{id}'"));
                false
            }
            status => {
                self.inner
                    .logger
                    .error(&format!("task '{id}' already terminal: {status}"));
                false
            }
        }
    }

    /// Current status of the named task, or `None` if the id is unknown
    /// (never submitted, or already reaped).
    pub fn status(&self, id: &str) -> Option<TaskStatus> {
        let state = self.inner.state.lock();
        state.registry.get(id).map(|record| record.lock().status)
    }

    /// Human-readable status of the named task; `"not found"` for unknown
    /// ids.
    pub fn status_string(&self, id: &str) -> String {
        match self.status(id) {
            Some(status) => status.to_string(),
            None => "not found".to_string(),
        }
    }
}
