//! # Pool core: shared state, construction, submission, shutdown.
//!
//! All pool-wide mutable state lives behind a single mutex ([`PoolState`]):
//! the pending queue, the id registry, the retire-set, the paused flag, the
//! submission sequence, and the worker ceiling. Two condition variables hang
//! off it: `dispatch` wakes workers (submit, resume, resize-down, shutdown)
//! and `drain` wakes [`wait_for_idle`](WorkerPool::wait_for_idle) callers
//! after each completion.
//!
//! Workers hold an `Arc<Inner>`; the outer [`WorkerPool`] owns the worker
//! handles and joins them before the inner state can drop. Task thunks
//! capture only the metrics and logger, so a queued task never keeps the
//! pool alive.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

use crate::config::PoolConfig;
use crate::error::PoolError;
use crate::logger::{LogLevel, Logger};
use crate::metrics::PoolMetrics;
use crate::pool::runner;
use crate::pool::worker;
use crate::tasks::{PendingEntry, PendingQueue, SharedRecord, TaskHandle, TaskPriority, TaskRecord};

/// State guarded by the queue mutex.
pub(crate) struct PoolState {
    pub pending: PendingQueue,
    /// Named-task registry; anonymous tasks never appear here.
    pub registry: HashMap<String, SharedRecord>,
    /// Worker ids scheduled to exit at the next wait/acquire boundary.
    pub retiring: HashSet<usize>,
    pub paused: bool,
    /// Next submission sequence number; assigned only under this lock.
    pub next_seq: u64,
    pub max_workers: usize,
}

/// State shared between the pool handle and its workers.
pub(crate) struct Inner {
    pub state: Mutex<PoolState>,
    pub dispatch: Condvar,
    pub drain: Condvar,
    /// Polled outside the lock by `Drop`; read under the lock in predicates.
    pub stop: AtomicBool,
    pub metrics: Arc<PoolMetrics>,
    pub logger: Arc<Logger>,
}

/// Priority-scheduled worker pool.
///
/// A fixed-to-elastic set of worker threads pulling closures from a shared
/// priority queue, with per-task timeout supervision, one-shot result
/// handles, and lifecycle controls.
///
/// ## Example
/// ```
/// use poolvisor::{LogLevel, PoolConfig, TaskPriority, WorkerPool};
///
/// let mut cfg = PoolConfig::default();
/// cfg.workers = 2;
/// cfg.log_level = LogLevel::None;
/// let pool = WorkerPool::with_config(cfg);
///
/// let handle = pool.submit(|| 2 + 2).unwrap();
/// assert_eq!(handle.wait().unwrap(), 4);
///
/// let urgent = pool
///     .submit_with_priority(TaskPriority::Critical, None, || "now")
///     .unwrap();
/// assert_eq!(urgent.wait().unwrap(), "now");
/// ```
pub struct WorkerPool {
    pub(crate) inner: Arc<Inner>,
    /// Join handles, indexed by worker slot id.
    pub(crate) workers: Mutex<Vec<JoinHandle<()>>>,
}

impl WorkerPool {
    /// Creates a pool with `workers` threads and default logging (Info, to
    /// the console).
    pub fn new(workers: usize) -> Self {
        Self::with_config(PoolConfig {
            workers,
            ..PoolConfig::default()
        })
    }

    /// Creates a pool from explicit configuration.
    pub fn with_config(config: PoolConfig) -> Self {
        let max_workers = config.max_workers();
        let initial = config.initial_workers();
        let logger = Arc::new(Logger::new(
            config.log_level,
            config.console_log,
            config.log_file.as_deref(),
        ));

        let inner = Arc::new(Inner {
            state: Mutex::new(PoolState {
                pending: PendingQueue::new(),
                registry: HashMap::new(),
                retiring: HashSet::new(),
                paused: false,
                next_seq: 0,
                max_workers,
            }),
            dispatch: Condvar::new(),
            drain: Condvar::new(),
            stop: AtomicBool::new(false),
            metrics: Arc::new(PoolMetrics::new()),
            logger,
        });

        inner.logger.info(&format!(
            "worker pool created, workers: {initial}, max: {max_workers}"
        ));

        let workers = (0..initial).map(|id| worker::spawn(&inner, id)).collect();

        Self {
            inner,
            workers: Mutex::new(workers),
        }
    }

    /// Submits an anonymous task at medium priority with no timeout.
    pub fn submit<F, R>(&self, f: F) -> Result<TaskHandle<R>, PoolError>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        self.submit_with_info("", "", TaskPriority::Medium, None, f)
    }

    /// Submits an anonymous task with explicit priority and timeout.
    ///
    /// A timeout of `Some(Duration::ZERO)` means no bound, like `None`.
    pub fn submit_with_priority<F, R>(
        &self,
        priority: TaskPriority,
        timeout: Option<Duration>,
        f: F,
    ) -> Result<TaskHandle<R>, PoolError>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        self.submit_with_info("", "", priority, timeout, f)
    }

    /// Submits a task with full metadata; the general form.
    ///
    /// A non-empty `id` must be unique among currently-known tasks and makes
    /// the task addressable by [`cancel`](Self::cancel) and
    /// [`status`](Self::status). An empty `id` submits anonymously.
    ///
    /// A task with a nonzero timeout runs on an auxiliary thread supervised
    /// by the worker; on deadline the handle resolves with
    /// [`TaskError::Timeout`](crate::TaskError::Timeout) and the auxiliary
    /// thread is detached, not interrupted.
    pub fn submit_with_info<F, R>(
        &self,
        id: impl Into<String>,
        description: impl Into<String>,
        priority: TaskPriority,
        timeout: Option<Duration>,
        f: F,
    ) -> Result<TaskHandle<R>, PoolError>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let id = id.into();
        let description = description.into();
        let timeout = timeout.filter(|d| *d > Duration::ZERO);

        let label = if id.is_empty() {
            "anonymous task".to_string()
        } else {
            format!("task '{id}'")
        };
        let (thunk, handle) = runner::make_thunk(
            f,
            timeout,
            Arc::clone(&self.inner.metrics),
            Arc::clone(&self.inner.logger),
            label,
        );

        {
            let mut state = self.inner.state.lock();

            if self.inner.stop.load(Ordering::SeqCst) {
                return Err(PoolError::ShuttingDown);
            }
            if !id.is_empty() && state.registry.contains_key(&id) {
                return Err(PoolError::DuplicateId { id });
            }

            self.log_submission(&id, &description, priority);

            let seq = state.next_seq;
            state.next_seq += 1;
            let record = TaskRecord::new(id.clone(), description, priority, seq, timeout, thunk);
            if !id.is_empty() {
                state.registry.insert(id, Arc::clone(&record));
            }
            state.pending.push(PendingEntry::new(record, priority, seq));

            self.inner.metrics.task_submitted();
            self.inner.metrics.record_queue_depth(state.pending.len());
        }
        self.inner.dispatch.notify_one();

        Ok(handle)
    }

    /// Submits a batch of anonymous tasks with a shared priority and timeout.
    ///
    /// Handles are returned in submission order. On a submission error the
    /// already-queued prefix stays queued and the error is returned.
    pub fn submit_batch<F, R>(
        &self,
        closures: Vec<F>,
        priority: TaskPriority,
        timeout: Option<Duration>,
    ) -> Result<Vec<TaskHandle<R>>, PoolError>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        closures
            .into_iter()
            .map(|f| self.submit_with_priority(priority, timeout, f))
            .collect()
    }

    /// Submits a batch of named tasks; ids are `"{id_prefix}-{index}"` and
    /// descriptions `"{desc_prefix}-{index}"`, 0-based.
    ///
    /// On a submission error (duplicate id, shutdown) the already-queued
    /// prefix stays queued and the error is returned.
    pub fn submit_batch_with_prefix<F, R>(
        &self,
        id_prefix: &str,
        desc_prefix: &str,
        closures: Vec<F>,
        priority: TaskPriority,
        timeout: Option<Duration>,
    ) -> Result<Vec<TaskHandle<R>>, PoolError>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        closures
            .into_iter()
            .enumerate()
            .map(|(i, f)| {
                self.submit_with_info(
                    format!("{id_prefix}-{i}"),
                    format!("{desc_prefix}-{i}"),
                    priority,
                    timeout,
                    f,
                )
            })
            .collect()
    }

    /// Number of worker threads, including ones mid-retirement.
    pub fn worker_count(&self) -> usize {
        self.workers.lock().len()
    }

    /// Number of workers currently executing a task.
    pub fn active_worker_count(&self) -> usize {
        self.inner.metrics.active_workers()
    }

    /// Number of workers parked on the dispatch condition.
    pub fn waiting_worker_count(&self) -> usize {
        self.worker_count()
            .saturating_sub(self.active_worker_count())
    }

    /// Number of queued tasks (briefly takes the queue lock).
    pub fn queue_depth(&self) -> usize {
        self.inner.state.lock().pending.len()
    }

    pub fn completed_count(&self) -> usize {
        self.inner.metrics.completed()
    }

    pub fn failed_count(&self) -> usize {
        self.inner.metrics.failed()
    }

    pub fn timed_out_count(&self) -> usize {
        self.inner.metrics.timed_out()
    }

    /// `true` once shutdown has begun.
    pub fn is_stopping(&self) -> bool {
        self.inner.stop.load(Ordering::SeqCst)
    }

    /// Current worker ceiling.
    pub fn max_workers(&self) -> usize {
        self.inner.state.lock().max_workers
    }

    /// Formatted multi-line metrics report.
    pub fn metrics_report(&self) -> String {
        self.inner.metrics.report()
    }

    /// Changes the logger's verbosity threshold.
    pub fn set_log_level(&self, level: LogLevel) {
        self.inner.logger.set_level(level);
    }

    /// Stops the pool: no new submissions, idle workers exit, in-flight
    /// tasks run to completion and are joined.
    ///
    /// Tasks still queued are dropped; their handles resolve with
    /// [`TaskError::Canceled`](crate::TaskError::Canceled). Idempotent;
    /// also run by `Drop`.
    pub fn shutdown(&self) {
        {
            // The lock couples the flag write with the condition waits so a
            // worker between predicate check and sleep cannot miss the wake.
            let _state = self.inner.state.lock();
            if self.inner.stop.swap(true, Ordering::SeqCst) {
                return;
            }
        }
        self.inner.logger.info("worker pool shutting down");
        self.inner.dispatch.notify_all();
        self.inner.drain.notify_all();

        let slots: Vec<JoinHandle<()>> = self.workers.lock().drain(..).collect();
        for handle in slots {
            let _ = handle.join();
        }

        let dropped = {
            let mut state = self.inner.state.lock();
            let n = state.pending.len();
            state.pending.clear();
            state.registry.clear();
            n
        };
        if dropped > 0 {
            self.inner
                .logger
                .info(&format!("dropped {dropped} queued tasks at shutdown"));
        }
        self.inner.logger.info("worker pool closed");
    }

    fn log_submission(&self, id: &str, description: &str, priority: TaskPriority) {
        if self.inner.logger.level() < LogLevel::Debug {
            return;
        }
        let msg = if !id.is_empty() || !description.is_empty() {
            format!("submitting task '{id}' ({description}), priority: {priority}")
        } else {
            format!("submitting {priority}-priority task")
        };
        self.inner.logger.debug(&msg);
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}
