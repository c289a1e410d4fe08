//! # Runtime metrics for the pool.
//!
//! [`PoolMetrics`] keeps monotonic counters (submitted / completed / failed /
//! timed-out), gauges with peak tracking (active workers, queue depth), and
//! an execution-time accumulator. All updates are atomic; reads are relaxed
//! and may observe slightly stale values. The contract is eventual
//! consistency for reporting, not linearisability.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Atomic counters and gauges for a single pool.
pub struct PoolMetrics {
    submitted: AtomicUsize,
    completed: AtomicUsize,
    failed: AtomicUsize,
    timed_out: AtomicUsize,

    active_workers: AtomicUsize,
    peak_workers: AtomicUsize,
    peak_queue_depth: AtomicUsize,

    total_task_time_ns: AtomicU64,
    start: Instant,
}

impl PoolMetrics {
    pub fn new() -> Self {
        Self {
            submitted: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
            timed_out: AtomicUsize::new(0),
            active_workers: AtomicUsize::new(0),
            peak_workers: AtomicUsize::new(0),
            peak_queue_depth: AtomicUsize::new(0),
            total_task_time_ns: AtomicU64::new(0),
            start: Instant::now(),
        }
    }

    pub fn task_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn task_completed(&self) {
        self.completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn task_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn task_timed_out(&self) {
        self.timed_out.fetch_add(1, Ordering::Relaxed);
    }

    /// Records the queue depth observed after a push, keeping the peak.
    pub fn record_queue_depth(&self, depth: usize) {
        raise_peak(&self.peak_queue_depth, depth);
    }

    /// Marks a worker as executing; returns nothing, keeps the peak.
    pub fn worker_started(&self) {
        let now = self.active_workers.fetch_add(1, Ordering::Relaxed) + 1;
        raise_peak(&self.peak_workers, now);
    }

    pub fn worker_finished(&self) {
        self.active_workers.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn add_task_time(&self, elapsed: Duration) {
        self.total_task_time_ns
            .fetch_add(elapsed.as_nanos() as u64, Ordering::Relaxed);
    }

    pub fn submitted(&self) -> usize {
        self.submitted.load(Ordering::Relaxed)
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::Relaxed)
    }

    pub fn timed_out(&self) -> usize {
        self.timed_out.load(Ordering::Relaxed)
    }

    pub fn active_workers(&self) -> usize {
        self.active_workers.load(Ordering::Relaxed)
    }

    pub fn peak_workers(&self) -> usize {
        self.peak_workers.load(Ordering::Relaxed)
    }

    pub fn peak_queue_depth(&self) -> usize {
        self.peak_queue_depth.load(Ordering::Relaxed)
    }

    /// Seconds since the pool was constructed.
    pub fn uptime(&self) -> Duration {
        self.start.elapsed()
    }

    /// Average execution time of completed tasks, in milliseconds.
    pub fn average_task_time_ms(&self) -> f64 {
        let completed = self.completed();
        if completed == 0 {
            return 0.0;
        }
        self.total_task_time_ns.load(Ordering::Relaxed) as f64 / completed as f64 / 1_000_000.0
    }

    /// Completed tasks per second of uptime.
    pub fn throughput(&self) -> f64 {
        let uptime = self.uptime().as_secs_f64();
        if uptime <= 0.0 {
            return 0.0;
        }
        self.completed() as f64 / uptime
    }

    /// Formats the multi-line metrics report.
    pub fn report(&self) -> String {
        format!(
            "pool metrics:\n  \
             uptime: {:.3}s\n  \
             submitted: {}\n  \
             completed: {}\n  \
             failed: {}\n  \
             timed out: {}\n  \
             active workers: {} (peak {})\n  \
             peak queue depth: {}\n  \
             avg task time: {:.3}ms\n  \
             throughput: {:.2} tasks/s\n",
            self.uptime().as_secs_f64(),
            self.submitted(),
            self.completed(),
            self.failed(),
            self.timed_out(),
            self.active_workers(),
            self.peak_workers(),
            self.peak_queue_depth(),
            self.average_task_time_ms(),
            self.throughput(),
        )
    }
}

impl Default for PoolMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Raises `peak` to `value` if it is larger, retrying on lost races.
fn raise_peak(peak: &AtomicUsize, value: usize) {
    let mut current = peak.load(Ordering::Relaxed);
    while value > current {
        match peak.compare_exchange_weak(current, value, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => break,
            Err(observed) => current = observed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let m = PoolMetrics::new();
        m.task_submitted();
        m.task_submitted();
        m.task_completed();
        m.task_failed();
        m.task_timed_out();

        assert_eq!(m.submitted(), 2);
        assert_eq!(m.completed(), 1);
        assert_eq!(m.failed(), 1);
        assert_eq!(m.timed_out(), 1);
    }

    #[test]
    fn peaks_never_decrease() {
        let m = PoolMetrics::new();
        m.record_queue_depth(3);
        m.record_queue_depth(7);
        m.record_queue_depth(2);
        assert_eq!(m.peak_queue_depth(), 7);

        m.worker_started();
        m.worker_started();
        m.worker_finished();
        m.worker_started();
        assert_eq!(m.active_workers(), 2);
        assert_eq!(m.peak_workers(), 2);
    }

    #[test]
    fn average_over_completed_tasks() {
        let m = PoolMetrics::new();
        assert_eq!(m.average_task_time_ms(), 0.0);

        m.task_completed();
        m.task_completed();
        m.add_task_time(Duration::from_millis(10));
        m.add_task_time(Duration::from_millis(30));
        let avg = m.average_task_time_ms();
        assert!((avg - 20.0).abs() < 1e-6, "avg {avg} not 20ms");
    }

    #[test]
    fn report_lists_every_field() {
        let m = PoolMetrics::new();
        m.task_submitted();
        let report = m.report();
        for needle in [
            "uptime:",
            "submitted: 1",
            "completed: 0",
            "failed: 0",
            "timed out: 0",
            "active workers: 0 (peak 0)",
            "peak queue depth: 0",
            "avg task time:",
            "throughput:",
        ] {
            assert!(report.contains(needle), "missing {needle:?} in {report}");
        }
    }
}
