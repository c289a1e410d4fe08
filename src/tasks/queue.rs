//! # Pending-task store with priority ordering.
//!
//! [`PendingQueue`] wraps a [`BinaryHeap`] of queue entries ordered by
//! `(priority desc, seq asc)`: higher priority first, FIFO among equals.
//! Sequence numbers are unique by construction (assigned under the queue
//! lock), so the order is total.
//!
//! Cancellation is resolved at extraction time, not insertion: the heap may
//! hold entries whose record was cancelled, and the worker drains those
//! silently.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use super::record::{SharedRecord, TaskPriority};

/// Heap entry; carries the ordering keys inline so comparisons never touch
/// the record mutex.
pub(crate) struct PendingEntry {
    pub record: SharedRecord,
    priority: TaskPriority,
    seq: u64,
}

impl PendingEntry {
    pub fn new(record: SharedRecord, priority: TaskPriority, seq: u64) -> Self {
        Self {
            record,
            priority,
            seq,
        }
    }
}

impl Ord for PendingEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Max-heap: higher priority wins; earlier seq wins the tie.
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for PendingEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Eq for PendingEntry {}

impl PartialEq for PendingEntry {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.seq == other.seq
    }
}

/// Ordered store of pending task records.
pub(crate) struct PendingQueue {
    heap: BinaryHeap<PendingEntry>,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
        }
    }

    pub fn push(&mut self, entry: PendingEntry) {
        self.heap.push(entry);
    }

    /// Removes and returns the highest-priority entry.
    pub fn pop_top(&mut self) -> Option<PendingEntry> {
        self.heap.pop()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Drops every pending entry (and with them their unsent result
    /// senders, which resolves orphaned handles as canceled).
    pub fn clear(&mut self) {
        self.heap = BinaryHeap::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::record::{ExecOutcome, TaskRecord};

    fn entry(priority: TaskPriority, seq: u64) -> PendingEntry {
        let record = TaskRecord::new(
            String::new(),
            String::new(),
            priority,
            seq,
            None,
            Box::new(|| ExecOutcome::Completed),
        );
        PendingEntry::new(record, priority, seq)
    }

    fn drain_seqs(queue: &mut PendingQueue) -> Vec<u64> {
        let mut seqs = Vec::new();
        while let Some(e) = queue.pop_top() {
            seqs.push(e.record.lock().seq);
        }
        seqs
    }

    #[test]
    fn higher_priority_pops_first() {
        let mut q = PendingQueue::new();
        q.push(entry(TaskPriority::Low, 0));
        q.push(entry(TaskPriority::Critical, 1));
        q.push(entry(TaskPriority::Medium, 2));
        q.push(entry(TaskPriority::High, 3));

        assert_eq!(drain_seqs(&mut q), vec![1, 3, 2, 0]);
    }

    #[test]
    fn fifo_within_equal_priority() {
        let mut q = PendingQueue::new();
        for seq in 0..5 {
            q.push(entry(TaskPriority::Medium, seq));
        }
        assert_eq!(drain_seqs(&mut q), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn mixed_priorities_keep_fifo_per_level() {
        let mut q = PendingQueue::new();
        q.push(entry(TaskPriority::Medium, 0));
        q.push(entry(TaskPriority::Critical, 1));
        q.push(entry(TaskPriority::Medium, 2));
        q.push(entry(TaskPriority::Critical, 3));

        assert_eq!(drain_seqs(&mut q), vec![1, 3, 0, 2]);
    }

    #[test]
    fn clear_empties_the_store() {
        let mut q = PendingQueue::new();
        q.push(entry(TaskPriority::Low, 0));
        assert_eq!(q.len(), 1);
        q.clear();
        assert!(q.is_empty());
        assert!(q.pop_top().is_none());
    }
}
