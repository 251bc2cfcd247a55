//! Timed min-heap shared by the normal and low-priority queues.
//!
//! Entries compare by due time using [`clock::diff`] rather than raw `u32`
//! ordering, so the heap stays correctly ordered across a clock wraparound.
//! A monotonically increasing sequence number breaks ties between entries
//! due at the same tick, giving FIFO order for simultaneous wakeups (the
//! source relies on Python heap stability plus insertion order for this;
//! `BinaryHeap` is not stable, so the tiebreak is made explicit here).

extern crate alloc;

use alloc::collections::BinaryHeap;
use core::cmp::Reverse;
use core::cmp::Ordering;

use crate::clock;
use crate::error::{LoopError, QueueKind};
use crate::task::Payload;
use crate::value::Args;

/// One pending entry: due tick, insertion sequence, and what to run with
/// which arguments.
pub struct TimedEntry {
    due: u32,
    seq: u64,
    payload: Payload,
    args: Args,
}

impl TimedEntry {
    #[must_use]
    pub fn due(&self) -> u32 {
        self.due
    }

    #[must_use]
    pub fn into_parts(self) -> (Payload, Args) {
        (self.payload, self.args)
    }
}

impl PartialEq for TimedEntry {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl Eq for TimedEntry {}

impl PartialOrd for TimedEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimedEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        match clock::diff(self.due, other.due) {
            0 => self.seq.cmp(&other.seq),
            d if d < 0 => Ordering::Less,
            _ => Ordering::Greater,
        }
    }
}

/// A capacity-bounded timed queue, backed by a binary heap of the entry
/// reversed for min-heap order (earliest due time pops first).
pub struct TimedQueue {
    heap: BinaryHeap<Reverse<TimedEntry>>,
    cap: usize,
    next_seq: u64,
    kind: QueueKind,
}

impl TimedQueue {
    /// Creates an empty queue accepting at most `cap` pending entries.
    #[must_use]
    pub fn new(cap: usize, kind: QueueKind) -> Self {
        Self {
            heap: BinaryHeap::new(),
            cap,
            next_seq: 0,
            kind,
        }
    }

    /// Number of pending entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Whether the queue has no pending entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Schedules `payload` to run at tick `due` with the given arguments.
    ///
    /// # Errors
    /// Returns [`LoopError::QueueFull`] if the queue is already at its
    /// configured capacity.
    pub fn push(&mut self, due: u32, payload: Payload, args: Args) -> Result<(), LoopError> {
        if self.heap.len() >= self.cap {
            return Err(LoopError::QueueFull(self.kind));
        }
        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);
        self.heap.push(Reverse(TimedEntry { due, seq, payload, args }));
        Ok(())
    }

    /// Returns the due tick of the earliest entry, without removing it.
    #[must_use]
    pub fn peek_time(&self) -> Option<u32> {
        self.heap.peek().map(|Reverse(e)| e.due)
    }

    /// Removes and returns the earliest entry.
    pub fn pop(&mut self) -> Option<TimedEntry> {
        self.heap.pop().map(|Reverse(e)| e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::TaskId;
    use crate::value::no_args;

    fn task_payload(n: u64) -> Payload {
        Payload::Task(TaskId::new(n))
    }

    #[test]
    fn pops_in_due_order() {
        let mut q = TimedQueue::new(8, QueueKind::Normal);
        q.push(30, task_payload(1), no_args()).unwrap();
        q.push(10, task_payload(2), no_args()).unwrap();
        q.push(20, task_payload(3), no_args()).unwrap();
        assert_eq!(q.pop().unwrap().due(), 10);
        assert_eq!(q.pop().unwrap().due(), 20);
        assert_eq!(q.pop().unwrap().due(), 30);
        assert!(q.pop().is_none());
    }

    #[test]
    fn ties_break_by_insertion_order() {
        let mut q = TimedQueue::new(8, QueueKind::Normal);
        q.push(100, task_payload(1), no_args()).unwrap();
        q.push(100, task_payload(2), no_args()).unwrap();
        let (first, _) = q.pop().unwrap().into_parts();
        let Payload::Task(id) = first else { panic!("expected task payload") };
        assert_eq!(id, TaskId::new(1));
    }

    #[test]
    fn orders_correctly_across_wraparound() {
        let mut q = TimedQueue::new(8, QueueKind::Normal);
        let before_wrap = u32::MAX - 2;
        let after_wrap = 5;
        q.push(after_wrap, task_payload(1), no_args()).unwrap();
        q.push(before_wrap, task_payload(2), no_args()).unwrap();
        assert_eq!(q.pop().unwrap().due(), before_wrap);
        assert_eq!(q.pop().unwrap().due(), after_wrap);
    }

    #[test]
    fn push_past_capacity_errors() {
        let mut q = TimedQueue::new(1, QueueKind::LowPriority);
        q.push(1, task_payload(1), no_args()).unwrap();
        assert_eq!(
            q.push(2, task_payload(2), no_args()),
            Err(LoopError::QueueFull(QueueKind::LowPriority))
        );
    }
}
