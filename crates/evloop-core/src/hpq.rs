//! High-priority queue: a fixed slot table of predicates scanned once per
//! tick, ahead of the timed queues.
//!
//! The source keeps the HPQ as a plain list, growable with
//! `_allocate_hpq(n)` when `schedule_hp` finds no free slot. The slot table
//! here mirrors that: `allocate` grows capacity ahead of time (the path an
//! embedder wanting zero steady-state allocation should use), `schedule`
//! fills the first free slot and, only if every slot is occupied, appends
//! one new slot (the source's rare allocating fallback, preserved exactly
//! rather than turned into an error — §4.3 asks for growth here, not
//! failure). `fire_first` scans in slot order and fires (clears and
//! returns) only the *first* entry whose predicate is currently true —
//! matching the source's "first truthy slot wins, exit selection" rule
//! exactly; any other slots that would also fire are left pending and
//! re-checked next tick.

extern crate alloc;

use alloc::vec::Vec;

use crate::directive::Predicate;
use crate::task::Payload;
use crate::value::Args;

/// One pending high-priority registration.
struct HpEntry {
    pred: Predicate,
    payload: Payload,
    args: Args,
}

/// Fixed slot table backing the high-priority queue.
///
/// Slots are `Option<HpEntry>` rather than a `Vec` that shrinks and grows
/// per-entry, so scheduling and firing never shift other entries' indices
/// mid-scan.
pub struct HpTable {
    slots: Vec<Option<HpEntry>>,
}

impl HpTable {
    /// Creates a table with `capacity` empty slots.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self { slots }
    }

    /// Current slot count.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Grows the table by `n` additional empty slots.
    pub fn allocate(&mut self, n: usize) {
        self.slots.reserve(n);
        for _ in 0..n {
            self.slots.push(None);
        }
    }

    /// Registers `pred`/`payload`/`args` in the first free slot, appending
    /// a new slot if every existing one is occupied. Embedders wanting a
    /// hard allocation-free guarantee should pre-size the table with
    /// [`Self::allocate`]/`allocate_hpq` so this fallback is never taken.
    pub fn schedule(&mut self, pred: Predicate, payload: Payload, args: Args) {
        for slot in &mut self.slots {
            if slot.is_none() {
                *slot = Some(HpEntry { pred, payload, args });
                return;
            }
        }
        self.slots.push(Some(HpEntry { pred, payload, args }));
    }

    /// Scans occupied slots in order; the first whose predicate evaluates
    /// true is cleared and returned. Remaining slots are left untouched.
    pub fn fire_first(&mut self) -> Option<(Payload, Args)> {
        for slot in &mut self.slots {
            let ready = matches!(slot, Some(entry) if (entry.pred)());
            if ready {
                let entry = slot.take().expect("checked Some above");
                return Some((entry.payload, entry.args));
            }
        }
        None
    }

    /// Whether any slot currently holds a pending registration.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::TaskId;
    use crate::value::no_args;
    use alloc::boxed::Box;

    fn task_payload(n: u64) -> Payload {
        Payload::Task(TaskId::new(n))
    }

    #[test]
    fn fires_when_predicate_becomes_true() {
        let mut table = HpTable::new(2);
        table.schedule(Box::new(|| false), task_payload(1), no_args());
        assert!(table.fire_first().is_none());
        table.schedule(Box::new(|| true), task_payload(2), no_args());
        let (payload, _) = table.fire_first().unwrap();
        assert!(matches!(payload, Payload::Task(id) if id == TaskId::new(2)));
    }

    #[test]
    fn only_the_first_truthy_slot_fires_per_scan() {
        let mut table = HpTable::new(2);
        table.schedule(Box::new(|| true), task_payload(1), no_args());
        table.schedule(Box::new(|| true), task_payload(2), no_args());
        let (first, _) = table.fire_first().unwrap();
        assert!(matches!(first, Payload::Task(id) if id == TaskId::new(1)));
        // Slot 2 is still pending and fires on the next scan.
        let (second, _) = table.fire_first().unwrap();
        assert!(matches!(second, Payload::Task(id) if id == TaskId::new(2)));
    }

    #[test]
    fn schedule_appends_a_slot_when_every_slot_is_occupied() {
        let mut table = HpTable::new(1);
        table.schedule(Box::new(|| false), task_payload(1), no_args());
        assert_eq!(table.capacity(), 1);
        table.schedule(Box::new(|| true), task_payload(2), no_args());
        assert_eq!(table.capacity(), 2);
        let (payload, _) = table.fire_first().unwrap();
        assert!(matches!(payload, Payload::Task(id) if id == TaskId::new(2)));
    }

    #[test]
    fn allocate_grows_capacity() {
        let mut table = HpTable::new(1);
        table.schedule(Box::new(|| false), task_payload(1), no_args());
        table.allocate(1);
        assert_eq!(table.capacity(), 2);
        table.schedule(Box::new(|| false), task_payload(2), no_args());
    }

    #[test]
    fn fired_slots_become_free_again() {
        let mut table = HpTable::new(1);
        table.schedule(Box::new(|| true), task_payload(1), no_args());
        assert!(table.fire_first().is_some());
        assert!(table.is_empty());
        table.schedule(Box::new(|| true), task_payload(2), no_args());
    }
}
