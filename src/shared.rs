//! # Summary
//!
//! This module holds the coordinator's FinishedSet. The peer thread marks
//! slots as notifications arrive, and the termination detector polls it.
//! Both run inside the coordinator process, so the set is wrapped in
//! Arc<RwLock<T>> and never leaves it.

use std::sync::Arc;
use std::time::Instant;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Thread-safe wrapper around a `FinishedSet`.
#[derive(Clone, Debug)]
pub struct Shared(Arc<RwLock<FinishedSet>>);

impl Shared {
    pub fn new(requesters: usize) -> Self {
        Shared(Arc::new(RwLock::new(FinishedSet::new(requesters))))
    }

    /// Acquires a read lock on the underlying set.
    pub fn read(&self) -> RwLockReadGuard<'_, FinishedSet> {
        self.0.read()
    }

    /// Acquires a write lock on the underlying set.
    pub fn write(&self) -> RwLockWriteGuard<'_, FinishedSet> {
        self.0.write()
    }
}

/// One slot per requester for the current run.
#[derive(Clone, Debug)]
pub struct FinishedSet {
    slots: Vec<bool>,
    started: Instant,
}

impl FinishedSet {
    pub fn new(requesters: usize) -> Self {
        FinishedSet {
            slots: vec![false; requesters],
            started: Instant::now(),
        }
    }

    /// Resizes for a new run and restarts the elapsed timer.
    pub fn rearm(&mut self, requesters: usize) {
        *self = FinishedSet::new(requesters);
    }

    /// Marks `id` as finished. Returns false if `id` has no slot.
    pub fn mark(&mut self, id: usize) -> bool {
        match self.slots.get_mut(id) {
        | Some(slot) => {
            *slot = true;
            true
        }
        | None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn finished(&self) -> usize {
        self.slots.iter().filter(|slot| **slot).count()
    }

    /// An empty set is never complete.
    pub fn is_complete(&self) -> bool {
        !self.slots.is_empty() && self.slots.iter().all(|slot| *slot)
    }

    pub fn started(&self) -> Instant {
        self.started
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completes_when_every_slot_is_set() {
        let mut set = FinishedSet::new(3);
        assert!(set.mark(0));
        assert!(set.mark(2));
        assert!(!set.is_complete());
        assert!(set.mark(1));
        assert!(set.is_complete());
        assert_eq!(set.finished(), 3);
    }

    #[test]
    fn repeated_marks_are_idempotent() {
        let mut set = FinishedSet::new(2);
        set.mark(1);
        set.mark(1);
        assert_eq!(set.finished(), 1);
        assert!(!set.is_complete());
    }

    #[test]
    fn out_of_range_is_rejected() {
        let mut set = FinishedSet::new(2);
        assert!(!set.mark(2));
        assert_eq!(set.finished(), 0);
    }

    #[test]
    fn empty_set_never_completes() {
        let set = FinishedSet::new(0);
        assert!(!set.is_complete());
    }

    #[test]
    fn rearm_clears_slots() {
        let shared = Shared::new(1);
        shared.write().mark(0);
        assert!(shared.read().is_complete());
        shared.write().rearm(2);
        assert_eq!(shared.read().len(), 2);
        assert_eq!(shared.read().finished(), 0);
    }
}
