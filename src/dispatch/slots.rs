use std::sync::atomic::{AtomicUsize, Ordering};

/// Tracks how many fetch operations are in flight against a fixed ceiling.
///
/// `try_acquire` performs the check and the increment as a single atomic
/// update, so the ceiling holds no matter which tasks race on it. The pool
/// does no queueing of its own; callers retry against the intake queue when
/// acquisition fails.
#[derive(Debug)]
pub struct SlotPool {
    in_flight: AtomicUsize,
    capacity: usize,
}

impl SlotPool {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "slot capacity must be greater than zero");
        Self {
            in_flight: AtomicUsize::new(0),
            capacity,
        }
    }

    /// Claims a slot, returning `false` when all of them are taken.
    pub fn try_acquire(&self) -> bool {
        self.in_flight
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                if current < self.capacity {
                    Some(current + 1)
                } else {
                    None
                }
            })
            .is_ok()
    }

    /// Returns a slot to the pool. Must be called exactly once per successful
    /// `try_acquire`.
    pub fn release(&self) {
        let previous = self.in_flight.fetch_sub(1, Ordering::AcqRel);
        debug_assert!(previous > 0, "release without a matching acquire");
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn has_capacity(&self) -> bool {
        self.in_flight() < self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
