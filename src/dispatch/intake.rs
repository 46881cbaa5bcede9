use std::collections::VecDeque;
use tokio::sync::{Mutex, Notify};

struct IntakeState {
    items: VecDeque<String>,
    closed: bool,
}

/// Bounded buffer of pending urls between the input reader and the dispatcher.
///
/// `offer` never waits for capacity: once the buffer holds `capacity` items
/// new urls are rejected and the caller decides what to do with them. `pop`
/// waits until an item arrives, and resolves to `None` exactly when the queue
/// has been closed and fully drained, which is the dispatcher's end-of-input
/// signal.
pub struct IntakeQueue {
    state: Mutex<IntakeState>,
    notify: Notify,
    capacity: usize,
}

impl IntakeQueue {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "capacity must be greater than zero");
        Self {
            state: Mutex::new(IntakeState {
                items: VecDeque::new(),
                closed: false,
            }),
            notify: Notify::new(),
            capacity,
        }
    }

    /// Appends `item` and returns `true`, or returns `false` without blocking
    /// when the buffer is full or already closed.
    pub async fn offer(&self, item: String) -> bool {
        let mut state = self.state.lock().await;
        if state.closed || state.items.len() >= self.capacity {
            return false;
        }
        state.items.push_back(item);
        drop(state);
        self.notify.notify_waiters();
        true
    }

    /// Waits for the next url. Returns `None` once the queue is closed and
    /// every queued item has been consumed.
    pub async fn pop(&self) -> Option<String> {
        loop {
            if let Some(outcome) = self.try_pop().await {
                return outcome;
            }
            // Re-check after registering the waiter so a push that landed in
            // the gap is not missed.
            let notified = self.notify.notified();
            if let Some(outcome) = self.try_pop().await {
                return outcome;
            }
            notified.await;
        }
    }

    async fn try_pop(&self) -> Option<Option<String>> {
        let mut state = self.state.lock().await;
        if let Some(item) = state.items.pop_front() {
            return Some(Some(item));
        }
        if state.closed {
            return Some(None);
        }
        None
    }

    /// Marks end-of-input. Idempotent; wakes the consumer so it can observe
    /// the close once the buffer drains.
    pub async fn close(&self) {
        let mut state = self.state.lock().await;
        state.closed = true;
        drop(state);
        self.notify.notify_waiters();
    }

    /// Discards everything still queued and returns how many items were
    /// dropped. Used on interrupt, when queued urls must never dispatch.
    pub async fn clear(&self) -> usize {
        let mut state = self.state.lock().await;
        let discarded = state.items.len();
        state.items.clear();
        drop(state);
        self.notify.notify_waiters();
        discarded
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.items.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.lock().await.items.is_empty()
    }
}
