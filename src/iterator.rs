//! Snapshot iterators returned by [`EventStore::query`].
//!
//! An iterator owns a private copy of the entries that matched its query.
//! Traversal follows a fixed key order (ascending key, i.e. insertion
//! order) and is driven by an explicit cursor state machine:
//!
//! ```text
//!  Fresh ──move_next──▶ Positioned ──remove──▶ AwaitingAdvance
//!    │                   │    ▲                      │
//!    │                   │    └──────move_next───────┘
//!    └──────move_next────┴──▶ Exhausted (terminal)
//! ```
//!
//! [`current`](EventIterator::current) and [`remove`](EventIterator::remove)
//! are only valid while `Positioned`; anywhere else they return
//! [`StoreError::InvalidState`].

use crate::error::{Result, StoreError};
use crate::store::EventStore;
use crate::types::{Event, EventKey};
use std::collections::HashMap;
use std::sync::Arc;

/// Cursor state of an [`EventIterator`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CursorState {
    /// No `move_next` call yet.
    Fresh,
    /// On the entry with this key.
    Positioned(EventKey),
    /// The positioned entry was removed; `move_next` must be called.
    AwaitingAdvance,
    /// The key sequence is spent.
    Exhausted,
}

/// Forward-only traversal over a query snapshot.
pub struct EventIterator<'a> {
    store: &'a EventStore,
    events: HashMap<EventKey, Arc<Event>>,
    /// Traversal order, fixed at construction.
    keys: Vec<EventKey>,
    /// Index of the next key `move_next` will produce.
    next_index: usize,
    state: CursorState,
}

impl<'a> EventIterator<'a> {
    pub(crate) fn new(store: &'a EventStore, events: HashMap<EventKey, Arc<Event>>) -> Self {
        let mut keys: Vec<EventKey> = events.keys().copied().collect();
        keys.sort_unstable();

        Self {
            store,
            events,
            keys,
            next_index: 0,
            state: CursorState::Fresh,
        }
    }

    /// Advance to the next entry. Returns false once the snapshot is spent,
    /// and on every call after that.
    pub fn move_next(&mut self) -> bool {
        if self.state == CursorState::Exhausted {
            return false;
        }

        match self.keys.get(self.next_index) {
            Some(&key) => {
                self.next_index += 1;
                self.state = CursorState::Positioned(key);
                tracing::trace!(%key, "iterator positioned");
                true
            }
            None => {
                self.state = CursorState::Exhausted;
                tracing::trace!("iterator exhausted");
                false
            }
        }
    }

    /// The event under the cursor.
    ///
    /// Resolved through the key produced by the last successful
    /// `move_next`, from this iterator's snapshot. Removal from the live
    /// store does not affect it.
    pub fn current(&self) -> Result<&Event> {
        let key = self.positioned_key("current")?;
        // Positioned keys always come from the snapshot, which only `close`
        // clears (and `close` leaves the cursor Exhausted).
        Ok(&self.events[&key])
    }

    /// Key of the event under the cursor.
    pub fn current_key(&self) -> Result<EventKey> {
        self.positioned_key("current_key")
    }

    /// Remove the entry under the cursor from the live store.
    ///
    /// The snapshot is left untouched. Afterwards `move_next` must succeed
    /// before `current` or `remove` may be called again.
    pub fn remove(&mut self) -> Result<()> {
        let key = self.positioned_key("remove")?;
        self.store.remove_event(key);
        self.state = CursorState::AwaitingAdvance;
        Ok(())
    }

    /// Release the snapshot. Idempotent; the iterator behaves as exhausted
    /// afterwards.
    pub fn close(&mut self) {
        self.events = HashMap::new();
        self.keys = Vec::new();
        self.next_index = 0;
        self.state = CursorState::Exhausted;
    }

    pub fn state(&self) -> CursorState {
        self.state
    }

    /// Number of entries captured by the query.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    fn positioned_key(&self, operation: &'static str) -> Result<EventKey> {
        match self.state {
            CursorState::Positioned(key) => Ok(key),
            state => Err(StoreError::InvalidState { operation, state }),
        }
    }
}

impl Drop for EventIterator<'_> {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for EventIterator<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventIterator")
            .field("len", &self.keys.len())
            .field("next_index", &self.next_index)
            .field("state", &self.state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_store() -> EventStore {
        let store = EventStore::new();
        store.insert(Event::new("x", 111));
        store.insert(Event::new("y", 112));
        store.insert(Event::new("x", 113));
        store
    }

    fn assert_invalid(result: Result<impl std::fmt::Debug>, expected: CursorState) {
        match result {
            Err(StoreError::InvalidState { state, .. }) => assert_eq!(state, expected),
            other => panic!("Expected InvalidState({:?}), got {:?}", expected, other),
        }
    }

    #[test]
    fn test_iterate_in_key_order() {
        let store = sample_store();
        let mut it = store.query("x", 110, 114);

        assert!(it.move_next());
        assert_eq!(it.current().unwrap(), &Event::new("x", 111));
        assert!(it.move_next());
        assert_eq!(it.current().unwrap(), &Event::new("x", 113));
        assert!(!it.move_next());
        assert!(!it.move_next());
        assert_eq!(it.state(), CursorState::Exhausted);
    }

    #[test]
    fn test_current_before_move_next() {
        let store = sample_store();
        let it = store.query("x", 110, 114);
        assert_invalid(it.current(), CursorState::Fresh);
    }

    #[test]
    fn test_remove_before_move_next() {
        let store = sample_store();
        let mut it = store.query("x", 110, 114);
        assert_invalid(it.remove(), CursorState::Fresh);
        assert_eq!(store.number_of_events(), 3);
    }

    #[test]
    fn test_current_and_remove_when_exhausted() {
        let store = sample_store();
        let mut it = store.query("x", 110, 114);
        it.move_next();
        it.move_next();
        it.move_next();

        assert_invalid(it.current(), CursorState::Exhausted);
        assert_invalid(it.remove(), CursorState::Exhausted);
        assert_eq!(store.number_of_events(), 3);
    }

    #[test]
    fn test_remove_forwards_to_store() {
        let store = sample_store();
        let mut it = store.query("x", 110, 114);

        assert!(it.move_next());
        it.remove().unwrap();

        assert_eq!(store.number_of_events(), 2);
        assert!(!store.contains_key(EventKey(0)));
        assert!(store.contains_key(EventKey(2)));
    }

    #[test]
    fn test_remove_requires_fresh_advance() {
        let store = sample_store();
        let mut it = store.query("x", 110, 114);

        it.move_next();
        it.remove().unwrap();
        assert_eq!(it.state(), CursorState::AwaitingAdvance);
        assert_invalid(it.current(), CursorState::AwaitingAdvance);
        assert_invalid(it.remove(), CursorState::AwaitingAdvance);
        assert_eq!(store.number_of_events(), 2);

        assert!(it.move_next());
        assert_eq!(it.current().unwrap().timestamp(), 113);
        it.remove().unwrap();
        assert_eq!(store.number_of_events(), 1);
    }

    #[test]
    fn test_current_uses_last_produced_key() {
        let store = EventStore::new();
        for ts in 0..10 {
            store.insert(Event::new(if ts % 3 == 0 { "x" } else { "y" }, ts));
        }
        let mut it = store.query("x", 0, 10);

        let mut seen = Vec::new();
        while it.move_next() {
            let key = it.current_key().unwrap();
            assert_eq!(it.current().unwrap(), store.get_event(key).unwrap().as_ref());
            seen.push(it.current().unwrap().timestamp());
        }
        assert_eq!(seen, vec![0, 3, 6, 9]);
    }

    #[test]
    fn test_current_stable_after_live_removal() {
        let store = sample_store();
        let mut it = store.query("x", 110, 114);
        it.move_next();
        store.remove_event(EventKey(0));

        assert_eq!(it.current().unwrap(), &Event::new("x", 111));
        assert_eq!(it.current().unwrap(), &Event::new("x", 111));
        assert_eq!(it.state(), CursorState::Positioned(EventKey(0)));
    }

    #[test]
    fn test_snapshot_survives_store_removal() {
        let store = sample_store();
        let mut it = store.query("x", 110, 114);
        store.remove_all("x");

        assert!(it.move_next());
        assert_eq!(it.current().unwrap().timestamp(), 111);
        assert!(it.move_next());
        assert_eq!(it.current().unwrap().timestamp(), 113);
        assert!(!it.move_next());
    }

    #[test]
    fn test_close_is_idempotent() {
        let store = sample_store();
        let mut it = store.query("x", 110, 114);
        it.move_next();

        it.close();
        it.close();
        assert!(it.is_empty());
        assert!(!it.move_next());
        assert_invalid(it.current(), CursorState::Exhausted);
        assert_eq!(store.number_of_events(), 3);
    }
}
