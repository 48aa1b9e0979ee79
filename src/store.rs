//! The live event store.

use crate::error::{Result, StoreError};
use crate::iterator::EventIterator;
use crate::subscriptions::{SubscriptionConfig, SubscriptionHandle, SubscriptionId, SubscriptionManager};
use crate::types::{Event, EventKey, StoreStats};
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Store configuration.
#[derive(Clone, Debug, Default)]
pub struct StoreConfig {
    /// Capacity preallocated for the live map.
    pub initial_capacity: usize,

    /// Number of lock stripes in the live map (None = map default).
    /// Must be a power of two greater than 1.
    pub shard_count: Option<usize>,

    /// First key handed out by the store. At most [`MAX_FIRST_KEY`].
    pub first_key: u64,
}

/// Largest accepted `first_key`. Leaves 2^63 keys before the counter could
/// wrap.
pub const MAX_FIRST_KEY: u64 = u64::MAX >> 1;

impl StoreConfig {
    fn validate(&self) -> Result<()> {
        if let Some(shards) = self.shard_count {
            if shards < 2 || !shards.is_power_of_two() {
                return Err(StoreError::InvalidConfig(format!(
                    "shard_count must be a power of two greater than 1, got {}",
                    shards
                )));
            }
        }
        if self.first_key > MAX_FIRST_KEY {
            return Err(StoreError::InvalidConfig(format!(
                "first_key must be at most {}, got {}",
                MAX_FIRST_KEY, self.first_key
            )));
        }
        Ok(())
    }
}

/// A concurrent in-memory registry of events.
///
/// Key assignment is the only serialized step: each insert takes the next
/// value of an atomic counter, so keys are unique, increase in assignment
/// order and are never reused. Everything else runs against a sharded map
/// without a store-wide lock.
///
/// Multi-key operations ([`remove_all`](Self::remove_all) and
/// [`query`](Self::query)) are weakly consistent: they scan the map shard by
/// shard, so events inserted or removed concurrently may or may not be seen.
pub struct EventStore {
    /// Live mapping from key to event.
    events: DashMap<EventKey, Arc<Event>>,

    /// Next key to assign.
    next_key: AtomicU64,

    subscriptions: SubscriptionManager,
}

impl EventStore {
    /// Create an empty store with default configuration.
    pub fn new() -> Self {
        Self::from_parts(DashMap::new(), 0)
    }

    /// Create an empty store from an explicit configuration.
    pub fn with_config(config: StoreConfig) -> Result<Self> {
        config.validate()?;

        let events = match config.shard_count {
            Some(shards) => DashMap::with_capacity_and_shard_amount(config.initial_capacity, shards),
            None => DashMap::with_capacity(config.initial_capacity),
        };

        tracing::debug!(
            initial_capacity = config.initial_capacity,
            shard_count = ?config.shard_count,
            first_key = config.first_key,
            "created event store"
        );

        Ok(Self::from_parts(events, config.first_key))
    }

    fn from_parts(events: DashMap<EventKey, Arc<Event>>, first_key: u64) -> Self {
        Self {
            events,
            next_key: AtomicU64::new(first_key),
            subscriptions: SubscriptionManager::new(),
        }
    }

    // --- Mutations ---

    /// Insert an event and return the key it was stored under.
    pub fn insert(&self, event: Event) -> EventKey {
        let key = EventKey(self.next_key.fetch_add(1, Ordering::SeqCst));
        let event = Arc::new(event);

        // The shard stays write-locked until `Inserted` is queued, so no
        // removal of this key can be broadcast ahead of it.
        let entry = self.events.entry(key).or_insert(Arc::clone(&event));
        tracing::trace!(%key, event_type = event.event_type(), "inserted event");
        self.subscriptions.broadcast_inserted(key, &event);
        drop(entry);

        key
    }

    /// Remove every event of `event_type`.
    ///
    /// Returns how many entries this call removed. Entries removed by a
    /// concurrent caller between the scan and the removal are not counted,
    /// and events inserted while the scan runs may be missed.
    pub fn remove_all(&self, event_type: &str) -> usize {
        let keys: Vec<EventKey> = self
            .events
            .iter()
            .filter(|entry| entry.value().event_type() == event_type)
            .map(|entry| *entry.key())
            .collect();

        let removed = keys
            .into_iter()
            .filter(|key| self.remove_event(*key).is_some())
            .count();

        tracing::debug!(event_type, removed, "removed events by type");
        removed
    }

    /// Remove the event stored under `key`, if any.
    pub fn remove_event(&self, key: EventKey) -> Option<Arc<Event>> {
        let (_, event) = self.events.remove(&key)?;

        tracing::trace!(%key, "removed event");
        self.subscriptions.broadcast_removed(key, &event);
        Some(event)
    }

    // --- Reads ---

    pub fn get_event(&self, key: EventKey) -> Option<Arc<Event>> {
        self.events.get(&key).map(|entry| Arc::clone(entry.value()))
    }

    pub fn contains_key(&self, key: EventKey) -> bool {
        self.events.contains_key(&key)
    }

    pub fn number_of_events(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Query events of `event_type` with `start <= timestamp < end`.
    ///
    /// The matching entries are copied into a snapshot owned by the returned
    /// iterator; later changes to the store never alter what it yields. An
    /// inverted range (`start >= end`) yields nothing.
    pub fn query(&self, event_type: &str, start: i64, end: i64) -> EventIterator<'_> {
        let snapshot: HashMap<EventKey, Arc<Event>> = self
            .events
            .iter()
            .filter(|entry| entry.value().matches(event_type, start, end))
            .map(|entry| (*entry.key(), Arc::clone(entry.value())))
            .collect();

        tracing::debug!(event_type, start, end, matched = snapshot.len(), "query");
        EventIterator::new(self, snapshot)
    }

    // --- Subscriptions ---

    /// Subscribe to inserts and removals broadcast after this call.
    pub fn subscribe(&self, config: SubscriptionConfig) -> SubscriptionHandle {
        self.subscriptions.subscribe(config)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.subscriptions.unsubscribe(id)
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            event_count: self.events.len(),
            next_key: EventKey(self.next_key.load(Ordering::SeqCst)),
            subscriber_count: self.subscriptions.subscription_count(),
        }
    }
}

impl Default for EventStore {
    fn default() -> Self {
        Self::new()
    }
}
