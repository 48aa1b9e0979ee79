//! Subscription manager for broadcasting store changes.

use crate::types::{Event, EventKey};
use crossbeam_channel::{bounded, Sender};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use super::types::{
    DropReason, StoreChange, SubscriptionConfig, SubscriptionHandle, SubscriptionId,
};

/// Internal subscription state.
struct Subscription {
    config: SubscriptionConfig,
    sender: Sender<StoreChange>,
}

impl Subscription {
    /// Try to send a change. Returns false if the buffer is full or the
    /// receiver is gone (subscriber will be dropped).
    fn try_send(&self, change: StoreChange) -> bool {
        self.sender.try_send(change).is_ok()
    }

    fn wants_insert(&self, event: &Event) -> bool {
        self.config.filter.include_inserts && self.config.filter.matches_type(event.event_type())
    }

    fn wants_removal(&self, event: &Event) -> bool {
        self.config.filter.include_removals && self.config.filter.matches_type(event.event_type())
    }
}

/// Manages subscriptions and broadcasts changes.
pub struct SubscriptionManager {
    /// Active subscriptions by ID.
    subscriptions: RwLock<HashMap<SubscriptionId, Subscription>>,
    /// Mirrors `subscriptions.len()` so the hot path can skip the lock.
    active: AtomicUsize,
    /// Counter for generating subscription IDs.
    next_id: AtomicU64,
}

impl SubscriptionManager {
    pub fn new() -> Self {
        Self {
            subscriptions: RwLock::new(HashMap::new()),
            active: AtomicUsize::new(0),
            next_id: AtomicU64::new(1),
        }
    }

    /// Create a new subscription. Changes broadcast after this call are
    /// delivered; an insert that races with it may or may not be.
    pub fn subscribe(&self, config: SubscriptionConfig) -> SubscriptionHandle {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let (sender, receiver) = bounded(config.buffer_size);

        let mut subs = self.subscriptions.write();
        subs.insert(id, Subscription { config, sender });
        self.active.store(subs.len(), Ordering::Release);

        SubscriptionHandle { id, receiver }
    }

    /// Unsubscribe and clean up.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        let mut subs = self.subscriptions.write();
        if let Some(sub) = subs.remove(&id) {
            // Best effort: the receiver may already be gone.
            let _ = sub.sender.try_send(StoreChange::Dropped {
                reason: DropReason::Unsubscribed,
            });
        }
        self.active.store(subs.len(), Ordering::Release);
    }

    pub fn subscription_count(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }

    // --- Broadcasting ---

    pub fn broadcast_inserted(&self, key: EventKey, event: &Event) {
        if self.subscription_count() == 0 {
            return;
        }
        let change = StoreChange::Inserted {
            key,
            event: event.clone(),
        };
        self.broadcast(|sub| sub.wants_insert(event), change);
    }

    pub fn broadcast_removed(&self, key: EventKey, event: &Event) {
        if self.subscription_count() == 0 {
            return;
        }
        let change = StoreChange::Removed {
            key,
            event: event.clone(),
        };
        self.broadcast(|sub| sub.wants_removal(event), change);
    }

    /// Internal broadcast helper. Drops subscribers that fail to receive.
    fn broadcast<F>(&self, filter: F, change: StoreChange)
    where
        F: Fn(&Subscription) -> bool,
    {
        let mut to_remove = Vec::new();

        {
            let subs = self.subscriptions.read();
            for (id, sub) in subs.iter() {
                if filter(sub) && !sub.try_send(change.clone()) {
                    to_remove.push(*id);
                }
            }
        }

        if !to_remove.is_empty() {
            let mut subs = self.subscriptions.write();
            for id in to_remove {
                if let Some(sub) = subs.remove(&id) {
                    tracing::warn!(subscription = id.0, "dropping slow subscriber");
                    let _ = sub.sender.try_send(StoreChange::Dropped {
                        reason: DropReason::BufferOverflow,
                    });
                }
            }
            self.active.store(subs.len(), Ordering::Release);
        }
    }
}

impl Default for SubscriptionManager {
    fn default() -> Self {
        Self::new()
    }
}
