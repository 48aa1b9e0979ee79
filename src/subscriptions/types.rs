//! Subscription types for the change feed.

use crate::types::{Event, EventKey};
use serde::{Deserialize, Serialize};

/// Configuration for a subscription.
#[derive(Clone, Debug)]
pub struct SubscriptionConfig {
    /// Max buffered changes before dropping the subscriber.
    /// Default: 1000
    pub buffer_size: usize,

    /// Filter criteria.
    pub filter: SubscriptionFilter,
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        Self {
            buffer_size: 1000,
            filter: SubscriptionFilter::default(),
        }
    }
}

/// Filter criteria for subscriptions.
#[derive(Clone, Debug)]
pub struct SubscriptionFilter {
    /// Filter by event types (None = all types).
    pub event_types: Option<Vec<String>>,

    pub include_inserts: bool,

    pub include_removals: bool,
}

impl Default for SubscriptionFilter {
    fn default() -> Self {
        Self::all()
    }
}

impl SubscriptionFilter {
    /// Subscribe to every change.
    pub fn all() -> Self {
        Self {
            event_types: None,
            include_inserts: true,
            include_removals: true,
        }
    }

    /// Subscribe to changes for specific event types.
    pub fn event_types(types: Vec<String>) -> Self {
        Self {
            event_types: Some(types),
            ..Self::all()
        }
    }

    /// Subscribe to inserts only.
    pub fn inserts() -> Self {
        Self {
            include_removals: false,
            ..Self::all()
        }
    }

    /// Subscribe to removals only.
    pub fn removals() -> Self {
        Self {
            include_inserts: false,
            ..Self::all()
        }
    }

    pub(crate) fn matches_type(&self, event_type: &str) -> bool {
        match self.event_types {
            Some(ref types) => types.iter().any(|t| t == event_type),
            None => true,
        }
    }
}

/// Changes emitted to subscribers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoreChange {
    /// An event was inserted under `key`.
    Inserted { key: EventKey, event: Event },

    /// The event stored under `key` was removed.
    Removed { key: EventKey, event: Event },

    /// Subscription was dropped.
    Dropped { reason: DropReason },
}

/// Why a subscription was dropped.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    /// Send buffer overflowed (slow consumer).
    BufferOverflow,
    /// Explicitly unsubscribed.
    Unsubscribed,
}

/// Unique identifier for a subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Handle to receive changes from a subscription.
pub struct SubscriptionHandle {
    pub id: SubscriptionId,
    pub receiver: crossbeam_channel::Receiver<StoreChange>,
}

impl SubscriptionHandle {
    /// Receive the next change (blocking).
    pub fn recv(&self) -> Result<StoreChange, crossbeam_channel::RecvError> {
        self.receiver.recv()
    }

    /// Try to receive a change (non-blocking).
    pub fn try_recv(&self) -> Result<StoreChange, crossbeam_channel::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Receive with timeout.
    pub fn recv_timeout(
        &self,
        timeout: std::time::Duration,
    ) -> Result<StoreChange, crossbeam_channel::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// Drain every change currently buffered.
    pub fn drain(&self) -> Vec<StoreChange> {
        self.receiver.try_iter().collect()
    }
}
