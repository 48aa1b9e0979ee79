//! Change feed for live store mutations.
//!
//! Subscribers receive a [`StoreChange`] for every insert and every
//! successful removal, optionally filtered by event type. Buffers are
//! bounded and a subscriber that falls behind is dropped.
//!
//! # Example
//!
//! ```ignore
//! let store = EventStore::new();
//! let handle = store.subscribe(SubscriptionConfig {
//!     filter: SubscriptionFilter::event_types(vec!["login".to_string()]),
//!     ..Default::default()
//! });
//!
//! store.insert(Event::new("login", 1));
//!
//! match handle.recv() {
//!     Ok(StoreChange::Inserted { key, event }) => println!("{key}: {event:?}"),
//!     Ok(StoreChange::Dropped { reason }) => println!("dropped: {reason:?}"),
//!     _ => {}
//! }
//! ```

mod manager;
mod types;

pub use manager::SubscriptionManager;
pub use types::{
    DropReason, StoreChange, SubscriptionConfig, SubscriptionFilter, SubscriptionHandle,
    SubscriptionId,
};
