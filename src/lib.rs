//! # Event Store
//!
//! A concurrent, in-memory store for timestamped events.
//!
//! ## Core Concepts
//!
//! - **Events**: Immutable `(type, timestamp)` values
//! - **Keys**: Unique, never-reused identifiers assigned on insert
//! - **Queries**: Type + time-range scans that capture a private snapshot
//! - **Iterators**: Cursor over a snapshot, able to remove from the live store
//! - **Subscriptions**: Bounded change feed of inserts and removals
//!
//! ## Example
//!
//! ```
//! use event_store::{Event, EventStore};
//!
//! let store = EventStore::new();
//! store.insert(Event::new("x", 111));
//! store.insert(Event::new("y", 112));
//! store.insert(Event::new("x", 113));
//!
//! let mut it = store.query("x", 110, 114);
//! while it.move_next() {
//!     let event = it.current()?;
//!     if event.timestamp() == 111 {
//!         it.remove()?;
//!     }
//! }
//! it.close();
//!
//! assert_eq!(store.number_of_events(), 2);
//! # Ok::<(), event_store::StoreError>(())
//! ```

pub mod error;
pub mod iterator;
pub mod store;
pub mod subscriptions;
pub mod types;

// Re-exports
pub use error::{Result, StoreError};
pub use iterator::{CursorState, EventIterator};
pub use store::{EventStore, StoreConfig, MAX_FIRST_KEY};
pub use subscriptions::{
    DropReason, StoreChange, SubscriptionConfig, SubscriptionFilter, SubscriptionHandle,
    SubscriptionId, SubscriptionManager,
};
pub use types::*;
