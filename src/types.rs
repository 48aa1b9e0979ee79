//! Core types for the event store.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Store-assigned identifier for a live event.
///
/// Keys come from a monotonically increasing counter and are never reused,
/// even after the event they named has been removed.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct EventKey(pub u64);

impl fmt::Debug for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventKey({})", self.0)
    }
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An immutable, timestamped event.
///
/// Events carry no identity of their own: several events may share both
/// type and timestamp. No validation is applied, so empty types and
/// negative timestamps are accepted.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    event_type: String,
    timestamp: i64,
}

impl Event {
    pub fn new(event_type: impl Into<String>, timestamp: i64) -> Self {
        Self {
            event_type: event_type.into(),
            timestamp,
        }
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// Whether this event has `event_type` and lies in `[start, end)`.
    pub fn matches(&self, event_type: &str, start: i64, end: i64) -> bool {
        self.event_type == event_type && start <= self.timestamp && self.timestamp < end
    }
}

/// Store statistics.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// Events currently live in the store.
    pub event_count: usize,
    /// The key the next insert will receive.
    pub next_key: EventKey,
    pub subscriber_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_accessors() {
        let event = Event::new("some_type", 123);
        assert_eq!(event.timestamp(), 123);
        assert_eq!(event.event_type(), "some_type");
    }

    #[test]
    fn test_matches_half_open_range() {
        let event = Event::new("x", 110);
        assert!(event.matches("x", 110, 111));
        assert!(!event.matches("x", 100, 110));
        assert!(!event.matches("y", 110, 111));
        // Inverted ranges match nothing.
        assert!(!event.matches("x", 111, 100));
    }

    #[test]
    fn test_accepts_unvalidated_fields() {
        let event = Event::new("", -5);
        assert!(event.matches("", -10, 0));
    }

    #[test]
    fn test_key_ordering_and_display() {
        assert!(EventKey(1) < EventKey(2));
        assert_eq!(EventKey(42).to_string(), "42");
        assert_eq!(format!("{:?}", EventKey(7)), "EventKey(7)");
    }
}
