//! Error types for the event store.

use crate::iterator::CursorState;
use thiserror::Error;

/// Main error type for store and iterator operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// An iterator operation was called outside the `Positioned` state.
    #[error("Invalid iterator state: {operation}() called while {state:?}")]
    InvalidState {
        operation: &'static str,
        state: CursorState,
    },

    #[error("Invalid store configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_state_message() {
        let err = StoreError::InvalidState {
            operation: "current",
            state: CursorState::Fresh,
        };
        assert_eq!(
            err.to_string(),
            "Invalid iterator state: current() called while Fresh"
        );
    }
}
