//! State engine error types.

use thiserror::Error;

/// Errors surfaced by the state engine.
///
/// Operations on missing ids are no-ops, not errors. These variants cover
/// caller bugs, money arithmetic, and the storage mirror.
#[derive(Error, Debug)]
pub enum StateError {
    /// Address not found in the address book.
    #[error("Address not found: {0}")]
    AddressNotFound(String),

    /// Currency mismatch.
    #[error("Currency mismatch: expected {expected}, got {got}")]
    CurrencyMismatch { expected: String, got: String },

    /// Arithmetic overflow.
    #[error("Arithmetic overflow in money calculation")]
    Overflow,

    /// Storage backend error.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Validation error.
    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<serde_json::Error> for StateError {
    fn from(e: serde_json::Error) -> Self {
        StateError::Serialization(e.to_string())
    }
}
