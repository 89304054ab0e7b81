//! Key-value store error types.

use shopstate_core::StateError;
use thiserror::Error;

/// Errors that can occur when using the store.
#[derive(Error, Debug)]
pub enum KvError {
    /// Failed to open the store.
    #[error("Failed to open store: {0}")]
    OpenError(String),

    /// Failed to serialize or deserialize a value.
    #[error("Serialization error: {0}")]
    SerializeError(#[from] serde_json::Error),

    /// Failed to perform a store operation.
    #[error("Store operation failed: {0}")]
    StoreError(String),

    /// Key contains characters the backend cannot store.
    #[error("Invalid key: {0:?}")]
    InvalidKey(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<KvError> for StateError {
    fn from(e: KvError) -> Self {
        match e {
            KvError::SerializeError(e) => StateError::Serialization(e.to_string()),
            other => StateError::Storage(other.to_string()),
        }
    }
}
