//! Messaging and adapter errors.

use thiserror::Error;

/// Errors raised by stores, the bus, and the messaging loops.
#[derive(Debug, Error)]
pub enum MessagingError {
    /// Persistence adapter failure.
    #[error("storage failure: {0}")]
    Storage(String),

    /// Bus publish/consume failure.
    #[error("bus failure: {0}")]
    Bus(String),

    /// Payload could not be serialized or deserialized.
    #[error("serialization failure: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A bounded await elapsed.
    #[error("operation timed out: {0}")]
    Timeout(String),
}
