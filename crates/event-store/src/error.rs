use thiserror::Error;

use crate::{ExpectedVersion, StreamId, Version};

/// Errors that can occur when interacting with the event store.
#[derive(Debug, Error)]
pub enum EventStoreError {
    /// Another writer appended to the stream since it was loaded.
    #[error(
        "Concurrency conflict on stream {stream_id}: expected {expected}, found version {actual}"
    )]
    ConcurrencyConflict {
        stream_id: StreamId,
        expected: ExpectedVersion,
        actual: Version,
    },

    /// The batch handed to `append` is malformed.
    #[error("Invalid append: {0}")]
    InvalidAppend(String),

    /// An envelope was built without a required field.
    #[error("Incomplete envelope: missing {0}")]
    IncompleteEnvelope(&'static str),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for event store operations.
pub type Result<T> = std::result::Result<T, EventStoreError>;
