use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;
use serde::{Deserialize, Serialize};

use crate::{EventEnvelope, EventStoreError, Result, Snapshot, StreamId, Version};

/// The stream version a writer believes it is appending after.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpectedVersion {
    /// Append regardless of the current version (use with caution).
    Any,

    /// The stream must not exist yet.
    NoStream,

    /// The stream must be exactly at this version.
    Exact(Version),
}

impl ExpectedVersion {
    /// The expectation matching a stream loaded at `version`.
    pub fn after(version: Version) -> Self {
        if version == Version::initial() {
            Self::NoStream
        } else {
            Self::Exact(version)
        }
    }

    /// Returns true if a stream currently at `current` satisfies this expectation.
    pub fn is_satisfied_by(&self, current: Version) -> bool {
        match self {
            Self::Any => true,
            Self::NoStream => current == Version::initial(),
            Self::Exact(expected) => *expected == current,
        }
    }
}

impl std::fmt::Display for ExpectedVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Any => write!(f, "any version"),
            Self::NoStream => write!(f, "no stream"),
            Self::Exact(v) => write!(f, "version {v}"),
        }
    }
}

/// A stream of events.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<EventEnvelope>> + Send>>;

/// Append-only storage of event streams.
///
/// Implementations must be thread-safe and must apply each append atomically:
/// either the whole batch lands at consecutive versions or nothing does.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Appends a batch to one stream.
    ///
    /// Fails with `ConcurrencyConflict` when `expected` does not match the
    /// stream's current version. Returns the stream version after the append.
    async fn append(
        &self,
        stream_id: &StreamId,
        events: Vec<EventEnvelope>,
        expected: ExpectedVersion,
    ) -> Result<Version>;

    /// Returns every event of a stream in version order.
    async fn read_stream(&self, stream_id: &StreamId) -> Result<Vec<EventEnvelope>>;

    /// Returns the events of a stream at or after `from`.
    async fn read_stream_from(
        &self,
        stream_id: &StreamId,
        from: Version,
    ) -> Result<Vec<EventEnvelope>>;

    /// Returns the current version of a stream, or None if it has no events.
    async fn stream_version(&self, stream_id: &StreamId) -> Result<Option<Version>>;

    /// Streams every stored event in append order, across all streams.
    async fn stream_all(&self) -> Result<EventStream>;

    /// Replaces the snapshot of a stream.
    async fn save_snapshot(&self, snapshot: Snapshot) -> Result<()>;

    /// Returns the latest snapshot of a stream.
    async fn load_snapshot(&self, stream_id: &StreamId) -> Result<Option<Snapshot>>;
}

/// Convenience methods for event stores.
#[async_trait]
pub trait EventStoreExt: EventStore {
    async fn stream_exists(&self, stream_id: &StreamId) -> Result<bool> {
        Ok(self.stream_version(stream_id).await?.is_some())
    }

    /// Loads the latest snapshot (if any) and the events recorded after it.
    async fn load_stream(
        &self,
        stream_id: &StreamId,
    ) -> Result<(Option<Snapshot>, Vec<EventEnvelope>)> {
        if let Some(snapshot) = self.load_snapshot(stream_id).await? {
            let events = self
                .read_stream_from(stream_id, snapshot.version.next())
                .await?;
            Ok((Some(snapshot), events))
        } else {
            Ok((None, self.read_stream(stream_id).await?))
        }
    }
}

impl<T: EventStore + ?Sized> EventStoreExt for T {}

/// Checks that a batch can be appended to a stream currently at `current`.
///
/// The batch must be non-empty, belong entirely to `stream_id`, and carry
/// consecutive versions starting right after `current`.
pub fn validate_append(
    stream_id: &StreamId,
    events: &[EventEnvelope],
    current: Version,
) -> Result<()> {
    if events.is_empty() {
        return Err(EventStoreError::InvalidAppend(
            "cannot append an empty batch".to_string(),
        ));
    }

    let mut expected = current;
    for event in events {
        if &event.stream_id != stream_id {
            return Err(EventStoreError::InvalidAppend(format!(
                "event {} belongs to stream {}, not {}",
                event.event_id, event.stream_id, stream_id
            )));
        }
        expected = expected.next();
        if event.version != expected {
            return Err(EventStoreError::InvalidAppend(format!(
                "versions must be consecutive: expected {}, got {}",
                expected, event.version
            )));
        }
    }

    Ok(())
}
