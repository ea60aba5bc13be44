use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    EventEnvelope, EventStoreError, Result, Snapshot, StreamId, Version,
    store::{EventStore, EventStream, ExpectedVersion, validate_append},
};

#[derive(Default)]
struct Inner {
    streams: HashMap<StreamId, Vec<EventEnvelope>>,
    log: Vec<EventEnvelope>,
    snapshots: HashMap<StreamId, Snapshot>,
}

/// In-memory event store.
///
/// All writes go through one lock, so the version check and the append of a
/// batch happen atomically with respect to other writers.
#[derive(Clone, Default)]
pub struct InMemoryEventStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of events stored across all streams.
    pub async fn event_count(&self) -> usize {
        self.inner.read().await.log.len()
    }

    /// Removes all events and snapshots.
    pub async fn clear(&self) {
        let mut inner = self.inner.write().await;
        inner.streams.clear();
        inner.log.clear();
        inner.snapshots.clear();
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn append(
        &self,
        stream_id: &StreamId,
        events: Vec<EventEnvelope>,
        expected: ExpectedVersion,
    ) -> Result<Version> {
        let mut inner = self.inner.write().await;

        let current = inner
            .streams
            .get(stream_id)
            .and_then(|events| events.last())
            .map(|e| e.version)
            .unwrap_or(Version::initial());

        if !expected.is_satisfied_by(current) {
            metrics::counter!("event_store_conflicts_total").increment(1);
            tracing::debug!(%stream_id, %expected, %current, "append rejected: version conflict");
            return Err(EventStoreError::ConcurrencyConflict {
                stream_id: stream_id.clone(),
                expected,
                actual: current,
            });
        }

        validate_append(stream_id, &events, current)?;

        let count = events.len();
        let last = events.last().map(|e| e.version).unwrap_or(current);
        inner.log.extend(events.iter().cloned());
        inner
            .streams
            .entry(stream_id.clone())
            .or_default()
            .extend(events);

        metrics::counter!("event_store_appends_total").increment(count as u64);
        tracing::debug!(%stream_id, count, version = %last, "events appended");

        Ok(last)
    }

    async fn read_stream(&self, stream_id: &StreamId) -> Result<Vec<EventEnvelope>> {
        let inner = self.inner.read().await;
        Ok(inner.streams.get(stream_id).cloned().unwrap_or_default())
    }

    async fn read_stream_from(
        &self,
        stream_id: &StreamId,
        from: Version,
    ) -> Result<Vec<EventEnvelope>> {
        let inner = self.inner.read().await;
        Ok(inner
            .streams
            .get(stream_id)
            .map(|events| {
                events
                    .iter()
                    .filter(|e| e.version >= from)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn stream_version(&self, stream_id: &StreamId) -> Result<Option<Version>> {
        let inner = self.inner.read().await;
        Ok(inner
            .streams
            .get(stream_id)
            .and_then(|events| events.last())
            .map(|e| e.version))
    }

    async fn stream_all(&self) -> Result<EventStream> {
        use futures_util::stream;

        let events = self.inner.read().await.log.clone();
        Ok(Box::pin(stream::iter(events.into_iter().map(Ok))))
    }

    async fn save_snapshot(&self, snapshot: Snapshot) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.snapshots.insert(snapshot.stream_id.clone(), snapshot);
        Ok(())
    }

    async fn load_snapshot(&self, stream_id: &StreamId) -> Result<Option<Snapshot>> {
        let inner = self.inner.read().await;
        Ok(inner.snapshots.get(stream_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::EventStoreExt;
    use chrono::Utc;

    fn event(stream: &StreamId, version: i64, event_type: &str) -> EventEnvelope {
        EventEnvelope::builder()
            .stream_id(stream.clone())
            .stream_type("Ticket")
            .event_type(event_type)
            .version(Version::new(version))
            .recorded_at(Utc::now())
            .payload_raw(serde_json::json!({"test": true}))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn append_to_new_stream() {
        let store = InMemoryEventStore::new();
        let stream = StreamId::new("t-1");

        let version = store
            .append(
                &stream,
                vec![event(&stream, 1, "TicketCreated")],
                ExpectedVersion::NoStream,
            )
            .await
            .unwrap();

        assert_eq!(version, Version::first());
        assert_eq!(store.read_stream(&stream).await.unwrap().len(), 1);
        assert_eq!(store.event_count().await, 1);
    }

    #[tokio::test]
    async fn append_batch_returns_last_version() {
        let store = InMemoryEventStore::new();
        let stream = StreamId::new("t-1");

        let batch = vec![
            event(&stream, 1, "TicketCreated"),
            event(&stream, 2, "TicketAssigned"),
            event(&stream, 3, "StatusTransitioned"),
        ];
        let version = store
            .append(&stream, batch, ExpectedVersion::NoStream)
            .await
            .unwrap();

        assert_eq!(version, Version::new(3));
    }

    #[tokio::test]
    async fn stale_writer_gets_conflict() {
        let store = InMemoryEventStore::new();
        let stream = StreamId::new("t-1");
        store
            .append(
                &stream,
                vec![event(&stream, 1, "TicketCreated")],
                ExpectedVersion::NoStream,
            )
            .await
            .unwrap();

        // Two writers both loaded version 1; the first wins.
        store
            .append(
                &stream,
                vec![event(&stream, 2, "TicketAssigned")],
                ExpectedVersion::Exact(Version::first()),
            )
            .await
            .unwrap();
        let result = store
            .append(
                &stream,
                vec![event(&stream, 2, "PriorityChanged")],
                ExpectedVersion::Exact(Version::first()),
            )
            .await;

        assert!(matches!(
            result,
            Err(EventStoreError::ConcurrencyConflict { actual, .. }) if actual == Version::new(2)
        ));
        assert_eq!(store.read_stream(&stream).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn creating_existing_stream_conflicts() {
        let store = InMemoryEventStore::new();
        let stream = StreamId::new("t-1");
        store
            .append(
                &stream,
                vec![event(&stream, 1, "TicketCreated")],
                ExpectedVersion::NoStream,
            )
            .await
            .unwrap();

        let result = store
            .append(
                &stream,
                vec![event(&stream, 1, "TicketCreated")],
                ExpectedVersion::NoStream,
            )
            .await;
        assert!(matches!(
            result,
            Err(EventStoreError::ConcurrencyConflict { .. })
        ));
    }

    #[tokio::test]
    async fn append_with_gap_is_invalid() {
        let store = InMemoryEventStore::new();
        let stream = StreamId::new("t-1");

        let result = store
            .append(
                &stream,
                vec![event(&stream, 2, "TicketCreated")],
                ExpectedVersion::Any,
            )
            .await;
        assert!(matches!(result, Err(EventStoreError::InvalidAppend(_))));
        assert_eq!(store.event_count().await, 0);
    }

    #[tokio::test]
    async fn read_from_version() {
        let store = InMemoryEventStore::new();
        let stream = StreamId::new("t-1");
        let batch = (1..=3).map(|v| event(&stream, v, "E")).collect();
        store
            .append(&stream, batch, ExpectedVersion::NoStream)
            .await
            .unwrap();

        let tail = store
            .read_stream_from(&stream, Version::new(2))
            .await
            .unwrap();
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[0].version, Version::new(2));
    }

    #[tokio::test]
    async fn streams_are_isolated() {
        let store = InMemoryEventStore::new();
        let a = StreamId::new("t-a");
        let b = StreamId::new("t-b");
        store
            .append(&a, vec![event(&a, 1, "E")], ExpectedVersion::NoStream)
            .await
            .unwrap();
        store
            .append(&b, vec![event(&b, 1, "E")], ExpectedVersion::NoStream)
            .await
            .unwrap();

        assert_eq!(
            store.stream_version(&a).await.unwrap(),
            Some(Version::first())
        );
        assert_eq!(store.read_stream(&b).await.unwrap().len(), 1);
        assert!(
            !store
                .stream_exists(&StreamId::new("t-c"))
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn stream_all_preserves_append_order() {
        use futures_util::StreamExt;

        let store = InMemoryEventStore::new();
        let a = StreamId::new("t-a");
        let b = StreamId::new("t-b");
        store
            .append(&a, vec![event(&a, 1, "First")], ExpectedVersion::NoStream)
            .await
            .unwrap();
        store
            .append(&b, vec![event(&b, 1, "Second")], ExpectedVersion::NoStream)
            .await
            .unwrap();

        let all: Vec<_> = store.stream_all().await.unwrap().collect().await;
        let types: Vec<_> = all
            .into_iter()
            .map(|e| e.unwrap().event_type)
            .collect();
        assert_eq!(types, vec!["First", "Second"]);
    }

    #[tokio::test]
    async fn load_stream_resumes_after_snapshot() {
        let store = InMemoryEventStore::new();
        let stream = StreamId::new("t-1");
        let batch = (1..=4).map(|v| event(&stream, v, "E")).collect();
        store
            .append(&stream, batch, ExpectedVersion::NoStream)
            .await
            .unwrap();

        let snapshot = Snapshot::from_state(
            stream.clone(),
            Version::new(3),
            Utc::now(),
            &serde_json::json!({"comments": 2}),
        )
        .unwrap();
        store.save_snapshot(snapshot).await.unwrap();

        let (snapshot, events) = store.load_stream(&stream).await.unwrap();
        assert_eq!(snapshot.unwrap().version, Version::new(3));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].version, Version::new(4));
    }

    #[tokio::test]
    async fn clear_empties_store() {
        let store = InMemoryEventStore::new();
        let stream = StreamId::new("t-1");
        store
            .append(&stream, vec![event(&stream, 1, "E")], ExpectedVersion::NoStream)
            .await
            .unwrap();

        store.clear().await;
        assert_eq!(store.event_count().await, 0);
        assert!(store.load_snapshot(&stream).await.unwrap().is_none());
    }
}
