//! Command handling infrastructure.
//!
//! The handler is the imperative shell around a [`Decider`]. It:
//! 1. Loads the aggregate state from the event store (snapshot + replay)
//! 2. Asks the decider for events
//! 3. Appends them with an expected version, so a stale writer fails
//! 4. Folds them onto the state and snapshots when due

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Instant;

use common::Clock;
use event_store::{
    EventEnvelope, EventStore, EventStoreError, EventStoreExt, ExpectedVersion, Snapshot,
    StreamId, Version,
};
use thiserror::Error;

use crate::aggregate::{Decider, DomainEvent};

/// Snapshot every this many events unless configured otherwise.
pub const DEFAULT_SNAPSHOT_INTERVAL: u64 = 50;

/// Result of command execution.
pub struct CommandResult<D: Decider> {
    pub stream_id: StreamId,

    /// The state after applying the new events.
    pub state: D::State,

    /// The events that were decided and persisted, in order.
    pub events: Vec<D::Event>,

    /// The stream version after the command.
    pub version: Version,
}

impl<D: Decider> fmt::Debug for CommandResult<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandResult")
            .field("stream_id", &self.stream_id)
            .field("state", &self.state)
            .field("events", &self.events)
            .field("version", &self.version)
            .finish()
    }
}

/// Why a command did not complete.
///
/// `Rejected` carries the decider's own error and means nothing was written.
/// The other variants are infrastructure failures.
#[derive(Debug, Error)]
pub enum CommandError<E> {
    #[error("{0}")]
    Rejected(E),

    #[error("event store error: {0}")]
    EventStore(#[from] EventStoreError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A creation command was accepted but produced no events.
    #[error("command did not create an aggregate")]
    NothingCreated,
}

impl<E> CommandError<E> {
    /// Returns the domain rejection, if that is what this is.
    pub fn rejection(&self) -> Option<&E> {
        match self {
            CommandError::Rejected(e) => Some(e),
            _ => None,
        }
    }

    /// Returns true if another writer appended to the stream first.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            CommandError::EventStore(EventStoreError::ConcurrencyConflict { .. })
        )
    }
}

/// Handler for executing commands against a decider's streams.
pub struct CommandHandler<S, D>
where
    S: EventStore,
    D: Decider,
{
    store: S,
    clock: Arc<dyn Clock>,
    snapshot_interval: u64,
    _decider: PhantomData<D>,
}

impl<S, D> CommandHandler<S, D>
where
    S: EventStore,
    D: Decider,
{
    /// Creates a new command handler with the given event store.
    ///
    /// `clock` stamps the `recorded_at` of stored events.
    pub fn new(store: S, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            snapshot_interval: DEFAULT_SNAPSHOT_INTERVAL,
            _decider: PhantomData,
        }
    }

    /// Sets how many events may accumulate between snapshots. Zero disables them.
    pub fn with_snapshot_interval(mut self, interval: u64) -> Self {
        self.snapshot_interval = interval;
        self
    }

    /// Returns a reference to the underlying event store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Loads the current state of a stream and the version it was read at.
    ///
    /// A stream with no events yields the decider's initial state at
    /// `Version::initial()`.
    pub async fn load(
        &self,
        stream_id: &StreamId,
    ) -> Result<(D::State, Version), CommandError<D::Error>> {
        let (snapshot, envelopes) = self.store.load_stream(stream_id).await?;

        let (mut state, mut version) = match snapshot {
            Some(snapshot) => {
                let version = snapshot.version;
                (snapshot.into_state()?, version)
            }
            None => (D::initial_state(), Version::initial()),
        };

        for envelope in &envelopes {
            let event: D::Event = envelope.decode()?;
            state = D::evolve(&state, &event);
            version = envelope.version;
        }

        Ok((state, version))
    }

    /// Executes a command against an existing stream and persists the result.
    #[tracing::instrument(skip(self, command, context), fields(aggregate = D::aggregate_type()))]
    pub async fn execute(
        &self,
        stream_id: &StreamId,
        command: &D::Command,
        context: &D::Context,
    ) -> Result<CommandResult<D>, CommandError<D::Error>> {
        let started = Instant::now();
        let (state, version) = self.load(stream_id).await?;
        let events = self.decide(command, &state, context)?;
        let result = self.commit(stream_id.clone(), state, version, events).await;
        metrics::histogram!("command_duration_seconds").record(started.elapsed().as_secs_f64());
        result
    }

    /// Executes a command that creates a new aggregate.
    ///
    /// The decider mints the aggregate id, so the stream is named after the
    /// first decided event and must not exist yet.
    #[tracing::instrument(skip(self, command, context), fields(aggregate = D::aggregate_type()))]
    pub async fn create(
        &self,
        command: &D::Command,
        context: &D::Context,
    ) -> Result<CommandResult<D>, CommandError<D::Error>> {
        let state = D::initial_state();
        let events = self.decide(command, &state, context)?;
        let stream_id = match events.first() {
            Some(first) => StreamId::new(first.aggregate_id()),
            None => return Err(CommandError::NothingCreated),
        };
        self.commit(stream_id, state, Version::initial(), events)
            .await
    }

    fn decide(
        &self,
        command: &D::Command,
        state: &D::State,
        context: &D::Context,
    ) -> Result<Vec<D::Event>, CommandError<D::Error>> {
        match D::decide(command, state, context) {
            Ok(events) => {
                metrics::counter!(
                    "commands_total",
                    "aggregate" => D::aggregate_type(),
                    "outcome" => "accepted"
                )
                .increment(1);
                Ok(events)
            }
            Err(error) => {
                metrics::counter!(
                    "commands_total",
                    "aggregate" => D::aggregate_type(),
                    "outcome" => "rejected"
                )
                .increment(1);
                tracing::info!(%error, ?command, "command rejected");
                Err(CommandError::Rejected(error))
            }
        }
    }

    /// Appends decided events after `version` and folds them onto `state`.
    async fn commit(
        &self,
        stream_id: StreamId,
        state: D::State,
        version: Version,
        events: Vec<D::Event>,
    ) -> Result<CommandResult<D>, CommandError<D::Error>> {
        if events.is_empty() {
            tracing::debug!(%stream_id, "command already satisfied, nothing to append");
            return Ok(CommandResult {
                stream_id,
                state,
                events,
                version,
            });
        }

        let envelopes = self.build_envelopes(&stream_id, version, &events)?;
        let new_version = self
            .store
            .append(&stream_id, envelopes, ExpectedVersion::after(version))
            .await?;

        metrics::counter!("events_appended_total", "aggregate" => D::aggregate_type())
            .increment(events.len() as u64);
        tracing::debug!(
            %stream_id,
            count = events.len(),
            version = %new_version,
            "command accepted"
        );

        let state = D::evolve_all(&state, &events);

        if self.snapshot_due(version, new_version) {
            self.snapshot(&stream_id, new_version, &state).await;
        }

        Ok(CommandResult {
            stream_id,
            state,
            events,
            version: new_version,
        })
    }

    /// Builds event envelopes from domain events.
    fn build_envelopes(
        &self,
        stream_id: &StreamId,
        current_version: Version,
        events: &[D::Event],
    ) -> Result<Vec<EventEnvelope>, CommandError<D::Error>> {
        let recorded_at = self.clock.now();
        let mut envelopes = Vec::with_capacity(events.len());
        let mut version = current_version;

        for event in events {
            version = version.next();
            let envelope = EventEnvelope::builder()
                .stream_id(stream_id.clone())
                .stream_type(D::aggregate_type())
                .event_type(event.event_type())
                .version(version)
                .recorded_at(recorded_at)
                .payload(event)?
                .build()?;
            envelopes.push(envelope);
        }

        Ok(envelopes)
    }

    /// True when the append moved the stream across a multiple of the interval.
    fn snapshot_due(&self, before: Version, after: Version) -> bool {
        let Ok(interval) = i64::try_from(self.snapshot_interval) else {
            return false;
        };
        interval > 0 && after.as_i64() / interval > before.as_i64() / interval
    }

    /// Saves a snapshot. The events are already committed, so a failure here
    /// only costs replay time and is logged rather than returned.
    async fn snapshot(&self, stream_id: &StreamId, version: Version, state: &D::State) {
        let snapshot =
            match Snapshot::from_state(stream_id.clone(), version, self.clock.now(), state) {
                Ok(snapshot) => snapshot,
                Err(error) => {
                    tracing::warn!(%stream_id, %error, "failed to serialize snapshot");
                    return;
                }
            };

        match self.store.save_snapshot(snapshot).await {
            Ok(()) => tracing::debug!(%stream_id, %version, "snapshot saved"),
            Err(error) => tracing::warn!(%stream_id, %error, "failed to save snapshot"),
        }
    }
}
