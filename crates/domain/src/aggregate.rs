//! Core decider and domain event traits.

use std::fmt::Debug;

use serde::{Serialize, de::DeserializeOwned};

/// Trait for domain events.
///
/// Domain events represent facts that have happened in the domain.
/// They are immutable and should be named in past tense.
pub trait DomainEvent: Serialize + DeserializeOwned + Debug + Clone + Send + Sync {
    /// Returns the event type name.
    ///
    /// This is used for serialization and event store filtering.
    fn event_type(&self) -> &'static str;

    /// Returns the identifier of the aggregate the event belongs to.
    fn aggregate_id(&self) -> &str;
}

/// A pure, event-sourced decision model.
///
/// A decider has no state of its own. It describes how an aggregate:
/// - Decides: turns a command and the current state into events or a rejection
/// - Evolves: folds one event onto a state, producing the next state
/// - Starts: the state before any event
///
/// Both functions must be deterministic and free of side effects, so they can
/// be called from any thread and replayed at any time.
pub trait Decider: Send + Sync + 'static {
    /// Intents this decider handles.
    type Command: Debug + Send + Sync;

    /// Facts this decider emits and folds.
    type Event: DomainEvent;

    /// The projection decisions are made against.
    type State: Clone + Debug + Serialize + DeserializeOwned + Send + Sync;

    /// Why a command was rejected.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Injected effectful values `decide` may consume (e.g. fresh ids).
    type Context: ?Sized + Sync;

    /// Returns the aggregate type name.
    ///
    /// Used as the stream type in the event store.
    fn aggregate_type() -> &'static str;

    /// The state of an aggregate that has no events yet.
    fn initial_state() -> Self::State;

    /// Decides which events realize `command` given `state`.
    fn decide(
        command: &Self::Command,
        state: &Self::State,
        context: &Self::Context,
    ) -> Result<Vec<Self::Event>, Self::Error>;

    /// Applies one event, returning the next state. Must not fail.
    fn evolve(state: &Self::State, event: &Self::Event) -> Self::State;

    /// Applies events left to right.
    fn evolve_all<'a, I>(state: &Self::State, events: I) -> Self::State
    where
        I: IntoIterator<Item = &'a Self::Event>,
        Self::Event: 'a,
    {
        events
            .into_iter()
            .fold(state.clone(), |state, event| Self::evolve(&state, event))
    }

    /// Rebuilds a state from its full history.
    fn reconstitute<'a, I>(events: I) -> Self::State
    where
        I: IntoIterator<Item = &'a Self::Event>,
        Self::Event: 'a,
    {
        Self::evolve_all(&Self::initial_state(), events)
    }
}
