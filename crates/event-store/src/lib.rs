//! Persistence boundary for event-sourced ticket streams.
//!
//! The store owns the ordered event log of every stream and enforces the
//! single-writer guarantee through version-checked appends.

pub mod error;
pub mod event;
pub mod memory;
pub mod snapshot;
pub mod store;

pub use error::{EventStoreError, Result};
pub use event::{EventEnvelope, EventEnvelopeBuilder, EventId, StreamId, Version};
pub use memory::InMemoryEventStore;
pub use snapshot::Snapshot;
pub use store::{EventStore, EventStoreExt, EventStream, ExpectedVersion};
