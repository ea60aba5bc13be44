use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{StreamId, Version};

/// Serialized aggregate state at a given stream version.
///
/// Loading resumes from the snapshot and replays only later events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub stream_id: StreamId,

    /// Version of the last event folded into `state`.
    pub version: Version,

    pub taken_at: DateTime<Utc>,

    pub state: serde_json::Value,
}

impl Snapshot {
    /// Serializes `state` into a snapshot.
    pub fn from_state<T: Serialize>(
        stream_id: StreamId,
        version: Version,
        taken_at: DateTime<Utc>,
        state: &T,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            stream_id,
            version,
            taken_at,
            state: serde_json::to_value(state)?,
        })
    }

    /// Deserializes the snapshot state into a concrete type.
    pub fn into_state<T: for<'de> Deserialize<'de>>(self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.state)
    }
}
