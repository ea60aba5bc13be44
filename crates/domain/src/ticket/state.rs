//! Decision state of a ticket.

use chrono::{DateTime, Utc};
use common::{CustomerId, TicketId, UserId};
use serde::{Deserialize, Serialize};

use super::{TicketPriority, TicketStatus, TicketType};

/// The minimal projection of a ticket that `decide` needs.
///
/// `id` is `None` until a `TicketCreated` event has been folded. Instances are
/// never mutated in place by the engine: `evolve` always returns a new value.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketState {
    pub id: Option<TicketId>,
    pub status: TicketStatus,
    pub priority: TicketPriority,
    pub ticket_type: TicketType,

    /// Current title, kept so edits can report their previous value.
    pub title: String,
    pub description: String,

    pub assignee_id: Option<UserId>,
    pub reporter_id: Option<UserId>,
    pub customer_id: Option<CustomerId>,

    pub comment_count: u32,

    pub has_first_response: bool,
    pub first_response_at: Option<DateTime<Utc>>,

    pub sla_breached: bool,
    pub sla_breached_at: Option<DateTime<Utc>>,

    /// Set once the ticket has been merged; a merged ticket is closed for good.
    pub merged_into_ticket_id: Option<TicketId>,

    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl TicketState {
    /// The state of a ticket before any event: not yet created.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns true once `TicketCreated` has been applied.
    pub fn exists(&self) -> bool {
        self.id.is_some()
    }

    pub fn is_closed(&self) -> bool {
        self.status.is_closed()
    }

    pub fn is_merged(&self) -> bool {
        self.merged_into_ticket_id.is_some()
    }

    pub fn is_assigned(&self) -> bool {
        self.assignee_id.is_some()
    }
}

/// Shorthand for [`TicketState::empty`].
pub fn empty_ticket_state() -> TicketState {
    TicketState::empty()
}
