//! Ticket domain events.
//!
//! Events are past-tense facts. Once appended they are never edited; the
//! ordered sequence for a ticket is the source of truth and `TicketState` is
//! a cache derived from it. On the wire each event is a flat JSON record
//! tagged with `_type`.

use chrono::{DateTime, Utc};
use common::{CommentId, CustomerId, TicketId, UserId};
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;

use super::{FieldChange, SlaKind, TicketPriority, TicketStatus, TicketType};

/// Fields common to every ticket event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventMeta {
    pub ticket_id: TicketId,
    pub occurred_at: DateTime<Utc>,
    /// The acting user, or `None` when the system caused the event.
    pub caused_by: Option<UserId>,
}

/// Events that can occur on a ticket aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "_type")]
pub enum TicketEvent {
    TicketCreated(TicketCreated),
    TicketUpdated(TicketUpdated),
    StatusTransitioned(StatusTransitioned),
    TicketClosed(TicketClosed),
    TicketReopened(TicketReopened),
    TicketAssigned(TicketAssigned),
    TicketUnassigned(TicketUnassigned),
    PriorityChanged(PriorityChanged),
    CommentAdded(CommentAdded),
    EmailReplyQueued(EmailReplyQueued),
    TicketMerged(TicketMerged),
    CustomerLinked(CustomerLinked),
    CustomerUnlinked(CustomerUnlinked),
    FirstResponseRecorded(FirstResponseRecorded),
    SlaBreached(SlaBreached),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketCreated {
    #[serde(flatten)]
    pub meta: EventMeta,
    pub title: String,
    pub description: String,
    pub priority: TicketPriority,
    pub ticket_type: TicketType,
    pub reporter_id: UserId,
    pub customer_id: Option<CustomerId>,
    pub order_number: Option<String>,
}

/// Descriptive fields that changed, each with its previous value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketChanges {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<FieldChange<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<FieldChange<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket_type: Option<FieldChange<TicketType>>,
}

impl TicketChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.ticket_type.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketUpdated {
    #[serde(flatten)]
    pub meta: EventMeta,
    pub changes: TicketChanges,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusTransitioned {
    #[serde(flatten)]
    pub meta: EventMeta,
    pub from: TicketStatus,
    pub to: TicketStatus,
    pub reason: Option<String>,
    /// True when the engine triggered the transition as a consequence of another command.
    #[serde(default)]
    pub automatic: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketClosed {
    #[serde(flatten)]
    pub meta: EventMeta,
    /// Status the ticket had before closing, kept for audit.
    pub previous_status: TicketStatus,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketReopened {
    #[serde(flatten)]
    pub meta: EventMeta,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketAssigned {
    #[serde(flatten)]
    pub meta: EventMeta,
    pub assignee_id: UserId,
    pub previous_assignee_id: Option<UserId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketUnassigned {
    #[serde(flatten)]
    pub meta: EventMeta,
    pub previous_assignee_id: UserId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriorityChanged {
    #[serde(flatten)]
    pub meta: EventMeta,
    pub from: TicketPriority,
    pub to: TicketPriority,
    /// True when `to` ranks above `from`.
    pub escalated: bool,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentAdded {
    #[serde(flatten)]
    pub meta: EventMeta,
    pub comment_id: CommentId,
    pub author_id: Option<UserId>,
    pub text: String,
    pub is_from_customer: bool,
    pub is_internal: bool,
    pub is_outgoing_reply: bool,
}

/// Request for the mail collaborator to send a reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailReplyQueued {
    #[serde(flatten)]
    pub meta: EventMeta,
    pub comment_id: CommentId,
    pub to: String,
    pub cc: Vec<String>,
    pub subject: Option<String>,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketMerged {
    #[serde(flatten)]
    pub meta: EventMeta,
    pub source_ticket_id: TicketId,
    pub target_ticket_id: TicketId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerLinked {
    #[serde(flatten)]
    pub meta: EventMeta,
    pub customer_id: CustomerId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerUnlinked {
    #[serde(flatten)]
    pub meta: EventMeta,
    pub previous_customer_id: CustomerId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirstResponseRecorded {
    #[serde(flatten)]
    pub meta: EventMeta,
    pub responded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlaBreached {
    #[serde(flatten)]
    pub meta: EventMeta,
    pub sla_kind: SlaKind,
    pub due_at: DateTime<Utc>,
}

macro_rules! event_variants {
    ($($variant:ident),* $(,)?) => {
        impl TicketEvent {
            /// Fields shared by every event.
            pub fn meta(&self) -> &EventMeta {
                match self {
                    $(TicketEvent::$variant(e) => &e.meta,)*
                }
            }
        }

        impl DomainEvent for TicketEvent {
            fn event_type(&self) -> &'static str {
                match self {
                    $(TicketEvent::$variant(_) => stringify!($variant),)*
                }
            }

            fn aggregate_id(&self) -> &str {
                self.meta().ticket_id.as_str()
            }
        }

        $(
            impl From<$variant> for TicketEvent {
                fn from(event: $variant) -> Self {
                    TicketEvent::$variant(event)
                }
            }
        )*
    };
}

event_variants!(
    TicketCreated,
    TicketUpdated,
    StatusTransitioned,
    TicketClosed,
    TicketReopened,
    TicketAssigned,
    TicketUnassigned,
    PriorityChanged,
    CommentAdded,
    EmailReplyQueued,
    TicketMerged,
    CustomerLinked,
    CustomerUnlinked,
    FirstResponseRecorded,
    SlaBreached,
);

impl TicketEvent {
    pub fn ticket_id(&self) -> &TicketId {
        &self.meta().ticket_id
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.meta().occurred_at
    }

    pub fn caused_by(&self) -> Option<&UserId> {
        self.meta().caused_by.as_ref()
    }

    /// Returns the status change this event realizes, if any.
    pub fn status_change(&self) -> Option<(TicketStatus, TicketStatus)> {
        match self {
            TicketEvent::StatusTransitioned(e) => Some((e.from, e.to)),
            TicketEvent::TicketClosed(e) => Some((e.previous_status, TicketStatus::Closed)),
            _ => None,
        }
    }
}
