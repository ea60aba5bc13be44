//! The full ticket read model.
//!
//! `TicketState` keeps only what decisions need. `Ticket` is the richer view
//! shown to agents: it keeps the comment thread, the order number and the
//! closing time. For any history that starts with `TicketCreated`, both folds
//! agree on every field they share.

use chrono::{DateTime, Utc};
use common::{CommentId, CustomerId, TicketId, UserId};
use serde::{Deserialize, Serialize};

use super::events::TicketCreated;
use super::{TicketEvent, TicketPriority, TicketState, TicketStatus, TicketType};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: CommentId,
    pub author_id: Option<UserId>,
    pub text: String,
    pub is_from_customer: bool,
    pub is_internal: bool,
    pub is_outgoing_reply: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: TicketId,
    pub title: String,
    pub description: String,
    pub status: TicketStatus,
    pub priority: TicketPriority,
    pub ticket_type: TicketType,
    pub reporter_id: UserId,
    pub assignee_id: Option<UserId>,
    pub customer_id: Option<CustomerId>,
    pub order_number: Option<String>,
    pub comments: Vec<Comment>,
    pub merged_into_ticket_id: Option<TicketId>,
    pub first_response_at: Option<DateTime<Utc>>,
    pub sla_breached_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

impl Ticket {
    fn created(e: &TicketCreated) -> Self {
        Self {
            id: e.meta.ticket_id.clone(),
            title: e.title.clone(),
            description: e.description.clone(),
            status: TicketStatus::New,
            priority: e.priority,
            ticket_type: e.ticket_type,
            reporter_id: e.reporter_id.clone(),
            assignee_id: None,
            customer_id: e.customer_id.clone(),
            order_number: e.order_number.clone(),
            comments: Vec::new(),
            merged_into_ticket_id: None,
            first_response_at: None,
            sla_breached_at: None,
            created_at: e.meta.occurred_at,
            updated_at: e.meta.occurred_at,
            closed_at: None,
        }
    }

    /// Builds the read model from a ticket's history.
    ///
    /// Returns `None` when the history has no `TicketCreated`. Events that
    /// precede it are ignored, so a history with such events only agrees with
    /// `reconstitute_from_events` from the creation onwards.
    pub fn from_events<'a>(events: impl IntoIterator<Item = &'a TicketEvent>) -> Option<Self> {
        events
            .into_iter()
            .fold(None, |ticket: Option<Ticket>, event| match (ticket, event) {
                (None, TicketEvent::TicketCreated(e)) => Some(Ticket::created(e)),
                (None, _) => None,
                (Some(mut ticket), event) => {
                    ticket.apply(event);
                    Some(ticket)
                }
            })
    }

    /// Applies one event in place.
    pub fn apply(&mut self, event: &TicketEvent) {
        let at = event.occurred_at();
        self.updated_at = at;

        match event {
            // Creation is only meaningful once.
            TicketEvent::TicketCreated(_) => {}
            TicketEvent::TicketUpdated(e) => {
                if let Some(change) = &e.changes.title {
                    self.title = change.to.clone();
                }
                if let Some(change) = &e.changes.description {
                    self.description = change.to.clone();
                }
                if let Some(change) = &e.changes.ticket_type {
                    self.ticket_type = change.to;
                }
            }
            TicketEvent::StatusTransitioned(e) => {
                self.status = e.to;
                if e.to == TicketStatus::Closed {
                    self.closed_at = Some(at);
                } else if e.from == TicketStatus::Closed {
                    self.closed_at = None;
                }
            }
            TicketEvent::TicketClosed(_) => {
                self.status = TicketStatus::Closed;
                self.closed_at = Some(at);
            }
            TicketEvent::TicketReopened(_) => {
                self.status = TicketStatus::Open;
                self.closed_at = None;
            }
            TicketEvent::TicketAssigned(e) => self.assignee_id = Some(e.assignee_id.clone()),
            TicketEvent::TicketUnassigned(_) => self.assignee_id = None,
            TicketEvent::PriorityChanged(e) => self.priority = e.to,
            TicketEvent::CommentAdded(e) => self.comments.push(Comment {
                id: e.comment_id.clone(),
                author_id: e.author_id.clone(),
                text: e.text.clone(),
                is_from_customer: e.is_from_customer,
                is_internal: e.is_internal,
                is_outgoing_reply: e.is_outgoing_reply,
                created_at: at,
            }),
            TicketEvent::EmailReplyQueued(_) => {}
            TicketEvent::TicketMerged(e) => {
                self.merged_into_ticket_id = Some(e.target_ticket_id.clone())
            }
            TicketEvent::CustomerLinked(e) => self.customer_id = Some(e.customer_id.clone()),
            TicketEvent::CustomerUnlinked(_) => self.customer_id = None,
            TicketEvent::FirstResponseRecorded(e) => self.first_response_at = Some(e.responded_at),
            TicketEvent::SlaBreached(_) => self.sla_breached_at = Some(at),
        }
    }

    /// Comments the customer may see.
    pub fn public_comments(&self) -> impl Iterator<Item = &Comment> {
        self.comments.iter().filter(|c| !c.is_internal)
    }

    /// Projects the decision state out of the read model.
    pub fn to_state(&self) -> TicketState {
        TicketState {
            id: Some(self.id.clone()),
            status: self.status,
            priority: self.priority,
            ticket_type: self.ticket_type,
            title: self.title.clone(),
            description: self.description.clone(),
            assignee_id: self.assignee_id.clone(),
            reporter_id: Some(self.reporter_id.clone()),
            customer_id: self.customer_id.clone(),
            comment_count: self.comments.len() as u32,
            has_first_response: self.first_response_at.is_some(),
            first_response_at: self.first_response_at,
            sla_breached: self.sla_breached_at.is_some(),
            sla_breached_at: self.sla_breached_at,
            merged_into_ticket_id: self.merged_into_ticket_id.clone(),
            created_at: Some(self.created_at),
            updated_at: Some(self.updated_at),
        }
    }
}
