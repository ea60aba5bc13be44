//! Folding events onto ticket state.

use crate::aggregate::Decider;
use crate::error::DomainError;

use super::decide::{DecideContext, decide};
use super::{TicketCommand, TicketEvent, TicketState, TicketStatus};

/// Applies one event to `state`, returning the next state.
///
/// The input is left untouched. Every event refreshes `updated_at`.
pub fn evolve(state: &TicketState, event: &TicketEvent) -> TicketState {
    let mut next = state.clone();
    next.updated_at = Some(event.occurred_at());

    match event {
        TicketEvent::TicketCreated(e) => {
            next.id = Some(e.meta.ticket_id.clone());
            next.status = TicketStatus::New;
            next.priority = e.priority;
            next.ticket_type = e.ticket_type;
            next.title = e.title.clone();
            next.description = e.description.clone();
            next.reporter_id = Some(e.reporter_id.clone());
            next.customer_id = e.customer_id.clone();
            next.created_at = Some(e.meta.occurred_at);
        }
        TicketEvent::TicketUpdated(e) => {
            if let Some(change) = &e.changes.title {
                next.title = change.to.clone();
            }
            if let Some(change) = &e.changes.description {
                next.description = change.to.clone();
            }
            if let Some(change) = &e.changes.ticket_type {
                next.ticket_type = change.to;
            }
        }
        TicketEvent::StatusTransitioned(e) => next.status = e.to,
        TicketEvent::TicketClosed(_) => next.status = TicketStatus::Closed,
        TicketEvent::TicketReopened(_) => next.status = TicketStatus::Open,
        TicketEvent::TicketAssigned(e) => next.assignee_id = Some(e.assignee_id.clone()),
        TicketEvent::TicketUnassigned(_) => next.assignee_id = None,
        TicketEvent::PriorityChanged(e) => next.priority = e.to,
        TicketEvent::CommentAdded(_) => next.comment_count += 1,
        // The reply itself was counted by its CommentAdded.
        TicketEvent::EmailReplyQueued(_) => {}
        TicketEvent::TicketMerged(e) => {
            next.merged_into_ticket_id = Some(e.target_ticket_id.clone())
        }
        TicketEvent::CustomerLinked(e) => next.customer_id = Some(e.customer_id.clone()),
        TicketEvent::CustomerUnlinked(_) => next.customer_id = None,
        TicketEvent::FirstResponseRecorded(e) => {
            next.has_first_response = true;
            next.first_response_at = Some(e.responded_at);
        }
        TicketEvent::SlaBreached(e) => {
            next.sla_breached = true;
            next.sla_breached_at = Some(e.meta.occurred_at);
        }
    }

    next
}

/// Applies events left to right.
pub fn evolve_all<'a>(
    state: &TicketState,
    events: impl IntoIterator<Item = &'a TicketEvent>,
) -> TicketState {
    events
        .into_iter()
        .fold(state.clone(), |state, event| evolve(&state, event))
}

/// Rebuilds a ticket's state from its full history.
pub fn reconstitute_from_events<'a>(
    events: impl IntoIterator<Item = &'a TicketEvent>,
) -> TicketState {
    evolve_all(&TicketState::empty(), events)
}

/// The ticket aggregate as a [`Decider`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TicketDecider;

impl Decider for TicketDecider {
    type Command = TicketCommand;
    type Event = TicketEvent;
    type State = TicketState;
    type Error = DomainError;
    type Context = dyn DecideContext;

    fn aggregate_type() -> &'static str {
        "Ticket"
    }

    fn initial_state() -> TicketState {
        TicketState::empty()
    }

    fn decide(
        command: &TicketCommand,
        state: &TicketState,
        context: &dyn DecideContext,
    ) -> Result<Vec<TicketEvent>, DomainError> {
        decide(command, state, context)
    }

    fn evolve(state: &TicketState, event: &TicketEvent) -> TicketState {
        evolve(state, event)
    }
}
