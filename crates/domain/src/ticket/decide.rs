//! The ticket decision function.
//!
//! `decide` maps a command and the current [`TicketState`] to the ordered
//! events that realize it, including automatic follow-up transitions, or to
//! the [`DomainError`] explaining the rejection. It reads nothing but its
//! arguments; the only effectful values it consumes are fresh identifiers
//! pulled from the injected [`DecideContext`].

use std::sync::Arc;

use common::result::ensure;
use common::{CommentId, IdGenerator, TicketId};

use crate::error::DomainError;

use super::commands::*;
use super::events::*;
use super::{FieldChange, TicketPriority, TicketState, TicketStatus};

const AUTO_ON_ASSIGNMENT: &str = "Auto-transitioned on assignment.";
const AUTO_ON_CUSTOMER_REPLY: &str = "Auto-transitioned on customer reply";
const AUTO_ON_AGENT_REPLY: &str = "Auto-transitioned on agent reply";
const CLOSED_BY_MERGE: &str = "Merged into another ticket";

/// Identifiers `decide` may mint for entities it creates.
pub trait DecideContext: Send + Sync {
    fn generate_ticket_id(&self) -> TicketId;
    fn generate_comment_id(&self) -> CommentId;
}

/// A [`DecideContext`] backed by an [`IdGenerator`].
#[derive(Clone)]
pub struct IdGeneratorContext {
    ids: Arc<dyn IdGenerator>,
}

impl IdGeneratorContext {
    pub fn new(ids: Arc<dyn IdGenerator>) -> Self {
        Self { ids }
    }
}

impl DecideContext for IdGeneratorContext {
    fn generate_ticket_id(&self) -> TicketId {
        TicketId::new(self.ids.generate())
    }

    fn generate_comment_id(&self) -> CommentId {
        CommentId::new(self.ids.generate())
    }
}

/// Decides which events realize `command` against `state`.
///
/// An empty list means the command is already satisfied (e.g. transitioning
/// to the current status) and nothing needs to be recorded.
pub fn decide(
    command: &TicketCommand,
    state: &TicketState,
    ctx: &dyn DecideContext,
) -> Result<Vec<TicketEvent>, DomainError> {
    match command {
        TicketCommand::CreateTicket(cmd) => create_ticket(cmd, state, ctx),
        TicketCommand::UpdateTicket(cmd) => update_ticket(cmd, state),
        TicketCommand::TransitionStatus(cmd) => transition_status(cmd, state),
        TicketCommand::CloseTicket(cmd) => close_ticket(cmd, state),
        TicketCommand::ReopenTicket(cmd) => reopen_ticket(cmd, state),
        TicketCommand::AssignTicket(cmd) => assign_ticket(cmd, state),
        TicketCommand::UnassignTicket(cmd) => unassign_ticket(cmd, state),
        TicketCommand::ChangePriority(cmd) => change_priority(
            &cmd.meta,
            cmd.new_priority,
            cmd.reason.clone(),
            state,
        ),
        TicketCommand::EscalatePriority(cmd) => change_priority(
            &cmd.meta,
            TicketPriority::Urgent,
            cmd.reason.clone(),
            state,
        ),
        TicketCommand::AddComment(cmd) => add_comment(cmd, state, ctx),
        TicketCommand::AddEmailReply(cmd) => add_email_reply(cmd, state, ctx),
        TicketCommand::MergeTicket(cmd) => merge_ticket(cmd, state),
        TicketCommand::LinkToCustomer(cmd) => link_to_customer(cmd, state),
        TicketCommand::UnlinkFromCustomer(cmd) => unlink_from_customer(cmd, state),
        TicketCommand::RecordFirstResponse(cmd) => {
            let id = existing(state)?;
            Ok(vec![
                FirstResponseRecorded {
                    meta: event_meta(id, &cmd.meta),
                    responded_at: cmd.responded_at,
                }
                .into(),
            ])
        }
        TicketCommand::BreachSla(cmd) => {
            let id = existing(state)?;
            Ok(vec![
                SlaBreached {
                    meta: event_meta(id, &cmd.meta),
                    sla_kind: cmd.sla_kind,
                    due_at: cmd.due_at,
                }
                .into(),
            ])
        }
    }
}

/// Checks whether a ticket in `state` may be merged into `target`.
pub fn can_merge(state: &TicketState, target: &TicketId) -> Result<(), DomainError> {
    let id = existing(state)?;
    ensure(id != target, || DomainError::CannotMergeIntoSelf {
        ticket_id: id.clone(),
    })?;
    not_merged(state)?;
    ensure(!state.is_closed(), || DomainError::CannotMergeClosedTicket {
        ticket_id: id.clone(),
    })
}

fn existing(state: &TicketState) -> Result<&TicketId, DomainError> {
    state.id.as_ref().ok_or(DomainError::TicketNotFound)
}

fn not_merged(state: &TicketState) -> Result<(), DomainError> {
    match &state.merged_into_ticket_id {
        Some(target) => Err(DomainError::TicketAlreadyMerged {
            merged_into: target.clone(),
        }),
        None => Ok(()),
    }
}

fn event_meta(ticket_id: &TicketId, meta: &CommandMeta) -> EventMeta {
    EventMeta {
        ticket_id: ticket_id.clone(),
        occurred_at: meta.timestamp,
        caused_by: meta.actor_id.clone(),
    }
}

fn automatic_transition(
    ticket_id: &TicketId,
    meta: &CommandMeta,
    from: TicketStatus,
    to: TicketStatus,
    reason: &str,
) -> TicketEvent {
    StatusTransitioned {
        meta: event_meta(ticket_id, meta),
        from,
        to,
        reason: Some(reason.to_string()),
        automatic: true,
    }
    .into()
}

fn create_ticket(
    cmd: &CreateTicket,
    state: &TicketState,
    ctx: &dyn DecideContext,
) -> Result<Vec<TicketEvent>, DomainError> {
    if let Some(id) = &state.id {
        return Err(DomainError::TicketAlreadyExists {
            ticket_id: id.clone(),
        });
    }

    let title = cmd.title.trim();
    ensure(!title.is_empty(), || DomainError::TitleRequired)?;
    let reporter_id = cmd
        .reporter_id
        .clone()
        .ok_or(DomainError::ReporterRequired)?;

    let ticket_id = ctx.generate_ticket_id();
    let mut events = vec![
        TicketCreated {
            meta: event_meta(&ticket_id, &cmd.meta),
            title: title.to_string(),
            description: cmd.description.clone(),
            priority: cmd.priority,
            ticket_type: cmd.ticket_type,
            reporter_id,
            customer_id: cmd.customer_id.clone(),
            order_number: cmd.order_number.clone(),
        }
        .into(),
    ];

    if let Some(assignee_id) = &cmd.assignee_id {
        events.push(
            TicketAssigned {
                meta: event_meta(&ticket_id, &cmd.meta),
                assignee_id: assignee_id.clone(),
                previous_assignee_id: None,
            }
            .into(),
        );
    }

    Ok(events)
}

fn update_ticket(
    cmd: &UpdateTicket,
    state: &TicketState,
) -> Result<Vec<TicketEvent>, DomainError> {
    let id = existing(state)?;

    let title = match &cmd.title {
        Some(title) => {
            let title = title.trim();
            ensure(!title.is_empty(), || DomainError::TitleRequired)?;
            FieldChange::between(state.title.clone(), title.to_string())
        }
        None => None,
    };

    let changes = TicketChanges {
        title,
        description: cmd
            .description
            .as_ref()
            .and_then(|d| FieldChange::between(state.description.clone(), d.clone())),
        ticket_type: cmd
            .ticket_type
            .and_then(|t| FieldChange::between(state.ticket_type, t)),
    };

    if changes.is_empty() {
        return Ok(vec![]);
    }

    Ok(vec![
        TicketUpdated {
            meta: event_meta(id, &cmd.meta),
            changes,
        }
        .into(),
    ])
}

fn transition_status(
    cmd: &TransitionStatus,
    state: &TicketState,
) -> Result<Vec<TicketEvent>, DomainError> {
    let id = existing(state)?;

    if cmd.new_status == state.status {
        return Ok(vec![]);
    }
    not_merged(state)?;

    if !state.status.can_transition_to(cmd.new_status) {
        return Err(DomainError::InvalidStatusTransition {
            from: state.status,
            to: cmd.new_status,
            valid: state.status.valid_transitions().to_vec(),
        });
    }

    Ok(vec![
        StatusTransitioned {
            meta: event_meta(id, &cmd.meta),
            from: state.status,
            to: cmd.new_status,
            reason: cmd.reason.clone(),
            automatic: false,
        }
        .into(),
    ])
}

fn close_ticket(cmd: &CloseTicket, state: &TicketState) -> Result<Vec<TicketEvent>, DomainError> {
    let id = existing(state)?;
    ensure(!state.is_closed(), || DomainError::TicketAlreadyClosed {
        ticket_id: id.clone(),
    })?;

    Ok(vec![
        TicketClosed {
            meta: event_meta(id, &cmd.meta),
            previous_status: state.status,
            reason: cmd.reason.clone(),
        }
        .into(),
    ])
}

fn reopen_ticket(
    cmd: &ReopenTicket,
    state: &TicketState,
) -> Result<Vec<TicketEvent>, DomainError> {
    let id = existing(state)?;
    ensure(state.is_closed(), || DomainError::TicketNotClosed {
        status: state.status,
    })?;
    not_merged(state)?;

    Ok(vec![
        TicketReopened {
            meta: event_meta(id, &cmd.meta),
            reason: cmd.reason.clone(),
        }
        .into(),
        StatusTransitioned {
            meta: event_meta(id, &cmd.meta),
            from: TicketStatus::Closed,
            to: TicketStatus::Open,
            reason: cmd.reason.clone(),
            automatic: false,
        }
        .into(),
    ])
}

fn assign_ticket(
    cmd: &AssignTicket,
    state: &TicketState,
) -> Result<Vec<TicketEvent>, DomainError> {
    let id = existing(state)?;
    let assignee_id = cmd
        .assignee_id
        .as_ref()
        .ok_or(DomainError::AssigneeRequired)?;
    ensure(state.assignee_id.as_ref() != Some(assignee_id), || {
        DomainError::SameAssignee {
            assignee_id: assignee_id.clone(),
        }
    })?;

    let mut events = vec![
        TicketAssigned {
            meta: event_meta(id, &cmd.meta),
            assignee_id: assignee_id.clone(),
            previous_assignee_id: state.assignee_id.clone(),
        }
        .into(),
    ];

    if state.status == TicketStatus::New {
        events.push(automatic_transition(
            id,
            &cmd.meta,
            TicketStatus::New,
            TicketStatus::InProgress,
            AUTO_ON_ASSIGNMENT,
        ));
    }

    Ok(events)
}

fn unassign_ticket(
    cmd: &UnassignTicket,
    state: &TicketState,
) -> Result<Vec<TicketEvent>, DomainError> {
    let id = existing(state)?;
    let previous = state
        .assignee_id
        .clone()
        .ok_or(DomainError::AlreadyUnassigned)?;

    Ok(vec![
        TicketUnassigned {
            meta: event_meta(id, &cmd.meta),
            previous_assignee_id: previous,
        }
        .into(),
    ])
}

fn change_priority(
    meta: &CommandMeta,
    new_priority: TicketPriority,
    reason: Option<String>,
    state: &TicketState,
) -> Result<Vec<TicketEvent>, DomainError> {
    let id = existing(state)?;
    ensure(new_priority != state.priority, || DomainError::SamePriority {
        priority: new_priority,
    })?;

    Ok(vec![
        PriorityChanged {
            meta: event_meta(id, meta),
            from: state.priority,
            to: new_priority,
            escalated: new_priority.is_escalation_from(state.priority),
            reason,
        }
        .into(),
    ])
}

fn add_comment(
    cmd: &AddComment,
    state: &TicketState,
    ctx: &dyn DecideContext,
) -> Result<Vec<TicketEvent>, DomainError> {
    let id = existing(state)?;
    ensure(!cmd.text.trim().is_empty(), || DomainError::CommentEmpty)?;

    let mut events = vec![
        CommentAdded {
            meta: event_meta(id, &cmd.meta),
            comment_id: ctx.generate_comment_id(),
            author_id: cmd.meta.actor_id.clone(),
            text: cmd.text.clone(),
            is_from_customer: cmd.is_from_customer,
            is_internal: cmd.is_internal,
            is_outgoing_reply: false,
        }
        .into(),
    ];

    if cmd.is_from_customer && state.status == TicketStatus::PendingCustomer {
        events.push(automatic_transition(
            id,
            &cmd.meta,
            TicketStatus::PendingCustomer,
            TicketStatus::Open,
            AUTO_ON_CUSTOMER_REPLY,
        ));
    }

    Ok(events)
}

fn add_email_reply(
    cmd: &AddEmailReply,
    state: &TicketState,
    ctx: &dyn DecideContext,
) -> Result<Vec<TicketEvent>, DomainError> {
    let id = existing(state)?;
    ensure(!cmd.text.trim().is_empty(), || DomainError::CommentEmpty)?;
    ensure(!cmd.to.trim().is_empty(), || DomainError::RecipientRequired)?;

    let comment_id = ctx.generate_comment_id();
    let mut events = vec![
        CommentAdded {
            meta: event_meta(id, &cmd.meta),
            comment_id: comment_id.clone(),
            author_id: cmd.meta.actor_id.clone(),
            text: cmd.text.clone(),
            is_from_customer: false,
            is_internal: false,
            is_outgoing_reply: true,
        }
        .into(),
        EmailReplyQueued {
            meta: event_meta(id, &cmd.meta),
            comment_id,
            to: cmd.to.trim().to_string(),
            cc: cmd.cc.clone(),
            subject: cmd.subject.clone(),
            body: cmd.text.clone(),
        }
        .into(),
    ];

    if state.status.awaits_agent() {
        events.push(automatic_transition(
            id,
            &cmd.meta,
            state.status,
            TicketStatus::PendingCustomer,
            AUTO_ON_AGENT_REPLY,
        ));
    }

    Ok(events)
}

fn merge_ticket(cmd: &MergeTicket, state: &TicketState) -> Result<Vec<TicketEvent>, DomainError> {
    ensure(cmd.source_ticket_id != cmd.target_ticket_id, || {
        DomainError::CannotMergeIntoSelf {
            ticket_id: cmd.source_ticket_id.clone(),
        }
    })?;
    let id = existing(state)?;
    ensure(cmd.source_ticket_id == *id, || DomainError::SourceTicketMismatch {
        ticket_id: id.clone(),
        source_ticket_id: cmd.source_ticket_id.clone(),
    })?;
    can_merge(state, &cmd.target_ticket_id)?;

    Ok(vec![
        TicketMerged {
            meta: event_meta(id, &cmd.meta),
            source_ticket_id: cmd.source_ticket_id.clone(),
            target_ticket_id: cmd.target_ticket_id.clone(),
        }
        .into(),
        TicketClosed {
            meta: event_meta(id, &cmd.meta),
            previous_status: state.status,
            reason: Some(CLOSED_BY_MERGE.to_string()),
        }
        .into(),
    ])
}

fn link_to_customer(
    cmd: &LinkToCustomer,
    state: &TicketState,
) -> Result<Vec<TicketEvent>, DomainError> {
    let id = existing(state)?;
    if let Some(customer_id) = &state.customer_id {
        return Err(DomainError::AlreadyLinkedToCustomer {
            customer_id: customer_id.clone(),
        });
    }

    Ok(vec![
        CustomerLinked {
            meta: event_meta(id, &cmd.meta),
            customer_id: cmd.customer_id.clone(),
        }
        .into(),
    ])
}

fn unlink_from_customer(
    cmd: &UnlinkFromCustomer,
    state: &TicketState,
) -> Result<Vec<TicketEvent>, DomainError> {
    let id = existing(state)?;
    let previous = state
        .customer_id
        .clone()
        .ok_or(DomainError::NoCustomerLinked)?;

    Ok(vec![
        CustomerUnlinked {
            meta: event_meta(id, &cmd.meta),
            previous_customer_id: previous,
        }
        .into(),
    ])
}
