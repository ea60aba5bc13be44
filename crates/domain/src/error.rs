//! Domain rejections.

use common::{CustomerId, TicketId, UserId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ticket::{TicketPriority, TicketStatus};

/// Why a command was rejected.
///
/// Every variant is an expected business outcome, returned as `Err` from
/// `decide`. Serialized with a stable `code` tag so callers can render a
/// precise message or branch on the reason.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(
    tag = "code",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum DomainError {
    #[error("Ticket title is required")]
    TitleRequired,

    #[error("Ticket reporter is required")]
    ReporterRequired,

    /// The command targets a ticket that has not been created.
    #[error("Ticket does not exist")]
    TicketNotFound,

    #[error("Ticket '{ticket_id}' already exists")]
    TicketAlreadyExists { ticket_id: TicketId },

    #[error(
        "Cannot transition from '{from}' to '{to}'. Valid transitions from '{from}': {}",
        list_statuses(.valid)
    )]
    InvalidStatusTransition {
        from: TicketStatus,
        to: TicketStatus,
        valid: Vec<TicketStatus>,
    },

    #[error("Ticket '{ticket_id}' is already closed")]
    TicketAlreadyClosed { ticket_id: TicketId },

    #[error("Only closed tickets can be reopened (current status: '{status}')")]
    TicketNotClosed { status: TicketStatus },

    #[error("Ticket has already been merged into '{merged_into}'")]
    TicketAlreadyMerged { merged_into: TicketId },

    #[error("Cannot merge ticket '{ticket_id}' into itself")]
    CannotMergeIntoSelf { ticket_id: TicketId },

    /// The merge names a source other than the ticket it is applied to.
    #[error("Merge source '{source_ticket_id}' does not match ticket '{ticket_id}'")]
    SourceTicketMismatch {
        ticket_id: TicketId,
        source_ticket_id: TicketId,
    },

    #[error("Cannot merge closed ticket '{ticket_id}'")]
    CannotMergeClosedTicket { ticket_id: TicketId },

    #[error("An assignee is required")]
    AssigneeRequired,

    #[error("Ticket is already assigned to '{assignee_id}'")]
    SameAssignee { assignee_id: UserId },

    #[error("Ticket is already unassigned")]
    AlreadyUnassigned,

    #[error("Ticket priority is already '{priority}'")]
    SamePriority { priority: TicketPriority },

    #[error("Comment text cannot be empty")]
    CommentEmpty,

    #[error("Email reply needs a recipient address")]
    RecipientRequired,

    #[error("Ticket is already linked to customer '{customer_id}'")]
    AlreadyLinkedToCustomer { customer_id: CustomerId },

    #[error("Ticket is not linked to a customer")]
    NoCustomerLinked,
}

impl DomainError {
    /// Stable machine-readable code, identical to the serialized `code` tag.
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::TitleRequired => "TITLE_REQUIRED",
            DomainError::ReporterRequired => "REPORTER_REQUIRED",
            DomainError::TicketNotFound => "TICKET_NOT_FOUND",
            DomainError::TicketAlreadyExists { .. } => "TICKET_ALREADY_EXISTS",
            DomainError::InvalidStatusTransition { .. } => "INVALID_STATUS_TRANSITION",
            DomainError::TicketAlreadyClosed { .. } => "TICKET_ALREADY_CLOSED",
            DomainError::TicketNotClosed { .. } => "TICKET_NOT_CLOSED",
            DomainError::TicketAlreadyMerged { .. } => "TICKET_ALREADY_MERGED",
            DomainError::CannotMergeIntoSelf { .. } => "CANNOT_MERGE_INTO_SELF",
            DomainError::SourceTicketMismatch { .. } => "SOURCE_TICKET_MISMATCH",
            DomainError::CannotMergeClosedTicket { .. } => "CANNOT_MERGE_CLOSED_TICKET",
            DomainError::AssigneeRequired => "ASSIGNEE_REQUIRED",
            DomainError::SameAssignee { .. } => "SAME_ASSIGNEE",
            DomainError::AlreadyUnassigned => "ALREADY_UNASSIGNED",
            DomainError::SamePriority { .. } => "SAME_PRIORITY",
            DomainError::CommentEmpty => "COMMENT_EMPTY",
            DomainError::RecipientRequired => "RECIPIENT_REQUIRED",
            DomainError::AlreadyLinkedToCustomer { .. } => "ALREADY_LINKED_TO_CUSTOMER",
            DomainError::NoCustomerLinked => "NO_CUSTOMER_LINKED",
        }
    }
}

fn list_statuses(statuses: &[TicketStatus]) -> String {
    if statuses.is_empty() {
        return "none".to_string();
    }
    statuses
        .iter()
        .map(TicketStatus::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
