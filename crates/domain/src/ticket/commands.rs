//! Ticket commands.
//!
//! A command is a request to change a ticket. It carries only the data the
//! decision needs; the acting user and timestamp travel in [`CommandMeta`],
//! filled in by the caller from its `Clock`.

use chrono::{DateTime, Utc};
use common::{CustomerId, TicketId, UserId};
use serde::{Deserialize, Serialize};

use super::{SlaKind, TicketPriority, TicketStatus, TicketType};

/// Who issued a command and when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandMeta {
    /// `None` for system-initiated actions.
    pub actor_id: Option<UserId>,

    pub timestamp: DateTime<Utc>,
}

impl CommandMeta {
    /// Metadata for an action performed by a user.
    pub fn by(actor_id: impl Into<UserId>, timestamp: DateTime<Utc>) -> Self {
        Self {
            actor_id: Some(actor_id.into()),
            timestamp,
        }
    }

    /// Metadata for an action performed by the system.
    pub fn system(timestamp: DateTime<Utc>) -> Self {
        Self {
            actor_id: None,
            timestamp,
        }
    }
}

/// Every intent the ticket aggregate understands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "_type")]
pub enum TicketCommand {
    CreateTicket(CreateTicket),
    UpdateTicket(UpdateTicket),
    TransitionStatus(TransitionStatus),
    CloseTicket(CloseTicket),
    ReopenTicket(ReopenTicket),
    AssignTicket(AssignTicket),
    UnassignTicket(UnassignTicket),
    ChangePriority(ChangePriority),
    EscalatePriority(EscalatePriority),
    AddComment(AddComment),
    AddEmailReply(AddEmailReply),
    MergeTicket(MergeTicket),
    LinkToCustomer(LinkToCustomer),
    UnlinkFromCustomer(UnlinkFromCustomer),
    RecordFirstResponse(RecordFirstResponse),
    BreachSla(BreachSla),
}

/// Open a new ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTicket {
    #[serde(flatten)]
    pub meta: CommandMeta,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: TicketPriority,
    #[serde(default)]
    pub ticket_type: TicketType,
    pub reporter_id: Option<UserId>,
    #[serde(default)]
    pub assignee_id: Option<UserId>,
    /// Already resolved by the customer-identity context.
    #[serde(default)]
    pub customer_id: Option<CustomerId>,
    /// Already resolved by the order-sync context.
    #[serde(default)]
    pub order_number: Option<String>,
}

impl CreateTicket {
    /// A ticket with default priority and type, reported by `meta.actor_id`.
    pub fn new(meta: CommandMeta, title: impl Into<String>) -> Self {
        let reporter_id = meta.actor_id.clone();
        Self {
            meta,
            title: title.into(),
            description: String::new(),
            priority: TicketPriority::default(),
            ticket_type: TicketType::default(),
            reporter_id,
            assignee_id: None,
            customer_id: None,
            order_number: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn priority(mut self, priority: TicketPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn ticket_type(mut self, ticket_type: TicketType) -> Self {
        self.ticket_type = ticket_type;
        self
    }

    pub fn reporter(mut self, reporter_id: Option<UserId>) -> Self {
        self.reporter_id = reporter_id;
        self
    }

    pub fn assignee(mut self, assignee_id: impl Into<UserId>) -> Self {
        self.assignee_id = Some(assignee_id.into());
        self
    }

    pub fn customer(mut self, customer_id: impl Into<CustomerId>) -> Self {
        self.customer_id = Some(customer_id.into());
        self
    }

    pub fn order_number(mut self, order_number: impl Into<String>) -> Self {
        self.order_number = Some(order_number.into());
        self
    }
}

/// Edit descriptive fields. `None` leaves a field untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTicket {
    #[serde(flatten)]
    pub meta: CommandMeta,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub ticket_type: Option<TicketType>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionStatus {
    #[serde(flatten)]
    pub meta: CommandMeta,
    pub new_status: TicketStatus,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseTicket {
    #[serde(flatten)]
    pub meta: CommandMeta,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReopenTicket {
    #[serde(flatten)]
    pub meta: CommandMeta,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignTicket {
    #[serde(flatten)]
    pub meta: CommandMeta,
    /// Nullable on the wire; a missing assignee is rejected.
    pub assignee_id: Option<UserId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnassignTicket {
    #[serde(flatten)]
    pub meta: CommandMeta,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePriority {
    #[serde(flatten)]
    pub meta: CommandMeta,
    pub new_priority: TicketPriority,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Raise the ticket to `urgent`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EscalatePriority {
    #[serde(flatten)]
    pub meta: CommandMeta,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddComment {
    #[serde(flatten)]
    pub meta: CommandMeta,
    pub text: String,
    #[serde(default)]
    pub is_from_customer: bool,
    /// Internal notes are never shown to the customer.
    #[serde(default)]
    pub is_internal: bool,
}

/// Reply to the customer by email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddEmailReply {
    #[serde(flatten)]
    pub meta: CommandMeta,
    pub text: String,
    pub to: String,
    #[serde(default)]
    pub cc: Vec<String>,
    #[serde(default)]
    pub subject: Option<String>,
}

/// Fold `source_ticket_id` into `target_ticket_id` and close the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeTicket {
    #[serde(flatten)]
    pub meta: CommandMeta,
    pub source_ticket_id: TicketId,
    pub target_ticket_id: TicketId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkToCustomer {
    #[serde(flatten)]
    pub meta: CommandMeta,
    pub customer_id: CustomerId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlinkFromCustomer {
    #[serde(flatten)]
    pub meta: CommandMeta,
}

/// Reported by the SLA tracker when an agent first responded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordFirstResponse {
    #[serde(flatten)]
    pub meta: CommandMeta,
    pub responded_at: DateTime<Utc>,
}

/// Reported by the SLA tracker when a target was missed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreachSla {
    #[serde(flatten)]
    pub meta: CommandMeta,
    pub sla_kind: SlaKind,
    pub due_at: DateTime<Utc>,
}

macro_rules! command_variants {
    ($($variant:ident),* $(,)?) => {
        impl TicketCommand {
            /// Who issued the command and when.
            pub fn meta(&self) -> &CommandMeta {
                match self {
                    $(TicketCommand::$variant(cmd) => &cmd.meta,)*
                }
            }

            /// The command's discriminator, as serialized in `_type`.
            pub fn command_type(&self) -> &'static str {
                match self {
                    $(TicketCommand::$variant(_) => stringify!($variant),)*
                }
            }
        }

        $(
            impl From<$variant> for TicketCommand {
                fn from(cmd: $variant) -> Self {
                    TicketCommand::$variant(cmd)
                }
            }
        )*
    };
}

command_variants!(
    CreateTicket,
    UpdateTicket,
    TransitionStatus,
    CloseTicket,
    ReopenTicket,
    AssignTicket,
    UnassignTicket,
    ChangePriority,
    EscalatePriority,
    AddComment,
    AddEmailReply,
    MergeTicket,
    LinkToCustomer,
    UnlinkFromCustomer,
    RecordFirstResponse,
    BreachSla,
);

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_create_ticket_defaults_reporter_to_actor() {
        let cmd = CreateTicket::new(CommandMeta::by("u1", at()), "Printer on fire");
        assert_eq!(cmd.reporter_id, Some(UserId::new("u1")));
        assert_eq!(cmd.priority, TicketPriority::Medium);
        assert!(cmd.assignee_id.is_none());
    }

    #[test]
    fn test_create_ticket_builder() {
        let cmd = CreateTicket::new(CommandMeta::system(at()), "Where is my order?")
            .reporter(Some(UserId::new("u2")))
            .priority(TicketPriority::High)
            .ticket_type(TicketType::Problem)
            .assignee("u3")
            .customer("c1")
            .order_number("#1001");

        assert_eq!(cmd.reporter_id, Some(UserId::new("u2")));
        assert_eq!(cmd.assignee_id, Some(UserId::new("u3")));
        assert_eq!(cmd.customer_id, Some(CustomerId::new("c1")));
        assert_eq!(cmd.order_number.as_deref(), Some("#1001"));
    }

    #[test]
    fn test_meta_and_type() {
        let cmd: TicketCommand = UnassignTicket {
            meta: CommandMeta::by("u1", at()),
        }
        .into();
        assert_eq!(cmd.command_type(), "UnassignTicket");
        assert_eq!(cmd.meta().actor_id, Some(UserId::new("u1")));
        assert_eq!(cmd.meta().timestamp, at());
    }

    #[test]
    fn test_deserialize_from_wire_format() {
        let json = serde_json::json!({
            "_type": "TransitionStatus",
            "actorId": null,
            "timestamp": "2024-05-01T12:00:00Z",
            "newStatus": "in_progress"
        });

        let cmd: TicketCommand = serde_json::from_value(json).unwrap();
        match cmd {
            TicketCommand::TransitionStatus(t) => {
                assert_eq!(t.new_status, TicketStatus::InProgress);
                assert!(t.meta.actor_id.is_none());
                assert_eq!(t.meta.timestamp, at());
                assert!(t.reason.is_none());
            }
            other => panic!("Expected TransitionStatus, got {other:?}"),
        }
    }

    #[test]
    fn test_serialization_carries_type_tag() {
        let cmd = TicketCommand::from(AddComment {
            meta: CommandMeta::by("u1", at()),
            text: "thanks!".to_string(),
            is_from_customer: true,
            is_internal: false,
        });

        let json = serde_json::to_value(&cmd).unwrap();
        assert_eq!(json["_type"], "AddComment");
        assert_eq!(json["actorId"], "u1");
        assert_eq!(json["isFromCustomer"], true);

        let back: TicketCommand = serde_json::from_value(json).unwrap();
        assert_eq!(back, cmd);
    }
}
