//! Ticket status state machine.

use serde::{Deserialize, Serialize};

/// The status of a ticket in its lifecycle.
///
/// Transitions:
/// ```text
/// New             ──► Open | InProgress | PendingCustomer | Closed
/// Open            ──► InProgress | PendingCustomer | Closed
/// InProgress      ──► Open | PendingCustomer | Closed
/// PendingCustomer ──► Open | InProgress | Closed
/// Closed          ──► Open
/// ```
/// Nothing returns to `New`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    /// Created, not yet triaged.
    #[default]
    New,

    Open,

    /// An agent is working on it.
    InProgress,

    /// Waiting for the customer to reply.
    PendingCustomer,

    /// Resolved or merged; can only be reopened.
    Closed,
}

impl TicketStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [TicketStatus; 5] = [
        TicketStatus::New,
        TicketStatus::Open,
        TicketStatus::InProgress,
        TicketStatus::PendingCustomer,
        TicketStatus::Closed,
    ];

    /// Statuses reachable from this one in a single transition.
    pub fn valid_transitions(&self) -> &'static [TicketStatus] {
        use TicketStatus::*;
        match self {
            New => &[Open, InProgress, PendingCustomer, Closed],
            Open => &[InProgress, PendingCustomer, Closed],
            InProgress => &[Open, PendingCustomer, Closed],
            PendingCustomer => &[Open, InProgress, Closed],
            Closed => &[Open],
        }
    }

    /// Returns true if `target` is a legal next status.
    pub fn can_transition_to(&self, target: TicketStatus) -> bool {
        self.valid_transitions().contains(&target)
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, TicketStatus::Closed)
    }

    /// Returns true if an outgoing agent reply should park the ticket on the customer.
    pub fn awaits_agent(&self) -> bool {
        matches!(self, TicketStatus::Open | TicketStatus::InProgress)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::New => "new",
            TicketStatus::Open => "open",
            TicketStatus::InProgress => "in_progress",
            TicketStatus::PendingCustomer => "pending_customer",
            TicketStatus::Closed => "closed",
        }
    }
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TicketStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TicketStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown ticket status '{s}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_status_is_new() {
        assert_eq!(TicketStatus::default(), TicketStatus::New);
    }

    #[test]
    fn test_transition_table() {
        use TicketStatus::*;
        let allowed = [
            (New, Open),
            (New, InProgress),
            (New, PendingCustomer),
            (New, Closed),
            (Open, InProgress),
            (Open, PendingCustomer),
            (Open, Closed),
            (InProgress, Open),
            (InProgress, PendingCustomer),
            (InProgress, Closed),
            (PendingCustomer, Open),
            (PendingCustomer, InProgress),
            (PendingCustomer, Closed),
            (Closed, Open),
        ];

        for from in TicketStatus::ALL {
            for to in TicketStatus::ALL {
                assert_eq!(
                    from.can_transition_to(to),
                    allowed.contains(&(from, to)),
                    "{from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn test_no_status_transitions_to_itself() {
        for status in TicketStatus::ALL {
            assert!(!status.can_transition_to(status));
        }
    }

    #[test]
    fn test_nothing_returns_to_new() {
        for status in TicketStatus::ALL {
            assert!(!status.can_transition_to(TicketStatus::New));
        }
    }

    #[test]
    fn test_awaits_agent() {
        assert!(TicketStatus::Open.awaits_agent());
        assert!(TicketStatus::InProgress.awaits_agent());
        assert!(!TicketStatus::New.awaits_agent());
        assert!(!TicketStatus::PendingCustomer.awaits_agent());
        assert!(!TicketStatus::Closed.awaits_agent());
    }

    #[test]
    fn test_display_and_parse() {
        for status in TicketStatus::ALL {
            assert_eq!(status.to_string().parse::<TicketStatus>(), Ok(status));
        }
        assert!("resolved".parse::<TicketStatus>().is_err());
    }

    #[test]
    fn test_serialization_is_snake_case() {
        let json = serde_json::to_string(&TicketStatus::PendingCustomer).unwrap();
        assert_eq!(json, "\"pending_customer\"");
    }
}
