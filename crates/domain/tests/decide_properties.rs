//! Behavioral properties of the ticket decision engine.
//!
//! These tests drive `decide` and `evolve` through the public API only and
//! check the guarantees callers rely on: determinism, replay equivalence, the
//! status table and the automatic follow-up transitions.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use common::{FixedIdGenerator, SequentialIdGenerator, TicketId, UserId};
use domain::ticket::{
    AddComment, AssignTicket, ChangePriority, CloseTicket, CommandMeta, CreateTicket,
    MergeTicket, TransitionStatus,
};
use domain::{
    Decider, DomainError, DomainEvent, IdGeneratorContext, TicketCommand, TicketDecider,
    TicketEvent, TicketPriority, TicketState, TicketStatus, decide, empty_ticket_state, evolve,
    evolve_all, reconstitute_from_events,
};

fn at(minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 9, minute, 0).unwrap()
}

fn ctx() -> IdGeneratorContext {
    IdGeneratorContext::new(Arc::new(SequentialIdGenerator::new("id")))
}

fn meta(minute: u32) -> CommandMeta {
    CommandMeta::by("agent-1", at(minute))
}

fn existing(status: TicketStatus) -> TicketState {
    TicketState {
        id: Some(TicketId::new("t-1")),
        status,
        title: "Damaged parcel".to_string(),
        reporter_id: Some(UserId::new("customer-1")),
        ..empty_ticket_state()
    }
}

/// Decides each command against the state folded so far.
fn play(commands: Vec<TicketCommand>) -> Vec<TicketEvent> {
    let ctx = ctx();
    let mut history = Vec::new();
    for command in commands {
        let state = reconstitute_from_events(&history);
        history.extend(decide(&command, &state, &ctx).unwrap());
    }
    history
}

fn lifecycle() -> Vec<TicketCommand> {
    vec![
        CreateTicket::new(meta(0), "Damaged parcel")
            .reporter(Some(UserId::new("customer-1")))
            .customer("cust-9")
            .into(),
        AssignTicket {
            meta: meta(1),
            assignee_id: Some(UserId::new("agent-1")),
        }
        .into(),
        TransitionStatus {
            meta: meta(2),
            new_status: TicketStatus::PendingCustomer,
            reason: Some("Asked for photos".to_string()),
        }
        .into(),
        AddComment {
            meta: CommandMeta::by("customer-1", at(3)),
            text: "photos attached".to_string(),
            is_from_customer: true,
            is_internal: false,
        }
        .into(),
        ChangePriority {
            meta: meta(4),
            new_priority: TicketPriority::High,
            reason: None,
        }
        .into(),
        CloseTicket {
            meta: meta(5),
            reason: Some("Refunded".to_string()),
        }
        .into(),
    ]
}

mod determinism {
    use super::*;

    #[test]
    fn same_inputs_same_events() {
        let ids = Arc::new(FixedIdGenerator::new("fixed"));
        let ctx = IdGeneratorContext::new(ids);
        let cmd: TicketCommand = CreateTicket::new(meta(0), "Damaged parcel")
            .assignee("agent-2")
            .into();
        let state = empty_ticket_state();

        let first = decide(&cmd, &state, &ctx);
        let second = decide(&cmd, &state, &ctx);

        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first.unwrap()).unwrap(),
            serde_json::to_string(&second.unwrap()).unwrap()
        );
    }

    #[test]
    fn decide_does_not_touch_state() {
        let state = existing(TicketStatus::New);
        let before = state.clone();
        let cmd: TicketCommand = AssignTicket {
            meta: meta(1),
            assignee_id: Some(UserId::new("u1")),
        }
        .into();

        decide(&cmd, &state, &ctx()).unwrap();
        assert_eq!(state, before);
    }
}

mod replay {
    use super::*;

    #[test]
    fn reconstitute_equals_evolve_all_from_empty() {
        let events = play(lifecycle());
        assert_eq!(
            reconstitute_from_events(&events),
            evolve_all(&empty_ticket_state(), &events)
        );
    }

    #[test]
    fn reconstitute_equals_stepwise_evolution() {
        let events = play(lifecycle());

        let mut state = empty_ticket_state();
        for event in &events {
            state = evolve(&state, event);
        }

        assert_eq!(reconstitute_from_events(&events), state);
        assert_eq!(TicketDecider::reconstitute(&events), state);
    }

    #[test]
    fn lifecycle_ends_closed() {
        let events = play(lifecycle());
        let state = reconstitute_from_events(&events);

        let kinds: Vec<_> = events.iter().map(|e| e.event_type()).collect();
        assert_eq!(
            kinds,
            vec![
                "TicketCreated",
                "TicketAssigned",
                "StatusTransitioned",
                "StatusTransitioned",
                "CommentAdded",
                "StatusTransitioned",
                "PriorityChanged",
                "TicketClosed",
            ]
        );
        assert_eq!(state.status, TicketStatus::Closed);
        assert_eq!(state.priority, TicketPriority::High);
        assert_eq!(state.comment_count, 1);
        assert_eq!(state.updated_at, Some(at(5)));
    }

    #[test]
    fn events_survive_the_wire() {
        let events = play(lifecycle());
        let json = serde_json::to_string(&events).unwrap();
        let back: Vec<TicketEvent> = serde_json::from_str(&json).unwrap();

        assert_eq!(back, events);
        assert_eq!(
            reconstitute_from_events(&back),
            reconstitute_from_events(&events)
        );
    }
}

mod status_machine {
    use super::*;

    fn transition(to: TicketStatus) -> TicketCommand {
        TransitionStatus {
            meta: meta(1),
            new_status: to,
            reason: None,
        }
        .into()
    }

    #[test]
    fn same_status_is_noop_for_every_status() {
        for status in TicketStatus::ALL {
            let result = decide(&transition(status), &existing(status), &ctx());
            assert_eq!(result, Ok(vec![]), "status {status}");
        }
    }

    #[test]
    fn edges_outside_table_are_rejected() {
        use TicketStatus::*;
        let table: [(TicketStatus, &[TicketStatus]); 5] = [
            (New, &[Open, InProgress, PendingCustomer, Closed]),
            (Open, &[InProgress, PendingCustomer, Closed]),
            (InProgress, &[Open, PendingCustomer, Closed]),
            (PendingCustomer, &[Open, InProgress, Closed]),
            (Closed, &[Open]),
        ];

        for (from, allowed) in table {
            for to in TicketStatus::ALL {
                if to == from {
                    continue;
                }
                let result = decide(&transition(to), &existing(from), &ctx());
                if allowed.contains(&to) {
                    assert!(result.is_ok(), "{from} -> {to} should be allowed");
                } else {
                    match result {
                        Err(DomainError::InvalidStatusTransition { from: f, to: t, valid }) => {
                            assert_eq!((f, t), (from, to));
                            assert_eq!(valid, allowed.to_vec());
                        }
                        other => panic!("{from} -> {to}: expected rejection, got {other:?}"),
                    }
                }
            }
        }
    }

    #[test]
    fn assignment_of_new_ticket_starts_work() {
        let cmd: TicketCommand = AssignTicket {
            meta: meta(1),
            assignee_id: Some(UserId::new("u1")),
        }
        .into();
        let events = decide(&cmd, &existing(TicketStatus::New), &ctx()).unwrap();

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type(), "TicketAssigned");
        assert_eq!(
            events[1].status_change(),
            Some((TicketStatus::New, TicketStatus::InProgress))
        );
    }

    #[test]
    fn customer_reply_reopens_pending_ticket() {
        let state = TicketState {
            comment_count: 2,
            ..existing(TicketStatus::PendingCustomer)
        };
        let cmd: TicketCommand = AddComment {
            meta: meta(1),
            text: "thanks!".to_string(),
            is_from_customer: true,
            is_internal: false,
        }
        .into();

        let events = decide(&cmd, &state, &ctx()).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type(), "CommentAdded");
        assert_eq!(
            events[1].status_change(),
            Some((TicketStatus::PendingCustomer, TicketStatus::Open))
        );

        let next = evolve_all(&state, &events);
        assert_eq!(next.status, TicketStatus::Open);
        assert_eq!(next.comment_count, 3);
    }
}

mod rejections {
    use super::*;

    #[test]
    fn closing_closed_ticket() {
        let cmd: TicketCommand = CloseTicket {
            meta: meta(1),
            reason: None,
        }
        .into();
        let error = decide(&cmd, &existing(TicketStatus::Closed), &ctx()).unwrap_err();
        assert_eq!(error.code(), "TICKET_ALREADY_CLOSED");
    }

    #[test]
    fn same_priority() {
        let state = TicketState {
            priority: TicketPriority::High,
            ..existing(TicketStatus::Open)
        };
        let cmd: TicketCommand = ChangePriority {
            meta: meta(1),
            new_priority: TicketPriority::High,
            reason: None,
        }
        .into();

        let error = decide(&cmd, &state, &ctx()).unwrap_err();
        assert_eq!(error.code(), "SAME_PRIORITY");
        assert_eq!(
            serde_json::to_value(&error).unwrap(),
            serde_json::json!({ "code": "SAME_PRIORITY", "priority": "high" })
        );
    }

    #[test]
    fn merge_into_self_always_rejected() {
        for status in TicketStatus::ALL {
            let cmd: TicketCommand = MergeTicket {
                meta: meta(1),
                source_ticket_id: TicketId::new("t-1"),
                target_ticket_id: TicketId::new("t-1"),
            }
            .into();
            let error = decide(&cmd, &existing(status), &ctx()).unwrap_err();
            assert_eq!(error.code(), "CANNOT_MERGE_INTO_SELF");
        }
    }

    #[test]
    fn merged_ticket_cannot_merge_again() {
        let state = TicketState {
            merged_into_ticket_id: Some(TicketId::new("t-2")),
            ..existing(TicketStatus::Open)
        };
        let cmd: TicketCommand = MergeTicket {
            meta: meta(1),
            source_ticket_id: TicketId::new("t-1"),
            target_ticket_id: TicketId::new("t-3"),
        }
        .into();

        let error = decide(&cmd, &state, &ctx()).unwrap_err();
        assert_eq!(error.code(), "TICKET_ALREADY_MERGED");
    }

    #[test]
    fn rejection_messages_name_offending_values() {
        let cmd: TicketCommand = TransitionStatus {
            meta: meta(1),
            new_status: TicketStatus::PendingCustomer,
            reason: None,
        }
        .into();
        let error = decide(&cmd, &existing(TicketStatus::Closed), &ctx()).unwrap_err();
        assert_eq!(
            error.to_string(),
            "Cannot transition from 'closed' to 'pending_customer'. Valid transitions from 'closed': open"
        );
    }
}
