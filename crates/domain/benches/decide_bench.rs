use std::sync::Arc;

use chrono::{TimeZone, Utc};
use common::{FixedClock, SequentialIdGenerator, TicketId, UserId};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use domain::ticket::{AddComment, AssignTicket, CommandMeta, CreateTicket, TransitionStatus};
use domain::{
    IdGeneratorContext, TicketCommand, TicketEvent, TicketService, TicketState, TicketStatus,
    decide, empty_ticket_state, reconstitute_from_events,
};
use event_store::InMemoryEventStore;

fn meta() -> CommandMeta {
    CommandMeta::by("agent-1", Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap())
}

fn comment(n: usize) -> TicketCommand {
    AddComment {
        meta: meta(),
        text: format!("note {n}"),
        is_from_customer: n % 2 == 0,
        is_internal: false,
    }
    .into()
}

/// A created ticket followed by `comments` comments, bouncing between
/// pending_customer and open.
fn history(comments: usize) -> Vec<TicketEvent> {
    let ctx = IdGeneratorContext::new(Arc::new(SequentialIdGenerator::new("id")));
    let mut events = Vec::new();
    let mut commands: Vec<TicketCommand> = vec![CreateTicket::new(meta(), "Bench").into()];
    for n in 0..comments {
        commands.push(
            TransitionStatus {
                meta: meta(),
                new_status: TicketStatus::PendingCustomer,
                reason: None,
            }
            .into(),
        );
        commands.push(comment(n));
    }

    for command in commands {
        let state = reconstitute_from_events(&events);
        if let Ok(decided) = decide(&command, &state, &ctx) {
            events.extend(decided);
        }
    }
    events
}

fn bench_decide(c: &mut Criterion) {
    let ctx = IdGeneratorContext::new(Arc::new(SequentialIdGenerator::new("id")));
    let state = TicketState {
        id: Some(TicketId::new("t-1")),
        ..empty_ticket_state()
    };
    let create: TicketCommand = CreateTicket::new(meta(), "Bench").assignee("agent-2").into();
    let assign: TicketCommand = AssignTicket {
        meta: meta(),
        assignee_id: Some(UserId::new("agent-2")),
    }
    .into();

    c.bench_function("decide/create_ticket", |b| {
        b.iter(|| decide(&create, &empty_ticket_state(), &ctx))
    });
    c.bench_function("decide/assign_new_ticket", |b| {
        b.iter(|| decide(&assign, &state, &ctx))
    });
}

fn bench_reconstitute(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconstitute_from_events");
    for comments in [10, 100, 1000] {
        let events = history(comments);
        group.bench_with_input(BenchmarkId::from_parameter(events.len()), &events, |b, events| {
            b.iter(|| reconstitute_from_events(events))
        });
    }
    group.finish();
}

fn bench_service_command(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let service = TicketService::new(
        InMemoryEventStore::new(),
        Arc::new(FixedClock::at_millis(0)),
        Arc::new(SequentialIdGenerator::new("ticket")),
    );
    let ticket_id = rt.block_on(async {
        let result = service
            .create(CreateTicket::new(meta(), "Bench"))
            .await
            .unwrap();
        TicketId::new(result.stream_id.as_str())
    });

    c.bench_function("service/add_comment", |b| {
        b.iter(|| {
            rt.block_on(async {
                service
                    .add_comment(&ticket_id, UserId::new("agent-1"), "note".to_string(), false)
                    .await
                    .unwrap();
            });
        });
    });
}

criterion_group!(benches, bench_decide, bench_reconstitute, bench_service_command);
criterion_main!(benches);
