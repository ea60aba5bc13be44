//! `ticketctl`: drives the ticket decision engine from JSON files.
//!
//! Every subcommand reads JSON (a path or `-` for stdin) and writes pretty
//! JSON to stdout. Domain rejections are not failures of the tool: they are
//! printed as `{"error": ..., "message": ...}` and flagged on [`Output`] so
//! the binary can exit with a distinct code.

pub mod args;

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, bail};
use common::{SystemClock, TicketId};
use domain::{
    CommandError, DecideContext, DomainError, IdGeneratorContext, LogFormat, ServiceConfig,
    Ticket, TicketCommand, TicketError, TicketEvent, TicketService, TicketStatus, decide,
    reconstitute_from_events,
};
use event_store::InMemoryEventStore;
use serde::Serialize;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub use args::{Action, Cli};

/// What a subcommand prints, and whether it was a domain rejection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output {
    pub body: String,
    pub rejected: bool,
}

impl Output {
    fn json(value: &impl Serialize) -> anyhow::Result<Self> {
        Ok(Self {
            body: serde_json::to_string_pretty(value)?,
            rejected: false,
        })
    }

    fn rejection(error: &DomainError) -> anyhow::Result<Self> {
        let body = serde_json::json!({
            "error": error,
            "message": error.to_string(),
        });
        Ok(Self {
            body: serde_json::to_string_pretty(&body)?,
            rejected: true,
        })
    }
}

/// Installs the global tracing subscriber. Logs go to stderr so stdout stays
/// machine-readable.
pub fn init_tracing(config: &ServiceConfig) {
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match config.log_format {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init(),
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}

/// Runs one subcommand.
pub async fn run(action: Action, config: &ServiceConfig) -> anyhow::Result<Output> {
    match action {
        Action::Replay { events, full } => replay_json(&read_input(&events)?, full),
        Action::Decide { command, events } => {
            let history = events.map(|path| read_input(&path)).transpose()?;
            let ctx = IdGeneratorContext::new(config.id_strategy.generator());
            decide_json(&read_input(&command)?, history.as_deref(), &ctx)
        }
        Action::Simulate { commands } => simulate_json(&read_input(&commands)?, config).await,
        Action::Transitions => Ok(Output {
            body: transition_table(),
            rejected: false,
        }),
    }
}

/// Reads a file, or stdin when `path` is `-`.
fn read_input(path: &Path) -> anyhow::Result<String> {
    if path == Path::new("-") {
        let mut input = String::new();
        std::io::stdin()
            .read_to_string(&mut input)
            .context("failed to read stdin")?;
        return Ok(input);
    }
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn parse_events(input: &str) -> anyhow::Result<Vec<TicketEvent>> {
    serde_json::from_str(input).context("invalid event history")
}

/// Folds an event history. With `full`, prints the ticket read model
/// (comments included) instead of the decision state.
pub fn replay_json(events: &str, full: bool) -> anyhow::Result<Output> {
    let events = parse_events(events)?;
    if full {
        let ticket = Ticket::from_events(&events).context("history has no TicketCreated event")?;
        return Output::json(&ticket);
    }
    Output::json(&reconstitute_from_events(&events))
}

/// Decides `command` against the state folded from `events`.
pub fn decide_json(
    command: &str,
    events: Option<&str>,
    ctx: &dyn DecideContext,
) -> anyhow::Result<Output> {
    let command: TicketCommand = serde_json::from_str(command).context("invalid command")?;
    let history = events.map(parse_events).transpose()?.unwrap_or_default();
    let state = reconstitute_from_events(&history);

    tracing::debug!(
        command_type = command.command_type(),
        history = history.len(),
        "deciding command"
    );

    match decide(&command, &state, ctx) {
        Ok(events) => Output::json(&events),
        Err(error) => Output::rejection(&error),
    }
}

/// Runs `commands` for a single ticket through a [`TicketService`] backed by
/// an in-memory store and prints the resulting ticket.
///
/// The first command must be `CreateTicket`. Processing stops at the first
/// rejection.
pub async fn simulate_json(commands: &str, config: &ServiceConfig) -> anyhow::Result<Output> {
    let commands: Vec<TicketCommand> =
        serde_json::from_str(commands).context("invalid command list")?;
    let mut commands = commands.into_iter();

    let Some(TicketCommand::CreateTicket(create)) = commands.next() else {
        bail!("the first command must be CreateTicket");
    };

    let service =
        TicketService::from_config(InMemoryEventStore::new(), Arc::new(SystemClock), config);

    let ticket_id = match service.create(create).await {
        Ok(result) => TicketId::new(result.stream_id.as_str()),
        Err(error) => return rejected(error),
    };

    for command in commands {
        if let Err(error) = service.execute(&ticket_id, command).await {
            return rejected(error);
        }
    }

    let ticket = service
        .ticket(&ticket_id)
        .await?
        .context("ticket stream is empty")?;
    tracing::info!(ticket_id = %ticket_id, status = %ticket.status, "simulation finished");
    Output::json(&ticket)
}

fn rejected(error: TicketError) -> anyhow::Result<Output> {
    match error {
        CommandError::Rejected(error) => Output::rejection(&error),
        other => Err(other.into()),
    }
}

/// One line per status: `from -> to, to, ...`.
pub fn transition_table() -> String {
    TicketStatus::ALL
        .iter()
        .map(|from| {
            let targets: Vec<&str> = from.valid_transitions().iter().map(|s| s.as_str()).collect();
            format!("{:<17} -> {}", from.as_str(), targets.join(", "))
        })
        .collect::<Vec<_>>()
        .join("\n")
}
