//! Ticket service providing a simplified API for ticket operations.

use std::sync::Arc;

use common::{Clock, IdGenerator, TicketId, UserId};
use event_store::{EventStore, StreamId};

use crate::command::{CommandError, CommandHandler, CommandResult};
use crate::config::ServiceConfig;
use crate::error::DomainError;

use super::{
    AddComment, AssignTicket, CloseTicket, CommandMeta, CreateTicket, EscalatePriority,
    IdGeneratorContext, MergeTicket, ReopenTicket, Ticket, TicketCommand, TicketDecider,
    TicketEvent, TicketState, TicketStatus, TransitionStatus,
};

/// Failure of a ticket operation: a domain rejection or an infrastructure error.
pub type TicketError = CommandError<DomainError>;

/// Outcome of a ticket command.
pub type TicketResult = Result<CommandResult<TicketDecider>, TicketError>;

/// Service for managing tickets.
///
/// Binds the `Clock` and `IdGenerator` ports once and stamps every command it
/// builds with `Clock::now()`. Each ticket is stored as its own stream, named
/// after the ticket id.
pub struct TicketService<S: EventStore> {
    handler: CommandHandler<S, TicketDecider>,
    clock: Arc<dyn Clock>,
    context: IdGeneratorContext,
}

impl<S: EventStore> TicketService<S> {
    /// Creates a new ticket service with the given event store and ports.
    pub fn new(store: S, clock: Arc<dyn Clock>, ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            handler: CommandHandler::new(store, clock.clone()),
            clock,
            context: IdGeneratorContext::new(ids),
        }
    }

    /// Creates a service whose id strategy and snapshot interval come from `config`.
    pub fn from_config(store: S, clock: Arc<dyn Clock>, config: &ServiceConfig) -> Self {
        let mut service = Self::new(store, clock, config.id_strategy.generator());
        service.handler = service
            .handler
            .with_snapshot_interval(config.snapshot_interval);
        service
    }

    /// Returns a reference to the underlying command handler.
    pub fn handler(&self) -> &CommandHandler<S, TicketDecider> {
        &self.handler
    }

    /// Command metadata for `actor`, stamped with the current time.
    pub fn meta(&self, actor: Option<UserId>) -> CommandMeta {
        CommandMeta {
            actor_id: actor,
            timestamp: self.clock.now(),
        }
    }

    /// Opens a new ticket.
    #[tracing::instrument(skip(self))]
    pub async fn create(&self, cmd: CreateTicket) -> TicketResult {
        self.handler
            .create(&TicketCommand::CreateTicket(cmd), &self.context)
            .await
    }

    /// Executes any command against an existing ticket.
    ///
    /// `CreateTicket` is routed to [`TicketService::create`] and ignores `ticket_id`.
    #[tracing::instrument(skip(self))]
    pub async fn execute(&self, ticket_id: &TicketId, command: TicketCommand) -> TicketResult {
        match command {
            TicketCommand::CreateTicket(cmd) => self.create(cmd).await,
            command => {
                self.handler
                    .execute(&stream_id(ticket_id), &command, &self.context)
                    .await
            }
        }
    }

    /// Assigns a ticket to `assignee`.
    #[tracing::instrument(skip(self))]
    pub async fn assign(&self, ticket_id: &TicketId, actor: UserId, assignee: UserId) -> TicketResult {
        let cmd = AssignTicket {
            meta: self.meta(Some(actor)),
            assignee_id: Some(assignee),
        };
        self.execute(ticket_id, cmd.into()).await
    }

    /// Moves a ticket to `new_status`.
    #[tracing::instrument(skip(self))]
    pub async fn transition(
        &self,
        ticket_id: &TicketId,
        actor: UserId,
        new_status: TicketStatus,
        reason: Option<String>,
    ) -> TicketResult {
        let cmd = TransitionStatus {
            meta: self.meta(Some(actor)),
            new_status,
            reason,
        };
        self.execute(ticket_id, cmd.into()).await
    }

    /// Adds a public comment. `is_from_customer` marks a reply from the customer.
    #[tracing::instrument(skip(self, text))]
    pub async fn add_comment(
        &self,
        ticket_id: &TicketId,
        actor: UserId,
        text: String,
        is_from_customer: bool,
    ) -> TicketResult {
        let cmd = AddComment {
            meta: self.meta(Some(actor)),
            text,
            is_from_customer,
            is_internal: false,
        };
        self.execute(ticket_id, cmd.into()).await
    }

    /// Raises a ticket to urgent.
    #[tracing::instrument(skip(self))]
    pub async fn escalate(
        &self,
        ticket_id: &TicketId,
        actor: UserId,
        reason: Option<String>,
    ) -> TicketResult {
        let cmd = EscalatePriority {
            meta: self.meta(Some(actor)),
            reason,
        };
        self.execute(ticket_id, cmd.into()).await
    }

    /// Closes a ticket.
    #[tracing::instrument(skip(self))]
    pub async fn close(
        &self,
        ticket_id: &TicketId,
        actor: UserId,
        reason: Option<String>,
    ) -> TicketResult {
        let cmd = CloseTicket {
            meta: self.meta(Some(actor)),
            reason,
        };
        self.execute(ticket_id, cmd.into()).await
    }

    /// Reopens a closed ticket.
    #[tracing::instrument(skip(self))]
    pub async fn reopen(
        &self,
        ticket_id: &TicketId,
        actor: UserId,
        reason: Option<String>,
    ) -> TicketResult {
        let cmd = ReopenTicket {
            meta: self.meta(Some(actor)),
            reason,
        };
        self.execute(ticket_id, cmd.into()).await
    }

    /// Merges `source` into `target`, closing `source`. The target stream is not written.
    #[tracing::instrument(skip(self))]
    pub async fn merge(&self, source: &TicketId, target: &TicketId, actor: UserId) -> TicketResult {
        let cmd = MergeTicket {
            meta: self.meta(Some(actor)),
            source_ticket_id: source.clone(),
            target_ticket_id: target.clone(),
        };
        self.execute(source, cmd.into()).await
    }

    /// Returns the decision state of a ticket (empty if it does not exist).
    pub async fn state(&self, ticket_id: &TicketId) -> Result<TicketState, TicketError> {
        let (state, _) = self.handler.load(&stream_id(ticket_id)).await?;
        Ok(state)
    }

    /// Returns every event recorded for a ticket, oldest first.
    pub async fn history(&self, ticket_id: &TicketId) -> Result<Vec<TicketEvent>, TicketError> {
        let envelopes = self.handler.store().read_stream(&stream_id(ticket_id)).await?;
        envelopes
            .iter()
            .map(|envelope| envelope.decode::<TicketEvent>().map_err(TicketError::from))
            .collect()
    }

    /// Returns the full read model of a ticket, or `None` if it does not exist.
    pub async fn ticket(&self, ticket_id: &TicketId) -> Result<Option<Ticket>, TicketError> {
        let events = self.history(ticket_id).await?;
        Ok(Ticket::from_events(&events))
    }
}

fn stream_id(ticket_id: &TicketId) -> StreamId {
    StreamId::new(ticket_id.as_str())
}
