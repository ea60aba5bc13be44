//! Ticket lifecycle decision engine.
//!
//! This crate provides:
//! - The `Decider` trait: pure `decide` and `evolve` over commands, events and state
//! - The ticket aggregate: commands, events, `TicketState`, `DomainError` and the status machine
//! - The `Ticket` read model folded from the same events
//! - `CommandHandler` and `TicketService`, which run deciders against an event store

pub mod aggregate;
pub mod command;
pub mod config;
pub mod error;
pub mod ticket;

pub use aggregate::{Decider, DomainEvent};
pub use command::{CommandError, CommandHandler, CommandResult};
pub use config::{IdStrategy, LogFormat, ServiceConfig};
pub use error::DomainError;
pub use ticket::{
    DecideContext, IdGeneratorContext, Ticket, TicketCommand, TicketDecider, TicketError,
    TicketEvent, TicketPriority, TicketService, TicketState, TicketStatus, TicketType, decide,
    empty_ticket_state, evolve, evolve_all, reconstitute_from_events,
};
