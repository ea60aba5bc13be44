//! Ticket aggregate and related types.

mod commands;
mod decide;
mod events;
mod evolve;
mod read_model;
mod service;
mod state;
mod status;
mod value_objects;

pub use commands::*;
pub use decide::{DecideContext, IdGeneratorContext, can_merge, decide};
pub use events::*;
pub use evolve::{TicketDecider, evolve, evolve_all, reconstitute_from_events};
pub use read_model::{Comment, Ticket};
pub use service::{TicketError, TicketResult, TicketService};
pub use state::{TicketState, empty_ticket_state};
pub use status::TicketStatus;
pub use value_objects::{FieldChange, SlaKind, TicketPriority, TicketType};
