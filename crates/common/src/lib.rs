//! Shared building blocks for the ticket lifecycle engine.
//!
//! - Branded identifiers for tickets, comments, users and customers
//! - `Clock` and `IdGenerator` ports with production and test implementations
//! - Result/Option combinators used by command validation

pub mod clock;
pub mod id;
pub mod result;
pub mod types;

pub use clock::{Clock, FixedClock, ManualClock, SystemClock};
pub use id::{FixedIdGenerator, IdGenerator, SequentialIdGenerator, UuidIdGenerator};
pub use types::{CommentId, CustomerId, TicketId, UserId};
