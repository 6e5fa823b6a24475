//! Domain read models and the normalized change event.

mod change;
mod queue;
mod ticket;

pub use change::{ChangeAction, ChangeEvent};
pub use queue::Queue;
pub use ticket::{Ticket, TicketStatus};
