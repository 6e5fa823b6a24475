//! # turnera-commons
//!
//! Shared building blocks for the Turnera streaming backend:
//! - Typed identifiers (`QueueId`, `TicketId`, `WatchId`, `TenantId`)
//! - Domain read models (`Ticket`, `Queue`) and the normalized `ChangeEvent`
//! - The outbound `StreamEvent` envelope and its SSE wire framing
//!
//! This crate carries no I/O and no engine logic; every other Turnera crate
//! depends on it.

pub mod ids;
pub mod models;
pub mod stream_event;

pub use ids::{QueueId, TenantId, TicketId, WatchId};
pub use models::{ChangeAction, ChangeEvent, Queue, Ticket, TicketStatus};
pub use stream_event::{StreamEvent, KEEP_ALIVE_FRAME};
