//! # turnera-core
//!
//! The Turnera real-time streaming core. One persistent listener on the
//! store's notification channel feeds a dispatcher that fans row-level ticket
//! changes out to the open client sessions that care about them:
//!
//! ```text
//! PostgreSQL NOTIFY
//!       ↓
//! source::PgChangeSource        (decode, reconnect state machine)
//!       ↓ bounded channel
//! dispatch::NotificationDispatcher   (dedup gate, listener isolation)
//!       ↓
//! live::StreamSessionManager    (watch registry lookup, broadcasts)
//!       ↓                ↘
//! client sinks       snapshot::SnapshotBuilder (queue-scoped pushes)
//! ```
//!
//! CRUD, auth and external notification delivery live elsewhere; this crate
//! only consumes a query interface for point lookups and the notification
//! channel, and exposes subscribe/unsubscribe plus introspection.

pub mod dispatch;
pub mod error;
pub mod live;
pub mod snapshot;
pub mod source;

pub use dispatch::{ChangeListener, DedupCache, NotificationDispatcher};
pub use error::{CoreError, Result};
pub use live::{
    SessionHandle, StreamReceiver, StreamSessionManager, StreamStats, WatchRegistry, WatchScope,
};
pub use snapshot::{QueueSnapshot, QueueStatistics, SnapshotBuilder};
pub use source::{PgChangeSource, SourceConfig, SourceHealth, SourceStatus, TicketDirectory};
