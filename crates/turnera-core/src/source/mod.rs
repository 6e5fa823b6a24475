//! Change source: the persistent notification listener and the point-query
//! interface over the relational store.

mod adapter;
mod payload;

pub use adapter::{
    PgChangeSource, SourceConfig, SourceHealth, SourceStatus, TicketDirectory,
    RECONNECT_DELAY, RECONNECT_FALLBACK_DELAY,
};
pub use payload::decode_payload;
