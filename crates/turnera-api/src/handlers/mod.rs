//! HTTP request handlers.

pub mod queues;
pub mod stats;
pub mod stream;
pub mod tickets;
