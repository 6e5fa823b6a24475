//! # turnera-api
//!
//! HTTP layer for the Turnera streaming core: the server-sent-event streaming
//! endpoint, the non-streaming point reads, and the subsystem stats surface.
//! All handlers speak to the core through [`turnera_core::StreamSessionManager`].

pub mod handlers;
pub mod models;
pub mod routes;

pub use handlers::stream::StreamSettings;
pub use routes::configure_routes;
