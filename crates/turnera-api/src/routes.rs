//! API route configuration.
//!
//! All endpoints use the /v1 version prefix:
//! - GET /v1/api/stream — server-sent event stream (watch subscriptions)
//! - GET /v1/api/stream/stats — streaming subsystem introspection
//! - GET /v1/api/tickets/{id} — point read of one ticket
//! - GET /v1/api/queues/{id}/tickets — ticket listing with status filter
//! - GET /v1/api/queues/{id}/state — aggregated queue state document
//! - GET /v1/api/healthcheck — health check endpoint

use crate::handlers;
use actix_web::{web, HttpResponse};
use serde_json::json;

/// Configure API routes for the Turnera streaming service.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/v1").service(
            web::scope("/api")
                .service(handlers::stream::open_stream)
                .service(handlers::stats::get_stream_stats)
                .service(handlers::tickets::get_ticket)
                .service(handlers::queues::list_queue_tickets)
                .service(handlers::queues::get_queue_state)
                .route("/healthcheck", web::get().to(healthcheck_handler)),
        ),
    );
}

/// Health check endpoint handler.
async fn healthcheck_handler() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "api_version": "v1",
    }))
}
