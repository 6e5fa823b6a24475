//! Subsystem introspection.

use actix_web::{get, web, HttpResponse, Responder};
use std::sync::Arc;
use turnera_core::StreamSessionManager;

/// GET /v1/api/stream/stats — open session count, per-queue and per-ticket
/// watcher counts, and upstream connection health.
#[get("/stream/stats")]
pub async fn get_stream_stats(manager: web::Data<Arc<StreamSessionManager>>) -> impl Responder {
    HttpResponse::Ok().json(manager.stats())
}
