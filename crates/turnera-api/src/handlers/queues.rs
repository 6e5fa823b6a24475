//! Point reads for queues: ticket listings and the aggregated state document.

use crate::models::{bad_request, core_error_response, source_unavailable};
use actix_web::{get, web, HttpResponse, Responder};
use serde::Deserialize;
use std::sync::Arc;
use turnera_commons::{QueueId, TicketStatus};
use turnera_core::{SourceHealth, StreamSessionManager};

#[derive(Debug, Deserialize)]
pub struct TicketListParams {
    pub status: Option<String>,
}

/// GET /v1/api/queues/{id}/tickets — list tickets for a queue, optionally
/// filtered by status.
#[get("/queues/{id}/tickets")]
pub async fn list_queue_tickets(
    path: web::Path<String>,
    params: web::Query<TicketListParams>,
    manager: web::Data<Arc<StreamSessionManager>>,
) -> impl Responder {
    let id = path.into_inner();
    if id.trim().is_empty() {
        return bad_request("queue id is required");
    }

    let status = match &params.status {
        Some(raw) => match TicketStatus::parse(raw) {
            Some(status) => Some(status),
            None => return bad_request(format!("unknown ticket status: {}", raw)),
        },
        None => None,
    };

    if manager.source_health() == SourceHealth::Disconnected {
        return source_unavailable();
    }

    let queue_id = QueueId::new(id);
    let tickets = manager.directory().tickets_by_queue(&queue_id, status).await;
    HttpResponse::Ok().json(tickets)
}

/// GET /v1/api/queues/{id}/state — the aggregated queue state (current /
/// next / last-called / completed tickets plus statistics) as one document.
#[get("/queues/{id}/state")]
pub async fn get_queue_state(
    path: web::Path<String>,
    manager: web::Data<Arc<StreamSessionManager>>,
) -> impl Responder {
    let id = path.into_inner();
    if id.trim().is_empty() {
        return bad_request("queue id is required");
    }

    if manager.source_health() == SourceHealth::Disconnected {
        return source_unavailable();
    }

    match manager
        .snapshots()
        .build_queue_snapshot(&QueueId::new(id))
        .await
    {
        Ok(snapshot) => HttpResponse::Ok().json(snapshot),
        Err(e) => core_error_response(&e),
    }
}
