//! Point reads for tickets.

use crate::models::{bad_request, not_found, source_unavailable};
use actix_web::{get, web, HttpResponse, Responder};
use std::sync::Arc;
use turnera_commons::TicketId;
use turnera_core::{SourceHealth, StreamSessionManager};

/// GET /v1/api/tickets/{id} — fetch one ticket by id.
#[get("/tickets/{id}")]
pub async fn get_ticket(
    path: web::Path<String>,
    manager: web::Data<Arc<StreamSessionManager>>,
) -> impl Responder {
    let id = path.into_inner();
    if id.trim().is_empty() {
        return bad_request("ticket id is required");
    }

    if manager.source_health() == SourceHealth::Disconnected {
        return source_unavailable();
    }

    let ticket_id = TicketId::new(id);
    match manager.directory().ticket(&ticket_id).await {
        Some(ticket) => HttpResponse::Ok().json(ticket),
        None => not_found(format!("ticket not found: {}", ticket_id)),
    }
}
