//! Response models shared by the HTTP handlers.

use actix_web::HttpResponse;
use serde::Serialize;
use turnera_core::CoreError;

/// Uniform JSON failure shape.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

impl ErrorBody {
    pub fn new(error: &str, message: impl Into<String>) -> Self {
        Self {
            error: error.to_string(),
            message: message.into(),
        }
    }
}

/// 503 used when the change source is unavailable.
pub fn source_unavailable() -> HttpResponse {
    HttpResponse::ServiceUnavailable().json(ErrorBody::new(
        "source_unavailable",
        "Change source is not connected",
    ))
}

/// 400 for a missing or invalid request parameter.
pub fn bad_request(message: impl Into<String>) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorBody::new("invalid_parameter", message))
}

/// 404 for an unknown queue or ticket.
pub fn not_found(message: impl Into<String>) -> HttpResponse {
    HttpResponse::NotFound().json(ErrorBody::new("not_found", message))
}

/// Map a core error onto the uniform failure responses.
pub fn core_error_response(error: &CoreError) -> HttpResponse {
    match error {
        CoreError::NotFound(message) => not_found(message.clone()),
        CoreError::Source(message) => HttpResponse::ServiceUnavailable()
            .json(ErrorBody::new("source_unavailable", message.clone())),
        CoreError::Config(message) => bad_request(message.clone()),
        other => HttpResponse::InternalServerError()
            .json(ErrorBody::new("internal_error", other.to_string())),
    }
}
