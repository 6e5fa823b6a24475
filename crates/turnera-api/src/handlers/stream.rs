//! The server-sent-event streaming endpoint.
//!
//! `GET /v1/api/stream` opens one watch session and keeps the response body
//! alive until the client disconnects. The session's receiver is adapted into
//! the response stream; keep-alive comment frames are interleaved on a fixed
//! interval so intermediating proxies do not reap idle connections. Dropping
//! the stream (client gone, response cancelled) closes the session in the
//! same step — a dead sink never lingers in the registry.

use crate::models::{bad_request, core_error_response};
use actix_web::{get, web, HttpResponse, Responder};
use bytes::Bytes;
use futures::Stream;
use log::{debug, warn};
use serde::Deserialize;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::time::{interval, Interval, MissedTickBehavior};
use turnera_commons::{QueueId, StreamEvent, TicketId, WatchId, KEEP_ALIVE_FRAME};
use turnera_core::{SessionHandle, StreamReceiver, StreamSessionManager, WatchScope};

/// Transport settings handed in by the server binary.
#[derive(Debug, Clone)]
pub struct StreamSettings {
    pub keep_alive: Duration,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            keep_alive: Duration::from_secs(15),
        }
    }
}

/// Subscription parameters on the streaming endpoint. `ticketId` narrows to
/// one ticket and wins over `queueId`; neither yields a global session.
/// `status` and `userId` are informational.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamParams {
    pub queue_id: Option<String>,
    pub ticket_id: Option<String>,
    pub status: Option<String>,
    pub user_id: Option<String>,
    pub watch_id: Option<String>,
}

impl StreamParams {
    fn scope(&self) -> Result<WatchScope, String> {
        if let Some(ticket_id) = &self.ticket_id {
            if ticket_id.trim().is_empty() {
                return Err("ticketId must not be empty".to_string());
            }
            return Ok(WatchScope::Ticket(TicketId::new(ticket_id.clone())));
        }
        if let Some(queue_id) = &self.queue_id {
            if queue_id.trim().is_empty() {
                return Err("queueId must not be empty".to_string());
            }
            return Ok(WatchScope::Queue(QueueId::new(queue_id.clone())));
        }
        Ok(WatchScope::Global)
    }
}

#[get("/stream")]
pub async fn open_stream(
    params: web::Query<StreamParams>,
    manager: web::Data<Arc<StreamSessionManager>>,
    settings: web::Data<StreamSettings>,
) -> impl Responder {
    let scope = match params.scope() {
        Ok(scope) => scope,
        Err(message) => return bad_request(message),
    };

    let watch_id = params
        .watch_id
        .as_ref()
        .filter(|id| !id.trim().is_empty())
        .map(|id| WatchId::new(id.clone()));

    let handle = match manager.open_session(scope, watch_id).await {
        Ok(handle) => handle,
        Err(e) => {
            warn!("Stream subscription rejected: {}", e);
            return core_error_response(&e);
        }
    };

    debug!(
        "Stream opened: watch={} user={:?}",
        handle.id, params.user_id
    );

    let body = SseStream::new(handle, manager.get_ref().clone(), settings.keep_alive);

    HttpResponse::Ok()
        .insert_header(("Content-Type", "text/event-stream"))
        .insert_header(("Cache-Control", "no-cache"))
        // Disable response buffering in intermediating proxies.
        .insert_header(("X-Accel-Buffering", "no"))
        .streaming(body)
}

/// Adapts a session receiver into an SSE response body, interleaving
/// keep-alive comment frames whenever no event is pending.
struct SseStream {
    watch_id: WatchId,
    receiver: StreamReceiver,
    keep_alive: Interval,
    manager: Arc<StreamSessionManager>,
}

impl SseStream {
    fn new(handle: SessionHandle, manager: Arc<StreamSessionManager>, keep_alive: Duration) -> Self {
        let mut ticker = interval(keep_alive);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick fires immediately; the stream already opens with a
        // stream_opened event, so skip it.
        ticker.reset();
        Self {
            watch_id: handle.id,
            receiver: handle.receiver,
            keep_alive: ticker,
            manager,
        }
    }
}

impl Stream for SseStream {
    type Item = Result<Bytes, actix_web::Error>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        match this.receiver.poll_recv(cx) {
            Poll::Ready(Some(event)) => {
                return Poll::Ready(Some(Ok(frame(&event))));
            }
            // The session was evicted server-side; end the response.
            Poll::Ready(None) => return Poll::Ready(None),
            Poll::Pending => {}
        }

        if this.keep_alive.poll_tick(cx).is_ready() {
            return Poll::Ready(Some(Ok(Bytes::from_static(KEEP_ALIVE_FRAME.as_bytes()))));
        }

        Poll::Pending
    }
}

impl Drop for SseStream {
    /// Client disconnects drop the response body; the session must stop
    /// receiving pushes in the same step, with no grace period.
    fn drop(&mut self) {
        self.manager.close_session(&self.watch_id);
    }
}

fn frame(event: &StreamEvent) -> Bytes {
    Bytes::from(event.to_sse_frame())
}
