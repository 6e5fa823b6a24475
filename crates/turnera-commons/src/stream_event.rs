//! Outbound stream event envelope and its server-sent-event framing.
//!
//! Every message pushed into a client stream is one `StreamEvent`, serialized
//! as JSON and framed as `data: <json>\n\n` on the wire. Clients multiplex on
//! the `event` field:
//!
//! - `stream_opened` — first event on every stream, echoes the watch id
//! - `queue_state` — a full queue snapshot (initial push and after changes)
//! - `ticket_notification` — global broadcast of a raw change
//! - `queue_ticket_notification` — queue-scoped raw change (paired with a
//!   fresh `queue_state`)
//! - `ticket_specific_notification` — change on an explicitly watched ticket
//! - `ticket_watch_started` — acknowledgement of a ticket-scoped subscribe

use crate::ids::{QueueId, TicketId, WatchId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// SSE comment frame sent periodically to defeat idle-connection timeouts in
/// intermediating proxies.
pub const KEEP_ALIVE_FRAME: &str = ": keep-alive\n\n";

/// The JSON envelope pushed to stream clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamEvent {
    pub event: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watch_id: Option<WatchId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_id: Option<QueueId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket_id: Option<TicketId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<JsonValue>,
    pub timestamp: DateTime<Utc>,
}

impl StreamEvent {
    fn new(event: &str) -> Self {
        Self {
            event: event.to_string(),
            watch_id: None,
            queue_id: None,
            ticket_id: None,
            data: None,
            timestamp: Utc::now(),
        }
    }

    /// First event on every stream.
    pub fn stream_opened(watch_id: WatchId) -> Self {
        Self {
            watch_id: Some(watch_id),
            ..Self::new("stream_opened")
        }
    }

    /// Full queue snapshot, pushed on subscribe and after each queue-scoped
    /// change.
    pub fn queue_state(queue_id: QueueId, snapshot: JsonValue) -> Self {
        Self {
            queue_id: Some(queue_id),
            data: Some(snapshot),
            ..Self::new("queue_state")
        }
    }

    /// Global broadcast of one raw change, delivered to every open session.
    pub fn ticket_notification(ticket_id: TicketId, queue_id: QueueId, change: JsonValue) -> Self {
        Self {
            ticket_id: Some(ticket_id),
            queue_id: Some(queue_id),
            data: Some(change),
            ..Self::new("ticket_notification")
        }
    }

    /// Raw change delivered to watchers of the ticket's queue.
    pub fn queue_ticket_notification(
        queue_id: QueueId,
        ticket_id: TicketId,
        change: JsonValue,
    ) -> Self {
        Self {
            queue_id: Some(queue_id),
            ticket_id: Some(ticket_id),
            data: Some(change),
            ..Self::new("queue_ticket_notification")
        }
    }

    /// Change delivered to sessions watching this specific ticket.
    pub fn ticket_specific_notification(ticket_id: TicketId, change: JsonValue) -> Self {
        Self {
            ticket_id: Some(ticket_id),
            data: Some(change),
            ..Self::new("ticket_specific_notification")
        }
    }

    /// Acknowledgement of a ticket-scoped subscribe.
    pub fn ticket_watch_started(watch_id: WatchId, ticket_id: TicketId) -> Self {
        Self {
            watch_id: Some(watch_id),
            ticket_id: Some(ticket_id),
            ..Self::new("ticket_watch_started")
        }
    }

    /// Wire framing for `text/event-stream`: `data: <json>\n\n`.
    ///
    /// Serialization of this type cannot fail (no maps with non-string keys),
    /// so the fallback branch only guards against future field additions.
    pub fn to_sse_frame(&self) -> String {
        match serde_json::to_string(self) {
            Ok(json) => format!("data: {}\n\n", json),
            Err(_) => "data: {}\n\n".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_uses_camel_case_and_omits_empty_fields() {
        let event = StreamEvent::stream_opened(WatchId::new("w-1"));
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"event\":\"stream_opened\""));
        assert!(json.contains("\"watchId\":\"w-1\""));
        assert!(json.contains("\"timestamp\""));
        assert!(!json.contains("queueId"));
        assert!(!json.contains("ticketId"));
        assert!(!json.contains("data"));
    }

    #[test]
    fn test_sse_frame_shape() {
        let event = StreamEvent::queue_state(QueueId::new("q-1"), serde_json::json!({"x": 1}));
        let frame = event.to_sse_frame();
        assert!(frame.starts_with("data: {"));
        assert!(frame.ends_with("\n\n"));
    }

    #[test]
    fn test_keep_alive_is_a_comment_frame() {
        assert!(KEEP_ALIVE_FRAME.starts_with(':'));
        assert!(KEEP_ALIVE_FRAME.ends_with("\n\n"));
    }
}
