//! Decoding of raw `pg_notify` payloads into typed change events.
//!
//! The ticket triggers emit one JSON document per row change:
//!
//! ```json
//! {"ticket_id": "t-1", "action": "INSERT", "queue_id": "q-1",
//!  "timestamp": "2025-06-01T12:00:00Z"}
//! ```

use crate::error::{CoreError, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use turnera_commons::{ChangeAction, ChangeEvent, QueueId, TicketId};

#[derive(Debug, Deserialize)]
struct RawChangePayload {
    ticket_id: String,
    action: String,
    queue_id: String,
    timestamp: DateTime<Utc>,
}

/// Decode one raw notification payload. Unknown actions and malformed JSON
/// are errors; the listener logs and drops them without affecting liveness.
pub fn decode_payload(raw: &str) -> Result<ChangeEvent> {
    let payload: RawChangePayload =
        serde_json::from_str(raw).map_err(|e| CoreError::Decode(e.to_string()))?;

    let action = ChangeAction::parse(&payload.action)
        .ok_or_else(|| CoreError::Decode(format!("unknown action: {}", payload.action)))?;

    Ok(ChangeEvent {
        entity_id: TicketId::new(payload.ticket_id),
        action,
        queue_id: QueueId::new(payload.queue_id),
        occurred_at: payload.timestamp,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_valid_payload() {
        let raw = r#"{"ticket_id":"t-1","action":"INSERT","queue_id":"q-1","timestamp":"2025-06-01T12:00:00Z"}"#;
        let event = decode_payload(raw).unwrap();
        assert_eq!(event.entity_id.as_str(), "t-1");
        assert_eq!(event.action, ChangeAction::Created);
        assert_eq!(event.queue_id.as_str(), "q-1");
    }

    #[test]
    fn test_decode_rejects_unknown_action() {
        let raw = r#"{"ticket_id":"t-1","action":"TRUNCATE","queue_id":"q-1","timestamp":"2025-06-01T12:00:00Z"}"#;
        assert!(matches!(decode_payload(raw), Err(CoreError::Decode(_))));
    }

    #[test]
    fn test_decode_rejects_malformed_json() {
        assert!(matches!(
            decode_payload("not json"),
            Err(CoreError::Decode(_))
        ));
        assert!(matches!(
            decode_payload(r#"{"ticket_id":"t-1"}"#),
            Err(CoreError::Decode(_))
        ));
    }
}
