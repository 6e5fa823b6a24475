//! Normalized change events delivered by the store's notification channel.

use crate::ids::{QueueId, TicketId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What happened to the ticket row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeAction {
    Created,
    Updated,
    Deleted,
}

impl ChangeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeAction::Created => "created",
            ChangeAction::Updated => "updated",
            ChangeAction::Deleted => "deleted",
        }
    }

    /// Parse the row-trigger operation names the store emits.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "INSERT" | "created" => Some(ChangeAction::Created),
            "UPDATE" | "updated" => Some(ChangeAction::Updated),
            "DELETE" | "deleted" => Some(ChangeAction::Deleted),
            _ => None,
        }
    }
}

impl fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One row-level change on the ticket data, normalized from the raw
/// notification payload. Immutable and transient; never persisted here.
/// Serialized in camelCase because changes are embedded in wire documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEvent {
    /// The ticket the change applies to.
    pub entity_id: TicketId,
    pub action: ChangeAction,
    /// The queue the ticket belongs to.
    pub queue_id: QueueId,
    pub occurred_at: DateTime<Utc>,
}

impl ChangeEvent {
    /// Key used by the dedup cache to suppress duplicate upstream deliveries
    /// of the same physical change.
    pub fn dedup_key(&self) -> String {
        format!(
            "{}:{}:{}",
            self.entity_id,
            self.action,
            self.occurred_at.timestamp_millis()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_action_parse_accepts_trigger_names() {
        assert_eq!(ChangeAction::parse("INSERT"), Some(ChangeAction::Created));
        assert_eq!(ChangeAction::parse("UPDATE"), Some(ChangeAction::Updated));
        assert_eq!(ChangeAction::parse("DELETE"), Some(ChangeAction::Deleted));
        assert_eq!(ChangeAction::parse("TRUNCATE"), None);
    }

    #[test]
    fn test_dedup_key_is_stable() {
        let event = ChangeEvent {
            entity_id: TicketId::new("t-1"),
            action: ChangeAction::Updated,
            queue_id: QueueId::new("q-1"),
            occurred_at: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
        };
        assert_eq!(event.dedup_key(), event.clone().dedup_key());
        assert!(event.dedup_key().starts_with("t-1:updated:"));
    }
}
