//! Ticket read model.

use crate::ids::{QueueId, TicketId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    /// Issued, waiting to be called.
    Waiting,
    /// Called to a counter, service in progress.
    Called,
    /// Service finished.
    Completed,
    /// Called but the customer never showed up.
    NoShow,
    /// Cancelled by the customer or an agent before being called.
    Cancelled,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Waiting => "waiting",
            TicketStatus::Called => "called",
            TicketStatus::Completed => "completed",
            TicketStatus::NoShow => "no_show",
            TicketStatus::Cancelled => "cancelled",
        }
    }

    /// Parse a status from its wire/storage form. Returns `None` for unknown
    /// values so callers can decide whether to skip or reject.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "waiting" => Some(TicketStatus::Waiting),
            "called" => Some(TicketStatus::Called),
            "completed" => Some(TicketStatus::Completed),
            "no_show" => Some(TicketStatus::NoShow),
            "cancelled" => Some(TicketStatus::Cancelled),
            _ => None,
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One customer's place in a queue, as read from the store. Serialized in
/// camelCase because tickets are embedded verbatim in wire documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: TicketId,
    pub queue_id: QueueId,
    /// Human-facing ticket number shown on displays (e.g. "A-042").
    pub display_number: String,
    pub status: TicketStatus,
    /// Higher priority is served first; ties break on `created_at`.
    pub priority: i32,
    pub created_at: DateTime<Utc>,
    pub called_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse_roundtrip() {
        for status in [
            TicketStatus::Waiting,
            TicketStatus::Called,
            TicketStatus::Completed,
            TicketStatus::NoShow,
            TicketStatus::Cancelled,
        ] {
            assert_eq!(TicketStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(TicketStatus::parse("on_hold"), None);
    }

    #[test]
    fn test_status_serde_snake_case() {
        let json = serde_json::to_string(&TicketStatus::NoShow).unwrap();
        assert_eq!(json, "\"no_show\"");
    }
}
