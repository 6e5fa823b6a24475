//! Snapshot wire model.

use serde::{Deserialize, Serialize};
use turnera_commons::{QueueId, Ticket};

/// Derived statistics over a queue's current ticket set. All values default
/// to zero on empty sets; none of the computations can produce NaN.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueStatistics {
    pub total_waiting: usize,
    pub total_called: usize,
    pub total_completed: usize,
    pub completed_today: usize,
    pub no_show_today: usize,
    /// Mean service duration (`completed_at − called_at`) over tickets
    /// completed today, in seconds.
    pub avg_wait_seconds: f64,
    /// Estimated wait for a ticket issued now, in seconds.
    pub next_estimated_seconds: f64,
    /// Share of today's created tickets that completed, as a percentage.
    pub completion_rate: f64,
    /// Share of today's created tickets that no-showed, as a percentage.
    pub abandonment_rate: f64,
}

impl QueueStatistics {
    pub fn zero() -> Self {
        Self {
            total_waiting: 0,
            total_called: 0,
            total_completed: 0,
            completed_today: 0,
            no_show_today: 0,
            avg_wait_seconds: 0.0,
            next_estimated_seconds: 0.0,
            completion_rate: 0.0,
            abandonment_rate: 0.0,
        }
    }
}

/// A freshly computed, immutable summary of one queue. Recomputed on demand
/// and sent wholesale to sinks; never mutated in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueSnapshot {
    pub queue_id: QueueId,
    pub queue_name: String,
    pub current_ticket: Option<Ticket>,
    pub previous_ticket: Option<Ticket>,
    pub next_ticket: Option<Ticket>,
    pub next_tickets: Vec<Ticket>,
    pub last_called_tickets: Vec<Ticket>,
    pub completed_tickets: Vec<Ticket>,
    pub statistics: QueueStatistics,
}
