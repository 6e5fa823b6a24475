//! On-demand snapshot construction.

use super::model::QueueSnapshot;
use super::stats::assemble;
use crate::error::{CoreError, Result};
use crate::source::TicketDirectory;
use chrono::Utc;
use log::debug;
use std::sync::Arc;
use turnera_commons::QueueId;

/// Builds [`QueueSnapshot`]s by composing point queries against the change
/// source's query interface. Each build produces a fresh value; nothing is
/// cached across calls.
pub struct SnapshotBuilder {
    directory: Arc<dyn TicketDirectory>,
}

impl SnapshotBuilder {
    pub fn new(directory: Arc<dyn TicketDirectory>) -> Arc<Self> {
        Arc::new(Self { directory })
    }

    /// Reconstruct the visible state of one queue. An unknown queue is a
    /// `NotFound` error — a snapshot for a non-existent queue is a
    /// client-visible failure, not an empty document.
    pub async fn build_queue_snapshot(&self, queue_id: &QueueId) -> Result<QueueSnapshot> {
        let queue = self
            .directory
            .queue(queue_id)
            .await
            .ok_or_else(|| CoreError::NotFound(format!("queue not found: {}", queue_id)))?;

        let tickets = self.directory.tickets_by_queue(queue_id, None).await;
        debug!(
            "Building snapshot for queue {} from {} tickets",
            queue_id,
            tickets.len()
        );

        Ok(assemble(&queue, &tickets, Utc::now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use turnera_commons::{Queue, TenantId, Ticket, TicketId, TicketStatus};

    struct EmptyDirectory;

    #[async_trait]
    impl TicketDirectory for EmptyDirectory {
        async fn ticket(&self, _id: &TicketId) -> Option<Ticket> {
            None
        }

        async fn tickets_by_queue(
            &self,
            _queue_id: &QueueId,
            _status: Option<TicketStatus>,
        ) -> Vec<Ticket> {
            Vec::new()
        }

        async fn queue(&self, id: &QueueId) -> Option<Queue> {
            (id.as_str() == "q-1").then(|| Queue {
                id: id.clone(),
                tenant_id: TenantId::new("tn-1"),
                name: "Front desk".to_string(),
                avg_service_seconds: 120,
                is_active: true,
            })
        }
    }

    #[tokio::test]
    async fn test_unknown_queue_is_not_found() {
        let builder = SnapshotBuilder::new(Arc::new(EmptyDirectory));
        let result = builder.build_queue_snapshot(&QueueId::new("missing")).await;
        assert!(matches!(result, Err(CoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_known_queue_with_no_tickets_builds_empty_snapshot() {
        let builder = SnapshotBuilder::new(Arc::new(EmptyDirectory));
        let snapshot = builder
            .build_queue_snapshot(&QueueId::new("q-1"))
            .await
            .unwrap();
        assert_eq!(snapshot.queue_id.as_str(), "q-1");
        assert!(snapshot.current_ticket.is_none());
        assert_eq!(snapshot.statistics.total_waiting, 0);
    }
}
