//! End-to-end flow through the core without a database: decoded payloads go
//! through the dispatcher's dedup gate into the session manager, and out to
//! watch sessions.

use async_trait::async_trait;
use std::sync::Arc;
use turnera_commons::{Queue, QueueId, TenantId, Ticket, TicketId, TicketStatus, WatchId};
use turnera_core::source::decode_payload;
use turnera_core::{
    NotificationDispatcher, SnapshotBuilder, SourceHealth, SourceStatus, StreamSessionManager,
    TicketDirectory, WatchScope,
};

struct FixtureDirectory;

#[async_trait]
impl TicketDirectory for FixtureDirectory {
    async fn ticket(&self, id: &TicketId) -> Option<Ticket> {
        (id.as_str() == "t-1").then(|| Ticket {
            id: id.clone(),
            queue_id: QueueId::new("q-1"),
            display_number: "A-001".to_string(),
            status: TicketStatus::Waiting,
            priority: 0,
            created_at: chrono::Utc::now(),
            called_at: None,
            completed_at: None,
        })
    }

    async fn tickets_by_queue(
        &self,
        queue_id: &QueueId,
        _status: Option<TicketStatus>,
    ) -> Vec<Ticket> {
        match self.ticket(&TicketId::new("t-1")).await {
            Some(ticket) if &ticket.queue_id == queue_id => vec![ticket],
            _ => Vec::new(),
        }
    }

    async fn queue(&self, id: &QueueId) -> Option<Queue> {
        (id.as_str() == "q-1").then(|| Queue {
            id: id.clone(),
            tenant_id: TenantId::new("tn-1"),
            name: "Front desk".to_string(),
            avg_service_seconds: 90,
            is_active: true,
        })
    }
}

fn wire_core() -> (Arc<NotificationDispatcher>, Arc<StreamSessionManager>) {
    let directory: Arc<dyn TicketDirectory> = Arc::new(FixtureDirectory);
    let snapshots = SnapshotBuilder::new(directory.clone());
    let status = Arc::new(SourceStatus::new(SourceHealth::Connected));
    let manager = StreamSessionManager::new(directory, snapshots, status);

    let dispatcher = NotificationDispatcher::new();
    dispatcher.register(manager.clone());
    (dispatcher, manager)
}

const RAW_UPDATE: &str = r#"{"ticket_id":"t-1","action":"UPDATE","queue_id":"q-1","timestamp":"2025-06-01T12:00:00Z"}"#;

#[tokio::test]
async fn duplicate_upstream_delivery_reaches_clients_once() {
    let (dispatcher, manager) = wire_core();

    let mut handle = manager
        .open_session(WatchScope::Queue(QueueId::new("q-1")), None)
        .await
        .unwrap();
    handle.receiver.recv().await.unwrap(); // stream_opened
    handle.receiver.recv().await.unwrap(); // initial queue_state

    // The store delivers the same physical notification twice.
    let event = decode_payload(RAW_UPDATE).unwrap();
    dispatcher.dispatch(event.clone()).await;
    dispatcher.dispatch(event).await;

    // Exactly one broadcast: raw change, queue state, global notification.
    let raw = handle.receiver.recv().await.unwrap();
    assert_eq!(raw.event, "queue_ticket_notification");
    let state = handle.receiver.recv().await.unwrap();
    assert_eq!(state.event, "queue_state");
    let global = handle.receiver.recv().await.unwrap();
    assert_eq!(global.event, "ticket_notification");

    assert!(
        handle.receiver.try_recv().is_err(),
        "duplicate delivery must not produce a second broadcast"
    );
}

#[tokio::test]
async fn disconnect_cleans_registry_and_later_events_skip_the_session() {
    let (dispatcher, manager) = wire_core();

    let handle = manager
        .open_session(
            WatchScope::Queue(QueueId::new("q-1")),
            Some(WatchId::new("board-1")),
        )
        .await
        .unwrap();
    assert_eq!(manager.session_count(), 1);

    // Transport gone: the receiver is dropped, close runs in the same step.
    manager.close_session(&handle.id);
    drop(handle);
    assert_eq!(manager.session_count(), 0);

    // A change after the disconnect is a no-op for the registry.
    let event = decode_payload(RAW_UPDATE).unwrap();
    dispatcher.dispatch(event).await;
    assert_eq!(manager.session_count(), 0);
    assert!(manager.stats().queue_watchers.is_empty());
}

#[tokio::test]
async fn stats_reflect_open_sessions_and_source_health() {
    let (_dispatcher, manager) = wire_core();

    let _global = manager.open_session(WatchScope::Global, None).await.unwrap();
    let _queue = manager
        .open_session(WatchScope::Queue(QueueId::new("q-1")), None)
        .await
        .unwrap();
    let _ticket = manager
        .open_session(WatchScope::Ticket(TicketId::new("t-1")), None)
        .await
        .unwrap();

    let stats = manager.stats();
    assert_eq!(stats.open_sessions, 3);
    assert_eq!(stats.queue_watchers.get("q-1"), Some(&1));
    assert_eq!(stats.ticket_watchers.get("t-1"), Some(&1));
    assert_eq!(stats.source_health, "connected");
}
