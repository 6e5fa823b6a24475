//! Stream session manager.
//!
//! The only component exposed to the HTTP layer. Opens and closes watch
//! sessions, pushes the initial snapshot on queue-scoped subscribes, and —
//! as the dispatcher's listener — routes each upstream change event into the
//! right set of outbound pushes.

use super::registry::{PushOutcome, WatchRegistry};
use super::session::{SessionHandle, WatchScope, WatchSession};
use crate::dispatch::ChangeListener;
use crate::error::{CoreError, Result};
use crate::snapshot::{QueueSnapshot, SnapshotBuilder};
use crate::source::{SourceHealth, SourceStatus, TicketDirectory};
use async_trait::async_trait;
use log::{debug, error, info, warn};
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::Arc;
use turnera_commons::{ChangeEvent, QueueId, StreamEvent, TicketId, WatchId};
use uuid::Uuid;

/// Introspection document for the stats endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamStats {
    pub open_sessions: usize,
    pub queue_watchers: HashMap<String, usize>,
    pub ticket_watchers: HashMap<String, usize>,
    pub source_health: String,
}

/// Owns the watch registry and performs every broadcast.
pub struct StreamSessionManager {
    registry: WatchRegistry,
    directory: Arc<dyn TicketDirectory>,
    snapshots: Arc<SnapshotBuilder>,
    source_status: Arc<SourceStatus>,
}

impl StreamSessionManager {
    pub fn new(
        directory: Arc<dyn TicketDirectory>,
        snapshots: Arc<SnapshotBuilder>,
        source_status: Arc<SourceStatus>,
    ) -> Arc<Self> {
        Arc::new(Self {
            registry: WatchRegistry::new(),
            directory,
            snapshots,
            source_status,
        })
    }

    /// Point-query interface, for the read endpoints.
    pub fn directory(&self) -> &Arc<dyn TicketDirectory> {
        &self.directory
    }

    /// Snapshot builder, for the queue-state endpoint.
    pub fn snapshots(&self) -> &Arc<SnapshotBuilder> {
        &self.snapshots
    }

    pub fn source_health(&self) -> SourceHealth {
        self.source_status.get()
    }

    // ==================== Session lifecycle ====================

    /// Open a watch session. A queue-scoped session receives one full
    /// `queue_state` push before the handle is returned, so a client never
    /// observes a window between connecting and receiving state. A reused
    /// watch id replaces the previous session with that id.
    pub async fn open_session(
        &self,
        scope: WatchScope,
        watch_id: Option<WatchId>,
    ) -> Result<SessionHandle> {
        let id = watch_id.unwrap_or_else(|| WatchId::new(Uuid::new_v4().to_string()));

        if self.registry.contains(&id) {
            debug!("Watch id {} reused; replacing previous session", id);
            self.close_session(&id);
        }

        let (session, receiver) = WatchSession::new(id.clone(), scope.clone());

        session
            .try_push(StreamEvent::stream_opened(id.clone()))
            .map_err(|_| CoreError::SinkClosed(id.to_string()))?;

        match &scope {
            WatchScope::Queue(queue_id) => {
                let snapshot = self.snapshots.build_queue_snapshot(queue_id).await?;
                session
                    .try_push(StreamEvent::queue_state(
                        queue_id.clone(),
                        to_json(&snapshot),
                    ))
                    .map_err(|_| CoreError::SinkClosed(id.to_string()))?;
            }
            WatchScope::Ticket(ticket_id) => {
                session
                    .try_push(StreamEvent::ticket_watch_started(
                        id.clone(),
                        ticket_id.clone(),
                    ))
                    .map_err(|_| CoreError::SinkClosed(id.to_string()))?;
            }
            WatchScope::Global => {}
        }

        self.registry.insert(session);
        info!("Watch session opened: {} ({:?})", id, scope);

        Ok(SessionHandle {
            id,
            scope,
            receiver,
        })
    }

    /// Close a session and drop every registry entry for it. Idempotent:
    /// closing twice, or closing an id never opened, is a no-op.
    pub fn close_session(&self, id: &WatchId) {
        if self.registry.remove(id) {
            info!("Watch session closed: {}", id);
        }
    }

    pub fn session_count(&self) -> usize {
        self.registry.session_count()
    }

    pub fn stats(&self) -> StreamStats {
        StreamStats {
            open_sessions: self.registry.session_count(),
            queue_watchers: self.registry.queue_watcher_counts(),
            ticket_watchers: self.registry.ticket_watcher_counts(),
            source_health: self.source_status.get().as_str().to_string(),
        }
    }

    // ==================== Broadcasts ====================

    /// Push a notification to every open session regardless of scope.
    pub fn broadcast_global(&self, event: &ChangeEvent) {
        let change = to_json(event);
        for id in self.registry.all_sessions() {
            self.push_or_evict(
                &id,
                StreamEvent::ticket_notification(
                    event.entity_id.clone(),
                    event.queue_id.clone(),
                    change.clone(),
                ),
            );
        }
    }

    /// Push the raw change and the fresh snapshot to every session scoped to
    /// the queue. A dead sink is evicted as a side effect; delivery to the
    /// remaining sessions continues.
    pub fn broadcast_to_queue(
        &self,
        queue_id: &QueueId,
        event: &ChangeEvent,
        snapshot: &QueueSnapshot,
    ) {
        let change = to_json(event);
        let state = to_json(snapshot);
        for id in self.registry.queue_watchers(queue_id) {
            let delivered = self.push_or_evict(
                &id,
                StreamEvent::queue_ticket_notification(
                    queue_id.clone(),
                    event.entity_id.clone(),
                    change.clone(),
                ),
            );
            if delivered {
                self.push_or_evict(
                    &id,
                    StreamEvent::queue_state(queue_id.clone(), state.clone()),
                );
            }
        }
    }

    /// Ticket-scoped analogue of the queue broadcast; push-only, no snapshot.
    pub fn broadcast_to_ticket(&self, ticket_id: &TicketId, event: &ChangeEvent) {
        let change = to_json(event);
        for id in self.registry.ticket_watchers(ticket_id) {
            self.push_or_evict(
                &id,
                StreamEvent::ticket_specific_notification(ticket_id.clone(), change.clone()),
            );
        }
    }

    /// Push one event; evict the session when its sink is gone. Returns
    /// whether the session is still alive.
    fn push_or_evict(&self, id: &WatchId, event: StreamEvent) -> bool {
        match self.registry.try_push(id, event) {
            PushOutcome::Delivered => true,
            PushOutcome::Full => {
                // TODO: the event is dropped when a session falls this far
                // behind; a reconnect picks up a fresh snapshot. Revisit if
                // slow consumers become common.
                warn!("Session {} channel full; dropping event", id);
                true
            }
            PushOutcome::Closed => {
                debug!("Session {} sink closed; evicting", id);
                self.close_session(id);
                false
            }
            PushOutcome::Unknown => false,
        }
    }
}

#[async_trait]
impl ChangeListener for StreamSessionManager {
    /// Route one upstream change: a snapshot is built (and queue watchers
    /// notified) only when the queue has at least one active watcher; ticket
    /// watchers get their scoped push; every open session gets the global
    /// notification.
    async fn on_change(&self, event: &ChangeEvent) -> Result<()> {
        if self.registry.has_queue_watchers(&event.queue_id) {
            match self.snapshots.build_queue_snapshot(&event.queue_id).await {
                Ok(snapshot) => self.broadcast_to_queue(&event.queue_id, event, &snapshot),
                Err(e) => warn!(
                    "Skipping queue broadcast for {}: {}",
                    event.queue_id, e
                ),
            }
        }

        if self.registry.has_ticket_watchers(&event.entity_id) {
            self.broadcast_to_ticket(&event.entity_id, event);
        }

        self.broadcast_global(event);
        Ok(())
    }
}

fn to_json<T: Serialize>(value: &T) -> JsonValue {
    match serde_json::to_value(value) {
        Ok(json) => json,
        Err(e) => {
            error!("Failed to serialize outbound payload: {}", e);
            JsonValue::Null
        }
    }
}
