//! PostgreSQL change source adapter.
//!
//! Owns the one persistent `LISTEN` connection feeding the dispatcher, plus
//! the pooled point queries the snapshot builder composes. The listener runs
//! a reconnect state machine (`Connected → Disconnected → Reconnecting →
//! Connected`); a store outage degrades the subsystem (streams stop receiving
//! live updates, lookups return empty) but never aborts it.

use crate::error::{CoreError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use sqlx::postgres::{PgListener, PgPool, PgPoolOptions};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use turnera_commons::{ChangeEvent, Queue, QueueId, TenantId, Ticket, TicketId, TicketStatus};

use super::payload::decode_payload;

/// Delay before the first reconnect attempt after a drop.
pub const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Fallback delay when a reconnect attempt itself fails.
pub const RECONNECT_FALLBACK_DELAY: Duration = Duration::from_secs(30);

/// Connection state of the upstream listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SourceHealth {
    Connected = 0,
    Disconnected = 1,
    Reconnecting = 2,
}

impl SourceHealth {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceHealth::Connected => "connected",
            SourceHealth::Disconnected => "disconnected",
            SourceHealth::Reconnecting => "reconnecting",
        }
    }
}

/// Shared, lock-free view of the listener state. The adapter writes it; the
/// stats surface and the HTTP layer read it.
#[derive(Debug)]
pub struct SourceStatus(AtomicU8);

impl SourceStatus {
    pub fn new(initial: SourceHealth) -> Self {
        Self(AtomicU8::new(initial as u8))
    }

    pub fn get(&self) -> SourceHealth {
        match self.0.load(Ordering::Acquire) {
            0 => SourceHealth::Connected,
            1 => SourceHealth::Disconnected,
            _ => SourceHealth::Reconnecting,
        }
    }

    fn set(&self, health: SourceHealth) {
        self.0.store(health as u8, Ordering::Release);
    }

    pub fn is_connected(&self) -> bool {
        self.get() == SourceHealth::Connected
    }
}

/// Point-query interface consumed by the snapshot builder and the point-read
/// endpoints. Implementations tolerate store outages by returning empty
/// results and logging, never a hard failure.
#[async_trait]
pub trait TicketDirectory: Send + Sync {
    async fn ticket(&self, id: &TicketId) -> Option<Ticket>;

    async fn tickets_by_queue(
        &self,
        queue_id: &QueueId,
        status: Option<TicketStatus>,
    ) -> Vec<Ticket>;

    async fn queue(&self, id: &QueueId) -> Option<Queue>;
}

/// Connection settings for the change source.
#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub url: String,
    pub max_connections: u32,
    /// Notification channel the ticket triggers publish on.
    pub channel: String,
}

/// The PostgreSQL-backed change source.
pub struct PgChangeSource {
    pool: PgPool,
    channel: String,
    status: Arc<SourceStatus>,
    shutdown: CancellationToken,
}

impl PgChangeSource {
    /// Build the adapter. The pool connects lazily, so an unreachable store
    /// does not fail here — only a malformed URL does (a configuration
    /// error). The listener is not started until [`PgChangeSource::start`].
    pub fn connect(config: &SourceConfig) -> Result<Arc<Self>> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect_lazy(&config.url)
            .map_err(|e| CoreError::Config(format!("invalid database url: {}", e)))?;

        Ok(Arc::new(Self {
            pool,
            channel: config.channel.clone(),
            status: Arc::new(SourceStatus::new(SourceHealth::Disconnected)),
            shutdown: CancellationToken::new(),
        }))
    }

    /// Shared handle to the listener state.
    pub fn status(&self) -> Arc<SourceStatus> {
        Arc::clone(&self.status)
    }

    /// Stop the listener task.
    pub fn stop(&self) {
        self.shutdown.cancel();
    }

    /// Spawn the listener task. Decoded events flow into `events_tx`; each
    /// raw payload is forwarded at most once. An initial connect failure is
    /// logged and retried on the fallback delay, leaving the subsystem in
    /// degraded mode rather than aborting startup.
    pub fn start(self: &Arc<Self>, events_tx: mpsc::Sender<ChangeEvent>) {
        let source = Arc::clone(self);
        tokio::spawn(async move {
            source.run_listener(events_tx).await;
        });
    }

    async fn run_listener(&self, events_tx: mpsc::Sender<ChangeEvent>) {
        loop {
            if self.shutdown.is_cancelled() {
                break;
            }

            let mut listener = match self.attach_listener().await {
                Ok(listener) => listener,
                Err(e) => {
                    error!(
                        "Failed to attach to notification channel '{}': {} (retrying in {}s)",
                        self.channel,
                        e,
                        RECONNECT_FALLBACK_DELAY.as_secs()
                    );
                    self.status.set(SourceHealth::Reconnecting);
                    if self.wait_or_shutdown(RECONNECT_FALLBACK_DELAY).await {
                        break;
                    }
                    continue;
                }
            };

            self.status.set(SourceHealth::Connected);
            info!("Listening on notification channel '{}'", self.channel);

            // Receive until the connection drops or shutdown is requested.
            loop {
                tokio::select! {
                    _ = self.shutdown.cancelled() => {
                        info!("Change source listener shutting down");
                        return;
                    }
                    received = listener.recv() => match received {
                        Ok(notification) => {
                            self.forward(notification.payload(), &events_tx).await;
                        }
                        Err(e) => {
                            warn!(
                                "Notification connection lost: {} (reconnecting in {}s)",
                                e,
                                RECONNECT_DELAY.as_secs()
                            );
                            self.status.set(SourceHealth::Disconnected);
                            break;
                        }
                    }
                }
            }

            if self.wait_or_shutdown(RECONNECT_DELAY).await {
                break;
            }
            self.status.set(SourceHealth::Reconnecting);
        }
    }

    async fn attach_listener(&self) -> std::result::Result<PgListener, sqlx::Error> {
        let mut listener = PgListener::connect_with(&self.pool).await?;
        listener.listen(&self.channel).await?;
        Ok(listener)
    }

    /// Decode one raw payload and hand it to the dispatcher channel.
    /// Malformed payloads are logged and dropped without affecting the
    /// connection's liveness.
    async fn forward(&self, raw: &str, events_tx: &mpsc::Sender<ChangeEvent>) {
        let event = match decode_payload(raw) {
            Ok(event) => event,
            Err(e) => {
                warn!("Dropping malformed notification payload: {}", e);
                return;
            }
        };

        debug!(
            "Change event: ticket={} action={} queue={}",
            event.entity_id, event.action, event.queue_id
        );

        if events_tx.send(event).await.is_err() {
            error!("Dispatcher channel closed; stopping change source listener");
            self.shutdown.cancel();
        }
    }

    /// Sleep unless shutdown arrives first. Returns true on shutdown.
    async fn wait_or_shutdown(&self, delay: Duration) -> bool {
        tokio::select! {
            _ = self.shutdown.cancelled() => true,
            _ = tokio::time::sleep(delay) => false,
        }
    }
}

// ==================== Point queries ====================

#[derive(Debug, sqlx::FromRow)]
struct TicketRow {
    id: String,
    queue_id: String,
    display_number: String,
    status: String,
    priority: i32,
    created_at: DateTime<Utc>,
    called_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
}

impl TicketRow {
    fn into_ticket(self) -> Option<Ticket> {
        let status = match TicketStatus::parse(&self.status) {
            Some(status) => status,
            None => {
                warn!("Skipping ticket {} with unknown status '{}'", self.id, self.status);
                return None;
            }
        };
        Some(Ticket {
            id: TicketId::new(self.id),
            queue_id: QueueId::new(self.queue_id),
            display_number: self.display_number,
            status,
            priority: self.priority,
            created_at: self.created_at,
            called_at: self.called_at,
            completed_at: self.completed_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct QueueRow {
    id: String,
    tenant_id: String,
    name: String,
    avg_service_seconds: i64,
    is_active: bool,
}

impl QueueRow {
    fn into_queue(self) -> Queue {
        Queue {
            id: QueueId::new(self.id),
            tenant_id: TenantId::new(self.tenant_id),
            name: self.name,
            avg_service_seconds: self.avg_service_seconds,
            is_active: self.is_active,
        }
    }
}

const TICKET_COLUMNS: &str =
    "id, queue_id, display_number, status, priority, created_at, called_at, completed_at";

#[async_trait]
impl TicketDirectory for PgChangeSource {
    async fn ticket(&self, id: &TicketId) -> Option<Ticket> {
        let sql = format!("SELECT {} FROM tickets WHERE id = $1", TICKET_COLUMNS);
        match sqlx::query_as::<_, TicketRow>(&sql)
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
        {
            Ok(row) => row.and_then(TicketRow::into_ticket),
            Err(e) => {
                warn!("Ticket lookup failed for {}: {}", id, e);
                None
            }
        }
    }

    async fn tickets_by_queue(
        &self,
        queue_id: &QueueId,
        status: Option<TicketStatus>,
    ) -> Vec<Ticket> {
        let sql = format!(
            "SELECT {} FROM tickets WHERE queue_id = $1 \
             AND ($2::text IS NULL OR status = $2) ORDER BY created_at",
            TICKET_COLUMNS
        );
        match sqlx::query_as::<_, TicketRow>(&sql)
            .bind(queue_id.as_str())
            .bind(status.map(|s| s.as_str()))
            .fetch_all(&self.pool)
            .await
        {
            Ok(rows) => rows.into_iter().filter_map(TicketRow::into_ticket).collect(),
            Err(e) => {
                warn!("Ticket listing failed for queue {}: {}", queue_id, e);
                Vec::new()
            }
        }
    }

    async fn queue(&self, id: &QueueId) -> Option<Queue> {
        match sqlx::query_as::<_, QueueRow>(
            "SELECT id, tenant_id, name, avg_service_seconds, is_active \
             FROM queues WHERE id = $1",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        {
            Ok(row) => row.map(QueueRow::into_queue),
            Err(e) => {
                warn!("Queue lookup failed for {}: {}", id, e);
                None
            }
        }
    }
}
