//! Fan-out of change events to registered listeners.

use super::dedup::DedupCache;
use crate::error::Result;
use async_trait::async_trait;
use log::{debug, error, trace};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use turnera_commons::ChangeEvent;

/// Capacity of the bounded channel between the change source and the
/// dispatcher task.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// A consumer of change events. Listener failures are isolated: one erroring
/// listener never prevents the others from running.
#[async_trait]
pub trait ChangeListener: Send + Sync {
    async fn on_change(&self, event: &ChangeEvent) -> Result<()>;
}

/// Fans one upstream change event out to every registered listener, gated by
/// the dedup cache.
pub struct NotificationDispatcher {
    listeners: RwLock<Vec<Arc<dyn ChangeListener>>>,
    dedup: DedupCache,
}

impl NotificationDispatcher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            listeners: RwLock::new(Vec::new()),
            dedup: DedupCache::new(),
        })
    }

    /// Register a listener. Registration order is dispatch order.
    pub fn register(&self, listener: Arc<dyn ChangeListener>) {
        self.listeners.write().push(listener);
    }

    /// Dispatch one physical upstream notification. A key already seen
    /// within the suppression window is dropped silently; otherwise every
    /// listener runs with the event and each failure is logged on its own.
    pub async fn dispatch(&self, event: ChangeEvent) {
        if !self.dedup.insert_if_fresh(&event.dedup_key(), Instant::now()) {
            trace!("Suppressed duplicate notification: {}", event.dedup_key());
            return;
        }

        let listeners: Vec<Arc<dyn ChangeListener>> = self.listeners.read().clone();
        debug!(
            "Dispatching {} {} to {} listener(s)",
            event.action,
            event.entity_id,
            listeners.len()
        );

        for listener in listeners {
            if let Err(e) = listener.on_change(&event).await {
                error!(
                    "Listener failed for {} on ticket {}: {}",
                    event.action, event.entity_id, e
                );
            }
        }
    }

    /// Consume the source's event channel until it closes.
    pub async fn run(self: Arc<Self>, mut events_rx: mpsc::Receiver<ChangeEvent>) {
        while let Some(event) = events_rx.recv().await {
            self.dispatch(event).await;
        }
        debug!("Dispatcher channel closed");
    }
}
