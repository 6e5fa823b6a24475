//! In-memory registry of open watch sessions.
//!
//! Arena + index layout: sessions live in one map keyed by watch id; the
//! per-queue and per-ticket buckets hold ids only. Removing a session clears
//! it from every bucket it appears in, so no orphan references survive a
//! disconnect.

use super::session::{PushError, WatchScope, WatchSession};
use dashmap::DashMap;
use std::collections::{HashMap, HashSet};
use turnera_commons::{QueueId, StreamEvent, TicketId, WatchId};

/// Result of pushing an event at a registered session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Delivered,
    /// Channel at capacity; event dropped, session kept.
    Full,
    /// Sink is gone; the caller must evict the session.
    Closed,
    /// No session with that id.
    Unknown,
}

/// Registry state. Mutated only through its own methods; every bucket entry
/// is a session id, never a sink reference.
pub struct WatchRegistry {
    sessions: DashMap<WatchId, WatchSession>,
    queue_watchers: DashMap<QueueId, HashSet<WatchId>>,
    ticket_watchers: DashMap<TicketId, HashSet<WatchId>>,
}

impl WatchRegistry {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
            queue_watchers: DashMap::new(),
            ticket_watchers: DashMap::new(),
        }
    }

    /// Register a session and bucket it by scope.
    pub fn insert(&self, session: WatchSession) {
        let id = session.id.clone();
        match &session.scope {
            WatchScope::Queue(queue_id) => {
                self.queue_watchers
                    .entry(queue_id.clone())
                    .or_default()
                    .insert(id.clone());
            }
            WatchScope::Ticket(ticket_id) => {
                self.ticket_watchers
                    .entry(ticket_id.clone())
                    .or_default()
                    .insert(id.clone());
            }
            WatchScope::Global => {}
        }
        self.sessions.insert(id, session);
    }

    /// Remove a session and clear it from every bucket. Idempotent: removing
    /// an unknown id is a no-op. Returns whether a session was removed.
    pub fn remove(&self, id: &WatchId) -> bool {
        let Some((_, session)) = self.sessions.remove(id) else {
            return false;
        };

        match &session.scope {
            WatchScope::Queue(queue_id) => {
                Self::unbucket(&self.queue_watchers, queue_id, id);
            }
            WatchScope::Ticket(ticket_id) => {
                Self::unbucket(&self.ticket_watchers, ticket_id, id);
            }
            WatchScope::Global => {}
        }
        true
    }

    fn unbucket<K: std::hash::Hash + Eq + Clone>(
        buckets: &DashMap<K, HashSet<WatchId>>,
        key: &K,
        id: &WatchId,
    ) {
        if let Some(mut bucket) = buckets.get_mut(key) {
            bucket.remove(id);
            let empty = bucket.is_empty();
            drop(bucket);
            if empty {
                buckets.remove_if(key, |_, bucket| bucket.is_empty());
            }
        }
    }

    pub fn contains(&self, id: &WatchId) -> bool {
        self.sessions.contains_key(id)
    }

    /// Push an event at one session without blocking.
    pub fn try_push(&self, id: &WatchId, event: StreamEvent) -> PushOutcome {
        match self.sessions.get(id) {
            Some(session) => match session.try_push(event) {
                Ok(()) => PushOutcome::Delivered,
                Err(PushError::Full) => PushOutcome::Full,
                Err(PushError::Closed) => PushOutcome::Closed,
            },
            None => PushOutcome::Unknown,
        }
    }

    pub fn has_queue_watchers(&self, queue_id: &QueueId) -> bool {
        self.queue_watchers.contains_key(queue_id)
    }

    pub fn has_ticket_watchers(&self, ticket_id: &TicketId) -> bool {
        self.ticket_watchers.contains_key(ticket_id)
    }

    pub fn queue_watchers(&self, queue_id: &QueueId) -> Vec<WatchId> {
        self.queue_watchers
            .get(queue_id)
            .map(|bucket| bucket.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn ticket_watchers(&self, ticket_id: &TicketId) -> Vec<WatchId> {
        self.ticket_watchers
            .get(ticket_id)
            .map(|bucket| bucket.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Ids of every open session, regardless of scope.
    pub fn all_sessions(&self) -> Vec<WatchId> {
        self.sessions.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Watcher count per queue, keyed by queue id.
    pub fn queue_watcher_counts(&self) -> HashMap<String, usize> {
        self.queue_watchers
            .iter()
            .map(|entry| (entry.key().to_string(), entry.value().len()))
            .collect()
    }

    /// Watcher count per ticket, keyed by ticket id.
    pub fn ticket_watcher_counts(&self) -> HashMap<String, usize> {
        self.ticket_watchers
            .iter()
            .map(|entry| (entry.key().to_string(), entry.value().len()))
            .collect()
    }
}

impl Default for WatchRegistry {
    fn default() -> Self {
        Self::new()
    }
}
