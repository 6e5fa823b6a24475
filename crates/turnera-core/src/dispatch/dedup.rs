//! Expiring cache of recently seen notification keys.
//!
//! Duplicate upstream deliveries are expected (the store may fire the same
//! notification more than once under load); this cache keeps a short memory
//! of processed keys so a burst of duplicates triggers exactly one broadcast
//! and one snapshot rebuild. Time is always supplied by the caller, so tests
//! drive expiry without wall-clock sleeps.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// How long an identical key is suppressed after first being seen.
pub const DEDUP_SUPPRESSION_WINDOW: Duration = Duration::from_secs(1);

/// How long entries are retained before the sweep drops them.
pub const DEDUP_RETENTION: Duration = Duration::from_secs(5);

/// TTL map of recently processed notification keys.
pub struct DedupCache {
    entries: Mutex<HashMap<String, Instant>>,
    suppression: Duration,
    retention: Duration,
}

impl DedupCache {
    pub fn new() -> Self {
        Self::with_windows(DEDUP_SUPPRESSION_WINDOW, DEDUP_RETENTION)
    }

    pub fn with_windows(suppression: Duration, retention: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            suppression,
            retention,
        }
    }

    /// Record `key` at `now` unless it was already seen within the
    /// suppression window. Returns `true` when the key is fresh (the caller
    /// should process the event) and `false` when it is a suppressed
    /// duplicate. Expired entries are swept lazily on each call.
    pub fn insert_if_fresh(&self, key: &str, now: Instant) -> bool {
        let mut entries = self.entries.lock();

        entries.retain(|_, inserted_at| now.duration_since(*inserted_at) < self.retention);

        if let Some(inserted_at) = entries.get(key) {
            if now.duration_since(*inserted_at) < self.suppression {
                return false;
            }
        }

        entries.insert(key.to_string(), now);
        true
    }

    /// Number of live (retained) entries.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl Default for DedupCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_within_window_is_suppressed() {
        let cache = DedupCache::new();
        let t0 = Instant::now();

        assert!(cache.insert_if_fresh("t-1:updated:100", t0));
        assert!(!cache.insert_if_fresh("t-1:updated:100", t0 + Duration::from_millis(300)));
        assert!(!cache.insert_if_fresh("t-1:updated:100", t0 + Duration::from_millis(900)));
    }

    #[test]
    fn test_distinct_keys_pass() {
        let cache = DedupCache::new();
        let t0 = Instant::now();

        assert!(cache.insert_if_fresh("t-1:updated:100", t0));
        assert!(cache.insert_if_fresh("t-1:updated:200", t0));
        assert!(cache.insert_if_fresh("t-2:updated:100", t0));
    }

    #[test]
    fn test_key_is_accepted_again_after_suppression_expires() {
        let cache = DedupCache::new();
        let t0 = Instant::now();

        assert!(cache.insert_if_fresh("k", t0));
        assert!(cache.insert_if_fresh("k", t0 + Duration::from_secs(2)));
    }

    #[test]
    fn test_retention_sweep_drops_old_entries() {
        let cache = DedupCache::new();
        let t0 = Instant::now();

        cache.insert_if_fresh("a", t0);
        cache.insert_if_fresh("b", t0);
        assert_eq!(cache.len(), 2);

        // A later insert sweeps everything past the retention window.
        cache.insert_if_fresh("c", t0 + Duration::from_secs(6));
        assert_eq!(cache.len(), 1);
    }
}
