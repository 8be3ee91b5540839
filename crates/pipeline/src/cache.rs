//! TTL cache for display queries.
//!
//! Entries are keyed by [`AlertFilter`] and expire `ttl` after insertion.
//! Expired entries are dropped when they are looked up. Every processing
//! cycle past the no-drafts fast path calls [`ResultCache::invalidate_all`].
//!
//! Each invalidation bumps a generation counter. A reader captures
//! [`ResultCache::generation`] before querying the store and hands it to
//! [`ResultCache::set`]; results read before a later invalidation are
//! discarded instead of cached.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use aquawatch_core::types::Timestamp;
use aquawatch_core::{Alert, AlertFilter, Clock};
use chrono::Duration;

/// Default time-to-live: 30 seconds.
pub const DEFAULT_CACHE_TTL_SECS: i64 = 30;

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Vec<Alert>,
    inserted_at: Timestamp,
}

pub struct ResultCache {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<AlertFilter, CacheEntry>>,
    generation: AtomicU64,
}

impl ResultCache {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            clock,
            entries: Mutex::new(HashMap::new()),
            generation: AtomicU64::new(0),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Cached value for `key`, if present and not expired.
    pub fn get(&self, key: &AlertFilter) -> Option<Vec<Alert>> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);

        let expired = match entries.get(key) {
            Some(entry) if now.signed_duration_since(entry.inserted_at) < self.ttl => {
                return Some(entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.remove(key);
        }
        None
    }

    /// Current invalidation generation.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Store `value` if no invalidation happened since `generation` was
    /// read. Returns whether the value was stored.
    pub fn set(&self, key: AlertFilter, value: Vec<Alert>, generation: u64) -> bool {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if self.generation.load(Ordering::Acquire) != generation {
            tracing::debug!("Discarding display result read before invalidation");
            return false;
        }
        let entry = CacheEntry {
            value,
            inserted_at: self.clock.now(),
        };
        entries.insert(key, entry);
        true
    }

    pub fn invalidate_all(&self) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        self.generation.fetch_add(1, Ordering::AcqRel);
        if !entries.is_empty() {
            tracing::debug!(count = entries.len(), "Invalidating display cache");
        }
        entries.clear();
    }

    /// Number of stored entries, expired ones included until next access.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
