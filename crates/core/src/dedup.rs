//! Moving-window alert deduplication.
//!
//! [`AlertDeduplicator`] remembers when each alert signature was last
//! accepted and suppresses repeats inside the window. There is no durable
//! history: a fresh deduplicator (or a process restart) starts empty.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use chrono::Duration;

use crate::alert::ValidDraft;
use crate::types::Timestamp;

/// Default suppression window: 5 minutes.
pub const DEFAULT_DEDUP_WINDOW_MS: i64 = 300_000;

/// Identity of "the same alert": parameter, level, and value rounded to one
/// decimal place.
pub fn signature(draft: &ValidDraft) -> String {
    let rounded = (draft.value * 10.0).round() / 10.0;
    format!("{}:{}:{rounded:.1}", draft.parameter, draft.level)
}

/// Tracks the last time each signature was accepted.
///
/// Lookup and update happen under one lock so that concurrent callers
/// carrying the same reading can never both be accepted.
#[derive(Debug)]
pub struct AlertDeduplicator {
    window: Duration,
    last_seen: Mutex<HashMap<String, Timestamp>>,
}

impl AlertDeduplicator {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_seen: Mutex::new(HashMap::new()),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Accept `signature` if its last acceptance is more than the window
    /// ago, recording `now` as its last-seen time. A repeat exactly one
    /// window later is still a duplicate.
    ///
    /// Returns `true` if the alert should proceed, `false` if it is a
    /// duplicate.
    pub fn check_and_record(&self, signature: &str, now: Timestamp) -> bool {
        let mut last_seen = self.last_seen.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(last) = last_seen.get(signature) {
            if now.signed_duration_since(*last) <= self.window {
                return false;
            }
        }
        last_seen.insert(signature.to_string(), now);
        true
    }

    /// Drop signatures whose last acceptance is more than the window ago.
    ///
    /// Returns the number of entries removed.
    pub fn sweep(&self, now: Timestamp) -> usize {
        let mut last_seen = self.last_seen.lock().unwrap_or_else(PoisonError::into_inner);
        let before = last_seen.len();
        last_seen.retain(|_, last| now.signed_duration_since(*last) <= self.window);
        before - last_seen.len()
    }

    /// Number of tracked signatures.
    pub fn len(&self) -> usize {
        self.last_seen.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forget every signature.
    pub fn reset(&self) {
        self.last_seen.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

impl Default for AlertDeduplicator {
    fn default() -> Self {
        Self::new(Duration::milliseconds(DEFAULT_DEDUP_WINDOW_MS))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
