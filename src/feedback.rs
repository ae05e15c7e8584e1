//! Feedback
//!
//! Transient pending/success/error indicator per key, e.g. per catalog item
//! while an "add to bag" request runs. Finished entries carry their own
//! expiry instead of relying on timers.

use std::{
    hash::Hash,
    time::{Duration, Instant},
};

use rustc_hash::FxHashMap;

/// How long a success indicator stays visible.
pub const SUCCESS_TTL: Duration = Duration::from_secs(1);

/// How long an error indicator stays visible.
pub const ERROR_TTL: Duration = Duration::from_secs(2);

/// Visible feedback for one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feedback {
    /// Request in flight.
    Pending,
    /// Request succeeded.
    Success,
    /// Request failed.
    Error,
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    feedback: Feedback,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|expires_at| now < expires_at)
    }
}

/// Feedback entries keyed by `K`.
#[derive(Debug, Clone)]
pub struct FeedbackBoard<K> {
    entries: FxHashMap<K, Entry>,
}

impl<K> Default for FeedbackBoard<K> {
    fn default() -> Self {
        Self {
            entries: FxHashMap::default(),
        }
    }
}

impl<K: Hash + Eq + Copy> FeedbackBoard<K> {
    /// Create an empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `key` as pending until it finishes.
    pub fn pending(&mut self, key: K) {
        self.entries.insert(
            key,
            Entry {
                feedback: Feedback::Pending,
                expires_at: None,
            },
        );
    }

    /// Mark `key` as succeeded at `now`; visible for [`SUCCESS_TTL`].
    pub fn succeeded(&mut self, key: K, now: Instant) {
        self.finish(key, Feedback::Success, now + SUCCESS_TTL);
    }

    /// Mark `key` as failed at `now`; visible for [`ERROR_TTL`].
    pub fn failed(&mut self, key: K, now: Instant) {
        self.finish(key, Feedback::Error, now + ERROR_TTL);
    }

    fn finish(&mut self, key: K, feedback: Feedback, expires_at: Instant) {
        self.entries.insert(
            key,
            Entry {
                feedback,
                expires_at: Some(expires_at),
            },
        );
    }

    /// Forget `key`, e.g. when its request was abandoned.
    pub fn remove(&mut self, key: K) {
        self.entries.remove(&key);
    }

    /// Feedback visible for `key` at `now`.
    pub fn get(&self, key: K, now: Instant) -> Option<Feedback> {
        self.entries
            .get(&key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.feedback)
    }

    /// Drop expired entries.
    pub fn sweep(&mut self, now: Instant) {
        self.entries.retain(|_, entry| entry.is_live(now));
    }

    /// Number of stored entries, expired or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no entries are stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
