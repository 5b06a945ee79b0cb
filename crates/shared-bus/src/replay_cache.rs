//! # Replay Cache
//!
//! Remembers the ids of recently seen events so that a redelivered event is
//! applied at most once per node.
//!
//! ## Design
//!
//! - Ids are kept for a retention window (default 10 minutes)
//! - Expired ids are garbage-collected lazily, at most once per GC interval
//! - Memory is bounded by the event rate times the retention window

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use uuid::Uuid;

/// Errors from replay cache operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReplayError {
    /// The event id has already been recorded.
    #[error("Event {id} has already been seen")]
    AlreadySeen { id: Uuid },
}

/// Time-bounded cache of seen event ids.
pub struct ReplayCache {
    /// Map of event id -> timestamp when it was first seen.
    cache: HashMap<Uuid, u64>,

    /// Retention window in seconds.
    retention_secs: u64,

    /// Last garbage collection timestamp.
    last_gc: u64,

    /// Garbage collection interval in seconds.
    gc_interval_secs: u64,
}

impl ReplayCache {
    /// Default retention window.
    pub const DEFAULT_RETENTION: u64 = 600;

    /// Default garbage collection interval.
    pub const DEFAULT_GC_INTERVAL: u64 = 30;

    /// Create a new cache with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(Self::DEFAULT_RETENTION, Self::DEFAULT_GC_INTERVAL)
    }

    /// Create a cache with custom settings.
    #[must_use]
    pub fn with_config(retention_secs: u64, gc_interval_secs: u64) -> Self {
        Self {
            cache: HashMap::new(),
            retention_secs,
            last_gc: Self::current_timestamp(),
            gc_interval_secs,
        }
    }

    /// Record an event id, failing if it was already seen.
    ///
    /// # Errors
    ///
    /// - `ReplayError::AlreadySeen` - the id is still inside the retention window
    pub fn record(&mut self, id: Uuid) -> Result<(), ReplayError> {
        let now = Self::current_timestamp();

        if now.saturating_sub(self.last_gc) > self.gc_interval_secs {
            self.garbage_collect(now);
            self.last_gc = now;
        }

        if self.cache.contains_key(&id) {
            return Err(ReplayError::AlreadySeen { id });
        }

        self.cache.insert(id, now);
        Ok(())
    }

    /// Check if an id is cached without recording it.
    #[must_use]
    pub fn contains(&self, id: &Uuid) -> bool {
        self.cache.contains_key(id)
    }

    /// Get the number of cached ids.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Check if the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Remove ids older than the retention window.
    fn garbage_collect(&mut self, now: u64) {
        let expiry_threshold = now.saturating_sub(self.retention_secs);
        self.cache.retain(|_, &mut seen| seen > expiry_threshold);
    }

    /// Get current Unix timestamp.
    fn current_timestamp() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

impl Default for ReplayCache {
    fn default() -> Self {
        Self::new()
    }
}
