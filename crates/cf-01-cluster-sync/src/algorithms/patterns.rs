//! # Pattern Matching
//!
//! Policy entries and selector names are regular expressions that match
//! anywhere in the identifier. A pattern equal to the identifier matches
//! without being compiled, so literal locations containing regex
//! metacharacters still work.

use lru::LruCache;
use parking_lot::Mutex;
use regex::{Regex, RegexBuilder};
use std::num::NonZeroUsize;

use crate::domain::SyncError;

/// Upper bound on the compiled size of a single pattern.
const REGEX_SIZE_LIMIT: usize = 1 << 20;

/// Fallback capacity when configured with zero.
const MIN_CACHE_SIZE: NonZeroUsize = match NonZeroUsize::new(16) {
    Some(n) => n,
    None => unreachable!(),
};

/// LRU cache of compiled patterns.
pub struct PatternCache {
    compiled: Mutex<LruCache<String, Regex>>,
}

impl PatternCache {
    /// Create a cache holding up to `capacity` compiled patterns.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(MIN_CACHE_SIZE);
        Self {
            compiled: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Get the compiled form of `pattern`, compiling it on a miss.
    pub fn compile(&self, pattern: &str) -> Result<Regex, SyncError> {
        if let Some(regex) = self.compiled.lock().get(pattern) {
            return Ok(regex.clone());
        }

        let regex = RegexBuilder::new(pattern)
            .size_limit(REGEX_SIZE_LIMIT)
            .build()
            .map_err(|e| SyncError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })?;

        self.compiled.lock().put(pattern.to_string(), regex.clone());
        Ok(regex)
    }

    /// Whether `pattern` matches `identifier`: literal equality, or a regex
    /// match anywhere in the identifier.
    pub fn matches(&self, pattern: &str, identifier: &str) -> Result<bool, SyncError> {
        if pattern == identifier {
            return Ok(true);
        }
        Ok(self.compile(pattern)?.is_match(identifier))
    }

    /// Number of cached patterns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.compiled.lock().len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for PatternCache {
    fn default() -> Self {
        Self::new(256)
    }
}
