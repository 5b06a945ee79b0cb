//! # Policy Evaluation
//!
//! Decides whether an identifier passes a whitelist/blacklist pair.
//!
//! ## Rules
//!
//! 1. A non-empty blacklist with any matching pattern denies.
//! 2. Otherwise a non-empty whitelist with no matching pattern denies.
//! 3. Otherwise the identifier is allowed.

use super::patterns::PatternCache;
use crate::domain::SyncError;

/// Evaluate one direction of a group policy for `identifier`.
pub fn evaluate(
    whitelist: &[String],
    blacklist: &[String],
    identifier: &str,
    patterns: &PatternCache,
) -> Result<bool, SyncError> {
    if any_match(blacklist, identifier, patterns)? {
        return Ok(false);
    }
    if !whitelist.is_empty() && !any_match(whitelist, identifier, patterns)? {
        return Ok(false);
    }
    Ok(true)
}

/// Toggle `pattern` in `list`. Returns whether it is present afterwards.
pub fn toggle_entry(list: &mut Vec<String>, pattern: &str) -> bool {
    if let Some(position) = list.iter().position(|p| p == pattern) {
        list.remove(position);
        false
    } else {
        list.push(pattern.to_string());
        true
    }
}

fn any_match(list: &[String], identifier: &str, patterns: &PatternCache) -> Result<bool, SyncError> {
    for pattern in list {
        if patterns.matches(pattern, identifier)? {
            return Ok(true);
        }
    }
    Ok(false)
}
