//! # Access Control
//!
//! Per-group, per-category, per-direction whitelist/blacklist policies.
//! Lists live in the group's policy map under `<category>.<kind>.<direction>`
//! and are created on first write.

use shared_types::entities::{Category, Direction, ListKind};
use std::sync::Arc;
use tracing::{debug, info};

use super::group_state::GroupState;
use crate::algorithms::{evaluate, toggle_entry, PatternCache};
use crate::domain::{PolicyKey, SyncError};
use crate::ports::outbound::ClusterStore;

/// Policy filter over the replicated policy maps.
pub struct AccessControl {
    store: Arc<dyn ClusterStore>,
    patterns: Arc<PatternCache>,
}

impl AccessControl {
    /// Create a filter over `store`.
    pub fn new(store: Arc<dyn ClusterStore>, patterns: Arc<PatternCache>) -> Self {
        Self { store, patterns }
    }

    /// Shared compiled pattern cache.
    #[must_use]
    pub fn patterns(&self) -> &Arc<PatternCache> {
        &self.patterns
    }

    /// Patterns of one list. Missing lists are empty.
    pub fn list(
        &self,
        group: &str,
        category: Category,
        kind: ListKind,
        direction: Direction,
    ) -> Result<Vec<String>, SyncError> {
        let key = PolicyKey::new(category, kind, direction).to_string();
        Ok(GroupState::new(self.store.clone(), group)
            .policies()
            .get(&key)?
            .unwrap_or_default())
    }

    /// Whether `identifier` may cross the group boundary in `direction`.
    pub fn is_allowed(
        &self,
        group: &str,
        category: Category,
        identifier: &str,
        direction: Direction,
    ) -> Result<bool, SyncError> {
        let allowed = self.evaluate_direction(group, category, identifier, direction)?;
        if !allowed {
            debug!(
                group,
                category = category.as_str(),
                direction = direction.as_str(),
                identifier,
                "Identifier denied by group policy"
            );
            fleet_telemetry::record_policy_denial(category.as_str(), direction.as_str());
        }
        Ok(allowed)
    }

    /// `(blocked_inbound, blocked_outbound)` for an identifier.
    ///
    /// Read-only view for listings and selectors: nothing is logged or
    /// counted as a denial.
    pub fn blocked_flags(
        &self,
        group: &str,
        category: Category,
        identifier: &str,
    ) -> Result<(bool, bool), SyncError> {
        let inbound = self.evaluate_direction(group, category, identifier, Direction::Inbound)?;
        let outbound = self.evaluate_direction(group, category, identifier, Direction::Outbound)?;
        Ok((!inbound, !outbound))
    }

    fn evaluate_direction(
        &self,
        group: &str,
        category: Category,
        identifier: &str,
        direction: Direction,
    ) -> Result<bool, SyncError> {
        let whitelist = self.list(group, category, ListKind::Whitelist, direction)?;
        let blacklist = self.list(group, category, ListKind::Blacklist, direction)?;
        evaluate(&whitelist, &blacklist, identifier, &self.patterns)
    }

    /// Toggle `pattern` in one list. Returns whether it is present afterwards.
    pub fn switch_list_entry(
        &self,
        kind: ListKind,
        group: &str,
        category: Category,
        direction: Direction,
        pattern: &str,
    ) -> Result<bool, SyncError> {
        let key = PolicyKey::new(category, kind, direction).to_string();
        let policies = GroupState::new(self.store.clone(), group).policies();

        let mut list = policies.get(&key)?.unwrap_or_default();
        let present = toggle_entry(&mut list, pattern);
        policies.put(&key, &list)?;

        info!(group, list = %key, pattern, present, "Policy list updated");
        Ok(present)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryClusterStore;

    fn access() -> AccessControl {
        AccessControl::new(
            Arc::new(InMemoryClusterStore::new()),
            Arc::new(PatternCache::new(16)),
        )
    }

    #[test]
    fn test_empty_policy_allows() {
        let access = access();
        assert!(access
            .is_allowed("default", Category::Bundle, "file:///a.jar", Direction::Outbound)
            .unwrap());
    }

    #[test]
    fn test_switch_list_entry_toggles() {
        let access = access();
        let present = access
            .switch_list_entry(
                ListKind::Blacklist,
                "default",
                Category::Bundle,
                Direction::Outbound,
                "a.*",
            )
            .unwrap();
        assert!(present);
        assert!(!access
            .is_allowed("default", Category::Bundle, "abc", Direction::Outbound)
            .unwrap());
        // other direction and category untouched
        assert!(access
            .is_allowed("default", Category::Bundle, "abc", Direction::Inbound)
            .unwrap());
        assert!(access
            .is_allowed("default", Category::Feature, "abc", Direction::Outbound)
            .unwrap());

        let present = access
            .switch_list_entry(
                ListKind::Blacklist,
                "default",
                Category::Bundle,
                Direction::Outbound,
                "a.*",
            )
            .unwrap();
        assert!(!present);
        assert!(access
            .list("default", Category::Bundle, ListKind::Blacklist, Direction::Outbound)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_blocked_flags() {
        let access = access();
        access
            .switch_list_entry(
                ListKind::Whitelist,
                "default",
                Category::Feature,
                Direction::Inbound,
                "^webconsole$",
            )
            .unwrap();

        assert_eq!(
            access.blocked_flags("default", Category::Feature, "ssh").unwrap(),
            (true, false)
        );
        assert_eq!(
            access
                .blocked_flags("default", Category::Feature, "webconsole")
                .unwrap(),
            (false, false)
        );
    }

    #[test]
    fn test_invalid_stored_pattern_is_error() {
        let access = access();
        access
            .switch_list_entry(
                ListKind::Blacklist,
                "default",
                Category::Bundle,
                Direction::Inbound,
                "a(",
            )
            .unwrap();
        assert!(matches!(
            access.is_allowed("default", Category::Bundle, "abc", Direction::Inbound),
            Err(SyncError::InvalidPattern { .. })
        ));
    }
}
