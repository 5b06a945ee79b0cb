//! # Sync Context
//!
//! Collaborators shared by the management services and the event consumer
//! of one node, plus the precondition checks every operation starts with.

use shared_types::entities::{Category, Direction, Group};
use std::sync::Arc;
use tracing::warn;

use super::access_control::AccessControl;
use super::group_state::GroupState;
use crate::algorithms::PatternCache;
use crate::config::SyncConfig;
use crate::domain::{SwitchStatus, SyncError};
use crate::ports::outbound::{ClusterStore, EventProducer, GroupRegistry};

/// Node-wide cluster collaborators.
pub struct SyncContext {
    config: SyncConfig,
    store: Arc<dyn ClusterStore>,
    groups: Arc<dyn GroupRegistry>,
    producer: Arc<dyn EventProducer>,
    access: AccessControl,
}

impl SyncContext {
    /// Wire a context. The producer switch is set from
    /// `config.producer_enabled`.
    pub fn new(
        config: SyncConfig,
        store: Arc<dyn ClusterStore>,
        groups: Arc<dyn GroupRegistry>,
        producer: Arc<dyn EventProducer>,
    ) -> Self {
        producer.set_status(SwitchStatus::from_enabled(config.producer_enabled));
        let patterns = Arc::new(PatternCache::new(config.pattern_cache_size));
        let access = AccessControl::new(store.clone(), patterns);
        Self {
            config,
            store,
            groups,
            producer,
            access,
        }
    }

    /// Configuration.
    #[must_use]
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Policy filter.
    #[must_use]
    pub fn access(&self) -> &AccessControl {
        &self.access
    }

    /// Event producer.
    #[must_use]
    pub fn producer(&self) -> &Arc<dyn EventProducer> {
        &self.producer
    }

    /// Group registry.
    #[must_use]
    pub fn groups(&self) -> &Arc<dyn GroupRegistry> {
        &self.groups
    }

    /// Compiled pattern cache.
    #[must_use]
    pub fn patterns(&self) -> &PatternCache {
        self.access.patterns()
    }

    /// Replicated maps of `group`.
    pub fn group_state(&self, group: &str) -> GroupState {
        GroupState::new(self.store.clone(), group)
    }

    /// Look up a group or fail with `GroupNotFound`.
    pub fn require_group(&self, name: &str) -> Result<Group, SyncError> {
        self.groups
            .find_group_by_name(name)
            .ok_or_else(|| SyncError::GroupNotFound(name.to_string()))
    }

    /// Fail with `ProducerOff` unless the switch is ON.
    pub fn require_producer_on(&self) -> Result<(), SyncError> {
        match self.producer.status() {
            SwitchStatus::On => Ok(()),
            SwitchStatus::Off => Err(SyncError::ProducerOff),
        }
    }

    /// Fail with `BlockedOutbound` unless `identifier` may leave this node.
    pub fn require_outbound(
        &self,
        group: &str,
        category: Category,
        identifier: &str,
    ) -> Result<(), SyncError> {
        if self
            .access
            .is_allowed(group, category, identifier, Direction::Outbound)?
        {
            return Ok(());
        }
        warn!(group, category = category.as_str(), identifier, "Blocked outbound");
        Err(SyncError::BlockedOutbound {
            category,
            identifier: identifier.to_string(),
            group: group.to_string(),
        })
    }
}
