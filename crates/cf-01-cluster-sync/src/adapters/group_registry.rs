//! Static Group Registry Adapter
//!
//! Implements `GroupRegistry` over an in-memory table of groups.

use parking_lot::RwLock;
use shared_types::entities::{Group, GroupName, NodeId};
use std::collections::HashMap;
use tracing::info;

use crate::ports::outbound::GroupRegistry;

/// Group registry populated by configuration or tests.
#[derive(Default)]
pub struct StaticGroupRegistry {
    groups: RwLock<HashMap<GroupName, Group>>,
}

impl StaticGroupRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a group.
    pub fn register(&self, group: Group) {
        info!(group = %group.name, members = group.members.len(), "Group registered");
        self.groups.write().insert(group.name.clone(), group);
    }

    /// Add `node` to `group`, creating the group if needed.
    pub fn join(&self, group: &str, node: NodeId) {
        let mut groups = self.groups.write();
        let entry = groups
            .entry(group.to_string())
            .or_insert_with(|| Group::new(group));
        if !entry.has_member(&node) {
            info!(group, node = %node, "Node joined group");
            entry.members.push(node);
        }
    }

    /// Remove `node` from `group`.
    pub fn leave(&self, group: &str, node: &NodeId) {
        if let Some(entry) = self.groups.write().get_mut(group) {
            entry.members.retain(|m| m != node);
            info!(group, node = %node, "Node left group");
        }
    }

    /// Registered group names, sorted.
    #[must_use]
    pub fn group_names(&self) -> Vec<GroupName> {
        let mut names: Vec<_> = self.groups.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Groups `node` is a member of, sorted by name.
    #[must_use]
    pub fn groups_of(&self, node: &NodeId) -> Vec<GroupName> {
        let mut names: Vec<_> = self
            .groups
            .read()
            .values()
            .filter(|g| g.has_member(node))
            .map(|g| g.name.clone())
            .collect();
        names.sort();
        names
    }
}

impl GroupRegistry for StaticGroupRegistry {
    fn find_group_by_name(&self, name: &str) -> Option<Group> {
        self.groups.read().get(name).cloned()
    }
}
