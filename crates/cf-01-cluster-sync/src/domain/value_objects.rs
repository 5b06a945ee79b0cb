//! # Value Objects
//!
//! Keys, map names and labels used across the subsystem.

use serde::{Deserialize, Serialize};
use shared_types::entities::{Category, Direction, ListKind};
use std::fmt;

/// Separator between a name and a version in composite keys.
pub const KEY_SEPARATOR: char = '/';

/// Build a composite key `name/version`.
pub fn composite_key(name: &str, version: &str) -> String {
    format!("{name}{KEY_SEPARATOR}{version}")
}

/// Split a composite key into its name and version segments. Segments past
/// the version are ignored.
pub fn split_key(key: &str) -> (&str, Option<&str>) {
    let mut segments = key.split(KEY_SEPARATOR);
    let name = segments.next().unwrap_or(key);
    (name, segments.next())
}

// =============================================================================
// MAP NAMES
// =============================================================================

/// The replicated maps every group owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupMap {
    /// `cluster.bundles.<group>`: composite key -> `UnitState`
    Bundles,
    /// `cluster.features.<group>`: composite key -> `FeatureState`
    Features,
    /// `cluster.repositories.<group>`: URL -> display name
    Repositories,
    /// `cluster.policies.<group>`: policy key -> pattern list
    Policies,
}

impl GroupMap {
    /// Prefix shared by all replicated maps.
    pub const PREFIX: &'static str = "cluster";

    /// Short segment for this map.
    #[must_use]
    pub fn segment(&self) -> &'static str {
        match self {
            Self::Bundles => "bundles",
            Self::Features => "features",
            Self::Repositories => "repositories",
            Self::Policies => "policies",
        }
    }

    /// Full map name for a group.
    #[must_use]
    pub fn name_for(&self, group: &str) -> String {
        format!("{}.{}.{}", Self::PREFIX, self.segment(), group)
    }
}

/// Key of one policy list inside the group's policy map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PolicyKey {
    /// Category the list applies to.
    pub category: Category,
    /// Whitelist or blacklist.
    pub kind: ListKind,
    /// Inbound or outbound.
    pub direction: Direction,
}

impl PolicyKey {
    /// Create a policy key.
    pub fn new(category: Category, kind: ListKind, direction: Direction) -> Self {
        Self {
            category,
            kind,
            direction,
        }
    }
}

impl fmt::Display for PolicyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}",
            self.category.as_str(),
            self.kind.as_str(),
            self.direction.as_str()
        )
    }
}

// =============================================================================
// LABELS
// =============================================================================

/// Where a reconciled record lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Located {
    /// In the replicated map and on this node.
    ClusterAndLocal,
    /// Only in the replicated map.
    Cluster,
    /// Only on this node.
    Local,
    /// Neither (not produced by reconciliation).
    Nowhere,
}

impl Located {
    /// Derive from the two presence flags.
    #[must_use]
    pub fn from_presence(cluster: bool, local: bool) -> Self {
        match (cluster, local) {
            (true, true) => Self::ClusterAndLocal,
            (true, false) => Self::Cluster,
            (false, true) => Self::Local,
            (false, false) => Self::Nowhere,
        }
    }

    /// Listing label.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::ClusterAndLocal => "cluster/local",
            Self::Cluster => "cluster",
            Self::Local => "local",
            Self::Nowhere => "",
        }
    }
}

/// Which policy directions deny a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockedPolicy {
    /// Denied both ways.
    Both,
    /// Denied inbound only.
    Inbound,
    /// Denied outbound only.
    Outbound,
    /// Allowed both ways.
    None,
}

impl BlockedPolicy {
    /// Derive from the two blocked flags.
    #[must_use]
    pub fn from_flags(inbound: bool, outbound: bool) -> Self {
        match (inbound, outbound) {
            (true, true) => Self::Both,
            (true, false) => Self::Inbound,
            (false, true) => Self::Outbound,
            (false, false) => Self::None,
        }
    }

    /// Listing label.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Both => "in/out",
            Self::Inbound => "in",
            Self::Outbound => "out",
            Self::None => "",
        }
    }
}

// =============================================================================
// OPERATION PARAMETERS
// =============================================================================

/// Event producer switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwitchStatus {
    /// Events are produced.
    On,
    /// Management operations are refused.
    Off,
}

impl SwitchStatus {
    /// Switch state from a boolean.
    #[must_use]
    pub fn from_enabled(enabled: bool) -> Self {
        if enabled {
            Self::On
        } else {
            Self::Off
        }
    }
}

/// Which lists and directions a block operation toggles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockRequest {
    /// Toggle the whitelist.
    pub whitelist: bool,
    /// Toggle the blacklist.
    pub blacklist: bool,
    /// Toggle inbound lists.
    pub inbound: bool,
    /// Toggle outbound lists.
    pub outbound: bool,
}

impl BlockRequest {
    /// Blacklist in both directions.
    #[must_use]
    pub fn blacklist_both() -> Self {
        Self {
            whitelist: false,
            blacklist: true,
            inbound: true,
            outbound: true,
        }
    }

    /// Every `(kind, direction)` pair this request toggles.
    #[must_use]
    pub fn targets(&self) -> Vec<(ListKind, Direction)> {
        let mut targets = Vec::new();
        for (enabled, direction) in [
            (self.inbound, Direction::Inbound),
            (self.outbound, Direction::Outbound),
        ] {
            if !enabled {
                continue;
            }
            if self.whitelist {
                targets.push((ListKind::Whitelist, direction));
            }
            if self.blacklist {
                targets.push((ListKind::Blacklist, direction));
            }
        }
        targets
    }
}

/// Feature install switches carried to the resolver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeatureOptions {
    /// Keep partially installed units on failure.
    pub no_clean: bool,
    /// Do not refresh dependent units.
    pub no_refresh: bool,
    /// Install without starting.
    pub no_start: bool,
}
