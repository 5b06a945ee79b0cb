//! # Cluster Vocabulary
//!
//! Types shared by every crate in the workspace.
//!
//! ## Clusters
//!
//! - **Membership**: `NodeId`, `Group`
//! - **Policy**: `Category`, `Direction`, `ListKind`

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// CLUSTER A: MEMBERSHIP
// =============================================================================

/// Name of a cluster group.
pub type GroupName = String;

/// Group every node joins unless configured otherwise.
pub const DEFAULT_GROUP: &str = "default";

/// Unique identifier for a node in the cluster (usually `host:port`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct NodeId(pub String);

impl NodeId {
    /// Create a node id from anything string-like.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A named subset of cluster nodes sharing replicated state and policies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// Group name, unique in the cluster.
    pub name: GroupName,
    /// Nodes that are members of this group.
    pub members: Vec<NodeId>,
}

impl Group {
    /// Create a group with no members.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
        }
    }

    /// Builder-style helper adding a member.
    #[must_use]
    pub fn with_member(mut self, node: NodeId) -> Self {
        if !self.members.contains(&node) {
            self.members.push(node);
        }
        self
    }

    /// Whether `node` belongs to this group.
    #[must_use]
    pub fn has_member(&self, node: &NodeId) -> bool {
        self.members.contains(node)
    }
}

// =============================================================================
// CLUSTER B: POLICY
// =============================================================================

/// Resource category a policy list applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    /// Deployable units.
    Bundle,
    /// Feature packages (and their repositories).
    Feature,
}

impl Category {
    /// Lower-case name used in policy keys.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bundle => "bundle",
            Self::Feature => "feature",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of a state change relative to this node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Accepting a change originated elsewhere.
    Inbound,
    /// Pushing a change to the group.
    Outbound,
}

impl Direction {
    /// Lower-case name used in policy keys.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inbound => "inbound",
            Self::Outbound => "outbound",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of policy list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ListKind {
    /// Only listed patterns are allowed (when non-empty).
    Whitelist,
    /// Listed patterns are always denied.
    Blacklist,
}

impl ListKind {
    /// Lower-case name used in policy keys.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Whitelist => "whitelist",
            Self::Blacklist => "blacklist",
        }
    }
}

impl fmt::Display for ListKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
