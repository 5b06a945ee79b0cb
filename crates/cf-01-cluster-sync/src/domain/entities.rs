//! # Domain Entities
//!
//! Records stored in the replicated group maps, the local runtime's view of
//! units and features, and the reconciled view combining both.

use serde::{Deserialize, Serialize};

use super::value_objects::{composite_key, BlockedPolicy, Located};

/// Version assumed when a unit descriptor carries none.
pub const DEFAULT_VERSION: &str = "0.0.0";

// =============================================================================
// UNIT STATUS
// =============================================================================

/// Lifecycle status of a unit as recorded in the cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitStatus {
    /// Installed but not resolved.
    Installed,
    /// Dependencies resolved.
    Resolved,
    /// Start in progress.
    Starting,
    /// Running.
    Started,
    /// Stop in progress.
    Stopping,
    /// Stopped.
    Stopped,
    /// Removed.
    Uninstalled,
}

impl UnitStatus {
    /// Listing label. Started reads "Active" and Stopped reads "Resolved".
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Installed => "Installed",
            Self::Resolved => "Resolved",
            Self::Starting => "Starting",
            Self::Started => "Active",
            Self::Stopping => "Stopping",
            Self::Stopped => "Resolved",
            Self::Uninstalled => "Uninstalled",
        }
    }
}

/// Unit state as reported by the local runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LocalUnitState {
    /// Installed.
    Installed,
    /// Resolved.
    Resolved,
    /// Starting.
    Starting,
    /// Active.
    Active,
    /// Stopping.
    Stopping,
    /// Uninstalled.
    Uninstalled,
}

impl From<LocalUnitState> for UnitStatus {
    fn from(state: LocalUnitState) -> Self {
        match state {
            LocalUnitState::Active => Self::Started,
            LocalUnitState::Installed => Self::Installed,
            LocalUnitState::Resolved => Self::Resolved,
            LocalUnitState::Starting => Self::Starting,
            // A stopping unit is still serving until the stop completes
            LocalUnitState::Stopping => Self::Started,
            LocalUnitState::Uninstalled => Self::Uninstalled,
        }
    }
}

// =============================================================================
// REPLICATED RECORDS
// =============================================================================

/// A unit record in the group's bundle map, keyed `symbolic_name/version`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitState {
    /// Informational id (map size at install time, may collide).
    pub id: u64,
    /// Display name.
    pub name: Option<String>,
    /// Symbolic name.
    pub symbolic_name: String,
    /// Version.
    pub version: String,
    /// Lifecycle status.
    pub status: UnitStatus,
    /// Location the unit was installed from.
    pub location: String,
}

impl UnitState {
    /// Composite key `symbolic_name/version`.
    #[must_use]
    pub fn key(&self) -> String {
        composite_key(&self.symbolic_name, &self.version)
    }

    /// Display name, falling back to symbolic name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.symbolic_name)
    }
}

/// A feature record in the group's feature map, keyed `name/version`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureState {
    /// Feature name.
    pub name: String,
    /// Feature version.
    pub version: String,
    /// Whether the feature should be installed on members.
    pub installed: bool,
}

impl FeatureState {
    /// Create a feature record.
    pub fn new(name: impl Into<String>, version: impl Into<String>, installed: bool) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            installed,
        }
    }

    /// Composite key `name/version`.
    #[must_use]
    pub fn key(&self) -> String {
        composite_key(&self.name, &self.version)
    }
}

// =============================================================================
// LOCAL RUNTIME VIEW
// =============================================================================

/// A unit installed on this node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalUnit {
    /// Runtime-assigned id.
    pub id: u64,
    /// Display name, if the descriptor has one.
    pub name: Option<String>,
    /// Symbolic name.
    pub symbolic_name: String,
    /// Version.
    pub version: String,
    /// Install location.
    pub location: String,
    /// Runtime state.
    pub state: LocalUnitState,
}

impl LocalUnit {
    /// Composite key `symbolic_name/version`.
    #[must_use]
    pub fn key(&self) -> String {
        composite_key(&self.symbolic_name, &self.version)
    }

    /// Convert to a cluster record. The name defaults to the symbolic name,
    /// then to the location.
    #[must_use]
    pub fn to_unit_state(&self) -> UnitState {
        let name = self.name.clone().or_else(|| {
            if self.symbolic_name.is_empty() {
                Some(self.location.clone())
            } else {
                Some(self.symbolic_name.clone())
            }
        });
        UnitState {
            id: self.id,
            name,
            symbolic_name: self.symbolic_name.clone(),
            version: self.version.clone(),
            status: self.state.into(),
            location: self.location.clone(),
        }
    }
}

/// A feature known to the local resolver.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FeatureInfo {
    /// Feature name.
    pub name: String,
    /// Feature version.
    pub version: String,
}

impl FeatureInfo {
    /// Create a feature reference.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }

    /// Composite key `name/version`.
    #[must_use]
    pub fn key(&self) -> String {
        composite_key(&self.name, &self.version)
    }
}

/// Contents of a features repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryDescriptor {
    /// Repository URL.
    pub url: String,
    /// Repository display name.
    pub name: String,
    /// Features declared by the repository.
    pub features: Vec<FeatureInfo>,
}

/// Identity headers read from a unit descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UnitDescriptor {
    /// Display name.
    pub name: Option<String>,
    /// Symbolic name.
    pub symbolic_name: Option<String>,
    /// Version.
    pub version: Option<String>,
}

// =============================================================================
// RECONCILED VIEW
// =============================================================================

/// A record annotated with where it lives and how policies treat it.
///
/// Built on demand by reconciliation, never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtendedState<T> {
    /// The underlying record.
    pub base: T,
    /// Present in the group's replicated map.
    pub present_in_cluster: bool,
    /// Present on this node.
    pub present_locally: bool,
    /// Denied by the inbound policy.
    pub blocked_inbound: bool,
    /// Denied by the outbound policy.
    pub blocked_outbound: bool,
}

impl<T> ExtendedState<T> {
    /// Wrap a record found in the replicated map.
    pub fn from_cluster(base: T) -> Self {
        Self {
            base,
            present_in_cluster: true,
            present_locally: false,
            blocked_inbound: false,
            blocked_outbound: false,
        }
    }

    /// Wrap a record found only on this node.
    pub fn from_local(base: T) -> Self {
        Self {
            base,
            present_in_cluster: false,
            present_locally: true,
            blocked_inbound: false,
            blocked_outbound: false,
        }
    }

    /// Where the record lives.
    #[must_use]
    pub fn located(&self) -> Located {
        Located::from_presence(self.present_in_cluster, self.present_locally)
    }

    /// Which directions block the record.
    #[must_use]
    pub fn blocked(&self) -> BlockedPolicy {
        BlockedPolicy::from_flags(self.blocked_inbound, self.blocked_outbound)
    }
}
