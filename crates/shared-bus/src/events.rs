//! # Cluster Events
//!
//! Defines the state-change events that flow between group members.
//! An event carries enough information to replay the mutation on any
//! member of the source group.

use serde::{Deserialize, Serialize};
use shared_types::entities::{GroupName, NodeId};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Kind of state change carried by a [`ClusterEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClusterEventKind {
    // =========================================================================
    // UNITS
    // =========================================================================
    /// A unit was installed in the group.
    Installed,
    /// A unit was removed from the group.
    Uninstalled,
    /// A unit was started.
    Started,
    /// A unit was stopped.
    Stopped,

    // =========================================================================
    // FEATURES
    // =========================================================================
    /// A feature was marked installed.
    FeatureInstalled,
    /// A feature was marked uninstalled.
    FeatureUninstalled,

    // =========================================================================
    // REPOSITORIES
    // =========================================================================
    /// A features repository was added to the group.
    RepositoryAdded,
    /// A features repository was removed from the group.
    RepositoryRemoved,
}

impl ClusterEventKind {
    /// Topic this kind is published under.
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::Installed | Self::Uninstalled | Self::Started | Self::Stopped => {
                EventTopic::Bundle
            }
            Self::FeatureInstalled | Self::FeatureUninstalled => EventTopic::Feature,
            Self::RepositoryAdded | Self::RepositoryRemoved => EventTopic::Repository,
        }
    }

    /// Stable label for logs and metrics.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Installed => "installed",
            Self::Uninstalled => "uninstalled",
            Self::Started => "started",
            Self::Stopped => "stopped",
            Self::FeatureInstalled => "feature_installed",
            Self::FeatureUninstalled => "feature_uninstalled",
            Self::RepositoryAdded => "repository_added",
            Self::RepositoryRemoved => "repository_removed",
        }
    }
}

/// Auxiliary switches that travel with an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventFlags {
    /// Start the unit right after installing it.
    pub start_after_install: bool,
    /// Do not clean up on failed feature installation.
    pub skip_clean: bool,
    /// Do not refresh dependent units.
    pub skip_refresh: bool,
    /// Install feature units without starting them.
    pub no_start: bool,
    /// Repository events: install (added) or uninstall (removed) the
    /// repository's features as well.
    pub cascade: bool,
}

/// A state change to be replayed on every member of `source_group`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterEvent {
    /// Unique id, used for redelivery detection.
    pub id: Uuid,
    /// What happened.
    pub kind: ClusterEventKind,
    /// Symbolic name, feature name or repository URL.
    pub name: String,
    /// Version of the unit or feature, if any.
    pub version: Option<String>,
    /// Unit location, if any.
    pub location: Option<String>,
    /// Auxiliary flags.
    pub flags: EventFlags,
    /// Group the change applies to.
    pub source_group: GroupName,
    /// Node that produced the event (stamped by the producer).
    pub source_node: Option<NodeId>,
    /// Unix timestamp (seconds) of creation.
    pub timestamp: u64,
}

impl ClusterEvent {
    /// Create a new event for `group`.
    pub fn new(kind: ClusterEventKind, name: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            name: name.into(),
            version: None,
            location: None,
            flags: EventFlags::default(),
            source_group: group.into(),
            source_node: None,
            timestamp: current_timestamp(),
        }
    }

    /// Set the version.
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Set the version when known.
    #[must_use]
    pub fn with_optional_version(mut self, version: Option<String>) -> Self {
        self.version = version;
        self
    }

    /// Set the location.
    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Set the flags.
    #[must_use]
    pub fn with_flags(mut self, flags: EventFlags) -> Self {
        self.flags = flags;
        self
    }

    /// The affected identifier: `name/version` or just `name`.
    #[must_use]
    pub fn identifier(&self) -> String {
        match &self.version {
            Some(version) => format!("{}/{}", self.name, version),
            None => self.name.clone(),
        }
    }

    /// Get the topic for this event (for filtering).
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        self.kind.topic()
    }
}

/// Event topics for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// Unit lifecycle events.
    Bundle,
    /// Feature events.
    Feature,
    /// Repository events.
    Repository,
    /// All events (no filtering).
    All,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
    /// Source groups to include. Empty means all groups.
    pub groups: Vec<GroupName>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self {
            topics,
            groups: Vec::new(),
        }
    }

    /// Create a filter for events targeting specific groups.
    #[must_use]
    pub fn for_groups(groups: Vec<GroupName>) -> Self {
        Self {
            topics: Vec::new(),
            groups,
        }
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &ClusterEvent) -> bool {
        let topic_match = self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic());

        let group_match = self.groups.is_empty() || self.groups.contains(&event.source_group);

        topic_match && group_match
    }
}

/// Current Unix timestamp in seconds.
pub(crate) fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
