//! # Domain Errors
//!
//! Error types for cluster synchronization.
//!
//! Preconditions (group, producer switch, outbound policy) fail before any
//! replicated map is touched. Failures of collaborators propagate with
//! their cause attached as text.

use shared_types::entities::{Category, GroupName};
use thiserror::Error;

/// Cluster sync error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// The named cluster group is not registered.
    #[error("Cluster group {0} doesn't exist")]
    GroupNotFound(GroupName),

    /// The event producer switch is OFF on this node.
    #[error("Cluster event producer is OFF for this node")]
    ProducerOff,

    /// The identifier is denied by the group's outbound policy.
    #[error("{category} {identifier} is blocked outbound for cluster group {group}")]
    BlockedOutbound {
        /// Policy category that denied the identifier
        category: Category,
        /// Location, symbolic name or feature name
        identifier: String,
        /// Group whose policy denied it
        group: GroupName,
    },

    /// The repository URL is already present in the group.
    #[error("Features repository URL {0} already registered")]
    RepositoryAlreadyRegistered(String),

    /// The repository URL is not present in the group.
    #[error("Features repository URL {url} doesn't exist in cluster group {group}")]
    RepositoryNotFound {
        /// Repository URL
        url: String,
        /// Group that was searched
        group: GroupName,
    },

    /// No feature with that name (and version) exists in the group.
    #[error("Feature {identifier} doesn't exist in cluster group {group}")]
    FeatureNotFound {
        /// `name` or `name/version`
        identifier: String,
        /// Group that was searched
        group: GroupName,
    },

    /// A policy or selector pattern is neither a literal match nor a valid regex.
    #[error("Invalid pattern {pattern}: {reason}")]
    InvalidPattern {
        /// The offending pattern
        pattern: String,
        /// Regex compiler message
        reason: String,
    },

    /// A unit or repository location is not a valid URL.
    #[error("Location {location} is not valid: {reason}")]
    InvalidLocation {
        /// The offending location
        location: String,
        /// Parser message
        reason: String,
    },

    /// The unit descriptor at a location is missing or incomplete.
    #[error("Unit location {location} doesn't seem correct: {reason}")]
    InvalidDescriptor {
        /// Unit location
        location: String,
        /// What is missing
        reason: String,
    },

    /// The features resolver failed.
    #[error("Features resolver error: {0}")]
    Resolver(String),

    /// The local runtime failed.
    #[error("Local runtime error: {0}")]
    Runtime(String),

    /// The cluster store failed.
    #[error("Cluster store error: {0}")]
    Store(String),

    /// A replicated value could not be encoded or decoded.
    #[error("Codec error: {0}")]
    Codec(String),
}

impl From<bincode::Error> for SyncError {
    fn from(e: bincode::Error) -> Self {
        Self::Codec(e.to_string())
    }
}
