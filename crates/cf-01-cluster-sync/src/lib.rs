//! # CF-01 Cluster Sync
//!
//! Group-scoped synchronization of deployable units, features and features
//! repositories across a cluster, with per-group access control.
//!
//! **Subsystem ID:** 1  
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! An operator issues a change against a cluster group on any member node.
//! The change is recorded in the group's replicated maps and broadcast as a
//! [`ClusterEvent`](shared_bus::ClusterEvent); every other member replays it
//! on its local runtime.
//!
//! ## Access Control
//!
//! | List | Effect |
//! |------|--------|
//! | whitelist | when non-empty, only matching identifiers pass |
//! | blacklist | matching identifiers never pass |
//!
//! Lists exist per group, per category (bundle, feature) and per direction
//! (inbound, outbound). Entries are literal strings or regular expressions.
//!
//! ## Module Structure
//!
//! ```text
//! cf-01-cluster-sync/
//! ├── domain/          # Records, value objects, SyncError
//! ├── algorithms/      # Patterns, policy evaluation, selectors, reconciliation
//! ├── ports/           # Management APIs (inbound) + collaborators (outbound)
//! ├── adapters/        # In-memory store, group registry, bus producer, file reader
//! ├── application/     # Services, event consumer, group state
//! └── config.rs        # SyncConfig
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

// Re-exports
pub use adapters::{
    BusEventProducer, FileDescriptorReader, InMemoryClusterStore, StaticGroupRegistry,
};
pub use algorithms::{resolve, PatternCache, Selector};
pub use application::{
    AccessControl, ApplyOutcome, BundleSyncService, EventConsumer, FeatureSyncService,
    GroupState, SyncContext,
};
pub use config::{CandidateOrder, SyncConfig};
pub use domain::{
    BlockRequest, ExtendedState, FeatureOptions, FeatureState, SwitchStatus, SyncError,
    UnitState, UnitStatus,
};
pub use ports::{
    BundleSyncApi, BundleView, ClusterStore, DescriptorReader, EventProducer, FeatureSyncApi,
    FeatureView, FeaturesResolver, GroupRegistry, LocalRuntime, MockDescriptorReader,
    MockEventProducer, MockFeaturesResolver, MockLocalRuntime,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
