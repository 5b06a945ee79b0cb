//! # Application Module
//!
//! Management services, the event consumer and the group-scoped state and
//! policy helpers they share.

pub mod access_control;
pub mod bundle_service;
pub mod consumer;
pub mod context;
pub mod feature_service;
pub mod gather;
pub mod group_state;

pub use access_control::AccessControl;
pub use bundle_service::BundleSyncService;
pub use consumer::{ApplyOutcome, EventConsumer};
pub use context::SyncContext;
pub use feature_service::FeatureSyncService;
pub use gather::{gather_bundles, gather_features};
pub use group_state::{GroupState, TypedMap};
