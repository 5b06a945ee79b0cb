//! # Inbound Ports
//!
//! Management API exposed to operator surfaces (shell, remote management).
//! Every mutating call validates group, producer switch and outbound policy
//! before touching the replicated maps.

use async_trait::async_trait;

use crate::domain::{BlockRequest, FeatureOptions, SyncError};

/// A row of the unit listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleView {
    /// Informational id.
    pub id: u64,
    /// Display name.
    pub name: String,
    /// Symbolic name.
    pub symbolic_name: String,
    /// Version.
    pub version: String,
    /// Status label (`Active`, `Resolved`, ...).
    pub status: String,
    /// Install location.
    pub location: String,
    /// `cluster/local`, `cluster` or `local`.
    pub located: String,
    /// `in/out`, `in`, `out` or empty.
    pub blocked: String,
}

/// A row of the feature listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureView {
    /// Feature name.
    pub name: String,
    /// Feature version.
    pub version: String,
    /// Installed flag.
    pub installed: bool,
    /// `cluster/local`, `cluster` or `local`.
    pub located: String,
    /// `in/out`, `in`, `out` or empty.
    pub blocked: String,
}

/// Unit management API - inbound port.
#[async_trait]
pub trait BundleSyncApi: Send + Sync {
    /// Install the unit at `location` in `group`, optionally starting it.
    async fn install(&self, group: &str, location: &str, start: bool) -> Result<(), SyncError>;

    /// Uninstall the units matched by `selector`.
    async fn uninstall(&self, group: &str, selector: &str) -> Result<(), SyncError>;

    /// Start the units matched by `selector`.
    async fn start(&self, group: &str, selector: &str) -> Result<(), SyncError>;

    /// Stop the units matched by `selector`.
    async fn stop(&self, group: &str, selector: &str) -> Result<(), SyncError>;

    /// Toggle policy entries for the locations matched by `pattern`, or for
    /// the raw pattern when nothing matches.
    async fn block(&self, group: &str, pattern: &str, request: BlockRequest)
        -> Result<(), SyncError>;

    /// Reconciled unit listing sorted by id.
    async fn list_bundles(&self, group: &str) -> Result<Vec<BundleView>, SyncError>;
}

/// Feature and repository management API - inbound port.
#[async_trait]
pub trait FeatureSyncApi: Send + Sync {
    /// Mark a feature installed in `group`.
    async fn install_feature(
        &self,
        group: &str,
        name: &str,
        version: Option<&str>,
        options: FeatureOptions,
    ) -> Result<(), SyncError>;

    /// Mark a feature uninstalled in `group`.
    async fn uninstall_feature(
        &self,
        group: &str,
        name: &str,
        version: Option<&str>,
        no_refresh: bool,
    ) -> Result<(), SyncError>;

    /// Reconciled feature listing.
    async fn list_features(&self, group: &str) -> Result<Vec<FeatureView>, SyncError>;

    /// Repository URLs registered in `group`.
    async fn list_repositories(&self, group: &str) -> Result<Vec<String>, SyncError>;

    /// Register a repository and its features in `group`.
    async fn add_repository(&self, group: &str, url: &str, install: bool)
        -> Result<(), SyncError>;

    /// Remove a repository and its features from `group`.
    async fn remove_repository(
        &self,
        group: &str,
        url: &str,
        uninstall: bool,
    ) -> Result<(), SyncError>;

    /// Toggle policy entries for a feature name pattern.
    async fn block(&self, group: &str, pattern: &str, request: BlockRequest)
        -> Result<(), SyncError>;
}
