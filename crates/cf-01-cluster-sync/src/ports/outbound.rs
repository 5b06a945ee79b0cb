//! # Outbound Ports
//!
//! Traits for the collaborators cluster sync depends on: the replicated
//! store, the group registry, the event producer, the local runtime, the
//! features resolver and the descriptor reader.
//!
//! In-memory mocks for the runtime-facing ports live at the bottom of this
//! file; the store and registry have real in-memory adapters.

use async_trait::async_trait;
use parking_lot::RwLock;
use shared_bus::ClusterEvent;
use shared_types::entities::Group;
use std::collections::{HashMap, HashSet};
use url::Url;

use crate::domain::{
    FeatureInfo, FeatureOptions, LocalUnit, LocalUnitState, RepositoryDescriptor, SwitchStatus,
    SyncError, UnitDescriptor,
};

/// Replicated keyed maps - outbound port.
///
/// Maps are addressed by name and hold opaque bytes. Implementations keep
/// a stable per-node insertion order; cross-node consistency is eventual.
pub trait ClusterStore: Send + Sync {
    /// Get a value.
    fn get(&self, map: &str, key: &str) -> Result<Option<Vec<u8>>, SyncError>;

    /// Put a value, returning the previous one.
    fn put(&self, map: &str, key: &str, value: Vec<u8>) -> Result<Option<Vec<u8>>, SyncError>;

    /// Remove a value, returning it.
    fn remove(&self, map: &str, key: &str) -> Result<Option<Vec<u8>>, SyncError>;

    /// Keys in insertion order.
    fn keys(&self, map: &str) -> Result<Vec<String>, SyncError>;

    /// Number of entries.
    fn len(&self, map: &str) -> Result<usize, SyncError>;
}

/// Group membership lookup - outbound port.
pub trait GroupRegistry: Send + Sync {
    /// Find a group by name.
    fn find_group_by_name(&self, name: &str) -> Option<Group>;
}

/// Cluster event producer - outbound port.
#[async_trait]
pub trait EventProducer: Send + Sync {
    /// Current switch state.
    fn status(&self) -> SwitchStatus;

    /// Flip the switch.
    fn set_status(&self, status: SwitchStatus);

    /// Hand an event to the group's members.
    ///
    /// Fails with `ProducerOff` when the switch is OFF.
    async fn produce(&self, event: ClusterEvent) -> Result<(), SyncError>;
}

/// Local unit runtime - outbound port.
#[async_trait]
pub trait LocalRuntime: Send + Sync {
    /// Units installed on this node.
    async fn list_units(&self) -> Result<Vec<LocalUnit>, SyncError>;

    /// Install the unit at `location`.
    async fn install(&self, location: &str) -> Result<LocalUnit, SyncError>;

    /// Start an installed unit.
    async fn start(&self, symbolic_name: &str, version: &str) -> Result<(), SyncError>;

    /// Stop an installed unit.
    async fn stop(&self, symbolic_name: &str, version: &str) -> Result<(), SyncError>;

    /// Uninstall a unit.
    async fn uninstall(&self, symbolic_name: &str, version: &str) -> Result<(), SyncError>;
}

/// Local features resolver - outbound port.
#[async_trait]
pub trait FeaturesResolver: Send + Sync {
    /// Repositories registered on this node.
    async fn list_repositories(&self) -> Result<Vec<RepositoryDescriptor>, SyncError>;

    /// Register a repository on this node.
    async fn add_repository(&self, url: &str) -> Result<(), SyncError>;

    /// Unregister a repository from this node.
    async fn remove_repository(&self, url: &str) -> Result<(), SyncError>;

    /// Features known on this node.
    async fn list_features(&self) -> Result<Vec<FeatureInfo>, SyncError>;

    /// Whether a feature is installed on this node.
    async fn is_installed(&self, feature: &FeatureInfo) -> Result<bool, SyncError>;

    /// Read a repository without registering it.
    ///
    /// `Ok(None)` means the resolver cannot inspect without registering;
    /// callers then fall back to register/inspect/unregister.
    async fn inspect_repository(
        &self,
        _url: &str,
    ) -> Result<Option<RepositoryDescriptor>, SyncError> {
        Ok(None)
    }

    /// Install a feature on this node.
    async fn install_feature(
        &self,
        name: &str,
        version: Option<&str>,
        options: FeatureOptions,
    ) -> Result<(), SyncError>;

    /// Uninstall a feature from this node.
    async fn uninstall_feature(
        &self,
        name: &str,
        version: Option<&str>,
        no_refresh: bool,
    ) -> Result<(), SyncError>;
}

/// Unit descriptor reader - outbound port.
#[async_trait]
pub trait DescriptorReader: Send + Sync {
    /// Read the descriptor at `location`. `Ok(None)` when there is none.
    async fn read_descriptor(&self, location: &Url) -> Result<Option<UnitDescriptor>, SyncError>;
}

// =============================================================================
// Mock Implementations for Testing
// =============================================================================

/// Mock event producer that records what it produced.
pub struct MockEventProducer {
    status: RwLock<SwitchStatus>,
    produced: RwLock<Vec<ClusterEvent>>,
    /// Should `produce` fail?
    pub should_fail: bool,
}

impl MockEventProducer {
    /// Create a producer with the switch ON.
    pub fn new() -> Self {
        Self {
            status: RwLock::new(SwitchStatus::On),
            produced: RwLock::new(Vec::new()),
            should_fail: false,
        }
    }

    /// Events produced so far.
    #[must_use]
    pub fn produced(&self) -> Vec<ClusterEvent> {
        self.produced.read().clone()
    }
}

impl Default for MockEventProducer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventProducer for MockEventProducer {
    fn status(&self) -> SwitchStatus {
        *self.status.read()
    }

    fn set_status(&self, status: SwitchStatus) {
        *self.status.write() = status;
    }

    async fn produce(&self, event: ClusterEvent) -> Result<(), SyncError> {
        if self.status() == SwitchStatus::Off {
            return Err(SyncError::ProducerOff);
        }
        if self.should_fail {
            return Err(SyncError::Store("Mock failure".to_string()));
        }
        self.produced.write().push(event);
        Ok(())
    }
}

/// Mock local runtime backed by a catalog of installable artifacts.
#[derive(Default)]
pub struct MockLocalRuntime {
    catalog: RwLock<HashMap<String, LocalUnit>>,
    units: RwLock<Vec<LocalUnit>>,
    next_id: RwLock<u64>,
}

impl MockLocalRuntime {
    /// Create an empty runtime.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `location` installable as `symbolic_name/version`.
    #[must_use]
    pub fn with_artifact(self, location: &str, symbolic_name: &str, version: &str) -> Self {
        self.add_artifact(location, symbolic_name, version);
        self
    }

    /// Make `location` installable from now on.
    pub fn add_artifact(&self, location: &str, symbolic_name: &str, version: &str) {
        self.catalog.write().insert(
            location.to_string(),
            LocalUnit {
                id: 0,
                name: None,
                symbolic_name: symbolic_name.to_string(),
                version: version.to_string(),
                location: location.to_string(),
                state: LocalUnitState::Installed,
            },
        );
    }

    /// Add an already installed unit.
    #[must_use]
    pub fn with_unit(self, unit: LocalUnit) -> Self {
        self.units.write().push(unit);
        self
    }

    /// State of a unit, if installed.
    #[must_use]
    pub fn state_of(&self, symbolic_name: &str, version: &str) -> Option<LocalUnitState> {
        self.units
            .read()
            .iter()
            .find(|u| u.symbolic_name == symbolic_name && u.version == version)
            .map(|u| u.state)
    }

    fn set_state(
        &self,
        symbolic_name: &str,
        version: &str,
        state: LocalUnitState,
    ) -> Result<(), SyncError> {
        let mut units = self.units.write();
        let unit = units
            .iter_mut()
            .find(|u| u.symbolic_name == symbolic_name && u.version == version)
            .ok_or_else(|| {
                SyncError::Runtime(format!("unit {symbolic_name}/{version} is not installed"))
            })?;
        unit.state = state;
        Ok(())
    }
}

#[async_trait]
impl LocalRuntime for MockLocalRuntime {
    async fn list_units(&self) -> Result<Vec<LocalUnit>, SyncError> {
        Ok(self.units.read().clone())
    }

    async fn install(&self, location: &str) -> Result<LocalUnit, SyncError> {
        let mut unit = self
            .catalog
            .read()
            .get(location)
            .cloned()
            .ok_or_else(|| SyncError::Runtime(format!("cannot read {location}")))?;

        if let Some(existing) = self
            .units
            .read()
            .iter()
            .find(|u| u.key() == unit.key())
        {
            return Ok(existing.clone());
        }

        let mut next_id = self.next_id.write();
        *next_id += 1;
        unit.id = *next_id;
        self.units.write().push(unit.clone());
        Ok(unit)
    }

    async fn start(&self, symbolic_name: &str, version: &str) -> Result<(), SyncError> {
        self.set_state(symbolic_name, version, LocalUnitState::Active)
    }

    async fn stop(&self, symbolic_name: &str, version: &str) -> Result<(), SyncError> {
        self.set_state(symbolic_name, version, LocalUnitState::Resolved)
    }

    async fn uninstall(&self, symbolic_name: &str, version: &str) -> Result<(), SyncError> {
        self.units
            .write()
            .retain(|u| !(u.symbolic_name == symbolic_name && u.version == version));
        Ok(())
    }
}

/// Mock features resolver.
///
/// `published` repositories can be registered; features become known once
/// their repository is registered.
#[derive(Default)]
pub struct MockFeaturesResolver {
    published: RwLock<HashMap<String, RepositoryDescriptor>>,
    registered: RwLock<Vec<String>>,
    installed: RwLock<HashSet<FeatureInfo>>,
    /// Answer `inspect_repository` instead of forcing the fallback.
    pub supports_inspect: bool,
    /// Number of `add_repository` calls.
    pub add_calls: RwLock<usize>,
    /// Number of `remove_repository` calls.
    pub remove_calls: RwLock<usize>,
}

impl MockFeaturesResolver {
    /// Create an empty resolver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a repository so it can be registered.
    #[must_use]
    pub fn with_published(self, repository: RepositoryDescriptor) -> Self {
        self.published
            .write()
            .insert(repository.url.clone(), repository);
        self
    }

    /// Register a published repository up front.
    #[must_use]
    pub fn with_registered(self, url: &str) -> Self {
        self.registered.write().push(url.to_string());
        self
    }

    /// Mark a feature installed up front.
    #[must_use]
    pub fn with_installed(self, name: &str, version: &str) -> Self {
        self.installed.write().insert(FeatureInfo::new(name, version));
        self
    }

    /// Whether `url` is registered.
    #[must_use]
    pub fn is_registered(&self, url: &str) -> bool {
        self.registered.read().iter().any(|u| u == url)
    }

    /// Whether any version of `name` is installed.
    #[must_use]
    pub fn is_feature_installed(&self, name: &str) -> bool {
        self.installed.read().iter().any(|f| f.name == name)
    }

    fn known_features(&self) -> Vec<FeatureInfo> {
        let published = self.published.read();
        self.registered
            .read()
            .iter()
            .filter_map(|url| published.get(url))
            .flat_map(|repo| repo.features.iter().cloned())
            .collect()
    }

    fn find_feature(&self, name: &str, version: Option<&str>) -> Result<FeatureInfo, SyncError> {
        self.known_features()
            .into_iter()
            .find(|f| f.name == name && version.map_or(true, |v| f.version == v))
            .ok_or_else(|| SyncError::Resolver(format!("no feature named {name}")))
    }
}

#[async_trait]
impl FeaturesResolver for MockFeaturesResolver {
    async fn list_repositories(&self) -> Result<Vec<RepositoryDescriptor>, SyncError> {
        let published = self.published.read();
        Ok(self
            .registered
            .read()
            .iter()
            .filter_map(|url| published.get(url).cloned())
            .collect())
    }

    async fn add_repository(&self, url: &str) -> Result<(), SyncError> {
        *self.add_calls.write() += 1;
        if !self.published.read().contains_key(url) {
            return Err(SyncError::Resolver(format!("cannot resolve {url}")));
        }
        if !self.is_registered(url) {
            self.registered.write().push(url.to_string());
        }
        Ok(())
    }

    async fn remove_repository(&self, url: &str) -> Result<(), SyncError> {
        *self.remove_calls.write() += 1;
        self.registered.write().retain(|u| u != url);
        Ok(())
    }

    async fn list_features(&self) -> Result<Vec<FeatureInfo>, SyncError> {
        Ok(self.known_features())
    }

    async fn is_installed(&self, feature: &FeatureInfo) -> Result<bool, SyncError> {
        Ok(self.installed.read().contains(feature))
    }

    async fn inspect_repository(
        &self,
        url: &str,
    ) -> Result<Option<RepositoryDescriptor>, SyncError> {
        if !self.supports_inspect {
            return Ok(None);
        }
        self.published
            .read()
            .get(url)
            .cloned()
            .map(Some)
            .ok_or_else(|| SyncError::Resolver(format!("cannot resolve {url}")))
    }

    async fn install_feature(
        &self,
        name: &str,
        version: Option<&str>,
        _options: FeatureOptions,
    ) -> Result<(), SyncError> {
        let feature = self.find_feature(name, version)?;
        self.installed.write().insert(feature);
        Ok(())
    }

    async fn uninstall_feature(
        &self,
        name: &str,
        version: Option<&str>,
        _no_refresh: bool,
    ) -> Result<(), SyncError> {
        self.installed
            .write()
            .retain(|f| !(f.name == name && version.map_or(true, |v| f.version == v)));
        Ok(())
    }
}

/// Mock descriptor reader keyed by location.
#[derive(Default)]
pub struct MockDescriptorReader {
    descriptors: RwLock<HashMap<String, UnitDescriptor>>,
}

impl MockDescriptorReader {
    /// Create an empty reader.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve a descriptor for `location`.
    #[must_use]
    pub fn with_unit(self, location: &str, symbolic_name: &str, version: &str) -> Self {
        self.descriptors.write().insert(
            location.to_string(),
            UnitDescriptor {
                name: None,
                symbolic_name: Some(symbolic_name.to_string()),
                version: Some(version.to_string()),
            },
        );
        self
    }

    /// Serve an arbitrary descriptor for `location`.
    #[must_use]
    pub fn with_descriptor(self, location: &str, descriptor: UnitDescriptor) -> Self {
        self.descriptors
            .write()
            .insert(location.to_string(), descriptor);
        self
    }
}

#[async_trait]
impl DescriptorReader for MockDescriptorReader {
    async fn read_descriptor(&self, location: &Url) -> Result<Option<UnitDescriptor>, SyncError> {
        Ok(self.descriptors.read().get(location.as_str()).cloned())
    }
}
