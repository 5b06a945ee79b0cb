//! # Group State
//!
//! Typed access to a group's replicated maps. Values are bincode-encoded
//! on the way into the store and decoded on the way out; nothing is cached
//! between calls.

use serde::{de::DeserializeOwned, Serialize};
use std::marker::PhantomData;
use std::sync::Arc;

use crate::domain::{FeatureState, GroupMap, SyncError, UnitState};
use crate::ports::outbound::ClusterStore;

/// Typed view of one replicated map.
pub struct TypedMap<V> {
    store: Arc<dyn ClusterStore>,
    name: String,
    _value: PhantomData<fn() -> V>,
}

impl<V: Serialize + DeserializeOwned> TypedMap<V> {
    /// Bind to the map called `name`.
    pub fn new(store: Arc<dyn ClusterStore>, name: String) -> Self {
        Self {
            store,
            name,
            _value: PhantomData,
        }
    }

    /// Full map name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get and decode a value.
    pub fn get(&self, key: &str) -> Result<Option<V>, SyncError> {
        self.store
            .get(&self.name, key)?
            .map(|bytes| bincode::deserialize(&bytes).map_err(SyncError::from))
            .transpose()
    }

    /// Encode and put a value, returning the previous one.
    pub fn put(&self, key: &str, value: &V) -> Result<Option<V>, SyncError> {
        let bytes = bincode::serialize(value)?;
        self.store
            .put(&self.name, key, bytes)?
            .map(|bytes| bincode::deserialize(&bytes).map_err(SyncError::from))
            .transpose()
    }

    /// Remove a value, returning it.
    pub fn remove(&self, key: &str) -> Result<Option<V>, SyncError> {
        self.store
            .remove(&self.name, key)?
            .map(|bytes| bincode::deserialize(&bytes).map_err(SyncError::from))
            .transpose()
    }

    /// Keys in store order.
    pub fn keys(&self) -> Result<Vec<String>, SyncError> {
        self.store.keys(&self.name)
    }

    /// Decoded entries in store order. Keys removed concurrently are skipped.
    pub fn entries(&self) -> Result<Vec<(String, V)>, SyncError> {
        let mut entries = Vec::new();
        for key in self.keys()? {
            if let Some(value) = self.get(&key)? {
                entries.push((key, value));
            }
        }
        Ok(entries)
    }

    /// Number of entries.
    pub fn len(&self) -> Result<usize, SyncError> {
        self.store.len(&self.name)
    }

    /// Whether the map is empty.
    pub fn is_empty(&self) -> Result<bool, SyncError> {
        Ok(self.len()? == 0)
    }

    /// Whether `key` is present.
    pub fn contains_key(&self, key: &str) -> Result<bool, SyncError> {
        Ok(self.store.get(&self.name, key)?.is_some())
    }
}

/// Accessor for all replicated maps of one group.
pub struct GroupState {
    store: Arc<dyn ClusterStore>,
    group: String,
}

impl GroupState {
    /// Bind to `group`.
    pub fn new(store: Arc<dyn ClusterStore>, group: impl Into<String>) -> Self {
        Self {
            store,
            group: group.into(),
        }
    }

    /// Group name.
    #[must_use]
    pub fn group(&self) -> &str {
        &self.group
    }

    /// `cluster.bundles.<group>`
    pub fn bundles(&self) -> TypedMap<UnitState> {
        self.map(GroupMap::Bundles)
    }

    /// `cluster.features.<group>`
    pub fn features(&self) -> TypedMap<FeatureState> {
        self.map(GroupMap::Features)
    }

    /// `cluster.repositories.<group>`: URL -> display name
    pub fn repositories(&self) -> TypedMap<String> {
        self.map(GroupMap::Repositories)
    }

    /// `cluster.policies.<group>`: policy key -> patterns
    pub fn policies(&self) -> TypedMap<Vec<String>> {
        self.map(GroupMap::Policies)
    }

    fn map<V: Serialize + DeserializeOwned>(&self, which: GroupMap) -> TypedMap<V> {
        TypedMap::new(self.store.clone(), which.name_for(&self.group))
    }
}
