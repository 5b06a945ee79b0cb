//! In-Memory Cluster Store Adapter
//!
//! Implements `ClusterStore` with insertion-ordered maps. Nodes of an
//! in-process cluster share one instance through an `Arc`, which makes every
//! write immediately visible to all members.

use indexmap::IndexMap;
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::trace;

use crate::domain::SyncError;
use crate::ports::outbound::ClusterStore;

/// In-memory replicated map store.
#[derive(Default)]
pub struct InMemoryClusterStore {
    /// map name -> (key -> encoded value)
    maps: RwLock<HashMap<String, IndexMap<String, Vec<u8>>>>,
}

impl InMemoryClusterStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of maps that hold at least one entry.
    #[must_use]
    pub fn map_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .maps
            .read()
            .iter()
            .filter(|(_, entries)| !entries.is_empty())
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }
}

impl ClusterStore for InMemoryClusterStore {
    fn get(&self, map: &str, key: &str) -> Result<Option<Vec<u8>>, SyncError> {
        Ok(self
            .maps
            .read()
            .get(map)
            .and_then(|entries| entries.get(key))
            .cloned())
    }

    fn put(&self, map: &str, key: &str, value: Vec<u8>) -> Result<Option<Vec<u8>>, SyncError> {
        trace!(map, key, bytes = value.len(), "put");
        Ok(self
            .maps
            .write()
            .entry(map.to_string())
            .or_default()
            .insert(key.to_string(), value))
    }

    fn remove(&self, map: &str, key: &str) -> Result<Option<Vec<u8>>, SyncError> {
        trace!(map, key, "remove");
        // shift_remove keeps the order of the remaining keys
        Ok(self
            .maps
            .write()
            .get_mut(map)
            .and_then(|entries| entries.shift_remove(key)))
    }

    fn keys(&self, map: &str) -> Result<Vec<String>, SyncError> {
        Ok(self
            .maps
            .read()
            .get(map)
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default())
    }

    fn len(&self, map: &str) -> Result<usize, SyncError> {
        Ok(self.maps.read().get(map).map_or(0, IndexMap::len))
    }
}
