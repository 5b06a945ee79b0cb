//! # Cluster Sync Configuration
//!
//! Configuration for the synchronization services and the event consumer.

use serde::{Deserialize, Serialize};
use shared_types::entities::NodeId;
use std::env;

/// Order in which reconciled candidates are presented to the selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CandidateOrder {
    /// Sorted by composite key. Identical on every node.
    #[default]
    Canonical,
    /// Cluster map order followed by local-only records. Node-local.
    Insertion,
}

impl CandidateOrder {
    /// Parse `canonical` / `insertion` (case-insensitive).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "canonical" => Some(Self::Canonical),
            "insertion" => Some(Self::Insertion),
            _ => None,
        }
    }
}

/// Cluster sync configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Identity of this node, stamped on produced events.
    pub node_id: NodeId,

    /// Initial state of the event producer switch.
    pub producer_enabled: bool,

    /// Candidate order for selector resolution.
    pub candidate_order: CandidateOrder,

    /// How long consumed event ids are remembered.
    pub replay_window_secs: u64,

    /// Compiled pattern cache capacity.
    pub pattern_cache_size: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            node_id: NodeId::new("node-0"),
            producer_enabled: true,
            candidate_order: CandidateOrder::Canonical,
            replay_window_secs: 600,
            pattern_cache_size: 256,
        }
    }
}

impl SyncConfig {
    /// Create a config for testing (small caches).
    pub fn for_testing() -> Self {
        Self {
            node_id: NodeId::new("test-node"),
            producer_enabled: true,
            candidate_order: CandidateOrder::Canonical,
            replay_window_secs: 60,
            pattern_cache_size: 16,
        }
    }

    /// Create a config for a named node, other fields default.
    pub fn for_node(node_id: impl Into<String>) -> Self {
        Self {
            node_id: NodeId::new(node_id),
            ..Self::default()
        }
    }

    /// Read overrides from the environment.
    ///
    /// - `CF_NODE_ID`
    /// - `CF_PRODUCER_ENABLED` (`true`/`false`)
    /// - `CF_CANDIDATE_ORDER` (`canonical`/`insertion`)
    /// - `CF_REPLAY_WINDOW_SECS`
    /// - `CF_PATTERN_CACHE_SIZE`
    ///
    /// Unparseable values keep the default.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            node_id: env::var("CF_NODE_ID")
                .map(NodeId::new)
                .unwrap_or(defaults.node_id),

            producer_enabled: env::var("CF_PRODUCER_ENABLED")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.producer_enabled),

            candidate_order: env::var("CF_CANDIDATE_ORDER")
                .ok()
                .and_then(|v| CandidateOrder::parse(&v))
                .unwrap_or(defaults.candidate_order),

            replay_window_secs: env::var("CF_REPLAY_WINDOW_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.replay_window_secs),

            pattern_cache_size: env::var("CF_PATTERN_CACHE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.pattern_cache_size),
        }
    }
}
