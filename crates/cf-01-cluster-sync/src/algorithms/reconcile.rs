//! # State Reconciliation
//!
//! Merges a group's replicated records with what this node actually runs.
//! Cluster records come first. A local record with the same key only marks
//! the cluster record as present locally; the cluster fields win.

use indexmap::IndexMap;

use crate::config::CandidateOrder;
use crate::domain::{ExtendedState, FeatureInfo, FeatureState, LocalUnit, UnitState};

/// Merge cluster unit records with local units.
pub fn merge_units(
    cluster: Vec<(String, UnitState)>,
    local: &[LocalUnit],
) -> IndexMap<String, ExtendedState<UnitState>> {
    let mut merged: IndexMap<String, ExtendedState<UnitState>> = cluster
        .into_iter()
        .map(|(key, state)| (key, ExtendedState::from_cluster(state)))
        .collect();

    for unit in local {
        let key = unit.key();
        match merged.get_mut(&key) {
            Some(existing) => existing.present_locally = true,
            None => {
                merged.insert(key, ExtendedState::from_local(unit.to_unit_state()));
            }
        }
    }

    merged
}

/// Merge cluster feature records with the features known locally.
///
/// `local` pairs each feature with whether it is installed on this node.
pub fn merge_features(
    cluster: Vec<(String, FeatureState)>,
    local: &[(FeatureInfo, bool)],
) -> IndexMap<String, ExtendedState<FeatureState>> {
    let mut merged: IndexMap<String, ExtendedState<FeatureState>> = cluster
        .into_iter()
        .map(|(key, state)| (key, ExtendedState::from_cluster(state)))
        .collect();

    for (feature, installed) in local {
        let key = feature.key();
        match merged.get_mut(&key) {
            Some(existing) => existing.present_locally = true,
            None => {
                let state = FeatureState::new(&feature.name, &feature.version, *installed);
                merged.insert(key, ExtendedState::from_local(state));
            }
        }
    }

    merged
}

/// Apply the configured candidate order in place.
pub fn order_candidates<T>(candidates: &mut IndexMap<String, T>, order: CandidateOrder) {
    if order == CandidateOrder::Canonical {
        candidates.sort_keys();
    }
}
