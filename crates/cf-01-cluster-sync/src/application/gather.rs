//! # Gather
//!
//! Builds the reconciled view of a group: replicated records merged with
//! this node's runtime, annotated with policy flags and ordered for
//! selector resolution.

use indexmap::IndexMap;
use shared_types::entities::Category;

use super::access_control::AccessControl;
use super::group_state::GroupState;
use crate::algorithms::{merge_features, merge_units, order_candidates};
use crate::config::CandidateOrder;
use crate::domain::{ExtendedState, FeatureState, SyncError, UnitState};
use crate::ports::outbound::{FeaturesResolver, LocalRuntime};

/// Reconciled units of `state`'s group, keyed `symbolic_name/version`.
pub async fn gather_bundles(
    state: &GroupState,
    runtime: &dyn LocalRuntime,
    access: &AccessControl,
    order: CandidateOrder,
) -> Result<IndexMap<String, ExtendedState<UnitState>>, SyncError> {
    let cluster = state.bundles().entries()?;
    let local = runtime.list_units().await?;

    let mut merged = merge_units(cluster, &local);
    for unit in merged.values_mut() {
        let (inbound, outbound) =
            access.blocked_flags(state.group(), Category::Bundle, &unit.base.location)?;
        unit.blocked_inbound = inbound;
        unit.blocked_outbound = outbound;
    }

    order_candidates(&mut merged, order);
    Ok(merged)
}

/// Reconciled features of `state`'s group, keyed `name/version`.
pub async fn gather_features(
    state: &GroupState,
    resolver: &dyn FeaturesResolver,
    access: &AccessControl,
    order: CandidateOrder,
) -> Result<IndexMap<String, ExtendedState<FeatureState>>, SyncError> {
    let cluster = state.features().entries()?;

    let mut local = Vec::new();
    for feature in resolver.list_features().await? {
        let installed = resolver.is_installed(&feature).await?;
        local.push((feature, installed));
    }

    let mut merged = merge_features(cluster, &local);
    for feature in merged.values_mut() {
        let (inbound, outbound) =
            access.blocked_flags(state.group(), Category::Feature, &feature.base.name)?;
        feature.blocked_inbound = inbound;
        feature.blocked_outbound = outbound;
    }

    order_candidates(&mut merged, order);
    Ok(merged)
}
