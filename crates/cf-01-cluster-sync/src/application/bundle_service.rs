//! # Bundle Sync Service
//!
//! Cluster-wide unit management: install, uninstall, start, stop, block and
//! list, scoped to a group.

use async_trait::async_trait;
use shared_bus::{ClusterEvent, ClusterEventKind, EventFlags};
use shared_types::entities::{Category, Direction};
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

use super::context::SyncContext;
use super::gather::gather_bundles;
use crate::algorithms::{effective_version, resolve};
use crate::domain::{BlockRequest, SyncError, UnitState, UnitStatus};
use crate::ports::inbound::{BundleSyncApi, BundleView};
use crate::ports::outbound::{DescriptorReader, LocalRuntime};

/// Unit lifecycle operation applied to selected keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Uninstall,
    Start,
    Stop,
}

impl Lifecycle {
    fn event_kind(self) -> ClusterEventKind {
        match self {
            Self::Uninstall => ClusterEventKind::Uninstalled,
            Self::Start => ClusterEventKind::Started,
            Self::Stop => ClusterEventKind::Stopped,
        }
    }
}

/// Bundle Sync Service - cluster-wide unit management.
pub struct BundleSyncService {
    ctx: Arc<SyncContext>,
    runtime: Arc<dyn LocalRuntime>,
    descriptors: Arc<dyn DescriptorReader>,
}

impl BundleSyncService {
    /// Create a new service.
    pub fn new(
        ctx: Arc<SyncContext>,
        runtime: Arc<dyn LocalRuntime>,
        descriptors: Arc<dyn DescriptorReader>,
    ) -> Self {
        Self {
            ctx,
            runtime,
            descriptors,
        }
    }

    /// Internal: apply a lifecycle change to every unit matched by `selector`.
    async fn apply_lifecycle(
        &self,
        group: &str,
        selector: &str,
        op: Lifecycle,
    ) -> Result<(), SyncError> {
        self.ctx.require_group(group)?;
        self.ctx.require_producer_on()?;

        let state = self.ctx.group_state(group);
        let candidates = gather_bundles(
            &state,
            self.runtime.as_ref(),
            self.ctx.access(),
            self.ctx.config().candidate_order,
        )
        .await?;
        let keys = resolve(selector, &candidates, self.ctx.patterns())?;

        let bundles = state.bundles();
        for key in keys {
            let Some(mut unit) = bundles.get(&key)? else {
                debug!(group, key = %key, "Not in cluster map, skipped");
                continue;
            };

            if !self.ctx.access().is_allowed(
                group,
                Category::Bundle,
                &unit.location,
                Direction::Outbound,
            )? {
                warn!(group, key = %key, location = %unit.location, "Blocked outbound, skipped");
                continue;
            }

            match op {
                Lifecycle::Uninstall => {
                    bundles.remove(&key)?;
                }
                Lifecycle::Start => {
                    unit.status = UnitStatus::Started;
                    bundles.put(&key, &unit)?;
                }
                Lifecycle::Stop => {
                    unit.status = UnitStatus::Stopped;
                    bundles.put(&key, &unit)?;
                }
            }

            let event = ClusterEvent::new(op.event_kind(), &unit.symbolic_name, group)
                .with_version(&unit.version)
                .with_location(&unit.location);
            self.ctx.producer().produce(event).await?;

            info!(group, key = %key, op = ?op, "Unit lifecycle change broadcast");
        }

        Ok(())
    }
}

#[async_trait]
impl BundleSyncApi for BundleSyncService {
    async fn install(&self, group: &str, location: &str, start: bool) -> Result<(), SyncError> {
        self.ctx.require_group(group)?;
        self.ctx.require_producer_on()?;
        self.ctx.require_outbound(group, Category::Bundle, location)?;

        let url = Url::parse(location).map_err(|e| SyncError::InvalidLocation {
            location: location.to_string(),
            reason: e.to_string(),
        })?;

        let descriptor = self
            .descriptors
            .read_descriptor(&url)
            .await?
            .ok_or_else(|| SyncError::InvalidDescriptor {
                location: location.to_string(),
                reason: "no unit descriptor".to_string(),
            })?;
        let symbolic_name =
            descriptor
                .symbolic_name
                .clone()
                .ok_or_else(|| SyncError::InvalidDescriptor {
                    location: location.to_string(),
                    reason: "missing symbolic name".to_string(),
                })?;

        self.ctx
            .require_outbound(group, Category::Bundle, &symbolic_name)?;

        let version = effective_version(&descriptor);
        let bundles = self.ctx.group_state(group).bundles();
        let unit = UnitState {
            id: bundles.len()? as u64,
            name: descriptor.name.clone().or_else(|| Some(symbolic_name.clone())),
            symbolic_name: symbolic_name.clone(),
            version: version.clone(),
            status: if start {
                UnitStatus::Started
            } else {
                UnitStatus::Installed
            },
            location: location.to_string(),
        };
        bundles.put(&unit.key(), &unit)?;

        let kind = if start {
            ClusterEventKind::Started
        } else {
            ClusterEventKind::Installed
        };
        let event = ClusterEvent::new(kind, &symbolic_name, group)
            .with_version(&version)
            .with_location(location)
            .with_flags(EventFlags {
                start_after_install: start,
                ..EventFlags::default()
            });
        self.ctx.producer().produce(event).await?;

        info!(group, key = %unit.key(), id = unit.id, start, "Unit installed in cluster group");
        Ok(())
    }

    async fn uninstall(&self, group: &str, selector: &str) -> Result<(), SyncError> {
        self.apply_lifecycle(group, selector, Lifecycle::Uninstall).await
    }

    async fn start(&self, group: &str, selector: &str) -> Result<(), SyncError> {
        self.apply_lifecycle(group, selector, Lifecycle::Start).await
    }

    async fn stop(&self, group: &str, selector: &str) -> Result<(), SyncError> {
        self.apply_lifecycle(group, selector, Lifecycle::Stop).await
    }

    async fn block(
        &self,
        group: &str,
        pattern: &str,
        request: BlockRequest,
    ) -> Result<(), SyncError> {
        self.ctx.require_group(group)?;

        let candidates = gather_bundles(
            &self.ctx.group_state(group),
            self.runtime.as_ref(),
            self.ctx.access(),
            self.ctx.config().candidate_order,
        )
        .await?;

        let mut patterns: Vec<String> = resolve(pattern, &candidates, self.ctx.patterns())?
            .iter()
            .filter_map(|key| candidates.get(key))
            .map(|state| state.base.location.clone())
            .collect();
        if patterns.is_empty() {
            patterns.push(pattern.to_string());
        }

        for entry in &patterns {
            for (kind, direction) in request.targets() {
                self.ctx
                    .access()
                    .switch_list_entry(kind, group, Category::Bundle, direction, entry)?;
            }
        }
        Ok(())
    }

    async fn list_bundles(&self, group: &str) -> Result<Vec<BundleView>, SyncError> {
        self.ctx.require_group(group)?;

        let candidates = gather_bundles(
            &self.ctx.group_state(group),
            self.runtime.as_ref(),
            self.ctx.access(),
            self.ctx.config().candidate_order,
        )
        .await?;

        let mut rows: Vec<BundleView> = candidates
            .values()
            .map(|state| BundleView {
                id: state.base.id,
                name: state.base.display_name().to_string(),
                symbolic_name: state.base.symbolic_name.clone(),
                version: state.base.version.clone(),
                status: state.base.status.label().to_string(),
                location: state.base.location.clone(),
                located: state.located().label().to_string(),
                blocked: state.blocked().label().to_string(),
            })
            .collect();
        rows.sort_by_key(|row| row.id);
        Ok(rows)
    }
}
