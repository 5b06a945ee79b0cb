//! # Event Consumer
//!
//! Replays cluster events produced by other members of a group on this node.
//!
//! ## Pipeline
//!
//! ```text
//! event ─→ own? ─→ member? ─→ seen? ─→ inbound policy ─→ group map ─→ local runtime
//!           skip     skip       skip        skip           upsert       transition
//! ```
//!
//! Every step is idempotent: an event applied twice leaves the same state
//! as an event applied once, so the replay cache only saves work.

use parking_lot::Mutex;
use shared_bus::{ClusterEvent, ClusterEventKind, EventTopic, ReplayCache, Subscription};
use shared_types::entities::{Category, Direction};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::context::SyncContext;
use super::feature_service::{describe_repository, find_feature};
use super::group_state::GroupState;
use crate::domain::{
    composite_key, FeatureInfo, FeatureOptions, FeatureState, LocalUnitState, RepositoryDescriptor,
    SyncError, UnitState, UnitStatus, DEFAULT_VERSION,
};
use crate::ports::outbound::{FeaturesResolver, LocalRuntime};

/// What happened to a consumed event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Replayed on this node.
    Applied,
    /// Produced by this node.
    OwnEvent,
    /// The source group is unknown here.
    UnknownGroup,
    /// This node is not a member of the source group.
    NotMember,
    /// Already applied.
    Duplicate,
    /// Denied by the group's inbound policy.
    Blocked,
    /// Applying failed; the cause was logged.
    Failed,
}

impl ApplyOutcome {
    /// Metric label.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Applied => "applied",
            Self::OwnEvent => "own_event",
            Self::UnknownGroup => "unknown_group",
            Self::NotMember => "not_member",
            Self::Duplicate => "duplicate",
            Self::Blocked => "blocked",
            Self::Failed => "failed",
        }
    }
}

/// Applies remote cluster events to this node.
pub struct EventConsumer {
    ctx: Arc<SyncContext>,
    runtime: Arc<dyn LocalRuntime>,
    resolver: Arc<dyn FeaturesResolver>,
    seen: Mutex<ReplayCache>,
}

impl EventConsumer {
    /// Create a consumer remembering event ids for the configured window.
    pub fn new(
        ctx: Arc<SyncContext>,
        runtime: Arc<dyn LocalRuntime>,
        resolver: Arc<dyn FeaturesResolver>,
    ) -> Self {
        let seen = ReplayCache::with_config(
            ctx.config().replay_window_secs,
            ReplayCache::DEFAULT_GC_INTERVAL,
        );
        Self {
            ctx,
            runtime,
            resolver,
            seen: Mutex::new(seen),
        }
    }

    /// Consume `subscription` until the bus closes. Returns the number of
    /// events processed.
    pub async fn run(&self, mut subscription: Subscription) -> usize {
        let mut processed = 0;
        while let Some(event) = subscription.recv().await {
            self.process(&event).await;
            processed += 1;
        }
        info!(
            node = %self.ctx.config().node_id,
            processed,
            missed = subscription.missed(),
            "Event bus closed, consumer stopped"
        );
        processed
    }

    /// Process every event already queued on `subscription`.
    pub async fn drain(&self, subscription: &mut Subscription) -> Vec<ApplyOutcome> {
        let mut outcomes = Vec::new();
        while let Ok(Some(event)) = subscription.try_recv() {
            outcomes.push(self.process(&event).await);
        }
        outcomes
    }

    /// Apply one event, logging failures instead of returning them.
    pub async fn process(&self, event: &ClusterEvent) -> ApplyOutcome {
        let outcome = match self.apply(event).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(
                    event_id = %event.id,
                    kind = event.kind.as_str(),
                    group = %event.source_group,
                    error = %e,
                    "Failed to apply cluster event"
                );
                ApplyOutcome::Failed
            }
        };
        fleet_telemetry::record_event_consumed(event.kind.as_str(), outcome.as_str());
        outcome
    }

    /// Apply one event.
    pub async fn apply(&self, event: &ClusterEvent) -> Result<ApplyOutcome, SyncError> {
        let node = &self.ctx.config().node_id;
        if event.source_node.as_ref() == Some(node) {
            return Ok(ApplyOutcome::OwnEvent);
        }

        let group = match self.ctx.groups().find_group_by_name(&event.source_group) {
            Some(group) => group,
            None => return Ok(ApplyOutcome::UnknownGroup),
        };
        if !group.has_member(node) {
            return Ok(ApplyOutcome::NotMember);
        }

        if self.seen.lock().contains(&event.id) {
            debug!(event_id = %event.id, "Duplicate event skipped");
            return Ok(ApplyOutcome::Duplicate);
        }

        // a failed replay stays retryable: only settled events are remembered
        let outcome = self.replay(&group.name, event).await?;
        let _ = self.seen.lock().record(event.id);
        Ok(outcome)
    }

    async fn replay(&self, group: &str, event: &ClusterEvent) -> Result<ApplyOutcome, SyncError> {
        let (category, identifier) = policy_subject(event);
        if !self
            .ctx
            .access()
            .is_allowed(group, category, identifier, Direction::Inbound)?
        {
            info!(
                group,
                kind = event.kind.as_str(),
                identifier,
                "Event blocked inbound"
            );
            return Ok(ApplyOutcome::Blocked);
        }

        let state = self.ctx.group_state(group);
        match event.kind {
            ClusterEventKind::Installed
            | ClusterEventKind::Uninstalled
            | ClusterEventKind::Started
            | ClusterEventKind::Stopped => self.apply_unit(&state, event).await?,
            ClusterEventKind::FeatureInstalled | ClusterEventKind::FeatureUninstalled => {
                self.apply_feature(&state, event).await?
            }
            ClusterEventKind::RepositoryAdded => self.apply_repository_added(&state, event).await?,
            ClusterEventKind::RepositoryRemoved => {
                self.apply_repository_removed(&state, event).await?
            }
        }

        debug!(
            group,
            kind = event.kind.as_str(),
            identifier = %event.identifier(),
            "Cluster event applied"
        );
        Ok(ApplyOutcome::Applied)
    }

    // =========================================================================
    // UNITS
    // =========================================================================

    async fn apply_unit(&self, state: &GroupState, event: &ClusterEvent) -> Result<(), SyncError> {
        let version = event.version.as_deref().unwrap_or(DEFAULT_VERSION);
        let key = composite_key(&event.name, version);
        let bundles = state.bundles();

        // group map
        match event.kind {
            ClusterEventKind::Uninstalled => {
                bundles.remove(&key)?;
            }
            kind => {
                let status = match kind {
                    ClusterEventKind::Started => UnitStatus::Started,
                    ClusterEventKind::Stopped => UnitStatus::Stopped,
                    _ => UnitStatus::Installed,
                };
                let unit = match bundles.get(&key)? {
                    Some(existing) => UnitState { status, ..existing },
                    None => UnitState {
                        id: bundles.len()? as u64,
                        name: Some(event.name.clone()),
                        symbolic_name: event.name.clone(),
                        version: version.to_string(),
                        status,
                        location: event.location.clone().unwrap_or_default(),
                    },
                };
                bundles.put(&key, &unit)?;
            }
        }

        // local runtime
        let local = self
            .runtime
            .list_units()
            .await?
            .into_iter()
            .find(|unit| unit.key() == key);

        match event.kind {
            ClusterEventKind::Installed | ClusterEventKind::Started => {
                let unit = match local {
                    Some(unit) => unit,
                    None => {
                        let location = event.location.as_deref().ok_or_else(|| {
                            SyncError::Runtime(format!("event {} carries no location", event.id))
                        })?;
                        self.runtime.install(location).await?
                    }
                };
                let start = event.kind == ClusterEventKind::Started
                    || event.flags.start_after_install;
                if start && unit.state != LocalUnitState::Active {
                    self.runtime.start(&unit.symbolic_name, &unit.version).await?;
                }
            }
            ClusterEventKind::Stopped => {
                if let Some(unit) = local.filter(|u| u.state == LocalUnitState::Active) {
                    self.runtime.stop(&unit.symbolic_name, &unit.version).await?;
                }
            }
            _ => {
                if let Some(unit) = local {
                    self.runtime
                        .uninstall(&unit.symbolic_name, &unit.version)
                        .await?;
                }
            }
        }
        Ok(())
    }

    // =========================================================================
    // FEATURES
    // =========================================================================

    async fn apply_feature(
        &self,
        state: &GroupState,
        event: &ClusterEvent,
    ) -> Result<(), SyncError> {
        let installed = event.kind == ClusterEventKind::FeatureInstalled;
        let version = event.version.as_deref();

        let features = state.features();
        match find_feature(&features.entries()?, &event.name, version) {
            Some((key, feature)) => {
                features.put(&key, &FeatureState { installed, ..feature })?;
            }
            None => {
                if let Some(version) = version {
                    features.put(
                        &composite_key(&event.name, version),
                        &FeatureState::new(&event.name, version, installed),
                    )?;
                }
            }
        }

        let local = self.local_feature(&event.name, version).await?;
        let locally_installed = match &local {
            Some(feature) => self.resolver.is_installed(feature).await?,
            None => false,
        };

        if installed && !locally_installed {
            let options = FeatureOptions {
                no_clean: event.flags.skip_clean,
                no_refresh: event.flags.skip_refresh,
                no_start: event.flags.no_start,
            };
            self.resolver
                .install_feature(&event.name, version, options)
                .await?;
        } else if !installed && locally_installed {
            self.resolver
                .uninstall_feature(&event.name, version, event.flags.skip_refresh)
                .await?;
        }
        Ok(())
    }

    async fn local_feature(
        &self,
        name: &str,
        version: Option<&str>,
    ) -> Result<Option<FeatureInfo>, SyncError> {
        Ok(self
            .resolver
            .list_features()
            .await?
            .into_iter()
            .find(|f| f.name == name && version.map_or(true, |v| f.version == v)))
    }

    // =========================================================================
    // REPOSITORIES
    // =========================================================================

    async fn registered_repository(
        &self,
        url: &str,
    ) -> Result<Option<RepositoryDescriptor>, SyncError> {
        Ok(self
            .resolver
            .list_repositories()
            .await?
            .into_iter()
            .find(|repo| repo.url == url))
    }

    async fn apply_repository_added(
        &self,
        state: &GroupState,
        event: &ClusterEvent,
    ) -> Result<(), SyncError> {
        let url = event.name.as_str();
        let descriptor = match self.registered_repository(url).await? {
            Some(descriptor) => descriptor,
            None => {
                self.resolver.add_repository(url).await?;
                self.registered_repository(url).await?.ok_or_else(|| {
                    SyncError::Resolver(format!("repository {url} not listed after registration"))
                })?
            }
        };

        let repositories = state.repositories();
        if !repositories.contains_key(url)? {
            repositories.put(url, &descriptor.name)?;
            let features = state.features();
            for feature in &descriptor.features {
                if !features.contains_key(&feature.key())? {
                    let installed = self.resolver.is_installed(feature).await?;
                    features.put(
                        &feature.key(),
                        &FeatureState::new(&feature.name, &feature.version, installed),
                    )?;
                }
            }
        }

        if event.flags.cascade {
            for feature in &descriptor.features {
                if !self.feature_inbound_allowed(state.group(), &feature.name)? {
                    continue;
                }
                if !self.resolver.is_installed(feature).await? {
                    self.resolver
                        .install_feature(
                            &feature.name,
                            Some(&feature.version),
                            FeatureOptions::default(),
                        )
                        .await?;
                }
            }
        }

        info!(group = state.group(), url, cascade = event.flags.cascade, "Repository registered");
        Ok(())
    }

    async fn apply_repository_removed(
        &self,
        state: &GroupState,
        event: &ClusterEvent,
    ) -> Result<(), SyncError> {
        let url = event.name.as_str();
        let local = self.registered_repository(url).await?;

        if event.flags.cascade {
            if let Some(descriptor) = &local {
                for feature in &descriptor.features {
                    if !self.feature_inbound_allowed(state.group(), &feature.name)? {
                        continue;
                    }
                    if self.resolver.is_installed(feature).await? {
                        self.resolver
                            .uninstall_feature(&feature.name, Some(&feature.version), false)
                            .await?;
                    }
                }
            }
        }

        let repositories = state.repositories();
        if repositories.contains_key(url)? {
            let descriptor = match &local {
                Some(descriptor) => descriptor.clone(),
                None => describe_repository(self.resolver.as_ref(), url).await?,
            };
            let features = state.features();
            for feature in &descriptor.features {
                features.remove(&feature.key())?;
            }
            repositories.remove(url)?;
        }

        if local.is_some() {
            self.resolver.remove_repository(url).await?;
        }

        info!(group = state.group(), url, cascade = event.flags.cascade, "Repository unregistered");
        Ok(())
    }

    fn feature_inbound_allowed(&self, group: &str, name: &str) -> Result<bool, SyncError> {
        self.ctx
            .access()
            .is_allowed(group, Category::Feature, name, Direction::Inbound)
    }
}

/// Policy category and identifier an event is checked against.
fn policy_subject(event: &ClusterEvent) -> (Category, &str) {
    match event.kind.topic() {
        EventTopic::Bundle => (
            Category::Bundle,
            event.location.as_deref().unwrap_or(&event.name),
        ),
        _ => (Category::Feature, event.name.as_str()),
    }
}
