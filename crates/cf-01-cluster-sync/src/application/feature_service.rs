//! # Feature Sync Service
//!
//! Cluster-wide feature and features-repository management for a group.
//!
//! Repository contents are read through the resolver. When the resolver
//! cannot inspect a repository without registering it, the service
//! registers it, reads it and unregisters it again. That sequence is not
//! atomic: a failure after registration leaves cleanup to a best-effort
//! unregister.

use async_trait::async_trait;
use shared_bus::{ClusterEvent, ClusterEventKind, EventFlags};
use shared_types::entities::Category;
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

use super::context::SyncContext;
use super::gather::gather_features;
use crate::domain::{
    composite_key, BlockRequest, FeatureOptions, FeatureState, RepositoryDescriptor, SyncError,
};
use crate::ports::inbound::{FeatureSyncApi, FeatureView};
use crate::ports::outbound::FeaturesResolver;

/// Read a repository's contents, registering it temporarily if needed.
pub(crate) async fn describe_repository(
    resolver: &dyn FeaturesResolver,
    url: &str,
) -> Result<RepositoryDescriptor, SyncError> {
    if let Some(descriptor) = resolver.inspect_repository(url).await? {
        return Ok(descriptor);
    }

    if let Some(descriptor) = find_registered(resolver, url).await? {
        return Ok(descriptor);
    }

    resolver.add_repository(url).await?;
    let found = find_registered(resolver, url).await;
    if let Err(e) = resolver.remove_repository(url).await {
        warn!(url, error = %e, "Failed to unregister inspected repository");
    }

    found?.ok_or_else(|| SyncError::Resolver(format!("repository {url} has no descriptor")))
}

async fn find_registered(
    resolver: &dyn FeaturesResolver,
    url: &str,
) -> Result<Option<RepositoryDescriptor>, SyncError> {
    Ok(resolver
        .list_repositories()
        .await?
        .into_iter()
        .find(|repo| repo.url == url))
}

/// Feature Sync Service - cluster-wide features and repositories.
pub struct FeatureSyncService {
    ctx: Arc<SyncContext>,
    resolver: Arc<dyn FeaturesResolver>,
}

impl FeatureSyncService {
    /// Create a new service.
    pub fn new(ctx: Arc<SyncContext>, resolver: Arc<dyn FeaturesResolver>) -> Self {
        Self { ctx, resolver }
    }

    /// Internal: flip the `installed` flag of one feature and broadcast it.
    async fn set_installed(
        &self,
        group: &str,
        name: &str,
        version: Option<&str>,
        installed: bool,
        flags: EventFlags,
    ) -> Result<(), SyncError> {
        self.ctx.require_group(group)?;
        self.ctx.require_producer_on()?;
        self.ctx.require_outbound(group, Category::Feature, name)?;

        let features = self.ctx.group_state(group).features();
        let (key, mut feature) =
            find_feature(&features.entries()?, name, version).ok_or_else(|| {
                SyncError::FeatureNotFound {
                    identifier: version.map_or_else(|| name.to_string(), |v| composite_key(name, v)),
                    group: group.to_string(),
                }
            })?;

        feature.installed = installed;
        features.put(&key, &feature)?;

        let kind = if installed {
            ClusterEventKind::FeatureInstalled
        } else {
            ClusterEventKind::FeatureUninstalled
        };
        let event = ClusterEvent::new(kind, &feature.name, group)
            .with_version(&feature.version)
            .with_flags(flags);
        self.ctx.producer().produce(event).await?;

        info!(group, key = %key, installed, "Feature state broadcast");
        Ok(())
    }
}

/// A repository the resolver cannot read is reported as an invalid URL.
fn unreadable_repository(url: &str, error: SyncError) -> SyncError {
    match error {
        SyncError::Resolver(reason) => SyncError::InvalidLocation {
            location: url.to_string(),
            reason,
        },
        other => other,
    }
}

/// Exact `name/version` match, or the first entry named `name` when no
/// version is given.
pub(crate) fn find_feature(
    entries: &[(String, FeatureState)],
    name: &str,
    version: Option<&str>,
) -> Option<(String, FeatureState)> {
    entries
        .iter()
        .find(|(_, feature)| {
            feature.name == name && version.map_or(true, |v| feature.version == v)
        })
        .cloned()
}

#[async_trait]
impl FeatureSyncApi for FeatureSyncService {
    async fn install_feature(
        &self,
        group: &str,
        name: &str,
        version: Option<&str>,
        options: FeatureOptions,
    ) -> Result<(), SyncError> {
        let flags = EventFlags {
            skip_clean: options.no_clean,
            skip_refresh: options.no_refresh,
            no_start: options.no_start,
            ..EventFlags::default()
        };
        self.set_installed(group, name, version, true, flags).await
    }

    async fn uninstall_feature(
        &self,
        group: &str,
        name: &str,
        version: Option<&str>,
        no_refresh: bool,
    ) -> Result<(), SyncError> {
        let flags = EventFlags {
            skip_refresh: no_refresh,
            ..EventFlags::default()
        };
        self.set_installed(group, name, version, false, flags).await
    }

    async fn list_features(&self, group: &str) -> Result<Vec<FeatureView>, SyncError> {
        self.ctx.require_group(group)?;

        let candidates = gather_features(
            &self.ctx.group_state(group),
            self.resolver.as_ref(),
            self.ctx.access(),
            self.ctx.config().candidate_order,
        )
        .await?;

        Ok(candidates
            .values()
            .map(|state| FeatureView {
                name: state.base.name.clone(),
                version: state.base.version.clone(),
                installed: state.base.installed,
                located: state.located().label().to_string(),
                blocked: state.blocked().label().to_string(),
            })
            .collect())
    }

    async fn list_repositories(&self, group: &str) -> Result<Vec<String>, SyncError> {
        self.ctx.require_group(group)?;
        self.ctx.group_state(group).repositories().keys()
    }

    async fn add_repository(&self, group: &str, url: &str, install: bool) -> Result<(), SyncError> {
        self.ctx.require_group(group)?;
        self.ctx.require_producer_on()?;

        let state = self.ctx.group_state(group);
        let repositories = state.repositories();
        if repositories.contains_key(url)? {
            return Err(SyncError::RepositoryAlreadyRegistered(url.to_string()));
        }

        Url::parse(url).map_err(|e| SyncError::InvalidLocation {
            location: url.to_string(),
            reason: e.to_string(),
        })?;

        let descriptor = describe_repository(self.resolver.as_ref(), url)
            .await
            .map_err(|e| unreadable_repository(url, e))?;

        repositories.put(url, &descriptor.name)?;
        let features = state.features();
        for feature in &descriptor.features {
            let installed = self.resolver.is_installed(feature).await?;
            features.put(
                &feature.key(),
                &FeatureState::new(&feature.name, &feature.version, installed),
            )?;
        }

        let event = ClusterEvent::new(ClusterEventKind::RepositoryAdded, url, group).with_flags(
            EventFlags {
                cascade: install,
                ..EventFlags::default()
            },
        );
        self.ctx.producer().produce(event).await?;

        info!(
            group,
            url,
            name = %descriptor.name,
            features = descriptor.features.len(),
            install,
            "Features repository added"
        );
        Ok(())
    }

    async fn remove_repository(
        &self,
        group: &str,
        url: &str,
        uninstall: bool,
    ) -> Result<(), SyncError> {
        self.ctx.require_group(group)?;
        self.ctx.require_producer_on()?;

        let state = self.ctx.group_state(group);
        let repositories = state.repositories();
        if !repositories.contains_key(url)? {
            return Err(SyncError::RepositoryNotFound {
                url: url.to_string(),
                group: group.to_string(),
            });
        }

        let descriptor = describe_repository(self.resolver.as_ref(), url)
            .await
            .map_err(|e| unreadable_repository(url, e))?;
        let features = state.features();
        for feature in &descriptor.features {
            if features.remove(&feature.key())?.is_none() {
                debug!(group, key = %feature.key(), "Feature already absent");
            }
        }
        repositories.remove(url)?;

        let event = ClusterEvent::new(ClusterEventKind::RepositoryRemoved, url, group).with_flags(
            EventFlags {
                cascade: uninstall,
                ..EventFlags::default()
            },
        );
        self.ctx.producer().produce(event).await?;

        info!(group, url, uninstall, "Features repository removed");
        Ok(())
    }

    async fn block(
        &self,
        group: &str,
        pattern: &str,
        request: BlockRequest,
    ) -> Result<(), SyncError> {
        self.ctx.require_group(group)?;
        for (kind, direction) in request.targets() {
            self.ctx
                .access()
                .switch_list_entry(kind, group, Category::Feature, direction, pattern)?;
        }
        Ok(())
    }
}
