//! # Feature and Repository Choreography
//!
//! Repository registration fans out to every member, optionally cascading
//! into feature installation:
//!
//! ```text
//! [node-0] add_repository(install)
//!     │  inspect (register, read, unregister), record repository + features
//!     ↓
//! [Event Bus] ──RepositoryAdded{cascade}──→ [node-1], [node-2]
//!                                             │
//!                                             ↓
//!                                register locally, install allowed features
//! ```
//!
//! ## Test Categories
//!
//! 1. **Repositories**: add and remove with and without cascade
//! 2. **Features**: install/uninstall propagation, version resolution
//! 3. **Policies**: inbound feature denial during replay
//! 4. **Telemetry**: counters exposed in the text exposition

#[cfg(test)]
mod tests {
    use crate::harness::{TestCluster, GROUP, REPOSITORY};

    use cf_01_cluster_sync::{
        ApplyOutcome, BlockRequest, FeatureOptions, FeatureSyncApi, SyncError,
    };

    const FEATURES: [&str; 3] = ["webconsole", "ssh", "jolokia"];

    fn inbound_blacklist() -> BlockRequest {
        BlockRequest {
            whitelist: false,
            blacklist: true,
            inbound: true,
            outbound: false,
        }
    }

    // =============================================================================
    // REPOSITORIES
    // =============================================================================

    #[tokio::test]
    async fn test_add_repository_with_install_cascades() {
        let mut cluster = TestCluster::new(3);
        cluster
            .node(0)
            .features
            .add_repository(GROUP, REPOSITORY, true)
            .await
            .unwrap();
        let outcomes = cluster.settle().await;
        assert_eq!(outcomes[1], vec![ApplyOutcome::Applied]);

        // inspection on the issuing node leaves no registration behind
        assert!(!cluster.node(0).resolver.is_registered(REPOSITORY));

        for node in &cluster.nodes[1..] {
            assert!(node.resolver.is_registered(REPOSITORY));
            for feature in FEATURES {
                assert!(node.resolver.is_feature_installed(feature), "{feature} on {}", node.id);
            }
        }

        assert_eq!(
            cluster.node(2).features.list_repositories(GROUP).await.unwrap(),
            vec![REPOSITORY.to_string()]
        );
    }

    #[tokio::test]
    async fn test_add_repository_without_install_only_registers() {
        let mut cluster = TestCluster::new(2);
        cluster
            .node(0)
            .features
            .add_repository(GROUP, REPOSITORY, false)
            .await
            .unwrap();
        cluster.settle().await;

        let node = cluster.node(1);
        assert!(node.resolver.is_registered(REPOSITORY));
        assert!(FEATURES.iter().all(|f| !node.resolver.is_feature_installed(f)));

        let rows = node.features.list_features(GROUP).await.unwrap();
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|row| row.located == "cluster/local"));
        assert!(rows.iter().all(|row| !row.installed));
    }

    #[tokio::test]
    async fn test_repository_is_group_wide() {
        let cluster = TestCluster::new(2);
        cluster
            .node(0)
            .features
            .add_repository(GROUP, REPOSITORY, false)
            .await
            .unwrap();

        assert_eq!(
            cluster
                .node(1)
                .features
                .add_repository(GROUP, REPOSITORY, false)
                .await,
            Err(SyncError::RepositoryAlreadyRegistered(REPOSITORY.to_string()))
        );
    }

    #[tokio::test]
    async fn test_remove_repository_with_uninstall() {
        let mut cluster = TestCluster::new(3);
        cluster
            .node(0)
            .features
            .add_repository(GROUP, REPOSITORY, true)
            .await
            .unwrap();
        cluster.settle().await;

        cluster
            .node(1)
            .features
            .remove_repository(GROUP, REPOSITORY, true)
            .await
            .unwrap();
        let outcomes = cluster.settle().await;
        assert_eq!(outcomes[0], vec![ApplyOutcome::Applied]);
        assert_eq!(outcomes[1], vec![ApplyOutcome::OwnEvent]);

        let node = cluster.node(2);
        assert!(!node.resolver.is_registered(REPOSITORY));
        assert!(FEATURES.iter().all(|f| !node.resolver.is_feature_installed(f)));
        assert!(node.features.list_repositories(GROUP).await.unwrap().is_empty());

        assert_eq!(
            cluster
                .node(0)
                .features
                .remove_repository(GROUP, REPOSITORY, false)
                .await,
            Err(SyncError::RepositoryNotFound {
                url: REPOSITORY.to_string(),
                group: GROUP.to_string(),
            })
        );
    }

    // =============================================================================
    // FEATURES
    // =============================================================================

    #[tokio::test]
    async fn test_feature_install_and_uninstall_propagate() {
        let mut cluster = TestCluster::new(3);
        let origin = &cluster.node(0).features;
        origin.add_repository(GROUP, REPOSITORY, false).await.unwrap();
        origin
            .install_feature(GROUP, "ssh", None, FeatureOptions::default())
            .await
            .unwrap();
        cluster.settle().await;

        for node in &cluster.nodes[1..] {
            assert!(node.resolver.is_feature_installed("ssh"));
            assert!(!node.resolver.is_feature_installed("webconsole"));
        }

        cluster
            .node(2)
            .features
            .uninstall_feature(GROUP, "ssh", Some("4.0"), false)
            .await
            .unwrap();
        cluster.settle().await;

        assert!(!cluster.node(1).resolver.is_feature_installed("ssh"));
        let rows = cluster.node(1).features.list_features(GROUP).await.unwrap();
        let ssh = rows.iter().find(|row| row.name == "ssh").unwrap();
        assert!(!ssh.installed);
    }

    #[tokio::test]
    async fn test_unknown_feature_is_rejected() {
        let cluster = TestCluster::new(1);
        cluster
            .node(0)
            .features
            .add_repository(GROUP, REPOSITORY, false)
            .await
            .unwrap();

        assert!(matches!(
            cluster
                .node(0)
                .features
                .install_feature(GROUP, "ssh", Some("9.0"), FeatureOptions::default())
                .await,
            Err(SyncError::FeatureNotFound { .. })
        ));
    }

    // =============================================================================
    // POLICIES
    // =============================================================================

    #[tokio::test]
    async fn test_inbound_feature_policy_filters_cascade_and_events() {
        let mut cluster = TestCluster::new(2);
        cluster
            .node(1)
            .features
            .block(GROUP, "^ssh$", inbound_blacklist())
            .await
            .unwrap();

        let origin = &cluster.node(0).features;
        origin.add_repository(GROUP, REPOSITORY, true).await.unwrap();
        origin
            .install_feature(GROUP, "ssh", None, FeatureOptions::default())
            .await
            .unwrap();
        let outcomes = cluster.settle().await;
        assert_eq!(
            outcomes[1],
            vec![ApplyOutcome::Applied, ApplyOutcome::Blocked]
        );

        let node = cluster.node(1);
        assert!(node.resolver.is_feature_installed("webconsole"));
        assert!(node.resolver.is_feature_installed("jolokia"));
        assert!(!node.resolver.is_feature_installed("ssh"));

        let rows = node.features.list_features(GROUP).await.unwrap();
        let ssh = rows.iter().find(|row| row.name == "ssh").unwrap();
        assert_eq!(ssh.blocked, "in");
    }

    // =============================================================================
    // TELEMETRY
    // =============================================================================

    #[tokio::test]
    async fn test_metrics_exposed() {
        fleet_telemetry::register_metrics().unwrap();

        let mut cluster = TestCluster::new(2);
        cluster
            .node(0)
            .features
            .add_repository(GROUP, REPOSITORY, false)
            .await
            .unwrap();
        cluster.settle().await;

        let text = fleet_telemetry::encode_metrics().unwrap();
        assert!(text.contains("cf_events_produced_total"));
        assert!(text.contains("cf_events_consumed_total"));
        assert!(text.contains("repository_added"));
    }
}
