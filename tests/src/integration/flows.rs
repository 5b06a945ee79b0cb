//! # Unit Sync Flows
//!
//! A management operation issued on one node is recorded in the group's
//! shared maps and replayed on every other member:
//!
//! ```text
//! [node-0] install/start/stop/uninstall
//!     │  precondition checks, map mutation
//!     ↓
//! [Event Bus] ──Installed/Started/Stopped/Uninstalled──→ [node-1], [node-2]
//!                                                          │
//!                                                          ↓
//!                                           inbound policy, local runtime
//! ```
//!
//! ## Test Categories
//!
//! 1. **Propagation**: lifecycle changes converge on every member
//! 2. **Policies**: outbound denial before mutation, inbound denial on replay
//! 3. **Membership and switches**: non-members and a producer that is OFF
//! 4. **Idempotence**: redelivery and re-install

#[cfg(test)]
mod tests {
    use crate::harness::{TestCluster, GROUP};

    use cf_01_cluster_sync::domain::LocalUnitState;
    use cf_01_cluster_sync::{
        ApplyOutcome, BlockRequest, BundleSyncApi, EventProducer, LocalRuntime, SwitchStatus,
        SyncError, UnitStatus,
    };
    use shared_bus::{ClusterEventKind, EventFilter, EventPublisher};
    use shared_types::entities::Category;

    const A: &str = "file:///a-1.0.jar";
    const B: &str = "file:///b-2.0.jar";
    const ABC: &str = "file:///abc-1.0.jar";

    fn inbound_blacklist() -> BlockRequest {
        BlockRequest {
            whitelist: false,
            blacklist: true,
            inbound: true,
            outbound: false,
        }
    }

    fn outbound_blacklist() -> BlockRequest {
        BlockRequest {
            whitelist: false,
            blacklist: true,
            inbound: false,
            outbound: true,
        }
    }

    // =============================================================================
    // PROPAGATION
    // =============================================================================

    #[tokio::test]
    async fn test_install_propagates_to_members() {
        let mut cluster = TestCluster::new(3);
        cluster.node(0).bundles.install(GROUP, A, false).await.unwrap();

        let outcomes = cluster.settle().await;
        assert_eq!(outcomes[0], vec![ApplyOutcome::OwnEvent]);
        assert_eq!(outcomes[1], vec![ApplyOutcome::Applied]);
        assert_eq!(outcomes[2], vec![ApplyOutcome::Applied]);

        for node in &cluster.nodes[1..] {
            assert_eq!(
                node.runtime.state_of("a", "1.0"),
                Some(LocalUnitState::Installed)
            );
        }
        // the issuing node only records the change in the cluster
        assert!(cluster.node(0).runtime.state_of("a", "1.0").is_none());
    }

    #[tokio::test]
    async fn test_lifecycle_converges() {
        let mut cluster = TestCluster::new(3);
        let origin = &cluster.node(0).bundles;
        origin.install(GROUP, A, false).await.unwrap();
        origin.install(GROUP, B, true).await.unwrap();
        origin.start(GROUP, "a/1.0").await.unwrap();
        origin.stop(GROUP, "^b$").await.unwrap();
        cluster.settle().await;

        for node in &cluster.nodes[1..] {
            assert_eq!(node.runtime.state_of("a", "1.0"), Some(LocalUnitState::Active));
            assert_eq!(
                node.runtime.state_of("b", "2.0"),
                Some(LocalUnitState::Resolved)
            );
        }

        let rows = cluster.node(1).bundles.list_bundles(GROUP).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|row| row.located == "cluster/local"));
        let b = rows.iter().find(|row| row.symbolic_name == "b").unwrap();
        assert_eq!(b.status, UnitStatus::Stopped.label());
    }

    #[tokio::test]
    async fn test_uninstall_by_selector_removes_everywhere() {
        let mut cluster = TestCluster::new(2);
        let origin = &cluster.node(0).bundles;
        origin.install(GROUP, A, false).await.unwrap();
        origin.install(GROUP, B, false).await.unwrap();
        cluster.settle().await;

        cluster
            .node(0)
            .bundles
            .uninstall(GROUP, "^[ab]$")
            .await
            .unwrap();
        cluster.settle().await;

        let rows = cluster.node(1).bundles.list_bundles(GROUP).await.unwrap();
        assert!(rows.is_empty());
        assert!(cluster.node(1).runtime.state_of("a", "1.0").is_none());
    }

    #[tokio::test]
    async fn test_range_selector_follows_sorted_keys() {
        let mut cluster = TestCluster::new(2);
        let origin = &cluster.node(0).bundles;
        origin.install(GROUP, B, false).await.unwrap();
        origin.install(GROUP, A, false).await.unwrap();
        cluster.settle().await;

        // positions 0 and 1 are a/1.0 and b/2.0 regardless of insertion order
        cluster.node(1).bundles.start(GROUP, "0-1").await.unwrap();
        let outcomes = cluster.settle().await;
        assert_eq!(outcomes[0], vec![ApplyOutcome::Applied, ApplyOutcome::Applied]);

        assert_eq!(cluster.node(0).runtime.state_of("a", "1.0"), Some(LocalUnitState::Active));
        assert_eq!(cluster.node(0).runtime.state_of("b", "2.0"), Some(LocalUnitState::Active));
        // the issuing node skips its own events
        assert_eq!(
            cluster.node(1).runtime.state_of("b", "2.0"),
            Some(LocalUnitState::Installed)
        );

        let rows = cluster.node(0).bundles.list_bundles(GROUP).await.unwrap();
        assert!(rows.iter().all(|row| row.status == "Active"));
    }

    // =============================================================================
    // POLICIES
    // =============================================================================

    #[tokio::test]
    async fn test_outbound_blacklist_blocks_before_mutation() {
        let mut cluster = TestCluster::new(2);
        cluster
            .node(0)
            .bundles
            .block(GROUP, "a.*", outbound_blacklist())
            .await
            .unwrap();

        let result = cluster.node(0).bundles.install(GROUP, ABC, false).await;
        assert!(matches!(
            result,
            Err(SyncError::BlockedOutbound {
                category: Category::Bundle,
                ..
            })
        ));

        assert!(cluster.store.map_names().iter().all(|name| !name.starts_with("cluster.bundles")));
        assert_eq!(cluster.bus.events_published(), 0);
        assert!(cluster.settle().await.iter().all(Vec::is_empty));
    }

    #[tokio::test]
    async fn test_inbound_blacklist_skips_replay() {
        let mut cluster = TestCluster::new(3);
        cluster
            .node(2)
            .bundles
            .block(GROUP, B, inbound_blacklist())
            .await
            .unwrap();

        cluster.node(0).bundles.install(GROUP, B, false).await.unwrap();
        let outcomes = cluster.settle().await;
        assert_eq!(outcomes[1], vec![ApplyOutcome::Blocked]);
        assert_eq!(outcomes[2], vec![ApplyOutcome::Blocked]);
        assert!(cluster.node(1).runtime.state_of("b", "2.0").is_none());

        let rows = cluster.node(1).bundles.list_bundles(GROUP).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].located, "cluster");
        assert_eq!(rows[0].blocked, "in");
    }

    #[tokio::test]
    async fn test_block_toggles_off() {
        let mut cluster = TestCluster::new(2);
        let origin = &cluster.node(0).bundles;
        origin.block(GROUP, B, inbound_blacklist()).await.unwrap();
        origin.block(GROUP, B, inbound_blacklist()).await.unwrap();

        origin.install(GROUP, B, false).await.unwrap();
        let outcomes = cluster.settle().await;
        assert_eq!(outcomes[1], vec![ApplyOutcome::Applied]);
    }

    // =============================================================================
    // MEMBERSHIP AND SWITCHES
    // =============================================================================

    #[tokio::test]
    async fn test_non_member_ignores_events() {
        let mut cluster = TestCluster::new(3);
        let leaving = cluster.node(2).id.clone();
        cluster.groups.leave(GROUP, &leaving);

        cluster.node(0).bundles.install(GROUP, A, false).await.unwrap();
        let outcomes = cluster.settle().await;
        assert_eq!(outcomes[1], vec![ApplyOutcome::Applied]);
        assert_eq!(outcomes[2], vec![ApplyOutcome::NotMember]);
        assert!(cluster.node(2).runtime.state_of("a", "1.0").is_none());
    }

    #[tokio::test]
    async fn test_producer_off_refuses_management() {
        let cluster = TestCluster::new(2);
        cluster.node(0).producer.set_status(SwitchStatus::Off);

        assert_eq!(
            cluster.node(0).bundles.install(GROUP, A, false).await,
            Err(SyncError::ProducerOff)
        );
        assert!(cluster.store.map_names().is_empty());

        // other nodes keep their own switch
        cluster.node(1).bundles.install(GROUP, A, false).await.unwrap();
    }

    #[tokio::test]
    async fn test_unknown_group() {
        let cluster = TestCluster::new(1);
        assert_eq!(
            cluster.node(0).bundles.install("prod", A, false).await,
            Err(SyncError::GroupNotFound("prod".to_string()))
        );
    }

    // =============================================================================
    // IDEMPOTENCE
    // =============================================================================

    #[tokio::test]
    async fn test_install_twice_succeeds() {
        let mut cluster = TestCluster::new(2);
        let origin = &cluster.node(0).bundles;

        origin.install(GROUP, A, false).await.unwrap();
        assert_eq!(cluster.bus.events_published(), 1);
        origin.install(GROUP, A, false).await.unwrap();
        cluster.settle().await;

        let rows = cluster.node(1).bundles.list_bundles(GROUP).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].symbolic_name, "a");
        assert_eq!(rows[0].version, "1.0");
        assert_eq!(rows[0].status, "Installed");
        assert_eq!(cluster.node(1).runtime.list_units().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_redelivered_event_applied_once() {
        let mut cluster = TestCluster::new(2);
        let mut probe = cluster.bus.subscribe(EventFilter::all());
        cluster.node(0).bundles.install(GROUP, A, true).await.unwrap();

        let event = probe.try_recv().unwrap().unwrap();
        assert_eq!(event.kind, ClusterEventKind::Started);
        assert_eq!(
            cluster.node(1).consumer.apply(&event).await.unwrap(),
            ApplyOutcome::Applied
        );

        // the queued copy and a republished copy are both recognised
        assert_eq!(cluster.settle().await[1], vec![ApplyOutcome::Duplicate]);
        cluster.bus.publish(event).await;
        assert_eq!(cluster.settle().await[1], vec![ApplyOutcome::Duplicate]);

        assert_eq!(
            cluster.node(1).runtime.state_of("a", "1.0"),
            Some(LocalUnitState::Active)
        );
    }
}
