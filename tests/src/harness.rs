//! # Test Cluster Harness
//!
//! Builds an in-process cluster: every node shares one replicated store,
//! one group registry and one event bus, and owns its runtime, resolver,
//! producer and consumer.
//!
//! ```text
//! node-0 ──┐                      ┌── node-0 consumer (skips own events)
//! node-1 ──┼─→ InMemoryEventBus ──┼── node-1 consumer
//! node-2 ──┘                      └── node-2 consumer
//!      ╲            │
//!       ╲───→ InMemoryClusterStore (shared maps)
//! ```

use std::sync::Arc;

use cf_01_cluster_sync::domain::{FeatureInfo, RepositoryDescriptor};
use cf_01_cluster_sync::{
    ApplyOutcome, BundleSyncService, BusEventProducer, EventConsumer, FeatureSyncService,
    InMemoryClusterStore, MockDescriptorReader, MockFeaturesResolver, MockLocalRuntime,
    StaticGroupRegistry, SwitchStatus, SyncConfig, SyncContext,
};
use shared_bus::{EventFilter, InMemoryEventBus, Subscription};
use shared_types::entities::{Group, NodeId, DEFAULT_GROUP};

/// Group every harness node joins.
pub const GROUP: &str = DEFAULT_GROUP;

/// Installable artifacts: `(location, symbolic name, version)`.
pub const ARTIFACTS: &[(&str, &str, &str)] = &[
    ("file:///a-1.0.jar", "a", "1.0"),
    ("file:///b-2.0.jar", "b", "2.0"),
    ("file:///abc-1.0.jar", "abc", "1.0"),
    ("mvn:org.example/console/3.1", "console", "3.1"),
];

/// Features repository published to every resolver.
pub const REPOSITORY: &str = "mvn:org.example/features/1.0/xml";

/// Contents of [`REPOSITORY`].
pub fn repository() -> RepositoryDescriptor {
    RepositoryDescriptor {
        url: REPOSITORY.to_string(),
        name: "example-1.0".to_string(),
        features: vec![
            FeatureInfo::new("webconsole", "4.0"),
            FeatureInfo::new("ssh", "4.0"),
            FeatureInfo::new("jolokia", "2.0"),
        ],
    }
}

/// One cluster member.
pub struct TestNode {
    /// Node identity.
    pub id: NodeId,
    /// Shared collaborators of this node.
    pub ctx: Arc<SyncContext>,
    /// Unit management.
    pub bundles: BundleSyncService,
    /// Feature and repository management.
    pub features: FeatureSyncService,
    /// Event consumer.
    pub consumer: EventConsumer,
    /// Local unit runtime.
    pub runtime: Arc<MockLocalRuntime>,
    /// Local features resolver.
    pub resolver: Arc<MockFeaturesResolver>,
    /// Producer publishing on the shared bus.
    pub producer: Arc<BusEventProducer<InMemoryEventBus>>,
    subscription: Subscription,
}

impl TestNode {
    /// Apply every event queued for this node.
    pub async fn drain(&mut self) -> Vec<ApplyOutcome> {
        self.consumer.drain(&mut self.subscription).await
    }
}

/// In-process cluster of [`TestNode`]s.
pub struct TestCluster {
    /// Shared event bus.
    pub bus: Arc<InMemoryEventBus>,
    /// Shared replicated store.
    pub store: Arc<InMemoryClusterStore>,
    /// Shared group registry.
    pub groups: Arc<StaticGroupRegistry>,
    /// Members, in creation order.
    pub nodes: Vec<TestNode>,
}

impl TestCluster {
    /// Create `size` nodes named `node-0..`, all members of [`GROUP`].
    pub fn new(size: usize) -> Self {
        let bus = Arc::new(InMemoryEventBus::new());
        let store = Arc::new(InMemoryClusterStore::new());
        let groups = Arc::new(StaticGroupRegistry::new());
        groups.register(Group::new(GROUP));

        let descriptors = Arc::new(
            ARTIFACTS
                .iter()
                .fold(MockDescriptorReader::new(), |reader, (location, name, version)| {
                    reader.with_unit(location, name, version)
                }),
        );

        let nodes = (0..size)
            .map(|i| {
                let id = NodeId::new(format!("node-{i}"));
                groups.join(GROUP, id.clone());

                let producer = Arc::new(BusEventProducer::new(
                    bus.clone(),
                    id.clone(),
                    SwitchStatus::On,
                ));
                let ctx = Arc::new(SyncContext::new(
                    SyncConfig::for_node(id.as_str()),
                    store.clone(),
                    groups.clone(),
                    producer.clone(),
                ));

                let runtime = Arc::new(ARTIFACTS.iter().fold(
                    MockLocalRuntime::new(),
                    |runtime, (location, name, version)| {
                        runtime.with_artifact(location, name, version)
                    },
                ));
                let resolver = Arc::new(MockFeaturesResolver::new().with_published(repository()));

                TestNode {
                    bundles: BundleSyncService::new(
                        ctx.clone(),
                        runtime.clone(),
                        descriptors.clone(),
                    ),
                    features: FeatureSyncService::new(ctx.clone(), resolver.clone()),
                    consumer: EventConsumer::new(ctx.clone(), runtime.clone(), resolver.clone()),
                    subscription: bus.subscribe(EventFilter::all()),
                    id,
                    ctx,
                    runtime,
                    resolver,
                    producer,
                }
            })
            .collect();

        Self {
            bus,
            store,
            groups,
            nodes,
        }
    }

    /// Node by index.
    pub fn node(&self, index: usize) -> &TestNode {
        &self.nodes[index]
    }

    /// Let every node apply what is queued. Outcomes per node, in node order.
    pub async fn settle(&mut self) -> Vec<Vec<ApplyOutcome>> {
        let mut outcomes = Vec::with_capacity(self.nodes.len());
        for node in &mut self.nodes {
            outcomes.push(node.drain().await);
        }
        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cluster_wiring() {
        let cluster = TestCluster::new(3);
        assert_eq!(cluster.nodes.len(), 3);
        assert_eq!(cluster.bus.subscriber_count(), 3);
        assert_eq!(
            cluster.groups.groups_of(&NodeId::new("node-2")),
            vec![GROUP.to_string()]
        );
        assert_eq!(cluster.node(1).id, NodeId::new("node-1"));
    }
}
