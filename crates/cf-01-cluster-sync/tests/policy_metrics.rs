//! # Policy Denial Accounting (cf-01)
//!
//! `cf_policy_denials_total` counts operations a policy refused. Listings
//! evaluate the same lists to label records and must leave it alone.
//!
//! Runs in its own test binary so no other test moves the counter.

use std::sync::Arc;

use cf_01_cluster_sync::{
    BlockRequest, BundleSyncApi, BundleSyncService, InMemoryClusterStore, MockDescriptorReader,
    MockEventProducer, MockLocalRuntime, StaticGroupRegistry, SyncConfig, SyncContext, SyncError,
};
use fleet_telemetry::POLICY_DENIALS;
use shared_types::entities::{Group, DEFAULT_GROUP};

const A: &str = "file:///a-1.0.jar";

// =============================================================================
// TEST HELPERS
// =============================================================================

fn make_service() -> BundleSyncService {
    let groups = StaticGroupRegistry::new();
    groups.register(Group::new(DEFAULT_GROUP));
    let ctx = Arc::new(SyncContext::new(
        SyncConfig::for_testing(),
        Arc::new(InMemoryClusterStore::new()),
        Arc::new(groups),
        Arc::new(MockEventProducer::new()),
    ));
    BundleSyncService::new(
        ctx,
        Arc::new(MockLocalRuntime::new()),
        Arc::new(MockDescriptorReader::new().with_unit(A, "a", "1.0")),
    )
}

fn denials(direction: &str) -> f64 {
    POLICY_DENIALS.with_label_values(&["bundle", direction]).get()
}

// =============================================================================
// DENIAL ACCOUNTING
// =============================================================================

#[tokio::test]
async fn test_listing_blocked_units_counts_no_denials() {
    let service = make_service();
    service.install(DEFAULT_GROUP, A, false).await.unwrap();
    service
        .block(DEFAULT_GROUP, A, BlockRequest::blacklist_both())
        .await
        .unwrap();

    let (inbound, outbound) = (denials("inbound"), denials("outbound"));
    for _ in 0..5 {
        let rows = service.list_bundles(DEFAULT_GROUP).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].blocked, "in/out");
    }
    assert_eq!(denials("inbound"), inbound);
    assert_eq!(denials("outbound"), outbound);

    // a refused operation is still counted
    assert!(matches!(
        service.install(DEFAULT_GROUP, A, false).await,
        Err(SyncError::BlockedOutbound { .. })
    ));
    assert_eq!(denials("outbound"), outbound + 1.0);
    assert_eq!(denials("inbound"), inbound);
}
