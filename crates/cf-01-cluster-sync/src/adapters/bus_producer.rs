//! Event Bus Producer Adapter
//!
//! Implements `EventProducer` on top of the shared event bus.

use async_trait::async_trait;
use parking_lot::RwLock;
use shared_bus::{ClusterEvent, EventPublisher};
use shared_types::entities::NodeId;
use std::sync::Arc;
use tracing::{debug, info};

use crate::domain::{SwitchStatus, SyncError};
use crate::ports::outbound::EventProducer;

/// Producer that stamps the local node id and publishes on the bus.
pub struct BusEventProducer<P: EventPublisher> {
    publisher: Arc<P>,
    node_id: NodeId,
    status: RwLock<SwitchStatus>,
}

impl<P: EventPublisher> BusEventProducer<P> {
    /// Create a producer for `node_id` with the given initial switch.
    pub fn new(publisher: Arc<P>, node_id: NodeId, status: SwitchStatus) -> Self {
        Self {
            publisher,
            node_id,
            status: RwLock::new(status),
        }
    }

    /// The node this producer speaks for.
    #[must_use]
    pub fn node_id(&self) -> &NodeId {
        &self.node_id
    }
}

#[async_trait]
impl<P: EventPublisher + 'static> EventProducer for BusEventProducer<P> {
    fn status(&self) -> SwitchStatus {
        *self.status.read()
    }

    fn set_status(&self, status: SwitchStatus) {
        info!(node = %self.node_id, status = ?status, "Event producer switch changed");
        *self.status.write() = status;
    }

    async fn produce(&self, mut event: ClusterEvent) -> Result<(), SyncError> {
        if self.status() == SwitchStatus::Off {
            return Err(SyncError::ProducerOff);
        }

        event.source_node = Some(self.node_id.clone());
        let kind = event.kind;
        let receivers = self.publisher.publish(event).await;

        fleet_telemetry::record_event_produced(kind.as_str());
        debug!(node = %self.node_id, kind = kind.as_str(), receivers, "Cluster event produced");
        Ok(())
    }
}
