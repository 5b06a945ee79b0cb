//! # Event Publisher
//!
//! Fans a group state change out to every subscribed node.

use crate::events::{ClusterEvent, EventFilter};
use crate::subscriber::Subscription;
use crate::DEFAULT_CHANNEL_CAPACITY;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Publishing side of the bus, used by a node's event producer.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish an event. Returns the number of subscribers it reached.
    async fn publish(&self, event: ClusterEvent) -> usize;

    /// Total number of events published.
    fn events_published(&self) -> u64;
}

/// In-process bus over `tokio::sync::broadcast`.
///
/// Every node of an in-process cluster (tests, single-host fleets) shares one
/// instance; a networked deployment plugs a different `EventPublisher`.
/// Delivery is at-least-once from the consumer's point of view: publishing
/// the same event twice delivers it twice.
pub struct InMemoryEventBus {
    sender: broadcast::Sender<ClusterEvent>,
    events_published: AtomicU64,
    capacity: usize,
}

impl InMemoryEventBus {
    /// Bus with the default per-subscriber capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Bus buffering at most `capacity` events per subscriber.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            events_published: AtomicU64::new(0),
            capacity,
        }
    }

    /// Subscribe to events matching `filter`. Only events published after
    /// this call are received.
    #[must_use]
    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        debug!(topics = ?filter.topics, groups = ?filter.groups, "New subscription created");
        Subscription::new(self.sender.subscribe(), filter)
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Per-subscriber buffer size.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventBus {
    async fn publish(&self, event: ClusterEvent) -> usize {
        self.events_published.fetch_add(1, Ordering::Relaxed);
        let (id, kind, group) = (event.id, event.kind, event.source_group.clone());

        match self.sender.send(event) {
            Ok(receivers) => {
                debug!(
                    event_id = %id,
                    kind = kind.as_str(),
                    group = %group,
                    receivers,
                    "Event published"
                );
                receivers
            }
            Err(_) => {
                warn!(
                    event_id = %id,
                    kind = kind.as_str(),
                    group = %group,
                    "Event dropped, no subscribers"
                );
                0
            }
        }
    }

    fn events_published(&self) -> u64 {
        self.events_published.load(Ordering::Relaxed)
    }
}
