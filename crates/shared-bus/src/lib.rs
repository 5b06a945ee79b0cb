//! # Shared Bus - Event Bus for Group State Changes
//!
//! Carries [`ClusterEvent`]s from the node where an administrative operation
//! was issued to every other member of the affected group.
//!
//! ## Flow
//!
//! ```text
//! ┌──────────────┐                    ┌──────────────┐
//! │   Node A     │                    │   Node B     │
//! │ (producer)   │    publish()       │ (consumer)   │
//! │              │ ──────┐            │              │
//! └──────────────┘       │            └──────────────┘
//!                        ▼                    ↑
//!                  ┌──────────────┐          │
//!                  │  Event Bus   │          │
//!                  │              │ ─────────┘
//!                  └──────────────┘  subscribe(group filter)
//! ```
//!
//! ## Delivery
//!
//! - Delivery is at-least-once; consumers dedupe with [`ReplayCache`]
//! - Subscribers filter by topic and by source group
//! - Lagging subscribers skip dropped events and keep going

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod events;
pub mod publisher;
pub mod replay_cache;
pub mod subscriber;

// Re-export main types
pub use events::{ClusterEvent, ClusterEventKind, EventFilter, EventFlags, EventTopic};
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use replay_cache::{ReplayCache, ReplayError};
pub use subscriber::{Subscription, SubscriptionError};

/// Current protocol version for event bus messages.
pub const PROTOCOL_VERSION: u16 = 1;

/// Maximum events to buffer per subscriber before backpressure.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
