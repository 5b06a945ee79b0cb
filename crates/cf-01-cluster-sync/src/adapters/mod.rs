//! # Adapters Layer (Hexagonal Architecture)
//!
//! Implements outbound port traits for cluster sync.

mod bus_producer;
mod cluster_store;
mod descriptor_reader;
mod group_registry;

pub use bus_producer::BusEventProducer;
pub use cluster_store::InMemoryClusterStore;
pub use descriptor_reader::{FileDescriptorReader, MANIFEST_PATH};
pub use group_registry::StaticGroupRegistry;
