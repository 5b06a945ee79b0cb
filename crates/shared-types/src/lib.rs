//! # Shared Types Crate
//!
//! Cluster vocabulary shared by the event bus, the telemetry crate and the
//! synchronization subsystem.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: group, node and policy identifiers are
//!   defined here and nowhere else.
//! - **Plain Data**: every type is a serde value with no behavior beyond
//!   naming helpers.

pub mod entities;

pub use entities::*;
