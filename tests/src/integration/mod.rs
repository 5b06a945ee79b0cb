//! # Integration Tests
//!
//! Multi-node flows over the [`harness`](crate::harness) cluster.

pub mod e2e_choreography;
pub mod flows;
