//! # Algorithms Module
//!
//! Pure logic: pattern matching, policy evaluation, selector resolution,
//! state reconciliation and descriptor parsing.

pub mod manifest;
pub mod patterns;
pub mod policy;
pub mod reconcile;
pub mod selector;

pub use manifest::{descriptor_from_headers, effective_version, parse_headers};
pub use patterns::PatternCache;
pub use policy::{evaluate, toggle_entry};
pub use reconcile::{merge_features, merge_units, order_candidates};
pub use selector::{resolve, Selectable, Selector};
