//! # Cellar Fleet Test Suite
//!
//! Unified test crate containing:
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── harness.rs        # In-process cluster: shared store + bus, mock runtimes
//! └── integration/      # Multi-node flows
//!     ├── flows.rs              # Unit install/start/stop/uninstall, policies
//!     └── e2e_choreography.rs   # Features and repositories
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p cf-tests
//!
//! # By category
//! cargo test -p cf-tests integration::flows
//! cargo test -p cf-tests integration::e2e_choreography
//!
//! # Benchmarks
//! cargo bench -p cf-tests
//! ```

#![allow(dead_code)]

pub mod harness;
pub mod integration;
