//! # Fleet Telemetry
//!
//! Logging and metrics for Cellar Fleet nodes.
//!
//! ## Components
//!
//! - **Logs**: `tracing` events rendered by `tracing-subscriber` (pretty or JSON)
//! - **Metrics**: Prometheus counters for the event protocol, policy denials
//!   and selector matches
//!
//! ## Usage
//!
//! ```rust,ignore
//! use fleet_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() {
//!     let config = TelemetryConfig::from_env();
//!     init_telemetry(&config).expect("Failed to init telemetry");
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `CF_LOG_LEVEL` | `info` | Log level filter (`RUST_LOG` also honored) |
//! | `CF_JSON_LOGS` | `false` | JSON formatted logs |
//! | `CF_CONSOLE_OUTPUT` | `true` | Write logs to stdout |
//! | `CF_NODE_ID` | `node-0` | Node identifier |
//! | `CF_CLUSTER` | `default` | Cluster name |

#![warn(missing_docs)]

mod config;
pub mod metrics;
mod tracing_setup;

pub use config::TelemetryConfig;
pub use metrics::{
    encode_metrics, record_event_consumed, record_event_produced, record_policy_denial,
    record_selector_matches, register_metrics, EVENTS_CONSUMED, EVENTS_PRODUCED, POLICY_DENIALS,
    SELECTOR_MATCHES,
};
pub use tracing_setup::init_tracing;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// The global tracing subscriber could not be installed.
    #[error("Failed to initialize tracing: {0}")]
    TracingInit(String),

    /// A metric could not be registered or encoded.
    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),
}

/// Initialize logging and register metrics.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    // Metrics first so counters bumped during startup are exported
    register_metrics()?;
    init_tracing(config)
}
