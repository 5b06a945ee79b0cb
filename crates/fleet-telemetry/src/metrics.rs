//! Prometheus metrics for cluster synchronization.
//!
//! All metrics follow the naming convention: `cf_<metric>_<unit>`
//!
//! Counters are created lazily and registered in [`REGISTRY`] by
//! [`register_metrics`]. Incrementing an unregistered counter is harmless; it
//! just does not show up in [`encode_metrics`] output.

use lazy_static::lazy_static;
use prometheus::{CounterVec, Encoder, IntCounter, Opts, Registry, TextEncoder};
use std::sync::Once;

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // EVENT PROTOCOL
    // =========================================================================

    /// Events handed to the bus, by kind
    pub static ref EVENTS_PRODUCED: CounterVec = CounterVec::new(
        Opts::new("cf_events_produced_total", "Cluster events produced by this node"),
        &["kind"]
    ).expect("metric creation failed");

    /// Events taken off the bus, by kind and outcome
    pub static ref EVENTS_CONSUMED: CounterVec = CounterVec::new(
        Opts::new("cf_events_consumed_total", "Cluster events consumed by this node"),
        &["kind", "outcome"]  // outcome: see ApplyOutcome::as_str
    ).expect("metric creation failed");

    // =========================================================================
    // ACCESS CONTROL
    // =========================================================================

    /// Identifiers rejected by a group policy
    pub static ref POLICY_DENIALS: CounterVec = CounterVec::new(
        Opts::new("cf_policy_denials_total", "Identifiers denied by group policies"),
        &["category", "direction"]
    ).expect("metric creation failed");

    // =========================================================================
    // SELECTOR
    // =========================================================================

    /// Keys returned by selector resolution
    pub static ref SELECTOR_MATCHES: IntCounter = IntCounter::new(
        "cf_selector_matches_total",
        "Keys matched by selector resolution"
    ).expect("metric creation failed");
}

static REGISTER: Once = Once::new();

/// Register all metrics with the global registry.
///
/// Safe to call more than once; only the first call registers.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let mut result = Ok(());

    REGISTER.call_once(|| {
        let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
            Box::new(EVENTS_PRODUCED.clone()),
            Box::new(EVENTS_CONSUMED.clone()),
            Box::new(POLICY_DENIALS.clone()),
            Box::new(SELECTOR_MATCHES.clone()),
        ];

        for metric in metrics {
            if let Err(e) = REGISTRY.register(metric) {
                result = Err(TelemetryError::MetricsInit(e.to_string()));
                return;
            }
        }
    });

    result
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Count an event handed to the bus.
pub fn record_event_produced(kind: &str) {
    EVENTS_PRODUCED.with_label_values(&[kind]).inc();
}

/// Count an event taken off the bus.
pub fn record_event_consumed(kind: &str, outcome: &str) {
    EVENTS_CONSUMED.with_label_values(&[kind, outcome]).inc();
}

/// Count a policy denial.
pub fn record_policy_denial(category: &str, direction: &str) {
    POLICY_DENIALS.with_label_values(&[category, direction]).inc();
}

/// Count selector matches.
pub fn record_selector_matches(count: usize) {
    SELECTOR_MATCHES.inc_by(count as u64);
}
