//! Telemetry configuration from environment variables.

use std::env;

/// Configuration for node logging and metrics.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name attached to log lines
    pub service_name: String,

    /// Identifier of this node within the cluster
    pub node_id: String,

    /// Cluster name (several clusters may share a log backend)
    pub cluster: String,

    /// Log level filter (trace, debug, info, warn, error)
    pub log_level: String,

    /// Whether to enable console output
    pub console_output: bool,

    /// Whether to enable JSON formatted logs
    pub json_logs: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "cellar-fleet".to_string(),
            node_id: "node-0".to_string(),
            cluster: "default".to_string(),
            log_level: "info".to_string(),
            console_output: true,
            json_logs: false,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `CF_SERVICE_NAME`: Service name (default: cellar-fleet)
    /// - `CF_NODE_ID`: Node identifier (default: node-0)
    /// - `CF_CLUSTER`: Cluster name (default: default)
    /// - `CF_LOG_LEVEL` or `RUST_LOG`: Log level (default: info)
    /// - `CF_CONSOLE_OUTPUT`: Enable console output (default: true)
    /// - `CF_JSON_LOGS`: Enable JSON logs (default: false in dev, true in containers)
    pub fn from_env() -> Self {
        let is_container =
            env::var("KUBERNETES_SERVICE_HOST").is_ok() || env::var("DOCKER_CONTAINER").is_ok();

        Self {
            service_name: env::var("CF_SERVICE_NAME")
                .unwrap_or_else(|_| "cellar-fleet".to_string()),

            node_id: env::var("CF_NODE_ID").unwrap_or_else(|_| "node-0".to_string()),

            cluster: env::var("CF_CLUSTER").unwrap_or_else(|_| "default".to_string()),

            log_level: env::var("CF_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),

            console_output: env::var("CF_CONSOLE_OUTPUT")
                .map(|v| parse_flag(&v, true))
                .unwrap_or(true),

            json_logs: env::var("CF_JSON_LOGS")
                .map(|v| parse_flag(&v, false))
                .unwrap_or(is_container),
        }
    }

    /// Create configuration for a specific node.
    pub fn for_node(node_id: &str) -> Self {
        let mut config = Self::from_env();
        config.node_id = node_id.to_string();
        config
    }

    /// Service name qualified with the cluster, e.g. `cellar-fleet.prod`.
    pub fn full_service_name(&self) -> String {
        if self.cluster == "default" {
            self.service_name.clone()
        } else {
            format!("{}.{}", self.service_name, self.cluster)
        }
    }
}

/// Parse a boolean switch, falling back to `default` for unrecognized input.
fn parse_flag(value: &str, default: bool) -> bool {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => true,
        "false" | "0" | "no" | "off" => false,
        _ => default,
    }
}
