//! Telemetry configuration from file and environment variables.

use serde::Deserialize;
use std::env;

/// Configuration for logging and metrics.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Service name attached to every log line
    pub service_name: String,

    /// Log level filter (trace, debug, info, warn, error), used when
    /// `RUST_LOG` is unset
    pub log_level: String,

    /// Whether to emit JSON formatted logs
    pub json_logs: bool,

    /// Whether to register the Prometheus metrics
    pub metrics_enabled: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "aln-node".to_string(),
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: true,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `ALN_SERVICE_NAME`: Service name (default: aln-node)
    /// - `ALN_LOG_LEVEL` or `RUST_LOG`: Log level (default: info)
    /// - `ALN_JSON_LOGS`: Enable JSON logs (default: false)
    /// - `ALN_METRICS_ENABLED`: Register Prometheus metrics (default: true)
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| env::var(key).ok())
    }

    /// Apply overrides from `lookup`, keyed by environment variable name.
    ///
    /// Unset or unparsable values leave the current setting in place.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(name) = lookup("ALN_SERVICE_NAME") {
            self.service_name = name;
        }
        if let Some(level) = lookup("ALN_LOG_LEVEL").or_else(|| lookup("RUST_LOG")) {
            self.log_level = level;
        }
        if let Some(flag) = lookup("ALN_JSON_LOGS").and_then(|v| parse_flag(&v)) {
            self.json_logs = flag;
        }
        if let Some(flag) = lookup("ALN_METRICS_ENABLED").and_then(|v| parse_flag(&v)) {
            self.metrics_enabled = flag;
        }
        self
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}
