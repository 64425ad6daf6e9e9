//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the ledger gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Transaction submission settings.
    pub submission: SubmissionConfig,

    /// Consensus core (network sink) connection settings.
    pub core: CoreConfig,

    /// Event stream reconnect settings (client side).
    pub stream: StreamConfig,

    /// Clock skew estimation settings (client side).
    pub clock_skew: ClockSkewConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8000").
    pub bind_address: String,

    /// Maximum accepted request body in bytes.
    pub max_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8000".to_string(),
            max_body_bytes: 256 * 1024,
        }
    }
}

/// Timeout configuration for inbound requests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Deadline of a single request's context, in seconds.
    pub request_secs: u64,
}

impl TimeoutConfig {
    pub fn request(&self) -> Duration {
        Duration::from_secs(self.request_secs)
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Transaction submission configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SubmissionConfig {
    /// Network identifier mixed into every transaction hash.
    pub network_passphrase: String,

    /// Budget for a broadcast to reach a terminal outcome, in seconds.
    pub wait_timeout_secs: u64,
}

impl SubmissionConfig {
    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_secs)
    }
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            network_passphrase: "Test Ledger Network ; January 2024".to_string(),
            wait_timeout_secs: 30,
        }
    }
}

/// Consensus core connection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Base URL of the core's HTTP command port.
    pub url: String,

    /// Per-call timeout in seconds.
    pub request_timeout_secs: u64,

    /// Interval between inclusion checks for a pending broadcast, in milliseconds.
    pub poll_interval_ms: u64,

    /// Interval between sync-state checks, in seconds.
    pub status_interval_secs: u64,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:11626".to_string(),
            request_timeout_secs: 10,
            poll_interval_ms: 1000,
            status_interval_secs: 5,
        }
    }
}

/// Stream reconnect configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Base delay for exponential reconnect backoff in milliseconds.
    pub reconnect_base_delay_ms: u64,

    /// Maximum reconnect delay in milliseconds.
    pub reconnect_max_delay_ms: u64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            reconnect_base_delay_ms: 1000,
            reconnect_max_delay_ms: 30_000,
        }
    }
}

/// Clock skew configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClockSkewConfig {
    /// Age after which a server time observation is no longer trusted.
    pub staleness_secs: i64,
}

impl Default for ClockSkewConfig {
    fn default() -> Self {
        Self {
            staleness_secs: 300, // 5 minutes
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GatewayConfig::default();
        assert_eq!(config.clock_skew.staleness_secs, 300);
        assert_eq!(config.submission.wait_timeout(), Duration::from_secs(30));
        assert_eq!(config.timeouts.request(), Duration::from_secs(30));
        assert!(!config.observability.metrics_enabled);
    }

    #[test]
    fn test_partial_toml_falls_back_to_defaults() {
        let config: GatewayConfig = toml::from_str(
            r#"
            [submission]
            network_passphrase = "Private Net"

            [clock_skew]
            staleness_secs = 60
            "#,
        )
        .unwrap();

        assert_eq!(config.submission.network_passphrase, "Private Net");
        assert_eq!(config.submission.wait_timeout_secs, 30);
        assert_eq!(config.clock_skew.staleness_secs, 60);
        assert_eq!(config.listener.bind_address, "0.0.0.0:8000");
    }
}
