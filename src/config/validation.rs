//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Check URLs the gateway will dial
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::GatewayConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid socket address '{value}'")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field}: invalid URL '{value}'")]
    InvalidUrl { field: &'static str, value: String },

    #[error("{field}: must be greater than zero")]
    NotPositive { field: &'static str },

    #[error("{field}: must not be empty")]
    Empty { field: &'static str },

    #[error("stream.reconnect_max_delay_ms must be >= stream.reconnect_base_delay_ms")]
    BackoffRange,
}

/// Validate a parsed configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }
    if config.listener.max_body_bytes == 0 {
        errors.push(ValidationError::NotPositive {
            field: "listener.max_body_bytes",
        });
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::NotPositive {
            field: "timeouts.request_secs",
        });
    }

    if config.submission.network_passphrase.is_empty() {
        errors.push(ValidationError::Empty {
            field: "submission.network_passphrase",
        });
    }
    if config.submission.wait_timeout_secs == 0 {
        errors.push(ValidationError::NotPositive {
            field: "submission.wait_timeout_secs",
        });
    }

    if url::Url::parse(&config.core.url).is_err() {
        errors.push(ValidationError::InvalidUrl {
            field: "core.url",
            value: config.core.url.clone(),
        });
    }
    for (field, value) in [
        ("core.request_timeout_secs", config.core.request_timeout_secs),
        ("core.poll_interval_ms", config.core.poll_interval_ms),
        ("core.status_interval_secs", config.core.status_interval_secs),
    ] {
        if value == 0 {
            errors.push(ValidationError::NotPositive { field });
        }
    }

    if config.stream.reconnect_max_delay_ms < config.stream.reconnect_base_delay_ms {
        errors.push(ValidationError::BackoffRange);
    }
    if config.clock_skew.staleness_secs <= 0 {
        errors.push(ValidationError::NotPositive {
            field: "clock_skew.staleness_secs",
        });
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
