//! Configuration validation.
//!
//! Serde handles syntax; this module checks value ranges and cross-field
//! constraints. Every problem is reported, not just the first.

use std::net::{IpAddr, SocketAddr};

use thiserror::Error;

use crate::config::schema::BridgeConfig;

/// Largest accepted transfer buffer.
pub const MAX_BUFFER_SIZE: usize = 16 * 1024 * 1024;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Validate a configuration, returning all errors found.
pub fn validate_config(config: &BridgeConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.host.parse::<IpAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.host",
            format!("'{}' is not an IP address", config.listener.host),
        ));
    }

    if config.listener.max_sessions == Some(0) {
        errors.push(ValidationError::new(
            "listener.max_sessions",
            "must be at least 1 when set",
        ));
    }

    if let Some(tls) = &config.listener.tls {
        if tls.cert_path.is_empty() {
            errors.push(ValidationError::new("listener.tls.cert_path", "must not be empty"));
        }
        if tls.key_path.is_empty() {
            errors.push(ValidationError::new("listener.tls.key_path", "must not be empty"));
        }
    }

    let timeouts = &config.timeouts;
    if timeouts.connect_secs == 0 {
        errors.push(ValidationError::new("timeouts.connect_secs", "must be greater than 0"));
    }
    if timeouts.request_secs <= timeouts.connect_secs {
        errors.push(ValidationError::new(
            "timeouts.request_secs",
            format!(
                "must exceed timeouts.connect_secs ({})",
                timeouts.connect_secs
            ),
        ));
    }
    if timeouts.close_secs == 0 {
        errors.push(ValidationError::new("timeouts.close_secs", "must be greater than 0"));
    }

    let buffer_size = config.bridge.buffer_size;
    if buffer_size == 0 || buffer_size > MAX_BUFFER_SIZE {
        errors.push(ValidationError::new(
            "bridge.buffer_size",
            format!("must be between 1 and {} bytes", MAX_BUFFER_SIZE),
        ));
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!(
                "'{}' is not a socket address",
                config.observability.metrics_address
            ),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
