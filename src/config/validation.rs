//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, ratios within bounds)
//! - Validate addresses and URLs before they reach the transport
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: BackendConfig → Result<(), Vec<ValidationError>>

use std::fmt;
use std::net::{IpAddr, SocketAddr};

use crate::config::schema::BackendConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field, e.g. `session.proxy`.
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

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check a configuration, collecting every problem found.
pub fn validate_config(config: &BackendConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let session = &config.session;
    if session.connect_timeout_secs == 0 {
        errors.push(ValidationError::new("session.connect_timeout_secs", "must be greater than 0"));
    }
    if session.request_timeout_secs == 0 {
        errors.push(ValidationError::new("session.request_timeout_secs", "must be greater than 0"));
    }
    if let Some(proxy) = session.proxy.as_deref().filter(|p| *p != "none") {
        if let Err(e) = url::Url::parse(proxy) {
            let message = format!("invalid URL '{}': {}", proxy, e);
            errors.push(ValidationError::new("session.proxy", message));
        }
    }

    let server = &config.server;
    if server.bind_address.parse::<IpAddr>().is_err() {
        errors.push(ValidationError::new(
            "server.bind_address",
            format!("'{}' is not an IP address", server.bind_address),
        ));
    }
    if server.request_timeout_secs == 0 {
        errors.push(ValidationError::new("server.request_timeout_secs", "must be greater than 0"));
    }
    if server.max_body_size == 0 {
        errors.push(ValidationError::new("server.max_body_size", "must be greater than 0"));
    }

    let retries = &config.retries;
    if retries.max_attempts == 0 {
        errors.push(ValidationError::new("retries.max_attempts", "must be at least 1"));
    }
    if retries.base_delay_ms > retries.max_delay_ms {
        errors.push(ValidationError::new(
            "retries.base_delay_ms",
            "must not exceed retries.max_delay_ms",
        ));
    }
    if !(0.0..=1.0).contains(&retries.budget_ratio) {
        errors.push(ValidationError::new("retries.budget_ratio", "must be between 0.0 and 1.0"));
    }

    if config.runtime.worker_threads == 0 {
        errors.push(ValidationError::new("runtime.worker_threads", "must be greater than 0"));
    }

    if config.heartbeat.enabled && config.heartbeat.interval_secs == 0 {
        errors.push(ValidationError::new("heartbeat.interval_secs", "must be greater than 0"));
    }

    let observability = &config.observability;
    if !LOG_LEVELS.contains(&observability.log_level.to_ascii_lowercase().as_str()) {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!("unknown level '{}'", observability.log_level),
        ));
    }
    let metrics_address = observability.metrics_address.parse::<SocketAddr>();
    if observability.metrics_enabled && metrics_address.is_err() {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
