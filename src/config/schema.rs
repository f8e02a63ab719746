//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the backend.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the HTTP backend.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct BackendConfig {
    /// Settings shared by the sync and async sessions.
    pub session: SessionConfig,

    /// Settings for servers started through `listen`.
    pub server: ServerConfig,

    /// Retry decorator settings.
    pub retries: RetryConfig,

    /// Event loop settings.
    pub runtime: RuntimeConfig,

    /// Heartbeat timer settings.
    pub heartbeat: HeartbeatConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Session (client transport) configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Accept-Language header: `"auto"` (from the locale), `"none"`, or a literal value.
    pub accept_language: String,

    /// Keep a cookie jar per session.
    pub cookies: bool,

    /// Transparently decode gzip, brotli and deflate bodies.
    pub decompression: bool,

    /// Proxy URL applied to both sessions. Unset follows the system proxy
    /// settings; `"none"` connects directly.
    pub proxy: Option<String>,

    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,

    /// Total time for one exchange in seconds.
    pub request_timeout_secs: u64,

    /// Idle pooled connections are closed after this many seconds.
    pub pool_idle_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            accept_language: "auto".to_string(),
            cookies: true,
            decompression: true,
            proxy: None,
            connect_timeout_secs: 10,
            request_timeout_secs: 60,
            pool_idle_secs: 90,
        }
    }
}

/// Embedded server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// IP address servers bind to; the port comes from `listen`.
    pub bind_address: String,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Maximum request body size in bytes.
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            request_timeout_secs: 30,
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Enable retries.
    pub enabled: bool,

    /// Maximum number of attempts, the first one included.
    pub max_attempts: u32,

    /// Base delay for exponential backoff in milliseconds.
    pub base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub max_delay_ms: u64,

    /// Fraction of requests that may be retried (retry budget).
    /// e.g., 0.1 for 10% budget.
    pub budget_ratio: f32,

    /// Retries always allowed regardless of the ratio.
    pub min_retries: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_attempts: 3,
            base_delay_ms: 100,
            max_delay_ms: 2000,
            budget_ratio: 0.1,
            min_retries: 10,
        }
    }
}

/// Event loop configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Worker threads driving the loop.
    pub worker_threads: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self { worker_threads: 2 }
    }
}

/// Heartbeat timer configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HeartbeatConfig {
    pub enabled: bool,
    pub interval_secs: u64,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 2,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Human-readable or JSON log lines.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
