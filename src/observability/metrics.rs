//! Metrics collection and exposition.
//!
//! # Metrics
//! - `http_backend_requests_total` (counter): exchanges by method, mode, status
//! - `http_backend_request_duration_seconds` (histogram): exchange latency
//! - `http_backend_server_requests_total` (counter): requests served by `listen`
//!
//! Failed exchanges are labelled `status="error"`.

use std::net::SocketAddr;
use std::time::Instant;

use axum::http::StatusCode;
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::execute::ExecuteMode;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => {
            tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter")
        }
    }
}

fn mode_label(mode: ExecuteMode) -> &'static str {
    match mode {
        ExecuteMode::Sync => "sync",
        ExecuteMode::Async => "async",
        ExecuteMode::Streaming => "streaming",
    }
}

/// Record one client exchange.
pub fn record_exchange(
    method: &str,
    mode: ExecuteMode,
    status: Option<StatusCode>,
    start_time: Instant,
) {
    let status = status.map(|s| s.as_u16().to_string()).unwrap_or_else(|| "error".to_string());
    let method = method.to_string();

    metrics::counter!(
        "http_backend_requests_total",
        "method" => method.clone(),
        "mode" => mode_label(mode),
        "status" => status
    )
    .increment(1);

    metrics::histogram!(
        "http_backend_request_duration_seconds",
        "method" => method,
        "mode" => mode_label(mode)
    )
    .record(start_time.elapsed().as_secs_f64());
}

/// Record one request answered by an embedded server.
pub fn record_server_request(method: &str, status: StatusCode) {
    metrics::counter!(
        "http_backend_server_requests_total",
        "method" => method.to_string(),
        "status" => status.as_u16().to_string()
    )
    .increment(1);
}
