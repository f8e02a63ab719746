//! Retry logic.
//!
//! # Responsibilities
//! - Determine if request is retryable (idempotent methods only)
//! - Enforce retry budget (retries as a fraction of requests)
//!
//! # Design Decisions
//! - Never retry POST/PATCH (non-idempotent)
//! - Connection errors and timeouts always retryable; 502/503/504 too
//! - Retry budget prevents retry storms under load

use std::sync::atomic::{AtomicU64, Ordering};

use axum::http::{Method, StatusCode};

/// Whether an attempt that ended with `status` (or a network error) may be
/// retried.
pub fn is_retryable(method: &Method, status: Option<StatusCode>, network_error: bool) -> bool {
    if !method.is_idempotent() {
        return false;
    }
    if network_error {
        return true;
    }
    matches!(
        status,
        Some(
            StatusCode::BAD_GATEWAY
                | StatusCode::SERVICE_UNAVAILABLE
                | StatusCode::GATEWAY_TIMEOUT
        )
    )
}

/// Caps retries at `max(min_retries, requests * ratio)`.
#[derive(Debug)]
pub struct RetryBudget {
    ratio: f32,
    min_retries: u64,
    requests: AtomicU64,
    retries: AtomicU64,
}

impl RetryBudget {
    pub fn new(ratio: f32, min_retries: u64) -> Self {
        Self {
            ratio: ratio.clamp(0.0, 1.0),
            min_retries,
            requests: AtomicU64::new(0),
            retries: AtomicU64::new(0),
        }
    }

    /// Count an original (non-retry) request.
    pub fn record_request(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Claim one retry from the budget. Returns false when it is exhausted.
    pub fn can_retry(&self) -> bool {
        let requests = self.requests.load(Ordering::Relaxed);
        let allowed = ((requests as f64 * self.ratio as f64) as u64).max(self.min_retries);

        let mut current = self.retries.load(Ordering::Relaxed);
        loop {
            if current >= allowed {
                return false;
            }
            match self.retries.compare_exchange_weak(
                current,
                current + 1,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
    }

    pub fn retries(&self) -> u64 {
        self.retries.load(Ordering::Relaxed)
    }
}
