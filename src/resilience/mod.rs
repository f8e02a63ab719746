//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! RetryDecorator::send:
//!     → attempt fails (network error / 502 / 503 / 504)
//!     → retries.rs (idempotent? budget left?)
//!     → backoff.rs (exponential delay + jitter)
//!     → next attempt on the same session
//! ```
//!
//! # Design Decisions
//! - Timeouts are enforced by the session transport, not here
//! - Retries only for idempotent requests (GET, HEAD, PUT, DELETE, ...)
//! - The budget is shared by every decorator created from one layer

pub mod backoff;
pub mod retries;
