//! HTTP message and server subsystem.
//!
//! # Data Flow
//! ```text
//! Outbound:
//!     request.rs (Request, builder) → execute strategies → session transport
//!         → response.rs (Exchange → Reply, or StreamEvent sequence)
//!
//! Inbound (Backend::listen):
//!     TCP → server.rs (axum service, path match)
//!         → callback(Request) → Reply → client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{Request, RequestBuilder, X_REQUEST_ID};
pub use response::{BodyStream, Exchange, Reply, ReplyHead, StreamEvent};
pub use server::{HttpServer, ServerCallback, ServerHandle};
