//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Backend::listen(path, port)
//!     → listener.rs (bind address:port, ephemeral when port is 0)
//!     → http::server (axum service on the bound socket)
//! ```

pub mod listener;
