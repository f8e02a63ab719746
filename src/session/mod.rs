//! Session subsystem.
//!
//! # Data Flow
//! ```text
//! Backend::init(user_agent)
//!     → SessionFactory::create(kind, user_agent, SessionConfig)
//!         - client.rs (reqwest client: cookies, decoding, proxy, timeouts)
//!         - locale.rs (Accept-Language from the process locale)
//!     → Session (transport + event-loop handle), one per kind
//!
//! Execution:
//!     strategy → Session::send(Arc<Request>) → Transport → Exchange
//! ```
//!
//! # Design Decisions
//! - The transport is a trait object so tests and embedders can swap it
//! - Sessions are shared (`Arc`) by every strategy the backend creates; the
//!   backend holds the only owning reference outside in-flight executions
//! - The transport is responsible for its own thread safety

pub mod client;
pub mod locale;
pub mod transport;

pub use client::{ReqwestSessionFactory, ReqwestTransport};
pub use transport::{Session, SessionFactory, SessionKind, Transport};
