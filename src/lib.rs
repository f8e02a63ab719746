//! HTTP client backend library.
//!
//! A `Backend` owns two sessions (sync and async) on one event loop and
//! executes requests through interchangeable strategies: blocking, callback
//! on completion, or streamed chunk by chunk. Executions can be wrapped by
//! decorators, and `listen` serves a callback over HTTP.

// Core
pub mod backend;
pub mod execute;
pub mod http;
pub mod session;

// Composition
pub mod decorator;

// Plumbing
pub mod config;
pub mod error;
pub mod net;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use backend::Backend;
pub use config::BackendConfig;
pub use decorator::{DecoratorChain, DecoratorFactory};
pub use error::{BackendError, ServerBindError, TransportError};
pub use execute::{Execute, ExecuteMode, ReplyHandle};
pub use http::{Reply, ReplyHead, Request, ServerHandle, StreamEvent};
pub use lifecycle::{EventLoop, Shutdown};
