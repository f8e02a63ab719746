//! Error taxonomy for the backend.
//!
//! - `BackendError`: session construction and lifecycle failures (`init`).
//! - `TransportError`: anything that goes wrong while executing a request.
//! - `ServerBindError`: `listen` could not set up its endpoint.

use thiserror::Error;

use crate::session::SessionKind;

/// Errors raised while setting up or tearing down a backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// A session handle could not be constructed.
    #[error("cannot create {kind} session: {message}")]
    Session { kind: SessionKind, message: String },

    /// `init` was called on a backend that already owns its sessions.
    #[error("backend is already initialized")]
    AlreadyInitialized,

    /// The backend was closed and cannot be initialized again.
    #[error("backend is closed")]
    Closed,

    /// The event loop could not be started.
    #[error("event loop error: {0}")]
    Runtime(#[from] std::io::Error),
}

impl BackendError {
    pub(crate) fn session(kind: SessionKind, err: impl std::fmt::Display) -> Self {
        BackendError::Session {
            kind,
            message: err.to_string(),
        }
    }
}

/// Errors surfaced by an execution.
///
/// Synchronous executions return it; asynchronous and streaming executions
/// deliver it through their callback.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The connection could not be established.
    #[error("connection failed: {0}")]
    Connect(String),

    /// The exchange did not finish within its deadline.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// The peer answered with something that is not valid HTTP.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Reading or decoding the response body failed.
    #[error("failed to read response body: {0}")]
    Body(String),

    /// The request could not be built or sent as described.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The backend has no sessions (not initialized, or closed).
    #[error("backend is not initialized")]
    NotInitialized,

    /// A synchronous execution was started from inside the event loop.
    #[error("synchronous execution is not allowed on the event loop")]
    BlockingInEventLoop,

    /// The execution was aborted before it delivered a result.
    #[error("execution cancelled")]
    Cancelled,
}

impl TransportError {
    /// True for failures to reach the peer at all.
    pub fn is_connect(&self) -> bool {
        matches!(self, TransportError::Connect(_))
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, TransportError::Timeout(_))
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        let message = err.to_string();
        if err.is_timeout() {
            TransportError::Timeout(message)
        } else if err.is_connect() {
            TransportError::Connect(message)
        } else if err.is_builder() {
            TransportError::InvalidRequest(message)
        } else if err.is_body() || err.is_decode() {
            TransportError::Body(message)
        } else {
            TransportError::Protocol(message)
        }
    }
}

/// Errors raised by `listen`.
#[derive(Debug, Error)]
pub enum ServerBindError {
    /// The configured bind address is not an IP address.
    #[error("invalid listen address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    /// The path cannot be mounted.
    #[error("invalid listen path '{0}'")]
    InvalidPath(String),

    /// The socket could not be bound.
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// `listen` was called before `init`.
    #[error("backend is not initialized")]
    NotInitialized,
}
