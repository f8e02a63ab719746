//! Session handles and the transport contract.

use std::fmt;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use tokio::runtime::Handle;

use crate::config::SessionConfig;
use crate::error::{BackendError, TransportError};
use crate::http::{Exchange, Request};

/// The black-box transport a session delegates to.
///
/// Implementations own connection management, TLS, proxying, cookies and
/// content decoding. `send` must not block; all I/O happens when the returned
/// future is polled on the event loop.
pub trait Transport: Send + Sync {
    fn send(&self, request: Arc<Request>) -> BoxFuture<'static, Result<Exchange, TransportError>>;
}

/// Which of the backend's two sessions a handle is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionKind {
    Sync,
    Async,
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionKind::Sync => write!(f, "sync"),
            SessionKind::Async => write!(f, "async"),
        }
    }
}

/// Builds the transport behind a session.
pub trait SessionFactory: Send + Sync {
    fn create(
        &self,
        kind: SessionKind,
        user_agent: &str,
        config: &SessionConfig,
    ) -> Result<Arc<dyn Transport>, BackendError>;
}

/// A long-lived transport context bound to the event loop that drives it.
pub struct Session {
    kind: SessionKind,
    transport: Arc<dyn Transport>,
    runtime: Handle,
    user_agent: String,
}

impl Session {
    pub fn new(
        kind: SessionKind,
        transport: Arc<dyn Transport>,
        runtime: Handle,
        user_agent: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            transport,
            runtime,
            user_agent: user_agent.into(),
        }
    }

    pub fn kind(&self) -> SessionKind {
        self.kind
    }

    /// Event loop this session's work is scheduled on.
    pub fn runtime(&self) -> &Handle {
        &self.runtime
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn send(
        &self,
        request: Arc<Request>,
    ) -> BoxFuture<'static, Result<Exchange, TransportError>> {
        self.transport.send(request)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("kind", &self.kind)
            .field("user_agent", &self.user_agent)
            .finish_non_exhaustive()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        tracing::debug!(kind = %self.kind, "Session released");
    }
}
