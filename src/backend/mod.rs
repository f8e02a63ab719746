//! Backend facade.
//!
//! # Data Flow
//! ```text
//! Backend::init(user_agent)
//!     → SessionFactory (async session, then sync session)
//!
//! Backend::request / request_async / request_streaming(req)
//!     → strategy (execute::strategy) on the matching session
//!     → decorator factory wraps it, when one is set
//!     → Execute::execute / execute_with / execute_streaming
//!
//! Backend::listen(path, port, callback)
//!     → http::server on the backend's event loop
//! ```
//!
//! # Design Decisions
//! - Explicit state machine: Uninitialized → Initialized → Closed
//! - Both sessions are built before either is kept, so a failed `init`
//!   leaves the backend untouched
//! - Sync requests use the sync session, everything else the async one

use std::fmt;
use std::sync::Arc;

use tokio::runtime::Handle;

use crate::config::BackendConfig;
use crate::decorator::DecoratorFactory;
use crate::error::{BackendError, ServerBindError, TransportError};
use crate::execute::{AsyncExecute, Execute, ReplyHandle, StreamingExecute, SyncExecute};
use crate::http::{HttpServer, Reply, Request, ServerHandle, StreamEvent};
use crate::session::{ReqwestSessionFactory, Session, SessionFactory, SessionKind};

struct Sessions {
    sync_session: Arc<Session>,
    async_session: Arc<Session>,
    user_agent: String,
}

enum State {
    Uninitialized,
    Initialized(Sessions),
    Closed,
}

impl State {
    fn name(&self) -> &'static str {
        match self {
            State::Uninitialized => "uninitialized",
            State::Initialized(_) => "initialized",
            State::Closed => "closed",
        }
    }
}

/// Entry point for outbound requests and embedded servers.
pub struct Backend {
    runtime: Handle,
    config: BackendConfig,
    factory: Arc<dyn SessionFactory>,
    decorator_factory: Option<Arc<dyn DecoratorFactory>>,
    state: State,
}

impl Backend {
    /// A backend with default configuration and the reqwest transport.
    pub fn new(runtime: Handle) -> Self {
        Self::with_config(runtime, BackendConfig::default())
    }

    pub fn with_config(runtime: Handle, config: BackendConfig) -> Self {
        Self {
            runtime,
            config,
            factory: Arc::new(ReqwestSessionFactory),
            decorator_factory: None,
            state: State::Uninitialized,
        }
    }

    /// A backend whose sessions come from `factory`.
    pub fn with_factory(runtime: Handle, factory: impl SessionFactory + 'static) -> Self {
        Self::new(runtime).with_session_factory(factory)
    }

    /// Replace the session factory. Only meaningful before `init`.
    pub fn with_session_factory(mut self, factory: impl SessionFactory + 'static) -> Self {
        self.factory = Arc::new(factory);
        self
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// Create both sessions with `user_agent`.
    pub fn init(&mut self, user_agent: &str) -> Result<(), BackendError> {
        match self.state {
            State::Uninitialized => {}
            State::Initialized(_) => return Err(BackendError::AlreadyInitialized),
            State::Closed => return Err(BackendError::Closed),
        }

        let async_session = self.create_session(SessionKind::Async, user_agent)?;
        let sync_session = self.create_session(SessionKind::Sync, user_agent)?;

        tracing::info!(user_agent = %user_agent, "Backend initialized");
        self.state = State::Initialized(Sessions {
            sync_session,
            async_session,
            user_agent: user_agent.to_string(),
        });
        Ok(())
    }

    fn create_session(
        &self,
        kind: SessionKind,
        user_agent: &str,
    ) -> Result<Arc<Session>, BackendError> {
        let transport = self
            .factory
            .create(kind, user_agent, &self.config.session)
            .map_err(|e| {
                tracing::debug!(kind = %kind, error = %e, "Failed to create session");
                e
            })?;
        Ok(Arc::new(Session::new(
            kind,
            transport,
            self.runtime.clone(),
            user_agent,
        )))
    }

    pub fn is_initialized(&self) -> bool {
        matches!(self.state, State::Initialized(_))
    }

    /// User agent given to `init`, while initialized.
    pub fn user_agent(&self) -> Option<&str> {
        match &self.state {
            State::Initialized(sessions) => Some(&sessions.user_agent),
            _ => None,
        }
    }

    /// Wrap every execution created from now on with `factory`.
    pub fn set_decorator_factory(&mut self, factory: impl DecoratorFactory + 'static) {
        self.decorator_factory = Some(Arc::new(factory));
    }

    pub fn clear_decorator_factory(&mut self) {
        self.decorator_factory = None;
    }

    fn sessions(&self) -> Result<&Sessions, TransportError> {
        match &self.state {
            State::Initialized(sessions) => Ok(sessions),
            _ => Err(TransportError::NotInitialized),
        }
    }

    fn decorate(&self, execution: Box<dyn Execute>) -> Box<dyn Execute> {
        match &self.decorator_factory {
            Some(factory) => factory.create_decorator(execution),
            None => execution,
        }
    }

    /// Perform `request` and block until the reply is complete.
    ///
    /// Must not be called from inside the event loop; that is refused with
    /// `TransportError::BlockingInEventLoop`.
    pub fn request(&self, request: impl Into<Arc<Request>>) -> Result<Reply, TransportError> {
        let session = self.sessions()?.sync_session.clone();
        let execution = self.decorate(Box::new(SyncExecute::new(session, request.into())));
        execution.execute()
    }

    /// Schedule `request`; `callback` runs exactly once on the event loop.
    pub fn request_async<F>(
        &self,
        request: impl Into<Arc<Request>>,
        callback: F,
    ) -> Result<ReplyHandle, TransportError>
    where
        F: FnOnce(Result<Reply, TransportError>) + Send + 'static,
    {
        let session = self.sessions()?.async_session.clone();
        let execution = self.decorate(Box::new(AsyncExecute::new(session, request.into())));
        Ok(execution.execute_with(Box::new(callback)))
    }

    /// Schedule `request` and deliver its body as it arrives.
    pub fn request_streaming<F>(
        &self,
        request: impl Into<Arc<Request>>,
        callback: F,
    ) -> Result<ReplyHandle, TransportError>
    where
        F: FnMut(StreamEvent) + Send + 'static,
    {
        let session = self.sessions()?.async_session.clone();
        let execution = self.decorate(Box::new(StreamingExecute::new(session, request.into())));
        Ok(execution.execute_streaming(Box::new(callback)))
    }

    /// Serve `callback` at `path` on `port` (0 for an ephemeral port).
    ///
    /// The callback runs on the blocking pool. It can issue further requests
    /// with `request_async`; a sync `request` from inside it is refused.
    pub fn listen<F>(
        &self,
        path: &str,
        port: u16,
        callback: F,
    ) -> Result<ServerHandle, ServerBindError>
    where
        F: Fn(Request) -> Reply + Send + Sync + 'static,
    {
        let user_agent = match &self.state {
            State::Initialized(sessions) => sessions.user_agent.as_str(),
            _ => return Err(ServerBindError::NotInitialized),
        };
        let config = self.config.server.clone();
        let server = HttpServer::new(path, user_agent, config, Arc::new(callback))?;
        server.start(&self.runtime, port)
    }

    /// Release both sessions. Later requests fail with `NotInitialized`.
    pub fn close(&mut self) {
        if let State::Initialized(_) = self.state {
            tracing::info!("Backend closed");
        }
        self.state = State::Closed;
    }
}

impl Drop for Backend {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Backend")
            .field("state", &self.state.name())
            .field("decorated", &self.decorator_factory.is_some())
            .finish_non_exhaustive()
    }
}
