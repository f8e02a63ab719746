//! Embedded HTTP server behind `Backend::listen`.
//!
//! # Responsibilities
//! - Mount the caller's callback at a path (and everything below it)
//! - Convert incoming requests into `Request`, replies into responses
//! - Wire up middleware (tracing, request timeout, body limit)
//! - Serve on the event loop until the handle stops it
//!
//! # Design Decisions
//! - The callback is synchronous and runs on the blocking pool, so a slow
//!   callback never stalls the loop
//! - Every reply carries a `Server` header with the backend's user agent

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{Body, Bytes},
    extract::{DefaultBodyLimit, FromRequest, State},
    http::{header, HeaderMap, HeaderValue, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use url::Url;

use crate::config::ServerConfig;
use crate::error::ServerBindError;
use crate::http::{Reply, Request};
use crate::lifecycle::Shutdown;
use crate::net::listener;
use crate::observability::metrics;

/// Callback answering requests delivered to a server.
pub type ServerCallback = Arc<dyn Fn(Request) -> Reply + Send + Sync + 'static>;

#[derive(Clone)]
struct ServerState {
    callback: ServerCallback,
    server_header: Option<HeaderValue>,
    local_addr: SocketAddr,
}

/// A server waiting to be started.
pub struct HttpServer {
    path: String,
    user_agent: String,
    config: ServerConfig,
    callback: ServerCallback,
}

impl HttpServer {
    /// Describe a server answering at `path`. Fails on paths that cannot be
    /// mounted (must start with `/`, no route syntax).
    pub fn new(
        path: &str,
        user_agent: &str,
        config: ServerConfig,
        callback: ServerCallback,
    ) -> Result<Self, ServerBindError> {
        let route_syntax = path.contains(['{', '}', '*', ':']) || path.contains("//");
        if !path.starts_with('/') || route_syntax {
            return Err(ServerBindError::InvalidPath(path.to_string()));
        }
        Ok(Self {
            path: path.to_string(),
            user_agent: user_agent.to_string(),
            config,
            callback,
        })
    }

    /// Bind `port` (0 for ephemeral) and start serving on `runtime`.
    pub fn start(self, runtime: &Handle, port: u16) -> Result<ServerHandle, ServerBindError> {
        let listener = listener::bind(runtime, &self.config.bind_address, port)?;
        let local_addr = listener.local_addr().map_err(|source| ServerBindError::Bind {
            address: format!("{}:{}", self.config.bind_address, port),
            source,
        })?;
        let app = self.build_router(local_addr);

        let shutdown = Shutdown::new();
        let signalled = shutdown.signalled();
        let path = self.path.clone();
        let task = runtime.spawn(async move {
            tracing::info!(address = %local_addr, path = %path, "HTTP server starting");
            if let Err(e) = axum::serve(listener, app)
                .with_graceful_shutdown(signalled)
                .await
            {
                tracing::error!(address = %local_addr, error = %e, "HTTP server failed");
            }
            tracing::info!(address = %local_addr, "HTTP server stopped");
        });

        Ok(ServerHandle {
            local_addr,
            shutdown,
            task: Some(task),
        })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(&self, local_addr: SocketAddr) -> Router {
        let state = ServerState {
            callback: self.callback.clone(),
            server_header: HeaderValue::from_str(&self.user_agent).ok(),
            local_addr,
        };
        let base = self.path.trim_end_matches('/');
        let nested = format!("{}/{{*rest}}", base);
        let timeout = Duration::from_secs(self.config.request_timeout_secs);

        Router::new()
            .route(&self.path, any(dispatch))
            .route(&nested, any(dispatch))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(TimeoutLayer::new(timeout))
                    .layer(DefaultBodyLimit::max(self.config.max_body_size)),
            )
    }
}

/// Owns a running server. Dropping the handle stops the server.
#[derive(Debug)]
pub struct ServerHandle {
    local_addr: SocketAddr,
    shutdown: Shutdown,
    task: Option<JoinHandle<()>>,
}

impl ServerHandle {
    /// The port actually bound.
    pub fn port(&self) -> u16 {
        self.local_addr.port()
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting connections; in-flight requests finish.
    pub fn stop(&self) {
        self.shutdown.trigger();
    }

    /// Stop and wait for the server task to exit.
    pub async fn stopped(mut self) {
        self.shutdown.trigger();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Rebuild the absolute URL the client addressed.
fn request_url(headers: &HeaderMap, uri: &Uri, local_addr: SocketAddr) -> Option<Url> {
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| local_addr.to_string());
    let path_and_query = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    Url::parse(&format!("http://{}{}", host, path_and_query)).ok()
}

async fn dispatch(State(state): State<ServerState>, request: axum::extract::Request) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let headers = request.headers().clone();

    // 413 when the body exceeds the limit, 400 when reading it fails.
    let body = match Bytes::from_request(request, &()).await {
        Ok(bytes) => bytes,
        Err(rejection) => {
            let status = rejection.status();
            tracing::warn!(
                method = %method,
                path = %uri.path(),
                status = %status,
                error = %rejection.body_text(),
                "Rejected request body"
            );
            metrics::record_server_request(method.as_str(), status);
            return rejection.into_response();
        }
    };

    let Some(url) = request_url(&headers, &uri, state.local_addr) else {
        metrics::record_server_request(method.as_str(), StatusCode::BAD_REQUEST);
        return (StatusCode::BAD_REQUEST, "Invalid request target").into_response();
    };

    let body = if body.is_empty() { None } else { Some(body) };
    let request = Request::from_parts(method.clone(), url, headers, body);
    tracing::debug!(method = %method, url = %request.url(), "Dispatching to listen callback");

    let callback = state.callback.clone();
    let reply = match tokio::task::spawn_blocking(move || callback(request)).await {
        Ok(reply) => reply,
        Err(e) => {
            tracing::error!(method = %method, error = %e, "Listen callback panicked");
            let status = StatusCode::INTERNAL_SERVER_ERROR;
            metrics::record_server_request(method.as_str(), status);
            return (status, "Internal server error").into_response();
        }
    };

    metrics::record_server_request(method.as_str(), reply.status);

    let Reply { status, headers, body } = reply;
    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    if let Some(server) = state.server_header {
        response.headers_mut().entry(header::SERVER).or_insert(server);
    }
    response
}
