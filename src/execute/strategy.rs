//! The three execution strategies.
//!
//! Sync and async executions read the whole body before handing the exchange
//! on; streaming executions pass the transport's body stream through.

use std::sync::Arc;

use futures_util::future::{BoxFuture, FutureExt};

use crate::error::TransportError;
use crate::execute::{Execute, ExecuteMode};
use crate::http::{Exchange, Request};
use crate::session::Session;

fn buffered(
    exchange: BoxFuture<'static, Result<Exchange, TransportError>>,
) -> BoxFuture<'static, Result<Exchange, TransportError>> {
    async move {
        let reply = exchange.await?.into_reply().await?;
        Ok(Exchange::buffered(reply))
    }
    .boxed()
}

/// Blocking execution; the caller waits for the reply.
#[derive(Debug)]
pub struct SyncExecute {
    session: Arc<Session>,
    request: Arc<Request>,
}

impl SyncExecute {
    pub fn new(session: Arc<Session>, request: Arc<Request>) -> Self {
        Self { session, request }
    }
}

impl Execute for SyncExecute {
    fn mode(&self) -> ExecuteMode {
        ExecuteMode::Sync
    }

    fn request(&self) -> &Arc<Request> {
        &self.request
    }

    fn session(&self) -> &Arc<Session> {
        &self.session
    }

    fn send(&self, request: Arc<Request>) -> BoxFuture<'static, Result<Exchange, TransportError>> {
        buffered(self.session.send(request))
    }
}

/// Execution completed through a callback.
#[derive(Debug)]
pub struct AsyncExecute {
    session: Arc<Session>,
    request: Arc<Request>,
}

impl AsyncExecute {
    pub fn new(session: Arc<Session>, request: Arc<Request>) -> Self {
        Self { session, request }
    }
}

impl Execute for AsyncExecute {
    fn mode(&self) -> ExecuteMode {
        ExecuteMode::Async
    }

    fn request(&self) -> &Arc<Request> {
        &self.request
    }

    fn session(&self) -> &Arc<Session> {
        &self.session
    }

    fn send(&self, request: Arc<Request>) -> BoxFuture<'static, Result<Exchange, TransportError>> {
        buffered(self.session.send(request))
    }
}

/// Execution whose body is delivered chunk by chunk.
#[derive(Debug)]
pub struct StreamingExecute {
    session: Arc<Session>,
    request: Arc<Request>,
}

impl StreamingExecute {
    pub fn new(session: Arc<Session>, request: Arc<Request>) -> Self {
        Self { session, request }
    }
}

impl Execute for StreamingExecute {
    fn mode(&self) -> ExecuteMode {
        ExecuteMode::Streaming
    }

    fn request(&self) -> &Arc<Request> {
        &self.request
    }

    fn session(&self) -> &Arc<Session> {
        &self.session
    }

    fn send(&self, request: Arc<Request>) -> BoxFuture<'static, Result<Exchange, TransportError>> {
        self.session.send(request)
    }
}
