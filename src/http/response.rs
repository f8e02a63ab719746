//! Reply types produced by executions.
//!
//! # Responsibilities
//! - `Reply`: a complete response (status, headers, buffered body)
//! - `Exchange`: response head plus a lazily read body stream
//! - `StreamEvent`: the events a streaming execution delivers
//!
//! # Design Decisions
//! - Transports hand back an `Exchange`; buffering is the caller's choice
//! - Body chunks are passed through untouched so ordering is the transport's

use std::fmt;

use axum::body::Bytes;
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use futures_util::stream::{self, BoxStream, StreamExt};
use serde::de::DeserializeOwned;

use crate::error::TransportError;

/// Body of an in-flight exchange.
pub type BodyStream = BoxStream<'static, Result<Bytes, TransportError>>;

/// Status line and headers of a response.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplyHead {
    pub status: StatusCode,
    pub headers: HeaderMap,
}

impl ReplyHead {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
        }
    }
}

/// A complete HTTP response.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Reply {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// 200 OK with the given body.
    pub fn ok(body: impl Into<Bytes>) -> Self {
        Self::new(StatusCode::OK).with_body(body)
    }

    pub fn from_parts(head: ReplyHead, body: Bytes) -> Self {
        Self {
            status: head.status,
            headers: head.headers,
            body,
        }
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn head(&self) -> ReplyHead {
        ReplyHead {
            status: self.status,
            headers: self.headers.clone(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Body decoded as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, TransportError> {
        serde_json::from_slice(&self.body)
            .map_err(|e| TransportError::Body(format!("invalid JSON body: {}", e)))
    }
}

/// A response whose head has arrived and whose body is still being read.
pub struct Exchange {
    pub head: ReplyHead,
    pub body: BodyStream,
}

impl Exchange {
    pub fn new(head: ReplyHead, body: BodyStream) -> Self {
        Self { head, body }
    }

    /// An exchange replaying a buffered reply as a single chunk.
    pub fn buffered(reply: Reply) -> Self {
        let Reply { status, headers, body } = reply;
        let chunk = if body.is_empty() { None } else { Some(Ok(body)) };
        Self {
            head: ReplyHead { status, headers },
            body: stream::iter(chunk).boxed(),
        }
    }

    /// Read the whole body and return the complete reply.
    pub async fn into_reply(self) -> Result<Reply, TransportError> {
        let Exchange { head, mut body } = self;
        let mut buffer = Vec::new();
        while let Some(chunk) = body.next().await {
            buffer.extend_from_slice(&chunk?);
        }
        Ok(Reply::from_parts(head, Bytes::from(buffer)))
    }
}

impl fmt::Debug for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Exchange")
            .field("head", &self.head)
            .finish_non_exhaustive()
    }
}

/// Events delivered to a streaming callback.
///
/// A stream is `Started`, then any number of `Data`, then exactly one
/// terminal `Finished` or `Failed`. A stream that fails before the head
/// arrives skips `Started`.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Started(ReplyHead),
    Data(Bytes),
    Finished,
    Failed(TransportError),
}

impl StreamEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Finished | StreamEvent::Failed(_))
    }
}
