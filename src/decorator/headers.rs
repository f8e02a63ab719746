//! Header injection (auth tokens, request IDs).
//!
//! The decorated request is a fresh copy; the caller's request is never
//! touched.

use std::sync::Arc;

use axum::http::{header, HeaderMap, HeaderName, HeaderValue};
use futures_util::future::BoxFuture;
use uuid::Uuid;

use crate::decorator::DecoratorFactory;
use crate::error::TransportError;
use crate::execute::{Execute, ExecuteMode};
use crate::http::{Exchange, Request, X_REQUEST_ID};
use crate::session::Session;

/// Factory for [`HeaderDecorator`].
#[derive(Debug, Clone, Default)]
pub struct HeaderLayer {
    headers: HeaderMap,
    request_id: bool,
}

impl HeaderLayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `name` on every request, replacing any value the caller set.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Send `Authorization: Bearer <token>`.
    pub fn bearer(self, token: &str) -> Result<Self, TransportError> {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|e| TransportError::InvalidRequest(format!("invalid bearer token: {}", e)))?;
        value.set_sensitive(true);
        Ok(self.with_header(header::AUTHORIZATION, value))
    }

    /// Attach a UUID v4 `x-request-id` to requests that carry none.
    pub fn with_request_id(mut self) -> Self {
        self.request_id = true;
        self
    }
}

impl DecoratorFactory for HeaderLayer {
    fn create_decorator(&self, wrapped: Box<dyn Execute>) -> Box<dyn Execute> {
        Box::new(HeaderDecorator {
            inner: wrapped,
            headers: self.headers.clone(),
            request_id: self.request_id,
        })
    }
}

pub struct HeaderDecorator {
    inner: Box<dyn Execute>,
    headers: HeaderMap,
    request_id: bool,
}

impl HeaderDecorator {
    fn decorate(&self, request: &Request) -> Request {
        let mut headers = request.headers().clone();
        for (name, value) in self.headers.iter() {
            headers.insert(name.clone(), value.clone());
        }
        if self.request_id && !headers.contains_key(X_REQUEST_ID) {
            if let Ok(value) = HeaderValue::from_str(&Uuid::new_v4().to_string()) {
                headers.insert(HeaderName::from_static(X_REQUEST_ID), value);
            }
        }
        request.with_headers(headers)
    }
}

impl Execute for HeaderDecorator {
    fn mode(&self) -> ExecuteMode {
        self.inner.mode()
    }

    fn request(&self) -> &Arc<Request> {
        self.inner.request()
    }

    fn session(&self) -> &Arc<Session> {
        self.inner.session()
    }

    fn send(&self, request: Arc<Request>) -> BoxFuture<'static, Result<Exchange, TransportError>> {
        let decorated = Arc::new(self.decorate(&request));
        self.inner.send(decorated)
    }
}
