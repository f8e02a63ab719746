//! Outbound request description.
//!
//! # Responsibilities
//! - Describe a request (method, URL, headers, optional body)
//! - Build requests with validation of URL and header syntax
//! - Derive modified copies for decorators without mutating the original
//!
//! # Design Decisions
//! - A `Request` is immutable once built; executions share it as `Arc<Request>`
//! - Builder errors are deferred until `build()` so call chains stay fluent

use axum::body::Bytes;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method};
use url::Url;

use crate::error::TransportError;

/// Header carrying the per-request correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// An immutable description of an outbound HTTP request.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    method: Method,
    url: Url,
    headers: HeaderMap,
    body: Option<Bytes>,
}

impl Request {
    /// Start building a request with an arbitrary method.
    pub fn builder(method: Method, url: &str) -> RequestBuilder {
        RequestBuilder::new(method, url)
    }

    pub fn get(url: &str) -> RequestBuilder {
        RequestBuilder::new(Method::GET, url)
    }

    pub fn post(url: &str) -> RequestBuilder {
        RequestBuilder::new(Method::POST, url)
    }

    pub fn put(url: &str) -> RequestBuilder {
        RequestBuilder::new(Method::PUT, url)
    }

    pub fn delete(url: &str) -> RequestBuilder {
        RequestBuilder::new(Method::DELETE, url)
    }

    /// Assemble a request from already validated parts.
    pub fn from_parts(method: Method, url: Url, headers: HeaderMap, body: Option<Bytes>) -> Self {
        Self {
            method,
            url,
            headers,
            body,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Path component of the target URL.
    pub fn path(&self) -> &str {
        self.url.path()
    }

    /// Request ID header, if one is attached.
    pub fn request_id(&self) -> Option<&str> {
        self.headers
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
    }

    /// A copy of this request carrying `headers` instead of the original set.
    pub fn with_headers(&self, headers: HeaderMap) -> Self {
        Self {
            method: self.method.clone(),
            url: self.url.clone(),
            headers,
            body: self.body.clone(),
        }
    }
}

/// Fluent builder for [`Request`].
#[derive(Debug)]
pub struct RequestBuilder {
    method: Method,
    url: Result<Url, TransportError>,
    headers: HeaderMap,
    body: Option<Bytes>,
    error: Option<TransportError>,
}

impl RequestBuilder {
    fn new(method: Method, url: &str) -> Self {
        let url = Url::parse(url)
            .map_err(|e| TransportError::InvalidRequest(format!("invalid URL '{}': {}", url, e)));
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
            error: None,
        }
    }

    /// Append a header given as strings. Invalid names or values fail `build()`.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if self.error.is_some() {
            return self;
        }
        let name = match HeaderName::from_bytes(name.as_bytes()) {
            Ok(name) => name,
            Err(e) => {
                let message = format!("invalid header name '{}': {}", name, e);
                self.error = Some(TransportError::InvalidRequest(message));
                return self;
            }
        };
        match HeaderValue::from_str(value) {
            Ok(value) => {
                self.headers.append(name, value);
            }
            Err(e) => {
                let message = format!("invalid value for header '{}': {}", name, e);
                self.error = Some(TransportError::InvalidRequest(message));
            }
        }
        self
    }

    /// Append an already typed header.
    pub fn typed_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serialize `value` as the JSON body and set the content type.
    pub fn json<T: serde::Serialize>(mut self, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(body) => {
                self.headers.insert(
                    axum::http::header::CONTENT_TYPE,
                    HeaderValue::from_static("application/json"),
                );
                self.body = Some(Bytes::from(body));
            }
            Err(e) => {
                if self.error.is_none() {
                    let message = format!("cannot encode JSON body: {}", e);
                    self.error = Some(TransportError::InvalidRequest(message));
                }
            }
        }
        self
    }

    pub fn build(self) -> Result<Request, TransportError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        let url = self.url?;
        match url.scheme() {
            "http" | "https" => {}
            other => {
                let message = format!("unsupported scheme '{}'", other);
                return Err(TransportError::InvalidRequest(message));
            }
        }
        Ok(Request {
            method: self.method,
            url,
            headers: self.headers,
            body: self.body,
        })
    }
}
