//! reqwest-backed transport.
//!
//! # Responsibilities
//! - Configure a `reqwest::Client` per session (user agent, Accept-Language,
//!   cookie jar, content decoding, proxy, timeouts)
//! - Translate `Request` into a reqwest request and the response into an
//!   `Exchange` whose body is read lazily

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::{BoxFuture, FutureExt};
use futures_util::stream::{StreamExt, TryStreamExt};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE};
use thiserror::Error;

use crate::config::SessionConfig;
use crate::error::{BackendError, TransportError};
use crate::http::{Exchange, ReplyHead, Request};
use crate::session::locale;
use crate::session::transport::{SessionFactory, SessionKind, Transport};

/// Transport over a pooled `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Build a client configured from the session settings.
    pub fn build(user_agent: &str, config: &SessionConfig) -> Result<Self, BuildError> {
        let mut builder = reqwest::Client::builder()
            .user_agent(user_agent)
            .cookie_store(config.cookies)
            .gzip(config.decompression)
            .brotli(config.decompression)
            .deflate(config.decompression)
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .pool_idle_timeout(Duration::from_secs(config.pool_idle_secs));

        if let Some(language) = locale::accept_language(&config.accept_language) {
            let value = HeaderValue::from_str(&language).map_err(|source| {
                BuildError::AcceptLanguage {
                    value: language.clone(),
                    source,
                }
            })?;
            let mut headers = HeaderMap::new();
            headers.insert(ACCEPT_LANGUAGE, value);
            builder = builder.default_headers(headers);
        }

        match config.proxy.as_deref() {
            None => {}
            Some("none") => builder = builder.no_proxy(),
            Some(proxy) => {
                let proxy = reqwest::Proxy::all(proxy).map_err(|source| BuildError::Proxy {
                    url: proxy.to_string(),
                    source,
                })?;
                builder = builder.proxy(proxy);
            }
        }

        let client = builder.build().map_err(BuildError::Client)?;
        Ok(Self { client })
    }
}

/// Client construction failure.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("invalid Accept-Language '{value}': {source}")]
    AcceptLanguage {
        value: String,
        #[source]
        source: reqwest::header::InvalidHeaderValue,
    },

    #[error("invalid proxy '{url}': {source}")]
    Proxy {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("cannot build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl Transport for ReqwestTransport {
    fn send(&self, request: Arc<Request>) -> BoxFuture<'static, Result<Exchange, TransportError>> {
        let mut builder = self
            .client
            .request(request.method().clone(), request.url().clone())
            .headers(request.headers().clone());
        if let Some(body) = request.body() {
            builder = builder.body(body.clone());
        }

        async move {
            let response = builder.send().await?;
            let head = ReplyHead {
                status: response.status(),
                headers: response.headers().clone(),
            };
            let body = response
                .bytes_stream()
                .map_err(|e| TransportError::Body(e.to_string()))
                .boxed();
            Ok(Exchange::new(head, body))
        }
        .boxed()
    }
}

/// Default session factory: one independent reqwest client per session.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReqwestSessionFactory;

impl SessionFactory for ReqwestSessionFactory {
    fn create(
        &self,
        kind: SessionKind,
        user_agent: &str,
        config: &SessionConfig,
    ) -> Result<Arc<dyn Transport>, BackendError> {
        let transport = ReqwestTransport::build(user_agent, config)
            .map_err(|e| BackendError::session(kind, e))?;
        tracing::debug!(
            kind = %kind,
            user_agent,
            cookies = config.cookies,
            proxy = ?config.proxy,
            "Session transport created"
        );
        Ok(Arc::new(transport))
    }
}
