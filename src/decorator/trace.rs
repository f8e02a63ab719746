//! Per-exchange tracing and metrics.

use std::sync::Arc;
use std::time::Instant;

use futures_util::future::{BoxFuture, FutureExt};
use tracing::Instrument;

use crate::decorator::DecoratorFactory;
use crate::error::TransportError;
use crate::execute::{Execute, ExecuteMode};
use crate::http::{Exchange, Request};
use crate::observability::metrics;
use crate::session::Session;

/// Factory for [`TracingDecorator`].
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLayer;

impl DecoratorFactory for TracingLayer {
    fn create_decorator(&self, wrapped: Box<dyn Execute>) -> Box<dyn Execute> {
        Box::new(TracingDecorator { inner: wrapped })
    }
}

/// Logs every exchange with its outcome and latency.
pub struct TracingDecorator {
    inner: Box<dyn Execute>,
}

impl Execute for TracingDecorator {
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
        let mode = self.inner.mode();
        let method = request.method().clone();
        let span = tracing::debug_span!(
            "exchange",
            method = %method,
            url = %request.url(),
            mode = ?mode,
            request_id = request.request_id().unwrap_or("-"),
        );
        let start_time = Instant::now();
        let exchange = self.inner.send(request);

        async move {
            let result = exchange.await;
            match &result {
                Ok(exchange) => {
                    tracing::debug!(
                        status = %exchange.head.status,
                        elapsed_ms = start_time.elapsed().as_millis() as u64,
                        "Exchange completed"
                    );
                    let status = Some(exchange.head.status);
                    metrics::record_exchange(method.as_str(), mode, status, start_time);
                }
                Err(err) => {
                    tracing::warn!(
                        error = %err,
                        elapsed_ms = start_time.elapsed().as_millis() as u64,
                        "Exchange failed"
                    );
                    metrics::record_exchange(method.as_str(), mode, None, start_time);
                }
            }
            result
        }
        .instrument(span)
        .boxed()
    }
}
