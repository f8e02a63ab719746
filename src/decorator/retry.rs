//! Retry decorator.
//!
//! Retries idempotent requests on connection failures, timeouts and
//! 502/503/504 answers. Only the response head is awaited before deciding,
//! so a body that has started streaming is never replayed.

use std::sync::Arc;

use futures_util::future::{BoxFuture, FutureExt};

use crate::config::RetryConfig;
use crate::decorator::DecoratorFactory;
use crate::error::TransportError;
use crate::execute::{Execute, ExecuteMode};
use crate::http::{Exchange, Request};
use crate::resilience::backoff::Backoff;
use crate::resilience::retries::{is_retryable, RetryBudget};
use crate::session::Session;

/// Factory for [`RetryDecorator`]. All decorators created by one layer share
/// its retry budget.
#[derive(Debug, Clone)]
pub struct RetryLayer {
    config: RetryConfig,
    budget: Arc<RetryBudget>,
}

impl RetryLayer {
    pub fn new(config: RetryConfig) -> Self {
        let budget = Arc::new(RetryBudget::new(config.budget_ratio, config.min_retries));
        Self { config, budget }
    }

    pub fn budget(&self) -> &Arc<RetryBudget> {
        &self.budget
    }
}

impl DecoratorFactory for RetryLayer {
    fn create_decorator(&self, wrapped: Box<dyn Execute>) -> Box<dyn Execute> {
        Box::new(RetryDecorator {
            inner: Arc::from(wrapped),
            config: self.config.clone(),
            budget: self.budget.clone(),
        })
    }
}

pub struct RetryDecorator {
    inner: Arc<dyn Execute>,
    config: RetryConfig,
    budget: Arc<RetryBudget>,
}

impl Execute for RetryDecorator {
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
        if !self.config.enabled || self.config.max_attempts <= 1 {
            return self.inner.send(request);
        }

        let inner = self.inner.clone();
        let budget = self.budget.clone();
        let max_attempts = self.config.max_attempts;
        let backoff = Backoff::from_millis(self.config.base_delay_ms, self.config.max_delay_ms);

        async move {
            budget.record_request();
            let mut attempts = 0;
            loop {
                attempts += 1;
                let result = inner.send(request.clone()).await;

                let (status, network_error) = match &result {
                    Ok(exchange) => (Some(exchange.head.status), false),
                    Err(err) => (None, err.is_connect() || err.is_timeout()),
                };
                let retry = attempts < max_attempts
                    && is_retryable(request.method(), status, network_error)
                    && budget.can_retry();
                if !retry {
                    return result;
                }

                let delay = backoff.delay(attempts);
                tracing::info!(
                    url = %request.url(),
                    attempt = attempts,
                    delay = ?delay,
                    status = ?status,
                    "Retrying request"
                );
                drop(result);
                tokio::time::sleep(delay).await;
            }
        }
        .boxed()
    }
}
