//! Decorator composition.
//!
//! # Data Flow
//! ```text
//! strategy (Box<dyn Execute>)
//!     → DecoratorFactory::create_decorator
//!         - trace.rs (span, structured log, metrics per exchange)
//!         - headers.rs (auth / request ID injection)
//!         - retry.rs (backoff + retry budget)
//!     → Box<dyn Execute> with the same interface
//! ```
//!
//! # Design Decisions
//! - A decorator is just another `Execute`; it overrides `send` and forwards
//!   everything else, so delivery guarantees are untouched
//! - Factories compose: `DecoratorChain` is itself a factory
//! - Errors pass through unchanged unless translating them is the point

pub mod headers;
pub mod retry;
pub mod trace;

use std::fmt;
use std::sync::Arc;

use crate::execute::Execute;

pub use headers::{HeaderDecorator, HeaderLayer};
pub use retry::{RetryDecorator, RetryLayer};
pub use trace::{TracingDecorator, TracingLayer};

/// Wraps executions in a decorator.
pub trait DecoratorFactory: Send + Sync {
    fn create_decorator(&self, wrapped: Box<dyn Execute>) -> Box<dyn Execute>;
}

impl<F> DecoratorFactory for F
where
    F: Fn(Box<dyn Execute>) -> Box<dyn Execute> + Send + Sync,
{
    fn create_decorator(&self, wrapped: Box<dyn Execute>) -> Box<dyn Execute> {
        self(wrapped)
    }
}

/// An ordered list of factories applied as one.
///
/// The first factory added wraps the strategy directly; the last one added
/// is outermost and sees the request first.
#[derive(Clone, Default)]
pub struct DecoratorChain {
    factories: Vec<Arc<dyn DecoratorFactory>>,
}

impl DecoratorChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a factory (builder style).
    pub fn with<F: DecoratorFactory + 'static>(mut self, factory: F) -> Self {
        self.push(factory);
        self
    }

    pub fn push<F: DecoratorFactory + 'static>(&mut self, factory: F) {
        self.factories.push(Arc::new(factory));
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl DecoratorFactory for DecoratorChain {
    fn create_decorator(&self, wrapped: Box<dyn Execute>) -> Box<dyn Execute> {
        self.factories
            .iter()
            .fold(wrapped, |inner, factory| factory.create_decorator(inner))
    }
}

impl fmt::Debug for DecoratorChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecoratorChain")
            .field("len", &self.factories.len())
            .finish()
    }
}
