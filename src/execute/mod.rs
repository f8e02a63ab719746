//! Request execution subsystem.
//!
//! # Data Flow
//! ```text
//! Backend::request*(req)
//!     → strategy.rs (SyncExecute / AsyncExecute / StreamingExecute)
//!     → [decorators wrap the strategy, see crate::decorator]
//!     → Execute::execute / execute_with / execute_streaming
//!         → Execute::send → Session → Transport → Exchange
//!     → sync: Reply returned to the caller
//!     → async: Reply or error delivered once to the callback (handle.rs)
//!     → streaming: Started, Data*, Finished | Failed
//! ```
//!
//! # Design Decisions
//! - One object-safe trait; decorators override only `send`
//! - Delivery lives in provided methods so every strategy and decorator
//!   shares the same exactly-once / terminal-last guarantees
//! - Async and streaming work is spawned on the session's event loop, so a
//!   callback never runs inline in the caller's stack
//! - Delivery is held back until the scheduling call has built its
//!   `ReplyHandle`, so a fast transport cannot beat the caller

pub mod handle;
pub mod strategy;

use std::sync::Arc;

use futures_util::future::BoxFuture;
use futures_util::stream::StreamExt;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::error::TransportError;
use crate::http::{Exchange, Reply, Request, StreamEvent};
use crate::session::Session;

pub use handle::{ReadyCallback, ReplyHandle, StreamCallback};
pub use strategy::{AsyncExecute, StreamingExecute, SyncExecute};

use handle::{ReadySink, StreamSink};

/// How an execution delivers its reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecuteMode {
    Sync,
    Async,
    Streaming,
}

/// One way of carrying out an HTTP request.
pub trait Execute: Send + Sync {
    fn mode(&self) -> ExecuteMode;

    /// The request this execution was created for.
    fn request(&self) -> &Arc<Request>;

    /// Session the exchange runs on.
    fn session(&self) -> &Arc<Session>;

    /// Run one exchange for `request`.
    ///
    /// Usually called with `self.request()`; a decorator may pass a derived
    /// request instead.
    fn send(&self, request: Arc<Request>) -> BoxFuture<'static, Result<Exchange, TransportError>>;

    /// Block the calling thread until the reply is complete.
    ///
    /// Refused with `BlockingInEventLoop` when called from inside an event
    /// loop, where blocking would starve the loop.
    fn execute(&self) -> Result<Reply, TransportError> {
        if Handle::try_current().is_ok() {
            return Err(TransportError::BlockingInEventLoop);
        }
        let exchange = self.send(self.request().clone());
        self.session()
            .runtime()
            .block_on(async move { exchange.await?.into_reply().await })
    }

    /// Schedule the exchange and return immediately; `callback` runs exactly
    /// once on the event loop with the complete reply or the error.
    fn execute_with(&self, callback: ReadyCallback) -> ReplyHandle {
        let exchange = self.send(self.request().clone());
        let mut sink = ReadySink::new(callback);
        let (arm, armed) = oneshot::channel::<()>();
        let task = self.session().runtime().spawn(async move {
            let result = match exchange.await {
                Ok(exchange) => exchange.into_reply().await,
                Err(err) => Err(err),
            };
            // Nothing is delivered before the scheduling call has returned.
            let _ = armed.await;
            sink.complete(result);
        });
        armed_handle(task, arm)
    }

    /// Schedule the exchange and stream it to `callback` as it arrives.
    fn execute_streaming(&self, callback: StreamCallback) -> ReplyHandle {
        let exchange = self.send(self.request().clone());
        let mut sink = StreamSink::new(callback);
        let (arm, armed) = oneshot::channel::<()>();
        let task = self.session().runtime().spawn(async move {
            let exchange = exchange.await;
            let _ = armed.await;

            let Exchange { head, mut body } = match exchange {
                Ok(exchange) => exchange,
                Err(err) => {
                    sink.emit(StreamEvent::Failed(err));
                    return;
                }
            };

            sink.emit(StreamEvent::Started(head));
            while let Some(chunk) = body.next().await {
                match chunk {
                    Ok(data) if data.is_empty() => {}
                    Ok(data) => sink.emit(StreamEvent::Data(data)),
                    Err(err) => {
                        sink.emit(StreamEvent::Failed(err));
                        return;
                    }
                }
            }
            sink.emit(StreamEvent::Finished);
        });
        armed_handle(task, arm)
    }
}

/// Wrap `task` in a handle, then release its delivery.
fn armed_handle(task: JoinHandle<()>, arm: oneshot::Sender<()>) -> ReplyHandle {
    let handle = ReplyHandle::new(task);
    let _ = arm.send(());
    handle
}
