//! Completion handles and exactly-once callback delivery.
//!
//! # Responsibilities
//! - `ReplyHandle`: observe or abort a scheduled execution
//! - `ReadySink`: invoke a completion callback exactly once
//! - `StreamSink`: deliver stream events, terminal last, nothing after it
//!
//! # Design Decisions
//! - Sinks own the callback; dropping an unfinished sink (abort, loop
//!   shutdown) delivers `Cancelled` so the callback contract still holds
//! - The callback is taken out of the sink while it runs, so a panicking
//!   callback is never invoked a second time

use tokio::task::JoinHandle;

use crate::error::TransportError;
use crate::http::{Reply, StreamEvent};

/// Completion callback of an asynchronous execution.
pub type ReadyCallback = Box<dyn FnOnce(Result<Reply, TransportError>) + Send + 'static>;

/// Event callback of a streaming execution.
pub type StreamCallback = Box<dyn FnMut(StreamEvent) + Send + 'static>;

/// Handle to a scheduled execution.
///
/// Dropping the handle does not cancel the execution.
#[derive(Debug)]
pub struct ReplyHandle {
    task: JoinHandle<()>,
}

impl ReplyHandle {
    pub(crate) fn new(task: JoinHandle<()>) -> Self {
        Self { task }
    }

    /// Abort the execution. If it has not delivered its terminal callback yet,
    /// the callback receives `TransportError::Cancelled`.
    pub fn abort(&self) {
        self.task.abort();
    }

    /// True once the callback contract has been fulfilled.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait until the execution has delivered its terminal callback.
    pub async fn finished(self) {
        // A cancelled or panicked task has still run (or dropped) its sink.
        let _ = self.task.await;
    }
}

pub(crate) struct ReadySink {
    callback: Option<ReadyCallback>,
}

impl ReadySink {
    pub(crate) fn new(callback: ReadyCallback) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    pub(crate) fn complete(&mut self, result: Result<Reply, TransportError>) {
        if let Some(callback) = self.callback.take() {
            callback(result);
        }
    }
}

impl Drop for ReadySink {
    fn drop(&mut self) {
        if self.callback.is_some() {
            tracing::debug!("Execution dropped before completion");
            self.complete(Err(TransportError::Cancelled));
        }
    }
}

pub(crate) struct StreamSink {
    callback: Option<StreamCallback>,
}

impl StreamSink {
    pub(crate) fn new(callback: StreamCallback) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    /// Deliver `event`; after a terminal event the sink is spent.
    pub(crate) fn emit(&mut self, event: StreamEvent) {
        let terminal = event.is_terminal();
        if let Some(mut callback) = self.callback.take() {
            callback(event);
            if !terminal {
                self.callback = Some(callback);
            }
        }
    }
}

impl Drop for StreamSink {
    fn drop(&mut self) {
        if self.callback.is_some() {
            tracing::debug!("Streaming execution dropped before its terminal event");
            self.emit(StreamEvent::Failed(TransportError::Cancelled));
        }
    }
}
