//! The event loop driving asynchronous work.
//!
//! # Responsibilities
//! - Own the tokio runtime that runs async and streaming executions,
//!   embedded servers and the heartbeat
//! - Hand out `Handle`s to sessions
//! - Run the harness until shutdown
//!
//! # Design Decisions
//! - Multi-thread runtime: synchronous executions block a foreign thread on
//!   the loop through `Handle::block_on`, which needs the loop's own workers
//!   to keep driving I/O
//! - Must be created and dropped outside any async context

use std::future::Future;
use std::time::Duration;

use tokio::runtime::{Builder, Handle, Runtime};

use crate::config::RuntimeConfig;
use crate::error::BackendError;
use crate::lifecycle::shutdown::Shutdown;

pub struct EventLoop {
    runtime: Runtime,
    shutdown: Shutdown,
}

impl EventLoop {
    pub fn new(config: &RuntimeConfig) -> Result<Self, BackendError> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(config.worker_threads.max(1))
            .thread_name("http-backend-loop")
            .enable_all()
            .build()?;

        tracing::debug!(worker_threads = config.worker_threads, "Event loop started");

        Ok(Self {
            runtime,
            shutdown: Shutdown::new(),
        })
    }

    pub fn handle(&self) -> Handle {
        self.runtime.handle().clone()
    }

    pub fn shutdown(&self) -> &Shutdown {
        &self.shutdown
    }

    /// Run `future` to completion on the loop, blocking the current thread.
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    /// Block until the shutdown signal fires.
    pub fn run(&self) {
        let signalled = self.shutdown.signalled();
        self.runtime.block_on(signalled);
        tracing::info!("Event loop stopping");
    }

    /// Stop the loop, giving in-flight tasks up to `timeout` to finish.
    pub fn close(self, timeout: Duration) {
        self.shutdown.trigger();
        self.runtime.shutdown_timeout(timeout);
    }
}

impl std::fmt::Debug for EventLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventLoop")
            .field("shutdown", &self.shutdown.is_triggered())
            .finish_non_exhaustive()
    }
}
