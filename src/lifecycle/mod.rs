//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     Load config → init logging → EventLoop (event_loop.rs)
//!         → Backend::init → Heartbeat (heartbeat.rs) on the loop
//!
//! Shutdown (shutdown.rs):
//!     Ctrl+C (signals.rs) → Shutdown::trigger
//!         → heartbeat and servers stop → EventLoop::close
//! ```
//!
//! # Design Decisions
//! - One loop per process; everything asynchronous runs on it
//! - Shutdown is a broadcast so any number of tasks can observe it
//! - Shutdown has timeout: in-flight work is abandoned after the deadline

pub mod event_loop;
pub mod heartbeat;
pub mod shutdown;
pub mod signals;

pub use event_loop::EventLoop;
pub use heartbeat::Heartbeat;
pub use shutdown::Shutdown;
