//! http-backend harness.
//!
//! Starts the event loop, initializes a backend, optionally fetches a URL
//! through it, then keeps a heartbeat ticking until Ctrl+C.
//!
//! ```text
//!     ┌──────────────────────── EventLoop ────────────────────────┐
//!     │                                                            │
//!     │   Heartbeat (every --interval)     Ctrl+C → Shutdown       │
//!     │                                                            │
//!     │   Backend ── async session ──┐                             │
//!     │          └── sync session ───┴── reqwest ──▶ origin        │
//!     └────────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use http_backend::config::{load_config, BackendConfig};
use http_backend::decorator::{DecoratorChain, RetryLayer, TracingLayer};
use http_backend::lifecycle::{signals, EventLoop, Heartbeat};
use http_backend::observability::{logging, metrics};
use http_backend::{Backend, Request};

#[derive(Parser, Debug)]
#[command(name = "http-backend", version, about = "HTTP backend harness")]
struct Cli {
    /// TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Heartbeat interval in seconds (overrides the config).
    #[arg(long)]
    interval: Option<u64>,

    /// Fetch this URL once at startup and log the reply.
    #[arg(long)]
    fetch: Option<String>,

    /// User agent for both sessions.
    #[arg(long, default_value = concat!("http-backend/", env!("CARGO_PKG_VERSION")))]
    user_agent: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => BackendConfig::default(),
    };
    if let Some(interval) = cli.interval {
        config.heartbeat.interval_secs = interval;
    }

    logging::init_logging(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "http-backend starting");

    let event_loop = EventLoop::new(&config.runtime)?;

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                let _guard = event_loop.handle().enter();
                metrics::init_metrics(addr);
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let mut backend = Backend::with_config(event_loop.handle(), config.clone());
    backend.init(&cli.user_agent)?;

    let mut chain = DecoratorChain::new();
    if config.retries.enabled {
        chain.push(RetryLayer::new(config.retries.clone()));
    }
    chain.push(TracingLayer);
    backend.set_decorator_factory(chain);

    if let Some(url) = &cli.fetch {
        let request = Request::get(url).build()?;
        match backend.request(request) {
            Ok(reply) => tracing::info!(
                url = %url,
                status = %reply.status,
                bytes = reply.body.len(),
                "Fetched"
            ),
            Err(e) => tracing::warn!(url = %url, error = %e, "Fetch failed"),
        }
    }

    let shutdown = event_loop.shutdown().clone();
    event_loop.handle().spawn(signals::shutdown_on_ctrl_c(shutdown.clone()));
    if config.heartbeat.enabled {
        let heartbeat = Heartbeat::new(Duration::from_secs(config.heartbeat.interval_secs));
        event_loop.handle().spawn(heartbeat.run(shutdown.subscribe()));
    }

    event_loop.run();

    backend.close();
    event_loop.close(Duration::from_secs(5));
    tracing::info!("Shutdown complete");
    Ok(())
}
