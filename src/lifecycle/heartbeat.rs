//! Periodic heartbeat on the event loop.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::{self, MissedTickBehavior};

/// Shortest interval a heartbeat ticks at.
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Ticks at a fixed interval until shutdown, proving the loop is alive.
#[derive(Debug, Clone)]
pub struct Heartbeat {
    interval: Duration,
    beats: Arc<AtomicU64>,
}

impl Heartbeat {
    /// Intervals shorter than `MIN_INTERVAL` are raised to it.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(MIN_INTERVAL),
            beats: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Beats so far; shared between clones.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn beats(&self) -> u64 {
        self.beats.load(Ordering::Relaxed)
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(interval = ?self.interval, "Heartbeat starting");

        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let beat = self.beats.fetch_add(1, Ordering::Relaxed) + 1;
                    tracing::trace!(beat, "Heartbeat");
                }
                _ = shutdown.recv() => {
                    tracing::info!(beats = self.beats(), "Heartbeat stopped");
                    return;
                }
            }
        }
    }
}
