//! # Heartbeat: the "last alive" stamp.
//!
//! One producer (the tick task) writes, one consumer (the monitor loop) reads.
//! The stamp is a single `AtomicU64` of milliseconds since the heartbeat was
//! created, so no lock is involved.
//!
//! Time comes from `tokio::time::Instant`, which makes the heartbeat fully
//! controllable in paused-clock tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

/// Shared last-alive stamp.
#[derive(Clone, Debug)]
pub struct Heartbeat {
    epoch: Instant,
    last_ms: Arc<AtomicU64>,
}

impl Heartbeat {
    /// Creates a heartbeat stamped "alive now".
    #[must_use]
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
            last_ms: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Stamps "alive" at the current instant.
    pub fn tick(&self) {
        self.tick_at(Instant::now());
    }

    /// Stamps "alive" at `now`.
    pub fn tick_at(&self, now: Instant) {
        let ms = now.saturating_duration_since(self.epoch).as_millis() as u64;
        self.last_ms.store(ms, Ordering::Release);
    }

    /// Instant of the last tick.
    pub fn last_tick(&self) -> Instant {
        self.epoch + Duration::from_millis(self.last_ms.load(Ordering::Acquire))
    }

    /// Gap between the last tick and `now` (zero if `now` is earlier).
    pub fn since_last(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_tick())
    }

    /// Tick producer: one stamp per `interval` until `token` is cancelled.
    pub async fn run_ticker(self, interval: Duration, token: CancellationToken) {
        loop {
            self.tick();
            tokio::select! {
                _ = time::sleep(interval) => {}
                _ = token.cancelled() => break,
            }
        }
    }

    /// Spawns [`run_ticker`](Self::run_ticker) on the current runtime.
    pub fn spawn_ticker(&self, interval: Duration, token: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.clone().run_ticker(interval, token))
    }
}

impl Default for Heartbeat {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn gap_grows_until_next_tick() {
        let hb = Heartbeat::new();
        time::advance(Duration::from_secs(4)).await;
        assert_eq!(hb.since_last(Instant::now()), Duration::from_secs(4));

        hb.tick();
        assert_eq!(hb.since_last(Instant::now()), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn ticker_keeps_gap_small_and_stops_on_cancel() {
        let hb = Heartbeat::new();
        let token = CancellationToken::new();
        let handle = hb.spawn_ticker(Duration::from_secs(1), token.clone());

        time::sleep(Duration::from_millis(5500)).await;
        assert!(hb.since_last(Instant::now()) <= Duration::from_secs(1));

        token.cancel();
        handle.await.expect("ticker joins");
        time::sleep(Duration::from_secs(30)).await;
        assert!(hb.since_last(Instant::now()) >= Duration::from_secs(29));
    }
}
