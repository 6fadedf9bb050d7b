//! # Monitor loop: watchdog check + prompt arbitration on one worker.
//!
//! ```text
//! loop
//!   ├─► watchdog.check()
//!   ├─► arbiter.arbitrate()  → earliest prompt deadline
//!   └─► wait for the first of:
//!         - arbiter wake (prompt queued / resolved)
//!         - earliest deadline or idle tick
//!         - cancellation                     → exit
//! ```
//! A wake raised while a cycle is running is kept by `Notify` and ends the
//! next wait at once, so no request is missed.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

use crate::prompts::PromptArbiter;
use crate::watchdog::Watchdog;

pub(crate) async fn run(
    arbiter: Arc<PromptArbiter>,
    mut watchdog: Watchdog,
    idle_tick: Duration,
    token: CancellationToken,
) {
    loop {
        watchdog.check();
        let deadline = arbiter.arbitrate().await;

        let idle = Instant::now() + idle_tick;
        let wake_at = deadline.map_or(idle, |d| d.min(idle));
        tokio::select! {
            _ = token.cancelled() => break,
            _ = arbiter.notified() => {}
            _ = time::sleep_until(wake_at) => {}
        }
    }
}
