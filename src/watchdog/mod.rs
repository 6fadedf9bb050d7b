//! Liveness watchdog.
//!
//! - [`Heartbeat`] the last-alive stamp and its tick producer
//! - [`Watchdog`] hysteresis state machine evaluated by the monitor loop

mod heartbeat;
mod monitor;

pub use heartbeat::Heartbeat;
pub use monitor::{Thresholds, Watchdog, WatchdogState, next_state};
