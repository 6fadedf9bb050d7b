//! # Global runtime configuration.
//!
//! Provides [`Config`], centralized settings for the boot sequencer, the
//! watchdog, the prompt arbiter, the room job controller and shutdown.
//!
//! ## Sentinel values
//! - `completion_timeout = 0s` → completion predicates are checked once, never polled
//! - `connect_wait_attempts = 0` → boot does not wait for panels

use std::ops::RangeInclusive;
use std::time::Duration;

use crate::boot::DEFAULT_QUEUE_CAPACITY;
use crate::rooms::OverlapPolicy;
use crate::watchdog::Thresholds;

/// Global configuration for the roomvisor runtime.
///
/// All fields are public. Prefer the helper accessors over re-deriving
/// clamping rules at call sites.
#[derive(Clone, Debug)]
pub struct Config {
    /// Maximum time to wait for background workers after shutdown is requested.
    pub grace: Duration,

    /// Capacity of the event bus ring buffer (minimum 1).
    pub bus_capacity: usize,

    /// Maximum number of boot tasks. Overflow is a configuration error.
    pub task_queue_capacity: usize,

    /// How many times boot checks for boot-gating panels before giving up.
    pub connect_wait_attempts: u32,

    /// Pause between panel connection checks.
    pub connect_wait_interval: Duration,

    /// Pause after a task that has no completion predicate.
    pub settle_delay: Duration,

    /// Poll period for completion predicates.
    pub completion_poll_interval: Duration,

    /// How long a completion predicate is polled before the task is reported stuck.
    pub completion_timeout: Duration,

    /// Range that per-task progress is scaled into. 100 is reserved for completion.
    pub progress_range: RangeInclusive<u8>,

    /// Period of the heartbeat tick producer.
    pub heartbeat_interval: Duration,

    /// Heartbeat gap (strictly greater) that degrades the watchdog.
    pub degraded_after: Duration,

    /// Heartbeat gap (strictly greater) that forces a restart.
    pub fatal_after: Duration,

    /// Monitor loop wake period when nothing else wakes it.
    pub arbiter_idle_tick: Duration,

    /// Pause between retracting room prompts and showing a system prompt.
    pub demote_grace: Duration,

    /// What happens when a room gets a source request while its job is running.
    pub overlap_policy: OverlapPolicy,
}

impl Config {
    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Progress reported when task `index` (0-based) of `total` starts.
    ///
    /// Scales `index / total` linearly into [`Config::progress_range`], never
    /// reaching 100 before completion.
    pub fn progress_for(&self, index: usize, total: usize) -> u8 {
        let lo = *self.progress_range.start();
        let hi = (*self.progress_range.end()).min(99).max(lo);
        if total == 0 {
            return lo;
        }
        let span = u64::from(hi - lo);
        let scaled = span * index.min(total) as u64 / total as u64;
        lo + scaled as u8
    }

    /// Watchdog thresholds taken from `degraded_after` / `fatal_after`.
    pub fn watchdog_thresholds(&self) -> Thresholds {
        Thresholds {
            degraded_after: self.degraded_after,
            fatal_after: self.fatal_after,
        }
    }
}

impl Default for Config {
    /// Defaults match a typical room controller deployment:
    ///
    /// - boot: 500 tasks, 30 × 1s panel wait, 500ms settle, 1s/300s completion polling
    /// - watchdog: 1s heartbeat, degraded > 10s, fatal > 600s
    /// - prompts: 2s idle tick, 500ms demote grace
    /// - rooms: serialized jobs per room
    fn default() -> Self {
        Self {
            grace: Duration::from_secs(10),
            bus_capacity: 1024,
            task_queue_capacity: DEFAULT_QUEUE_CAPACITY,
            connect_wait_attempts: 30,
            connect_wait_interval: Duration::from_secs(1),
            settle_delay: Duration::from_millis(500),
            completion_poll_interval: Duration::from_secs(1),
            completion_timeout: Duration::from_secs(300),
            progress_range: 10..=95,
            heartbeat_interval: Duration::from_secs(1),
            degraded_after: Duration::from_secs(10),
            fatal_after: Duration::from_secs(600),
            arbiter_idle_tick: Duration::from_secs(2),
            demote_grace: Duration::from_millis(500),
            overlap_policy: OverlapPolicy::default(),
        }
    }
}
