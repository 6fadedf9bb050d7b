//! # Watchdog: heartbeat gap → Healthy / Degraded / Fatal.
//!
//! ## State machine
//! ```text
//!            gap > degraded_after              gap > fatal_after
//! Healthy ─────────────────────────► Degraded ─────────────────────► Fatal (terminal)
//!    ▲                                   │                          └─► Restarter::force_restart()
//!    └───────── gap < degraded_after ────┘
//! ```
//!
//! ## Rules
//! - At most one transition per check; the warning is published on entry only.
//! - A gap exactly equal to `degraded_after` changes nothing in either direction.
//! - Fatal is reached only from Degraded and is never left.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use super::heartbeat::Heartbeat;
use crate::events::{Bus, Event, EventKind};
use crate::hooks::{Restarter, contain_sync};

/// Liveness state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WatchdogState {
    Healthy,
    Degraded,
    Fatal,
}

/// Thresholds, both compared with strict `>`.
#[derive(Clone, Copy, Debug)]
pub struct Thresholds {
    pub degraded_after: Duration,
    pub fatal_after: Duration,
}

/// Next state for a heartbeat `gap` observed in `state`.
pub fn next_state(state: WatchdogState, gap: Duration, t: Thresholds) -> WatchdogState {
    match state {
        WatchdogState::Healthy if gap > t.degraded_after => WatchdogState::Degraded,
        WatchdogState::Degraded if gap > t.fatal_after => WatchdogState::Fatal,
        WatchdogState::Degraded if gap < t.degraded_after => WatchdogState::Healthy,
        other => other,
    }
}

/// Heartbeat watchdog, driven by the monitor loop.
pub struct Watchdog {
    heartbeat: Heartbeat,
    thresholds: Thresholds,
    state: WatchdogState,
    bus: Bus,
    restarter: Arc<dyn Restarter>,
}

impl Watchdog {
    pub fn new(
        heartbeat: Heartbeat,
        thresholds: Thresholds,
        bus: Bus,
        restarter: Arc<dyn Restarter>,
    ) -> Self {
        Self {
            heartbeat,
            thresholds,
            state: WatchdogState::Healthy,
            bus,
            restarter,
        }
    }

    pub fn state(&self) -> WatchdogState {
        self.state
    }

    /// Evaluates the heartbeat at the current instant.
    pub fn check(&mut self) -> WatchdogState {
        self.check_at(Instant::now())
    }

    /// Evaluates the heartbeat at `now`, publishing and escalating on transitions.
    pub fn check_at(&mut self, now: Instant) -> WatchdogState {
        let gap = self.heartbeat.since_last(now);
        let next = next_state(self.state, gap, self.thresholds);
        if next == self.state {
            return next;
        }
        self.state = next;

        match next {
            WatchdogState::Degraded => {
                self.bus
                    .publish(Event::new(EventKind::WatchdogDegraded).with_elapsed(gap));
            }
            WatchdogState::Healthy => {
                self.bus
                    .publish(Event::new(EventKind::WatchdogRecovered).with_elapsed(gap));
            }
            WatchdogState::Fatal => {
                let mut ev = Event::new(EventKind::WatchdogFatal).with_elapsed(gap);
                let restarter = Arc::clone(&self.restarter);
                match contain_sync(move || restarter.force_restart()) {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) | Err(e) => ev = ev.with_reason(e.to_string()),
                }
                self.bus.publish(ev);
            }
        }
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{CountingRestarter, drain};
    use std::sync::atomic::Ordering;
    use tokio::time;

    const T: Thresholds = Thresholds {
        degraded_after: Duration::from_secs(10),
        fatal_after: Duration::from_secs(600),
    };

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[test]
    fn transitions_happen_exactly_past_thresholds() {
        use WatchdogState::*;

        assert_eq!(next_state(Healthy, secs(10), T), Healthy);
        assert_eq!(next_state(Healthy, secs(10) + Duration::from_millis(1), T), Degraded);

        assert_eq!(next_state(Degraded, secs(600), T), Degraded);
        assert_eq!(next_state(Degraded, secs(600) + Duration::from_millis(1), T), Fatal);

        assert_eq!(next_state(Degraded, secs(10), T), Degraded);
        assert_eq!(next_state(Degraded, secs(9), T), Healthy);

        assert_eq!(next_state(Healthy, secs(700), T), Degraded);
        assert_eq!(next_state(Fatal, secs(0), T), Fatal);
    }

    #[tokio::test(start_paused = true)]
    async fn degrades_once_recovers_and_escalates() {
        let hb = Heartbeat::new();
        let bus = Bus::new(64);
        let mut rx = bus.subscribe();
        let restarter = Arc::new(CountingRestarter::default());
        let mut wd = Watchdog::new(hb.clone(), T, bus, restarter.clone());

        time::advance(secs(11)).await;
        assert_eq!(wd.check(), WatchdogState::Degraded);
        time::advance(secs(5)).await;
        assert_eq!(wd.check(), WatchdogState::Degraded);

        hb.tick();
        time::advance(secs(2)).await;
        assert_eq!(wd.check(), WatchdogState::Healthy);

        time::advance(secs(15)).await;
        assert_eq!(wd.check(), WatchdogState::Degraded);
        time::advance(secs(600)).await;
        assert_eq!(wd.check(), WatchdogState::Fatal);
        assert_eq!(wd.check(), WatchdogState::Fatal);
        assert_eq!(restarter.calls.load(Ordering::SeqCst), 1);

        let kinds: Vec<EventKind> = drain(&mut rx).into_iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                EventKind::WatchdogDegraded,
                EventKind::WatchdogRecovered,
                EventKind::WatchdogDegraded,
                EventKind::WatchdogFatal,
            ]
        );
    }
}
