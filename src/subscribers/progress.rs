//! # BootProgressTracker: last known boot progress
//!
//! Keeps the most recent `(message, percent, complete)` triple derived from
//! boot events, so a console or web dashboard can render progress without
//! holding its own bus receiver.
//!
//! ## Internal scheme
//! ```text
//! on_event(ev):
//!   ├─ BootWaitingForPanels → message="waiting for panels"
//!   ├─ BootProgress         → message=task,  percent=ev.progress
//!   ├─ BootCompleted        → percent=100, complete=true
//!   ├─ BootAborted          → message="boot aborted"
//!   └─ otherwise: ignore
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Snapshot of boot progress.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BootProgress {
    /// What the sequencer is doing.
    pub message: Arc<str>,
    /// Coarse progress, 0-100.
    pub percent: u8,
    /// True once every boot task ran.
    pub complete: bool,
}

/// Tracks the latest boot progress.
pub struct BootProgressTracker {
    inner: RwLock<BootProgress>,
}

impl BootProgressTracker {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(BootProgress {
                message: Arc::from("not started"),
                percent: 0,
                complete: false,
            }),
        }
    }

    /// Returns a copy of the latest progress.
    #[must_use]
    pub fn snapshot(&self) -> BootProgress {
        self.inner.read().clone()
    }

    fn apply(&self, ev: &Event) {
        let mut g = self.inner.write();
        match ev.kind {
            EventKind::BootWaitingForPanels => {
                g.message = Arc::from("waiting for panels");
            }
            EventKind::BootProgress => {
                if let Some(task) = &ev.task {
                    g.message = Arc::clone(task);
                }
                if let Some(p) = ev.progress {
                    g.percent = p;
                }
            }
            EventKind::BootCompleted => {
                g.message = Arc::from("boot complete");
                g.percent = 100;
                g.complete = true;
            }
            EventKind::BootAborted => {
                g.message = Arc::from("boot aborted");
            }
            _ => {}
        }
    }
}

impl Default for BootProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Subscribe for BootProgressTracker {
    async fn on_event(&self, ev: &Event) {
        self.apply(ev);
    }

    fn name(&self) -> &'static str {
        "BootProgressTracker"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn follows_boot_events() {
        let t = BootProgressTracker::new();
        assert_eq!(t.snapshot().percent, 0);

        t.apply(
            &Event::new(EventKind::BootProgress)
                .with_task("init room")
                .with_progress(40),
        );
        let s = t.snapshot();
        assert_eq!(&*s.message, "init room");
        assert_eq!(s.percent, 40);
        assert!(!s.complete);

        t.apply(&Event::new(EventKind::PromptShown));
        assert_eq!(t.snapshot().percent, 40);

        t.apply(&Event::new(EventKind::BootCompleted).with_progress(100));
        let s = t.snapshot();
        assert_eq!(s.percent, 100);
        assert!(s.complete);
    }
}
