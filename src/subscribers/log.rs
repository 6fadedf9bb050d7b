//! # LogWriter: events rendered through `tracing`
//!
//! A subscriber that turns every [`Event`] into a structured `tracing` record.
//! Install a `tracing-subscriber` in the binary to see them.
//!
//! ## Example output (fmt layer)
//! ```text
//! INFO  boot progress task="register room 1" progress=12
//! WARN  boot task failed task="display 2" reason="hook failed: no route"
//! WARN  heartbeat stalled, watchdog degraded gap_ms=10500
//! INFO  prompt shown prompt=prompt-7 room=room-2 surfaces=1
//! ```

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let task = e.task.as_deref().unwrap_or("");
        let reason = e.reason.as_deref().unwrap_or("");
        let room = e.room.map(|r| r.to_string()).unwrap_or_default();
        let prompt = e.prompt.map(|p| p.to_string()).unwrap_or_default();

        match e.kind {
            EventKind::SubscriberPanicked => {
                error!(subscriber = task, reason, "subscriber panicked")
            }
            EventKind::SubscriberOverflow => {
                warn!(subscriber = task, reason, "subscriber overflow")
            }
            EventKind::ShutdownRequested => info!(seq = e.seq, "shutdown requested"),
            EventKind::AllStoppedWithin => info!("all workers stopped within grace"),
            EventKind::GraceExceeded => error!("grace exceeded"),

            EventKind::BootWaitingForPanels => {
                info!(attempt = e.attempt, pending = reason, "waiting for panels")
            }
            EventKind::BootPanelsTimedOut => {
                warn!(pending = reason, "panels not connected, booting anyway")
            }
            EventKind::BootProgress => info!(task, progress = e.progress, "boot progress"),
            EventKind::BootTaskFailed => warn!(task, reason, "boot task failed"),
            EventKind::BootTaskStuck => {
                warn!(task, elapsed_ms = e.elapsed_ms, "boot task never completed")
            }
            EventKind::BootCompleted => info!("boot complete"),
            EventKind::BootAborted => warn!(started = e.attempt, "boot aborted by shutdown"),
            EventKind::ReconcileFailed => warn!(reason, "liveness reconciliation failed"),

            EventKind::WatchdogDegraded => {
                warn!(gap_ms = e.elapsed_ms, "heartbeat stalled, watchdog degraded")
            }
            EventKind::WatchdogRecovered => info!(gap_ms = e.elapsed_ms, "heartbeat recovered"),
            EventKind::WatchdogFatal => {
                error!(gap_ms = e.elapsed_ms, reason, "heartbeat dead, forcing restart")
            }

            EventKind::PromptQueued => debug!(%prompt, %room, title = task, "prompt queued"),
            EventKind::PromptShown => {
                info!(%prompt, %room, surfaces = e.surfaces, "prompt shown")
            }
            EventKind::PromptDemoted => info!(%prompt, %room, "prompt demoted"),
            EventKind::PromptActioned => info!(%prompt, %room, action = reason, "prompt actioned"),
            EventKind::PromptTimedOut => info!(%prompt, %room, "prompt timed out"),
            EventKind::PromptCancelled => info!(%prompt, %room, "prompt cancelled"),

            EventKind::SourceChanged => {
                let source = e.source.map(|s| s.to_string()).unwrap_or_default();
                info!(%room, %source, previous = reason, "source changed")
            }
            EventKind::SourceReselected => debug!(%room, "source reselected"),
            EventKind::SourceStarted => debug!(source = ?e.source, %room, "source in use"),
            EventKind::SourceEnded => debug!(source = ?e.source, %room, "source released"),
            EventKind::RoomJobQueued => debug!(%room, job = e.job, "room job queued"),
            EventKind::RoomJobStarted => debug!(%room, job = e.job, "room job started"),
            EventKind::RoomJobStepFailed => {
                warn!(%room, job = e.job, step = task, reason, "room job step failed")
            }
            EventKind::RoomJobFinished => {
                debug!(%room, job = e.job, elapsed_ms = e.elapsed_ms, "room job finished")
            }
            EventKind::RoomPoweredOff => info!(%room, reason, "room powered off"),
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
