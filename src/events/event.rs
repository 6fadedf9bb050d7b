//! # Runtime events emitted by the orchestration core.
//!
//! The [`EventKind`] enum classifies event types across five categories:
//! - **Boot events**: panel wait, progress, per-task failures, completion/abort
//! - **Watchdog events**: degraded, recovered, fatal
//! - **Prompt events**: queued, shown, demoted, and the three terminal states
//! - **Room events**: source switching, in-use transitions, job lifecycle
//! - **Runtime events**: shutdown and subscriber health
//!
//! The [`Event`] struct carries additional metadata such as timestamps, the room,
//! source or prompt concerned, boot progress and human-readable reasons.
//!
//! ## Ordering guarantees
//! Each event gets a sequence number (`seq`) from the [`Bus`](crate::events::Bus)
//! that published it. Use `seq` to restore publish order.
//!
//! ## Example
//! ```rust
//! use roomvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::BootProgress)
//!     .with_task("register display 3")
//!     .with_progress(42);
//!
//! assert_eq!(ev.kind, EventKind::BootProgress);
//! assert_eq!(ev.task.as_deref(), Some("register display 3"));
//! assert_eq!(ev.progress, Some(42));
//! ```

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use crate::ids::{PromptId, RoomId, SourceId};

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets: `task` (subscriber name), `reason` (panic info).
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets: `task` (subscriber name), `reason` ("full" / "closed").
    SubscriberOverflow,

    // === Shutdown events ===
    /// Shutdown requested (OS signal or `Runtime::shutdown`).
    ShutdownRequested,

    /// All background workers stopped within the configured grace period.
    AllStoppedWithin,

    /// Grace period exceeded; some workers did not stop in time.
    GraceExceeded,

    // === Boot events ===
    /// Boot is waiting for panels that require a live connection.
    ///
    /// Sets: `attempt` (wait iteration, 1-based), `reason` (pending panel names).
    BootWaitingForPanels,

    /// The panel wait budget ran out; boot continues anyway.
    ///
    /// Sets: `reason` (panels still disconnected).
    BootPanelsTimedOut,

    /// A boot task is about to run.
    ///
    /// Sets: `task` (description), `progress` (0-100), `attempt` (1-based task index).
    BootProgress,

    /// A boot task action failed or panicked; the sequence continues.
    ///
    /// Sets: `task`, `reason`.
    BootTaskFailed,

    /// A boot task's completion predicate never reported done within the budget.
    ///
    /// Sets: `task`, `elapsed_ms`.
    BootTaskStuck,

    /// Every boot task ran; `progress` is 100.
    BootCompleted,

    /// Shutdown was signalled mid-boot; remaining tasks were skipped.
    ///
    /// Sets: `attempt` (tasks that had started).
    BootAborted,

    /// The post-boot liveness reconciliation hook failed.
    ///
    /// Sets: `reason`.
    ReconcileFailed,

    // === Watchdog events ===
    /// Heartbeat gap exceeded the degraded threshold.
    ///
    /// Sets: `elapsed_ms` (gap since the last tick).
    WatchdogDegraded,

    /// Heartbeat resumed after a degraded period.
    ///
    /// Sets: `elapsed_ms`.
    WatchdogRecovered,

    /// Heartbeat gap exceeded the fatal threshold; a forced restart was issued.
    ///
    /// Sets: `elapsed_ms`, `reason` (restart failure, if any).
    WatchdogFatal,

    // === Prompt events ===
    /// Prompt entered the registry in `Queued` state.
    ///
    /// Sets: `prompt`, `room` (room scope only), `task` (title).
    PromptQueued,

    /// Prompt became `Shown` on the surfaces of its scope.
    ///
    /// Sets: `prompt`, `room`, `surfaces` (how many it was shown on).
    PromptShown,

    /// Shown room prompt was pushed back to `Queued` by a system prompt.
    ///
    /// Sets: `prompt`, `room`.
    PromptDemoted,

    /// Prompt was answered.
    ///
    /// Sets: `prompt`, `room`, `reason` (chosen action name).
    PromptActioned,

    /// Prompt countdown reached zero while shown.
    ///
    /// Sets: `prompt`, `room`.
    PromptTimedOut,

    /// Prompt was cancelled by its owner.
    ///
    /// Sets: `prompt`, `room`.
    PromptCancelled,

    // === Room events ===
    /// Room's current source was replaced.
    ///
    /// Sets: `room`, `source` (new, if any), `reason` (previous source name, if any).
    SourceChanged,

    /// The requested source was already current; surfaces were refreshed instead.
    ///
    /// Sets: `room`, `source`.
    SourceReselected,

    /// A source's room count went 0 → 1.
    ///
    /// Sets: `source`, `room` (room that took it).
    SourceStarted,

    /// A source's room count went back to 0.
    ///
    /// Sets: `source`, `room` (room that released it).
    SourceEnded,

    /// A room job was accepted but waits behind a running job for the same room.
    ///
    /// Sets: `room`, `job`.
    RoomJobQueued,

    /// A room job started its lifecycle calls.
    ///
    /// Sets: `room`, `source`, `job`.
    RoomJobStarted,

    /// One lifecycle step of a room job failed; later steps still run.
    ///
    /// Sets: `room`, `task` (step name), `reason`, `job`.
    RoomJobStepFailed,

    /// A room job finished all three lifecycle calls.
    ///
    /// Sets: `room`, `job`, `elapsed_ms`.
    RoomJobFinished,

    /// Room power-off hook ran.
    ///
    /// Sets: `room`, `reason` (power event, or hook error).
    RoomPoweredOff,
}

/// Runtime event with optional metadata.
///
/// - `seq`: sequence stamped by the publishing bus
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Sequence number assigned at publish time (0 until published).
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Room concerned, if any.
    pub room: Option<RoomId>,
    /// Source concerned, if any.
    pub source: Option<SourceId>,
    /// Prompt concerned, if any.
    pub prompt: Option<PromptId>,
    /// Boot task description, prompt title, step or subscriber name.
    pub task: Option<Arc<str>>,
    /// Human-readable reason (errors, chosen action, overflow details).
    pub reason: Option<Arc<str>>,
    /// Boot progress percentage.
    pub progress: Option<u8>,
    /// Counter context: boot task index, panel wait iteration.
    pub attempt: Option<u32>,
    /// Room job id, as returned in [`JobHandle`](crate::JobHandle).
    pub job: Option<u64>,
    /// Number of surfaces a prompt was displayed on.
    pub surfaces: Option<u32>,
    /// Elapsed time or gap in milliseconds (compact).
    pub elapsed_ms: Option<u64>,
}

impl Event {
    /// Creates a new event of the given kind with the current timestamp.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: 0,
            at: SystemTime::now(),
            kind,
            room: None,
            source: None,
            prompt: None,
            task: None,
            reason: None,
            progress: None,
            attempt: None,
            job: None,
            surfaces: None,
            elapsed_ms: None,
        }
    }

    #[inline]
    pub fn with_room(mut self, room: RoomId) -> Self {
        self.room = Some(room);
        self
    }

    /// Attaches a room only when one is given (prompt scopes).
    #[inline]
    pub fn with_room_opt(mut self, room: Option<RoomId>) -> Self {
        self.room = room;
        self
    }

    #[inline]
    pub fn with_source(mut self, source: SourceId) -> Self {
        self.source = Some(source);
        self
    }

    #[inline]
    pub fn with_prompt(mut self, prompt: PromptId) -> Self {
        self.prompt = Some(prompt);
        self
    }

    /// Attaches a task description / name.
    #[inline]
    pub fn with_task(mut self, task: impl Into<Arc<str>>) -> Self {
        self.task = Some(task.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a progress percentage (clamped to 100).
    #[inline]
    pub fn with_progress(mut self, percent: u8) -> Self {
        self.progress = Some(percent.min(100));
        self
    }

    #[inline]
    pub fn with_attempt(mut self, n: u32) -> Self {
        self.attempt = Some(n);
        self
    }

    #[inline]
    pub fn with_job(mut self, job: u64) -> Self {
        self.job = Some(job);
        self
    }

    /// Attaches a surface count, saturating at `u32::MAX`.
    #[inline]
    pub fn with_surfaces(mut self, count: usize) -> Self {
        self.surfaces = Some(u32::try_from(count).unwrap_or(u32::MAX));
        self
    }

    /// Attaches an elapsed duration (stored as milliseconds).
    #[inline]
    pub fn with_elapsed(mut self, d: Duration) -> Self {
        self.elapsed_ms = Some(d.as_millis().min(u128::from(u64::MAX)) as u64);
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_task(subscriber)
            .with_reason(reason)
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_task(subscriber)
            .with_reason(info)
    }

    /// True for events produced by the subscriber machinery itself.
    #[inline]
    pub fn is_subscriber_health(&self) -> bool {
        matches!(
            self.kind,
            EventKind::SubscriberOverflow | EventKind::SubscriberPanicked
        )
    }
}
