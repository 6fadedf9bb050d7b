//! Room job results.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;

use super::room::{Room, Source};
use crate::error::HookError;
use crate::ids::{RoomId, SourceId};

/// One of the three lifecycle calls a room job makes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum JobStep {
    LoadStarted,
    LoadProcess,
    LoadEnded,
}

impl JobStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStep::LoadStarted => "source_load_started",
            JobStep::LoadProcess => "source_load_process",
            JobStep::LoadEnded => "source_load_ended",
        }
    }
}

/// What a finished room job did.
#[derive(Clone, Debug)]
pub struct JobReport {
    pub room: RoomId,
    /// Job number, unique per controller.
    pub job: u64,
    pub previous: Option<SourceId>,
    pub next: Option<SourceId>,
    /// Steps that failed or panicked; the other steps still ran.
    pub failed: Vec<(JobStep, HookError)>,
    pub elapsed: Duration,
}

impl JobReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Awaitable handle to a scheduled room job.
#[derive(Debug)]
pub struct JobHandle {
    pub(crate) room: RoomId,
    pub(crate) job: u64,
    pub(crate) rx: oneshot::Receiver<JobReport>,
}

impl JobHandle {
    pub fn room(&self) -> RoomId {
        self.room
    }

    pub fn job(&self) -> u64 {
        self.job
    }

    /// Waits for the job to finish.
    ///
    /// `None` if the job was dropped unrun (controller stopped first).
    pub async fn wait(self) -> Option<JobReport> {
        self.rx.await.ok()
    }
}

/// Result of [`RoomJobController::request_source_change`](crate::RoomJobController::request_source_change).
#[derive(Debug)]
#[must_use = "the handle reports when the devices have switched"]
pub enum SourceChange {
    /// The source was already current; the panels were refreshed and no job runs.
    Reselected,
    /// A background job was scheduled.
    Scheduled(JobHandle),
}

impl SourceChange {
    pub fn into_handle(self) -> Option<JobHandle> {
        match self {
            SourceChange::Reselected => None,
            SourceChange::Scheduled(h) => Some(h),
        }
    }
}

/// A scheduled job waiting to run.
pub(crate) struct Job {
    pub(crate) id: u64,
    pub(crate) room: Arc<Room>,
    pub(crate) previous: Option<Arc<Source>>,
    pub(crate) next: Option<Arc<Source>>,
    pub(crate) report: oneshot::Sender<JobReport>,
}
