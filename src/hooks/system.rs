//! # The owning system and the restart executor.

use async_trait::async_trait;

use crate::boot::InitTask;
use crate::error::HookError;
use crate::rooms::{Room, Source};

/// Why a room is being powered off; forwarded to `ShowHomePage`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PowerEvent {
    /// A user pressed power off on a panel.
    User,
    /// A schedule or timer fired.
    Schedule,
    /// An external controller or web request asked for it.
    Remote,
    /// The system itself decided (e.g. occupancy timeout).
    System,
}

/// # Deployment-specific system behavior.
///
/// The orchestration core is free-standing; a deployment implements this trait
/// over its own rooms, sources and devices.
///
/// - [`items_to_initialize`](System::items_to_initialize) is called once while
///   the [`Runtime`](crate::Runtime) is built; the tasks are run in the
///   returned order.
/// - The three `source_load_*` hooks are called by every room job, in order,
///   each inside its own failure boundary.
/// - [`source_started`](System::source_started) / [`source_ended`](System::source_ended)
///   are the device/asset notifications for a source's room count going
///   0 → 1 and back to 0. They run on the request path, under the
///   controller's switch lock, and must not block.
#[async_trait]
pub trait System: Send + Sync + 'static {
    /// Initialization steps for every managed entity, in boot order.
    fn items_to_initialize(&self) -> Vec<InitTask>;

    /// First lifecycle call of a room job; `source` is the incoming source.
    async fn source_load_started(
        &self,
        room: &Room,
        source: Option<&Source>,
    ) -> Result<(), HookError>;

    /// The slow, device-facing part of a source switch.
    async fn source_load_process(
        &self,
        room: &Room,
        previous: Option<&Source>,
        next: Option<&Source>,
    ) -> Result<(), HookError>;

    /// Last lifecycle call of a room job; runs even if the others failed.
    async fn source_load_ended(&self, room: &Room) -> Result<(), HookError>;

    /// Powers the room's equipment off.
    async fn power_off(&self, room: &Room, event: PowerEvent) -> Result<(), HookError>;

    /// A source became live in its first room. Start the device.
    fn source_started(&self, _source: &Source, _room: &Room) {}

    /// A source is no longer live in any room. Stop the device.
    fn source_ended(&self, _source: &Source, _room: &Room) {}

    /// One-time pass after boot that reports current liveness of every entity.
    async fn reconcile_liveness(&self) -> Result<(), HookError> {
        Ok(())
    }
}

/// Executes the watchdog's forced restart.
///
/// Reaching this is terminal for the controller process.
pub trait Restarter: Send + Sync + 'static {
    fn force_restart(&self) -> Result<(), HookError>;
}

/// Restarts by exiting the process and leaving the respawn to the service manager.
#[derive(Clone, Copy, Debug)]
pub struct ExitRestarter {
    /// Exit status used for the forced restart.
    pub code: i32,
}

impl Default for ExitRestarter {
    fn default() -> Self {
        Self { code: 70 }
    }
}

impl Restarter for ExitRestarter {
    fn force_restart(&self) -> Result<(), HookError> {
        tracing::error!(code = self.code, "watchdog forcing process restart");
        std::process::exit(self.code)
    }
}
