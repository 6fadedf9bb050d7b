//! # roomvisor
//!
//! **Roomvisor** is the orchestration core of a building/room automation
//! controller. It boots the system in a fixed order, arbitrates user prompts
//! across panels and rooms, watches a liveness heartbeat, and runs every room's
//! source switch as a background job.
//!
//! Device drivers, UI rendering and configuration storage are not part of the
//! crate; deployments plug them in through the [`System`], [`UiSurface`] and
//! [`Restarter`] traits.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌─────────────────────────┐          ┌─────────────────────────┐
//!     │ System                  │          │ UiSurface × N           │
//!     │ (items_to_initialize,   │          │ (show_prompt,           │
//!     │  source_load_*, ...)    │          │  show_main_view, ...)   │
//!     └───────────┬─────────────┘          └────────────┬────────────┘
//!                 ▼                                     ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Runtime (owner)                                                  │
//! │  - Bus (broadcast events, bus-owned sequence numbers)             │
//! │  - SubscriberSet (fans out to user subscribers)                   │
//! │  - IdAllocator (room / source / prompt ids)                       │
//! └──────┬──────────────────┬──────────────────┬───────────────┬──────┘
//!        ▼                  ▼                  ▼               ▼
//!  ┌────────────┐   ┌────────────────┐   ┌──────────────┐  ┌──────────────┐
//!  │ Heartbeat  │   │ BootSequencer  │   │ RoomJob      │  │ PromptArbiter│
//!  │ tick (1s)  │   │ drains         │   │ Controller   │  │ (registry)   │
//!  └─────┬──────┘   │ TaskQueue      │   │ one job per  │  └──────┬───────┘
//!        │          └───────┬────────┘   │ source change│         │
//!        │                  │ completed  └──────────────┘         │
//!        │                  ▼                                     │
//!        │          ┌────────────────────────────────┐            │
//!        └─────────►│ monitor loop                   │◄───────────┘
//!                   │ Watchdog::check + arbitrate()  │
//!                   └────────────────────────────────┘
//! ```
//!
//! ### Source change
//! ```text
//! panel ──► RoomJobController::request_source_change(room, source)   (sync, any thread)
//!             ├─► room.current = source, room counts, SourceChanged
//!             └─► background job: load_started → load_process → load_ended
//!                   (each step contained; a failure never skips the next)
//! ```
//!
//! ## Features
//! | Area              | Description                                                       | Key types / traits                         |
//! |-------------------|-------------------------------------------------------------------|--------------------------------------------|
//! | **Boot**          | Ordered, delayed, failure-tolerant initialization with progress.  | [`InitTask`], [`TaskQueue`], [`BootSequencer`] |
//! | **Watchdog**      | Heartbeat gap → Healthy / Degraded / Fatal, forced restart.        | [`Heartbeat`], [`Watchdog`], [`Restarter`] |
//! | **Prompts**       | One shown prompt per scope, system preempts room, countdowns.      | [`PromptArbiter`], [`PromptRequest`]       |
//! | **Rooms**         | Non-blocking source switching, room counts, power off.             | [`RoomJobController`], [`OverlapPolicy`]   |
//! | **Subscriber API**| Hook into runtime events (logging, dashboards, asset status).      | [`Subscribe`], [`BootProgressTracker`]     |
//! | **Errors**        | Typed errors for the queue, hooks and the runtime.                 | [`QueueError`], [`HookError`], [`RuntimeError`] |
//! | **Configuration** | Centralize runtime settings.                                       | [`Config`]                                 |
//!
//! ## Optional features
//! - `logging`: exports the built-in [`LogWriter`] that renders events through `tracing`.
//!
//! ## Example
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use async_trait::async_trait;
//! use roomvisor::{
//!     Config, HookError, InitTask, PowerEvent, PromptRequest, Room, RuntimeBuilder, Source, System,
//! };
//!
//! struct Hall;
//!
//! #[async_trait]
//! impl System for Hall {
//!     fn items_to_initialize(&self) -> Vec<InitTask> {
//!         vec![
//!             InitTask::new("projector", || async { Ok(()) }),
//!             InitTask::new("audio dsp", || async { Ok(()) }).with_delay(Duration::from_secs(1)),
//!         ]
//!     }
//!     async fn source_load_started(&self, _: &Room, _: Option<&Source>) -> Result<(), HookError> { Ok(()) }
//!     async fn source_load_process(&self, _: &Room, _: Option<&Source>, _: Option<&Source>) -> Result<(), HookError> { Ok(()) }
//!     async fn source_load_ended(&self, _: &Room) -> Result<(), HookError> { Ok(()) }
//!     async fn power_off(&self, _: &Room, _: PowerEvent) -> Result<(), HookError> { Ok(()) }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     #[cfg(feature = "logging")]
//!     let subs: Vec<Arc<dyn roomvisor::Subscribe>> = vec![Arc::new(roomvisor::LogWriter::new())];
//!     #[cfg(not(feature = "logging"))]
//!     let subs: Vec<Arc<dyn roomvisor::Subscribe>> = Vec::new();
//!
//!     let runtime = RuntimeBuilder::new(Config::default(), Arc::new(Hall))
//!         .with_subscribers(subs)
//!         .build()?;
//!
//!     runtime.arbiter().request(
//!         PromptRequest::system("Building closes in 15 minutes").timeout_secs(30),
//!         |resp| println!("closing notice: {:?}", resp.state),
//!     );
//!     runtime.run().await?;
//!     Ok(())
//! }
//! ```
mod boot;
mod core;
mod error;
mod events;
mod hooks;
mod ids;
mod prompts;
mod rooms;
mod subscribers;
mod watchdog;

#[cfg(test)]
mod test_support;

// ---- Public re-exports ----

pub use boot::{
    BootOutcome, BootSequencer, BoxInitFuture, DEFAULT_QUEUE_CAPACITY, InitTask, TaskQueue,
};
pub use crate::core::{Config, Runtime, RuntimeBuilder};
pub use error::{HookError, QueueError, RuntimeError};
pub use events::{Bus, Event, EventKind};
pub use hooks::{ExitRestarter, PowerEvent, Restarter, Surfaces, System, UiSurface};
pub use ids::{IdAllocator, PromptId, RoomId, SourceId};
pub use prompts::{
    ActionType, Prompt, PromptAction, PromptArbiter, PromptCallback, PromptHandle, PromptRequest,
    PromptResponse, PromptScope, PromptState, UserContext,
};
pub use rooms::{
    JobHandle, JobReport, JobStep, OverlapPolicy, Room, RoomJobController, Source, SourceChange,
};
pub use subscribers::{BootProgress, BootProgressTracker, Subscribe, SubscriberSet};
pub use watchdog::{Heartbeat, Thresholds, Watchdog, WatchdogState, next_state};

// Optional: expose the built-in tracing subscriber.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
