//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to events emitted by the boot sequencer, the watchdog,
//! the prompt arbiter, the room job controller and the subscriber workers.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast` that stamps sequence numbers
//!
//! ## Quick reference
//! - **Publishers**: `BootSequencer`, `Watchdog` (via the monitor loop),
//!   `PromptArbiter`, `RoomJobController`, `Runtime`, `SubscriberSet` workers.
//! - **Consumers**: `Runtime::subscriber_listener()` (fans out to `SubscriberSet`),
//!   plus anyone holding a receiver from [`Bus::subscribe`] (tests, dashboards).

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
