//! # Event subscribers for the roomvisor runtime.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`] fan-out and
//! built-in subscribers for events broadcast through the [`Bus`](crate::events::Bus).
//!
//! ## Architecture
//! ```text
//!   BootSequencer / Monitor loop / PromptArbiter / RoomJobs
//!         ── publish(Event) ──► Bus ──► Runtime::subscriber_listener
//!                                              │
//!                                       SubscriberSet::emit
//!                                    ┌─────────┼──────────────┐
//!                                    ▼         ▼              ▼
//!                               LogWriter  BootProgress    custom
//!                               (tracing)   Tracker      (dashboards,
//!                                                         asset bus)
//! ```
//!
//! ## Subscriber types
//! - **Passive subscribers** observe and react (logging, asset-fleet status)
//! - **Stateful subscribers** keep a snapshot derived from events ([`BootProgressTracker`])

mod progress;
mod set;
mod subscriber;

#[cfg(feature = "logging")]
mod log;

pub use progress::{BootProgress, BootProgressTracker};
pub use set::SubscriberSet;
pub use subscriber::Subscribe;

#[cfg(feature = "logging")]
pub use log::LogWriter;
