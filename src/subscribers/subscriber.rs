//! # Subscribe: plug consumers into the runtime's event stream.
//!
//! Consoles, web dashboards and asset-fleet publishers implement [`Subscribe`]
//! and are handed to [`RuntimeBuilder::with_subscribers`](crate::RuntimeBuilder::with_subscribers).
//! The [`SubscriberSet`](crate::SubscriberSet) gives each one its own bounded
//! inbox and driver task, so a stalled dashboard can lose events but can never
//! hold up boot, prompts or room jobs.
//!
//! Events reach a subscriber one at a time, in bus order. A panic inside
//! `on_event` is caught and published as `SubscriberPanicked`; the next event is
//! delivered normally.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use roomvisor::{Event, EventKind, Subscribe};
//!
//! struct FleetStatus;
//!
//! #[async_trait]
//! impl Subscribe for FleetStatus {
//!     async fn on_event(&self, ev: &Event) {
//!         if matches!(ev.kind, EventKind::SourceStarted | EventKind::SourceEnded) {
//!             // push usage to the asset bus
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "fleet-status" }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Consumer of runtime events.
///
/// `on_event` runs on the subscriber's own task: await I/O freely, but do not
/// block the thread.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    async fn on_event(&self, event: &Event);

    /// Label used in logs and in `SubscriberOverflow` / `SubscriberPanicked` events.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Inbox size; events beyond it are dropped for this subscriber. Clamped to at least 1.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
