//! # Bus: the runtime's single event stream.
//!
//! Boot, watchdog, prompt and room code all publish here, often from plain
//! synchronous calls made on UI threads, so publishing must never wait.
//!
//! ```text
//!   BootSequencer ──┐
//!   PromptArbiter ──┼──► Bus (tokio broadcast) ──► subscriber_listener ──► SubscriberSet
//!   RoomJobs      ──┤                          └─► test / dashboard receivers
//!   Monitor loop  ──┘
//! ```
//!
//! ## Rules
//! - `publish()` stamps the bus's own sequence counter and calls `broadcast::Sender::send`.
//! - A receiver that falls behind the ring sees `RecvError::Lagged(n)` and loses the `n` oldest events.
//! - With no receiver attached, published events are simply gone.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::broadcast;

use super::event::Event;

/// Cloneable handle to the event stream; clones share the ring and the sequence counter.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
    seq: Arc<AtomicU64>,
}

impl Bus {
    /// Creates a new bus with the given channel capacity (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, _rx) = broadcast::channel::<Event>(capacity);
        Self {
            tx,
            seq: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Stamps the next sequence number and publishes to all active receivers.
    ///
    /// If there are no receivers, the event is dropped.
    pub fn publish(&self, mut ev: Event) {
        ev.seq = self.seq.fetch_add(1, Ordering::Relaxed) + 1;
        let _ = self.tx.send(ev);
    }

    /// Receiver for events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }

    /// Number of events published so far.
    pub fn published(&self) -> u64 {
        self.seq.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;

    #[tokio::test]
    async fn publish_stamps_increasing_sequence() {
        let bus = Bus::new(8);
        let mut rx = bus.subscribe();

        bus.publish(Event::new(EventKind::BootCompleted));
        bus.publish(Event::new(EventKind::ShutdownRequested));

        let a = rx.recv().await.expect("first");
        let b = rx.recv().await.expect("second");
        assert_eq!(a.seq, 1);
        assert_eq!(b.seq, 2);
        assert_eq!(bus.published(), 2);
    }

    #[test]
    fn publish_without_receivers_is_silent() {
        let bus = Bus::new(0);
        bus.publish(Event::new(EventKind::BootCompleted));
        assert_eq!(bus.published(), 1);
    }
}
