//! # SubscriberSet: per-subscriber queues between the bus and the consumers.
//!
//! ```text
//! emit(event) ── Arc<Event> ──┬─► inbox (bounded) ─► drive() ─► LogWriter::on_event
//!                             ├─► inbox (bounded) ─► drive() ─► BootProgressTracker::on_event
//!                             └─► inbox (bounded) ─► drive() ─► dashboard::on_event
//!                                                     └─ panic ─► SubscriberPanicked
//! ```
//!
//! `emit` only ever `try_send`s, so boot, prompt and room code never waits on a
//! console or dashboard. An inbox that is full or closed loses that one event
//! for that one subscriber; the loss is counted, logged and published as
//! `SubscriberOverflow` (except for subscriber-health events themselves, which
//! would otherwise feed back into the full inbox).

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::FutureExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::HookError;
use crate::events::{Bus, Event};
use crate::subscribers::Subscribe;

struct Inbox {
    name: &'static str,
    tx: mpsc::Sender<Arc<Event>>,
    dropped: AtomicU64,
}

/// Fans bus events out to every registered [`Subscribe`] implementor.
pub struct SubscriberSet {
    inboxes: Vec<Inbox>,
    drivers: Vec<JoinHandle<()>>,
    bus: Bus,
}

impl SubscriberSet {
    /// Spawns one driver task per subscriber. Must be called inside a tokio runtime.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>, bus: Bus) -> Self {
        let (inboxes, drivers): (Vec<Inbox>, Vec<JoinHandle<()>>) = subs
            .into_iter()
            .map(|sub| {
                let (tx, rx) = mpsc::channel(sub.queue_capacity().max(1));
                let inbox = Inbox {
                    name: sub.name(),
                    tx,
                    dropped: AtomicU64::new(0),
                };
                (inbox, tokio::spawn(drive(sub, rx, bus.clone())))
            })
            .unzip();
        Self {
            inboxes,
            drivers,
            bus,
        }
    }

    /// Queues `event` for every subscriber.
    pub fn emit(&self, event: &Event) {
        if self.inboxes.is_empty() {
            return;
        }
        self.emit_arc(Arc::new(event.clone()));
    }

    /// Queues a shared event for every subscriber without cloning it again.
    pub fn emit_arc(&self, event: Arc<Event>) {
        let health = event.is_subscriber_health();
        for inbox in &self.inboxes {
            let reason = match inbox.tx.try_send(Arc::clone(&event)) {
                Ok(()) => continue,
                Err(mpsc::error::TrySendError::Full(_)) => "full",
                Err(mpsc::error::TrySendError::Closed(_)) => "closed",
            };
            let dropped = inbox.dropped.fetch_add(1, Ordering::Relaxed) + 1;
            tracing::warn!(
                subscriber = inbox.name,
                reason,
                dropped,
                kind = ?event.kind,
                "subscriber lost an event"
            );
            if !health {
                self.bus
                    .publish(Event::subscriber_overflow(inbox.name, reason));
            }
        }
    }

    /// Events lost so far by the subscriber called `name`.
    pub fn dropped(&self, name: &str) -> Option<u64> {
        self.inboxes
            .iter()
            .find(|i| i.name == name)
            .map(|i| i.dropped.load(Ordering::Relaxed))
    }

    /// Closes every inbox and waits until the drivers have drained them.
    pub async fn shutdown(self) {
        drop(self.inboxes);
        for driver in self.drivers {
            let _ = driver.await;
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inboxes.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inboxes.len()
    }
}

/// Feeds one subscriber in FIFO order until its inbox closes.
async fn drive(sub: Arc<dyn Subscribe>, mut rx: mpsc::Receiver<Arc<Event>>, bus: Bus) {
    while let Some(ev) = rx.recv().await {
        let Err(payload) = AssertUnwindSafe(sub.on_event(&ev)).catch_unwind().await else {
            continue;
        };
        let info = match HookError::from_panic(payload) {
            HookError::Panicked { info } => info,
            other => other.to_string(),
        };
        tracing::error!(subscriber = sub.name(), %info, kind = ?ev.kind, "subscriber panicked");
        bus.publish(Event::subscriber_panicked(sub.name(), info));
    }
}
