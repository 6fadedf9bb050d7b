//! # BootSequencer: ordered, delayed, failure-tolerant initialization.
//!
//! Drains a [`TaskQueue`] on its own worker, one task at a time, publishing
//! coarse progress on the [`Bus`].
//!
//! ## Flow
//! ```text
//! run(token)
//!   ├─► wait for boot-gating panels (attempts × interval, abort on shutdown)
//!   ├─► loop while queue non-empty:
//!   │     ├─► publish BootProgress{ task, progress }
//!   │     ├─► sleep(delay_before_run)                 (cancellable)
//!   │     ├─► action()  ── Err/panic ─► BootTaskFailed, continue
//!   │     └─► completion check?
//!   │           ├─ yes ─► poll every 1s up to 300s ─► BootTaskStuck on budget
//!   │           └─ no  ─► sleep(settle_delay)         (cancellable)
//!   └─► queue empty:
//!         ├─► mark complete, publish BootCompleted(100)
//!         ├─► surface.show_main_view() for every surface
//!         └─► system.reconcile_liveness()
//! ```
//!
//! ## Rules
//! - Every dequeued task's action runs exactly once, in enqueue order, even if
//!   earlier actions failed.
//! - A running action is never cancelled; shutdown is observed between steps and
//!   during every sleep. Once observed, no further action runs and completion is
//!   never reported.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

use super::queue::TaskQueue;
use super::task::CompletionCheck;
use crate::core::Config;
use crate::events::{Bus, Event, EventKind};
use crate::hooks::{Surfaces, System, contain, contain_sync};

/// How a boot run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BootOutcome {
    /// The queue was drained.
    Completed {
        /// Tasks whose action ran.
        ran: usize,
        /// Tasks whose action failed or panicked.
        failed: usize,
        /// Tasks whose completion predicate never reported done.
        stuck: usize,
    },
    /// Shutdown was observed before the queue was drained.
    Aborted {
        /// Tasks whose action had started.
        started: usize,
        /// Tasks in the queue when the run began.
        total: usize,
    },
}

impl BootOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, BootOutcome::Completed { .. })
    }
}

enum Poll {
    Done,
    Stuck(Duration),
    Cancelled,
}

/// Drains the boot queue.
pub struct BootSequencer {
    queue: TaskQueue,
    cfg: Config,
    bus: Bus,
    surfaces: Arc<Surfaces>,
    system: Arc<dyn System>,
    complete: Arc<AtomicBool>,
}

impl BootSequencer {
    pub fn new(
        queue: TaskQueue,
        cfg: Config,
        bus: Bus,
        surfaces: Arc<Surfaces>,
        system: Arc<dyn System>,
    ) -> Self {
        Self {
            queue,
            cfg,
            bus,
            surfaces,
            system,
            complete: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Shared flag that turns true when boot completes.
    pub fn completion_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.complete)
    }

    /// Runs the whole boot sequence until the queue is drained or `token` is cancelled.
    pub async fn run(self, token: CancellationToken) -> BootOutcome {
        let total = self.queue.len();

        if !self.wait_for_panels(&token).await {
            return self.abort(0, total);
        }

        let mut started = 0usize;
        let mut failed = 0usize;
        let mut stuck = 0usize;

        while let Some(task) = self.queue.dequeue() {
            if token.is_cancelled() {
                return self.abort(started, total);
            }
            let (description, delay, action, check) = task.into_parts();

            self.bus.publish(
                Event::new(EventKind::BootProgress)
                    .with_task(Arc::clone(&description))
                    .with_progress(self.cfg.progress_for(started, total))
                    .with_attempt(started as u32 + 1),
            );

            if !delay.is_zero() && !sleep_or_cancel(delay, &token).await {
                return self.abort(started, total);
            }

            started += 1;
            if let Err(e) = contain(async move { action().await }).await {
                failed += 1;
                self.bus.publish(
                    Event::new(EventKind::BootTaskFailed)
                        .with_task(Arc::clone(&description))
                        .with_reason(e.to_string()),
                );
            }

            let settled = match check {
                Some(check) => match self.poll_completion(check, &token).await {
                    Poll::Done => true,
                    Poll::Stuck(elapsed) => {
                        stuck += 1;
                        self.bus.publish(
                            Event::new(EventKind::BootTaskStuck)
                                .with_task(Arc::clone(&description))
                                .with_elapsed(elapsed),
                        );
                        true
                    }
                    Poll::Cancelled => false,
                },
                None => sleep_or_cancel(self.cfg.settle_delay, &token).await,
            };
            if !settled {
                return self.abort(started, total);
            }
        }

        if token.is_cancelled() {
            return self.abort(started, total);
        }
        self.finish().await;
        BootOutcome::Completed {
            ran: started,
            failed,
            stuck,
        }
    }

    /// Waits for boot-gating panels. Returns false if shutdown was observed.
    async fn wait_for_panels(&self, token: &CancellationToken) -> bool {
        for attempt in 1..=self.cfg.connect_wait_attempts {
            if token.is_cancelled() {
                return false;
            }
            let pending = self.surfaces.pending_boot_connections();
            if pending.is_empty() {
                return true;
            }
            self.bus.publish(
                Event::new(EventKind::BootWaitingForPanels)
                    .with_attempt(attempt)
                    .with_reason(pending.join(", ")),
            );
            if !sleep_or_cancel(self.cfg.connect_wait_interval, token).await {
                return false;
            }
        }

        if token.is_cancelled() {
            return false;
        }
        let pending = self.surfaces.pending_boot_connections();
        if !pending.is_empty() {
            self.bus.publish(
                Event::new(EventKind::BootPanelsTimedOut).with_reason(pending.join(", ")),
            );
        }
        true
    }

    /// Polls `check` once per interval until it reports done or the budget runs out.
    async fn poll_completion(&self, check: CompletionCheck, token: &CancellationToken) -> Poll {
        let started = Instant::now();
        loop {
            match contain_sync(|| check()) {
                Ok(true) => return Poll::Done,
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "completion check panicked");
                    return Poll::Stuck(started.elapsed());
                }
            }
            let elapsed = started.elapsed();
            if elapsed >= self.cfg.completion_timeout {
                return Poll::Stuck(elapsed);
            }
            if !sleep_or_cancel(self.cfg.completion_poll_interval, token).await {
                return Poll::Cancelled;
            }
        }
    }

    fn abort(&self, started: usize, total: usize) -> BootOutcome {
        self.bus
            .publish(Event::new(EventKind::BootAborted).with_attempt(started as u32));
        BootOutcome::Aborted { started, total }
    }

    async fn finish(&self) {
        self.complete.store(true, Ordering::Release);
        self.bus
            .publish(Event::new(EventKind::BootCompleted).with_progress(100));

        for surface in self.surfaces.all() {
            if let Err(e) = contain_sync(|| surface.show_main_view()) {
                tracing::warn!(surface = surface.name(), error = %e, "show_main_view failed");
            }
        }

        if let Err(e) = contain(self.system.reconcile_liveness()).await {
            self.bus
                .publish(Event::new(EventKind::ReconcileFailed).with_reason(e.to_string()));
        }
    }
}

/// Sleeps for `d`; returns false if `token` was cancelled first.
async fn sleep_or_cancel(d: Duration, token: &CancellationToken) -> bool {
    tokio::select! {
        _ = time::sleep(d) => true,
        _ = token.cancelled() => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boot::InitTask;
    use crate::error::HookError;
    use crate::hooks::UiSurface;
    use crate::test_support::{FakeSurface, NullSystem, drain};
    use parking_lot::Mutex;
    use std::sync::atomic::AtomicUsize;

    fn sequencer(queue: TaskQueue, surfaces: Vec<Arc<FakeSurface>>) -> (BootSequencer, Bus) {
        let bus = Bus::new(256);
        let surfaces = Arc::new(Surfaces::new(
            surfaces
                .into_iter()
                .map(|s| s as Arc<dyn UiSurface>)
                .collect(),
        ));
        let seq = BootSequencer::new(
            queue,
            Config::default(),
            bus.clone(),
            surfaces,
            Arc::new(NullSystem::default()),
        );
        (seq, bus)
    }

    fn recording(log: &Arc<Mutex<Vec<usize>>>, i: usize, fail: bool) -> InitTask {
        let log = Arc::clone(log);
        InitTask::new(format!("task {i}"), move || async move {
            log.lock().push(i);
            if fail {
                Err(HookError::failed(format!("task {i} broke")))
            } else {
                Ok(())
            }
        })
    }

    #[tokio::test(start_paused = true)]
    async fn every_action_runs_in_order_even_when_all_fail() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let queue = TaskQueue::new(16);
        for i in 0..5 {
            queue.enqueue(recording(&log, i, true)).unwrap();
        }
        let (seq, bus) = sequencer(queue, vec![]);
        let mut rx = bus.subscribe();

        let outcome = seq.run(CancellationToken::new()).await;
        assert_eq!(
            outcome,
            BootOutcome::Completed {
                ran: 5,
                failed: 5,
                stuck: 0
            }
        );
        assert_eq!(*log.lock(), vec![0, 1, 2, 3, 4]);

        let kinds: Vec<EventKind> = drain(&mut rx).into_iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds.iter().filter(|k| **k == EventKind::BootTaskFailed).count(),
            5
        );
        assert_eq!(kinds.last(), Some(&EventKind::BootCompleted));
    }

    #[tokio::test(start_paused = true)]
    async fn panicking_action_does_not_halt_sequence() {
        let ran = Arc::new(AtomicUsize::new(0));
        let queue = TaskQueue::new(4);
        queue
            .enqueue(InitTask::new("explodes", || async {
                panic!("driver exploded")
            }))
            .unwrap();
        let r = Arc::clone(&ran);
        queue
            .enqueue(InitTask::new("after", move || async move {
                r.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }))
            .unwrap();

        let (seq, _bus) = sequencer(queue, vec![]);
        let outcome = seq.run(CancellationToken::new()).await;
        assert_eq!(
            outcome,
            BootOutcome::Completed {
                ran: 2,
                failed: 1,
                stuck: 0
            }
        );
        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_mid_sequence_skips_the_rest() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let token = CancellationToken::new();
        let queue = TaskQueue::new(8);
        for i in 0..2 {
            queue.enqueue(recording(&log, i, false)).unwrap();
        }
        let t = token.clone();
        queue
            .enqueue(InitTask::new("pull the plug", move || async move {
                t.cancel();
                Ok(())
            }))
            .unwrap();
        for i in 3..6 {
            queue.enqueue(recording(&log, i, false)).unwrap();
        }

        let (seq, bus) = sequencer(queue, vec![]);
        let flag = seq.completion_flag();
        let mut rx = bus.subscribe();

        let outcome = seq.run(token).await;
        assert_eq!(
            outcome,
            BootOutcome::Aborted {
                started: 3,
                total: 6
            }
        );
        assert_eq!(*log.lock(), vec![0, 1]);
        assert!(!flag.load(Ordering::Acquire));

        let kinds: Vec<EventKind> = drain(&mut rx).into_iter().map(|e| e.kind).collect();
        assert!(!kinds.contains(&EventKind::BootCompleted));
        assert_eq!(kinds.last(), Some(&EventKind::BootAborted));
    }

    #[tokio::test(start_paused = true)]
    async fn stuck_completion_check_is_reported_after_budget() {
        let queue = TaskQueue::new(4);
        queue
            .enqueue(InitTask::new("never ready", || async { Ok(()) }).with_completion(|| false))
            .unwrap();
        let (seq, bus) = sequencer(queue, vec![]);
        let mut rx = bus.subscribe();

        let start = Instant::now();
        let outcome = seq.run(CancellationToken::new()).await;
        assert_eq!(
            outcome,
            BootOutcome::Completed {
                ran: 1,
                failed: 0,
                stuck: 1
            }
        );
        let waited = start.elapsed();
        assert!(waited >= Duration::from_secs(300), "waited {waited:?}");
        assert!(waited < Duration::from_secs(302), "waited {waited:?}");

        let stuck = drain(&mut rx)
            .into_iter()
            .find(|e| e.kind == EventKind::BootTaskStuck)
            .expect("stuck event");
        assert_eq!(stuck.task.as_deref(), Some("never ready"));
    }

    #[tokio::test(start_paused = true)]
    async fn completion_check_polled_until_done() {
        let polls = Arc::new(AtomicUsize::new(0));
        let p = Arc::clone(&polls);
        let queue = TaskQueue::new(4);
        queue
            .enqueue(
                InitTask::new("warming up", || async { Ok(()) })
                    .with_delay(Duration::from_secs(2))
                    .with_completion(move || p.fetch_add(1, Ordering::SeqCst) >= 3),
            )
            .unwrap();
        let (seq, _bus) = sequencer(queue, vec![]);

        let start = Instant::now();
        let outcome = seq.run(CancellationToken::new()).await;
        assert!(outcome.is_completed());
        assert_eq!(polls.load(Ordering::SeqCst), 4);
        // 2s delay + 3 poll intervals
        assert_eq!(start.elapsed(), Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn waits_for_gating_panels_then_shows_main_view() {
        let panel = FakeSurface::new("lobby panel", None).gating(false);
        let other = FakeSurface::new("board room", None);
        let p = Arc::clone(&panel);
        tokio::spawn(async move {
            time::sleep(Duration::from_millis(3500)).await;
            p.set_connected(true);
        });

        let queue = TaskQueue::new(4);
        queue
            .enqueue(InitTask::new("only", || async { Ok(()) }))
            .unwrap();
        let (seq, bus) = sequencer(queue, vec![Arc::clone(&panel), Arc::clone(&other)]);
        let mut rx = bus.subscribe();

        let outcome = seq.run(CancellationToken::new()).await;
        assert!(outcome.is_completed());

        let waits = drain(&mut rx)
            .into_iter()
            .filter(|e| e.kind == EventKind::BootWaitingForPanels)
            .count();
        assert_eq!(waits, 4);
        assert_eq!(panel.main_views(), 1);
        assert_eq!(other.main_views(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_during_panel_wait_aborts_before_any_task() {
        let panel = FakeSurface::new("offline", None).gating(false);
        let ran = Arc::new(AtomicUsize::new(0));
        let r = Arc::clone(&ran);
        let queue = TaskQueue::new(4);
        queue
            .enqueue(InitTask::new("never", move || async move {
                r.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }))
            .unwrap();
        let (seq, _bus) = sequencer(queue, vec![panel]);

        let token = CancellationToken::new();
        let t = token.clone();
        tokio::spawn(async move {
            time::sleep(Duration::from_secs(5)).await;
            t.cancel();
        });

        let outcome = seq.run(token).await;
        assert_eq!(
            outcome,
            BootOutcome::Aborted {
                started: 0,
                total: 1
            }
        );
        assert_eq!(ran.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn progress_is_published_per_task() {
        let queue = TaskQueue::new(4);
        for name in ["a", "b", "c", "d"] {
            queue
                .enqueue(InitTask::new(name, || async { Ok(()) }))
                .unwrap();
        }
        let (seq, bus) = sequencer(queue, vec![]);
        let mut rx = bus.subscribe();
        seq.run(CancellationToken::new()).await;

        let progress: Vec<u8> = drain(&mut rx)
            .into_iter()
            .filter(|e| matches!(e.kind, EventKind::BootProgress | EventKind::BootCompleted))
            .filter_map(|e| e.progress)
            .collect();
        assert_eq!(progress, vec![10, 31, 52, 73, 100]);
    }
}
