//! # Runtime: owns the orchestration workers and shuts them down gracefully.
//!
//! The [`Runtime`] owns the event bus, the [`SubscriberSet`], the prompt
//! arbiter, the room job controller and the boot sequencer. [`Runtime::run`]
//! starts every background worker and returns once they stopped after a
//! shutdown request.
//!
//! ## Workers
//! ```text
//! run()
//!   ├─ subscriber listener: Bus.subscribe() ─► SubscriberSet::emit(&Event)
//!   ├─ "heartbeat": Heartbeat::run_ticker(heartbeat_interval)
//!   ├─ "rooms":     RoomJobController::run()        (drives room jobs)
//!   └─ "monitor":   BootSequencer::run()
//!                     ├─ Completed ─► monitor loop (watchdog + arbiter)
//!                     └─ Aborted   ─► exit
//!
//! Shutdown path:
//!   OS signal | Runtime::shutdown()
//!     └─► Bus.publish(ShutdownRequested)
//!     └─► runtime token cancel → child token of every worker
//!     └─► wait up to cfg.grace:
//!           ├─ all joined → AllStoppedWithin, Ok(())
//!           └─ timeout    → GraceExceeded, Err(GraceExceeded{stuck workers})
//! ```
//!
//! ## Example
//! ```rust,no_run
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use roomvisor::{Config, HookError, InitTask, PowerEvent, Room, RuntimeBuilder, Source, System};
//!
//! struct Building;
//!
//! #[async_trait]
//! impl System for Building {
//!     fn items_to_initialize(&self) -> Vec<InitTask> {
//!         vec![InitTask::new("matrix switcher", || async { Ok(()) })]
//!     }
//!     async fn source_load_started(&self, _: &Room, _: Option<&Source>) -> Result<(), HookError> { Ok(()) }
//!     async fn source_load_process(&self, _: &Room, _: Option<&Source>, _: Option<&Source>) -> Result<(), HookError> { Ok(()) }
//!     async fn source_load_ended(&self, _: &Room) -> Result<(), HookError> { Ok(()) }
//!     async fn power_off(&self, _: &Room, _: PowerEvent) -> Result<(), HookError> { Ok(()) }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let runtime = RuntimeBuilder::new(Config::default(), Arc::new(Building)).build()?;
//!     let lobby = runtime.rooms().add_room("Lobby");
//!     let signage = runtime.rooms().add_source("Signage");
//!     let _ = runtime.rooms().request_source_change(&lobby, Some(signage));
//!     runtime.run().await?;
//!     Ok(())
//! }
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use super::{Config, monitor, shutdown};
use crate::boot::{BootOutcome, BootSequencer};
use crate::error::RuntimeError;
use crate::events::{Bus, Event, EventKind};
use crate::hooks::{Restarter, Surfaces};
use crate::ids::IdAllocator;
use crate::prompts::PromptArbiter;
use crate::rooms::RoomJobController;
use crate::subscribers::SubscriberSet;
use crate::watchdog::{Heartbeat, Watchdog};

/// Owns the orchestration core of one controller.
pub struct Runtime {
    cfg: Config,
    bus: Bus,
    ids: IdAllocator,
    subs: Arc<SubscriberSet>,
    surfaces: Arc<Surfaces>,
    restarter: Arc<dyn Restarter>,
    arbiter: Arc<PromptArbiter>,
    rooms: Arc<RoomJobController>,
    heartbeat: Heartbeat,
    boot: Mutex<Option<BootSequencer>>,
    boot_complete: Arc<AtomicBool>,
    token: CancellationToken,
}

pub(super) struct RuntimeParts {
    pub cfg: Config,
    pub bus: Bus,
    pub ids: IdAllocator,
    pub subs: Arc<SubscriberSet>,
    pub surfaces: Arc<Surfaces>,
    pub restarter: Arc<dyn Restarter>,
    pub arbiter: Arc<PromptArbiter>,
    pub rooms: Arc<RoomJobController>,
    pub boot: BootSequencer,
}

impl Runtime {
    pub(super) fn new_internal(parts: RuntimeParts) -> Self {
        let boot_complete = parts.boot.completion_flag();
        Self {
            cfg: parts.cfg,
            bus: parts.bus,
            ids: parts.ids,
            subs: parts.subs,
            surfaces: parts.surfaces,
            restarter: parts.restarter,
            arbiter: parts.arbiter,
            rooms: parts.rooms,
            heartbeat: Heartbeat::new(),
            boot: Mutex::new(Some(parts.boot)),
            boot_complete,
            token: CancellationToken::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    pub fn ids(&self) -> &IdAllocator {
        &self.ids
    }

    pub fn surfaces(&self) -> &Arc<Surfaces> {
        &self.surfaces
    }

    pub fn arbiter(&self) -> &Arc<PromptArbiter> {
        &self.arbiter
    }

    pub fn rooms(&self) -> &Arc<RoomJobController> {
        &self.rooms
    }

    pub fn heartbeat(&self) -> &Heartbeat {
        &self.heartbeat
    }

    /// True once the boot queue was drained (never after an aborted boot).
    pub fn is_boot_complete(&self) -> bool {
        self.boot_complete.load(Ordering::Acquire)
    }

    /// Requests a graceful shutdown; [`run`](Self::run) then returns.
    pub fn shutdown(&self) {
        self.token.cancel();
    }

    /// Starts every worker and waits for a shutdown request.
    ///
    /// May be called once per runtime.
    pub async fn run(&self) -> Result<(), RuntimeError> {
        let Some(boot) = self.boot.lock().take() else {
            return Err(RuntimeError::AlreadyRunning);
        };
        self.subscriber_listener();

        let mut set: JoinSet<&'static str> = JoinSet::new();
        let mut running = Vec::new();
        self.spawn_workers(&mut set, &mut running, boot);
        self.drive_shutdown(&mut set, &mut running).await
    }

    /// Forwards bus events to the subscriber set (fire-and-forget).
    fn subscriber_listener(&self) {
        let mut rx = self.bus.subscribe();
        let set = Arc::clone(&self.subs);
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(ev) => set.emit(&ev),
                    Err(RecvError::Lagged(missed)) => {
                        tracing::warn!(missed, "subscriber listener lagged behind the bus");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });
    }

    fn spawn_workers(
        &self,
        set: &mut JoinSet<&'static str>,
        running: &mut Vec<&'static str>,
        boot: BootSequencer,
    ) {
        let hb = self.heartbeat.clone();
        let interval = self.cfg.heartbeat_interval;
        let token = self.token.child_token();
        running.push("heartbeat");
        set.spawn(async move {
            hb.run_ticker(interval, token).await;
            "heartbeat"
        });

        let rooms = Arc::clone(&self.rooms);
        let token = self.token.child_token();
        running.push("rooms");
        set.spawn(async move {
            rooms.run(token).await;
            "rooms"
        });

        let arbiter = Arc::clone(&self.arbiter);
        let watchdog = Watchdog::new(
            self.heartbeat.clone(),
            self.cfg.watchdog_thresholds(),
            self.bus.clone(),
            Arc::clone(&self.restarter),
        );
        let idle_tick = self.cfg.arbiter_idle_tick;
        let token = self.token.child_token();
        running.push("monitor");
        set.spawn(async move {
            match boot.run(token.clone()).await {
                BootOutcome::Completed { .. } => {
                    monitor::run(arbiter, watchdog, idle_tick, token).await;
                }
                BootOutcome::Aborted { .. } => {}
            }
            "monitor"
        });
    }

    /// Waits for an OS signal or [`shutdown`](Self::shutdown), then stops the workers.
    async fn drive_shutdown(
        &self,
        set: &mut JoinSet<&'static str>,
        running: &mut Vec<&'static str>,
    ) -> Result<(), RuntimeError> {
        let signalled = async {
            match shutdown::wait_for_shutdown_signal().await {
                Ok(name) => name,
                Err(e) => {
                    tracing::warn!(error = %e, "cannot listen for OS signals");
                    std::future::pending().await
                }
            }
        };
        let reason = tokio::select! {
            name = signalled => name,
            _ = self.token.cancelled() => "requested",
        };

        self.bus
            .publish(Event::new(EventKind::ShutdownRequested).with_reason(reason));
        self.token.cancel();
        self.wait_all_with_grace(set, running).await
    }

    /// Waits for all workers within the configured grace period.
    async fn wait_all_with_grace(
        &self,
        set: &mut JoinSet<&'static str>,
        running: &mut Vec<&'static str>,
    ) -> Result<(), RuntimeError> {
        let grace = self.cfg.grace;
        let done = async {
            while let Some(res) = set.join_next().await {
                match res {
                    Ok(name) => running.retain(|n| *n != name),
                    Err(e) => tracing::error!(error = %e, "runtime worker failed"),
                }
            }
        };

        let outcome = tokio::time::timeout(grace, done).await;
        match outcome {
            Ok(()) => {
                self.bus.publish(Event::new(EventKind::AllStoppedWithin));
                Ok(())
            }
            Err(_) => {
                let stuck: Vec<String> = running.iter().map(|n| n.to_string()).collect();
                self.bus
                    .publish(Event::new(EventKind::GraceExceeded).with_reason(stuck.join(",")));
                set.abort_all();
                Err(RuntimeError::GraceExceeded { grace, stuck })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::RuntimeBuilder;
    use crate::test_support::{FakeSurface, NullSystem, drain};
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn boots_then_shuts_down_within_grace() {
        let panel = FakeSurface::new("lobby", None);
        let rt = RuntimeBuilder::new(Config::default(), Arc::new(NullSystem))
            .with_surface(panel.clone())
            .build()
            .expect("build");
        let mut rx = rt.bus().subscribe();

        let runner = {
            let rt = Arc::clone(&rt);
            tokio::spawn(async move { rt.run().await })
        };
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(rt.is_boot_complete());
        assert_eq!(panel.main_views(), 1);

        rt.shutdown();
        runner.await.expect("join").expect("clean shutdown");

        let kinds: Vec<EventKind> = drain(&mut rx).into_iter().map(|e| e.kind).collect();
        assert!(kinds.contains(&EventKind::BootCompleted));
        assert_eq!(
            &kinds[kinds.len() - 2..],
            [EventKind::ShutdownRequested, EventKind::AllStoppedWithin]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn second_run_is_rejected() {
        let rt = RuntimeBuilder::new(Config::default(), Arc::new(NullSystem))
            .build()
            .expect("build");
        rt.shutdown();
        rt.run().await.expect("first run");
        assert!(matches!(rt.run().await, Err(RuntimeError::AlreadyRunning)));
    }

    #[tokio::test(start_paused = true)]
    async fn stuck_room_job_exceeds_grace() {
        use crate::test_support::RecordingSystem;

        let system = Arc::new(RecordingSystem::default());
        *system.process_delay.lock() = Duration::from_secs(60);
        let cfg = Config {
            grace: Duration::from_secs(2),
            ..Config::default()
        };
        let rt = RuntimeBuilder::new(cfg, system).build().expect("build");
        let room = rt.rooms().add_room("R");
        let tv = rt.rooms().add_source("TV");

        let runner = {
            let rt = Arc::clone(&rt);
            tokio::spawn(async move { rt.run().await })
        };
        let _ = rt.rooms().request_source_change(&room, Some(tv));
        tokio::time::sleep(Duration::from_secs(1)).await;

        rt.shutdown();
        match runner.await.expect("join") {
            Err(RuntimeError::GraceExceeded { stuck, .. }) => assert_eq!(stuck, vec!["rooms"]),
            other => panic!("unexpected {other:?}"),
        }
    }
}
