//! # RoomJobController: source switching off the request path.
//!
//! [`RoomJobController::request_source_change`] is a plain synchronous call a
//! panel can make from any thread. It updates the data model on the spot and
//! hands the slow device work to a background job:
//!
//! ```text
//! request_source_change(room, new)
//!   ├─ new == current (non-null) ─► SourceReselected + show_main_view, no job
//!   └─ otherwise (under the switch lock):
//!        room.current = new
//!        outgoing.room_count -= 1   (→ 0: source_ended)
//!        incoming.room_count += 1   (0 → 1: source_started)
//!        SourceEnded / SourceStarted
//!      SourceChanged
//!      inbox ◄── Job ───────────────► run(): admit per OverlapPolicy
//!                                          └─ spawn job:
//!                                               source_load_started(new)
//!                                               source_load_process(prev, new)
//!                                               source_load_ended()      (always)
//!                                               └─ JobReport ─► JobHandle::wait()
//! ```
//!
//! ## Rules
//! - Each lifecycle call has its own failure boundary; a failing step never
//!   skips the next one, and nothing is rolled back.
//! - Room counts are written only under the controller-wide switch lock, so
//!   rooms sharing a source cannot interleave the read-modify-write.
//! - `source_started` / `source_ended` are delivered before that lock is
//!   released, in the same order as the count edges. The lock is reentrant, so
//!   those hooks may switch sources again from the same thread.
//! - The other hooks and surfaces are called with no lock held.
//! - Started jobs always run to completion; on shutdown, jobs still waiting in a
//!   room's queue are dropped and their handles resolve to `None`.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::{Mutex, ReentrantMutex, RwLock};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::job::{Job, JobHandle, JobReport, JobStep, SourceChange};
use super::policy::OverlapPolicy;
use super::room::{Room, Source};
use crate::error::HookError;
use crate::events::{Bus, Event, EventKind};
use crate::hooks::{PowerEvent, Surfaces, System, contain, contain_sync};
use crate::ids::{IdAllocator, RoomId, SourceId};
use crate::prompts::{ActionType, PromptAction, PromptArbiter, PromptHandle, PromptRequest};

enum Command {
    Run(Job),
    PowerOff { room: Arc<Room>, event: PowerEvent },
}

/// Per-room serialization slot.
struct SlotState {
    running: bool,
    queue: VecDeque<Job>,
}

impl SlotState {
    fn new() -> Self {
        Self {
            running: false,
            queue: VecDeque::new(),
        }
    }
}

/// Owns rooms and sources and runs their source-change jobs.
pub struct RoomJobController {
    system: Arc<dyn System>,
    surfaces: Arc<Surfaces>,
    bus: Bus,
    ids: IdAllocator,
    policy: OverlapPolicy,

    rooms: RwLock<Vec<Arc<Room>>>,
    sources: RwLock<Vec<Arc<Source>>>,

    switch_lock: ReentrantMutex<()>,
    slots: Mutex<HashMap<RoomId, SlotState>>,
    next_job: AtomicU64,

    tx: mpsc::UnboundedSender<Command>,
    rx: Mutex<Option<mpsc::UnboundedReceiver<Command>>>,
}

impl RoomJobController {
    /// Creates a controller. Jobs are accepted at once but only start after [`run`](Self::run).
    pub fn new(
        system: Arc<dyn System>,
        surfaces: Arc<Surfaces>,
        bus: Bus,
        ids: IdAllocator,
        policy: OverlapPolicy,
    ) -> Arc<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        Arc::new(Self {
            system,
            surfaces,
            bus,
            ids,
            policy,
            rooms: RwLock::new(Vec::new()),
            sources: RwLock::new(Vec::new()),
            switch_lock: ReentrantMutex::new(()),
            slots: Mutex::new(HashMap::new()),
            next_job: AtomicU64::new(0),
            tx,
            rx: Mutex::new(Some(rx)),
        })
    }

    pub fn policy(&self) -> OverlapPolicy {
        self.policy
    }

    /// Creates and registers a room.
    pub fn add_room(&self, name: impl Into<Arc<str>>) -> Arc<Room> {
        let room = Arc::new(Room::new(self.ids.room(), name));
        self.rooms.write().push(Arc::clone(&room));
        room
    }

    /// Creates and registers a source.
    pub fn add_source(&self, name: impl Into<Arc<str>>) -> Arc<Source> {
        let source = Arc::new(Source::new(self.ids.source(), name));
        self.sources.write().push(Arc::clone(&source));
        source
    }

    pub fn room(&self, id: RoomId) -> Option<Arc<Room>> {
        self.rooms.read().iter().find(|r| r.id() == id).cloned()
    }

    pub fn source(&self, id: SourceId) -> Option<Arc<Source>> {
        self.sources.read().iter().find(|s| s.id() == id).cloned()
    }

    pub fn rooms(&self) -> Vec<Arc<Room>> {
        self.rooms.read().clone()
    }

    pub fn sources(&self) -> Vec<Arc<Source>> {
        self.sources.read().clone()
    }

    /// Number of jobs waiting behind the running one in `room`.
    pub fn queued_jobs(&self, room: RoomId) -> usize {
        self.slots.lock().get(&room).map_or(0, |s| s.queue.len())
    }

    /// Switches `room` to `new` and schedules the device work.
    pub fn request_source_change(
        &self,
        room: &Arc<Room>,
        new: Option<Arc<Source>>,
    ) -> SourceChange {
        let switch = self.switch_lock.lock();
        let mut st = room.state.lock();
        if matches!((&st.current, &new), (Some(cur), Some(next)) if Arc::ptr_eq(cur, next)) {
            drop(st);
            drop(switch);
            self.reselect(room);
            return SourceChange::Reselected;
        }
        let previous = std::mem::replace(&mut st.current, new.clone());
        st.jobs += 1;
        drop(st);

        if let Some(source) = previous.as_ref().filter(|s| s.release()) {
            self.source_edge(EventKind::SourceEnded, source, room);
        }
        if let Some(source) = new.as_ref().filter(|s| s.acquire()) {
            self.source_edge(EventKind::SourceStarted, source, room);
        }
        drop(switch);

        let mut ev = Event::new(EventKind::SourceChanged).with_room(room.id());
        if let Some(s) = &new {
            ev = ev.with_source(s.id());
        }
        if let Some(p) = &previous {
            ev = ev.with_reason(p.name());
        }
        self.bus.publish(ev);

        let id = self.next_job.fetch_add(1, Ordering::Relaxed) + 1;
        let (report, rx) = oneshot::channel();
        let job = Job {
            id,
            room: Arc::clone(room),
            previous,
            next: new,
            report,
        };
        if self.tx.send(Command::Run(job)).is_err() {
            tracing::warn!(room = %room.id(), job = id, "controller stopped, room job dropped");
            room.job_done();
        }
        SourceChange::Scheduled(JobHandle {
            room: room.id(),
            job: id,
            rx,
        })
    }

    /// Clears the room's source, powers its equipment off and shows the home page.
    ///
    /// Waits for the clearing job first, so the devices see the source go away
    /// before the power goes. Needs [`run`](Self::run) to be driving jobs.
    pub async fn power_off(&self, room: &Arc<Room>, event: PowerEvent) -> Result<(), HookError> {
        if room.current_source().is_some() {
            if let SourceChange::Scheduled(job) = self.request_source_change(room, None) {
                job.wait().await;
            }
        }

        let res = contain(self.system.power_off(room, event)).await;
        if let Err(e) = &res {
            tracing::warn!(room = %room.id(), error = %e, "power_off hook failed");
        }

        for surface in self.surfaces.in_room(room.id()) {
            if let Err(e) = contain_sync(|| surface.show_home_page(event)) {
                tracing::warn!(surface = surface.name(), error = %e, "show_home_page panicked");
            }
        }

        let reason = match &res {
            Ok(()) => format!("{event:?}"),
            Err(e) => format!("{event:?}: {e}"),
        };
        self.bus.publish(
            Event::new(EventKind::RoomPoweredOff)
                .with_room(room.id())
                .with_reason(reason),
        );
        res
    }

    /// Fire-and-forget [`power_off`](Self::power_off), callable from any thread.
    pub fn request_power_off(&self, room: &Arc<Room>, event: PowerEvent) {
        let cmd = Command::PowerOff {
            room: Arc::clone(room),
            event,
        };
        if self.tx.send(cmd).is_err() {
            tracing::warn!(room = %room.id(), "controller stopped, power off dropped");
        }
    }

    /// Asks the room's panels to confirm, and powers off only on an affirmative answer.
    pub fn power_off_with_confirmation(
        &self,
        arbiter: &PromptArbiter,
        room: &Arc<Room>,
        event: PowerEvent,
        timeout: Duration,
    ) -> PromptHandle {
        let req = PromptRequest::room(room.id(), format!("Power off {}?", room.name()))
            .subtitle("All equipment in this room will be turned off")
            .action(PromptAction::new("power_off", ActionType::Answer).with_icon("power"))
            .action(PromptAction::new("cancel", ActionType::Cancel))
            .timeout(timeout);

        let tx = self.tx.clone();
        let target = Arc::clone(room);
        arbiter.request(req, move |resp| {
            let confirmed = resp.responded && resp.action.is_some_and(|a| a.kind.is_affirmative());
            if !confirmed {
                tracing::debug!(
                    room = %target.id(),
                    state = ?resp.state,
                    "power off not confirmed"
                );
                return;
            }
            if tx.send(Command::PowerOff { room: target, event }).is_err() {
                tracing::warn!("controller stopped, power off dropped");
            }
        })
    }

    /// Drives jobs until `token` is cancelled, then lets running jobs finish.
    pub async fn run(self: Arc<Self>, token: CancellationToken) {
        let Some(mut rx) = self.rx.lock().take() else {
            tracing::warn!("room job controller already running");
            return;
        };
        let mut jobs: JoinSet<Option<RoomId>> = JoinSet::new();

        loop {
            tokio::select! {
                _ = token.cancelled() => break,

                Some(cmd) = rx.recv() => match cmd {
                    Command::Run(job) => self.admit(job, &mut jobs),
                    Command::PowerOff { room, event } => {
                        let me = Arc::clone(&self);
                        jobs.spawn(async move {
                            let _ = me.power_off(&room, event).await;
                            None
                        });
                    }
                },

                Some(done) = jobs.join_next() => {
                    if let Ok(Some(room)) = done {
                        self.on_job_finished(room, &mut jobs);
                    }
                }
            }
        }

        let waiting: Vec<Job> = self
            .slots
            .lock()
            .values_mut()
            .flat_map(|s| s.queue.drain(..))
            .collect();
        rx.close();
        let mut dropped = waiting.len();
        for job in waiting {
            job.room.job_done();
        }
        while let Ok(cmd) = rx.try_recv() {
            if let Command::Run(job) = cmd {
                job.room.job_done();
                dropped += 1;
            }
        }
        if dropped > 0 {
            tracing::info!(dropped, "room jobs dropped at shutdown");
        }

        while jobs.join_next().await.is_some() {}
    }

    fn admit(&self, job: Job, jobs: &mut JoinSet<Option<RoomId>>) {
        if self.policy == OverlapPolicy::Serialize {
            let mut slots = self.slots.lock();
            let slot = slots.entry(job.room.id()).or_insert_with(SlotState::new);
            if slot.running {
                self.bus.publish(
                    Event::new(EventKind::RoomJobQueued)
                        .with_room(job.room.id())
                        .with_job(job.id),
                );
                slot.queue.push_back(job);
                return;
            }
            slot.running = true;
        }
        self.spawn_job(job, jobs);
    }

    fn on_job_finished(&self, room: RoomId, jobs: &mut JoinSet<Option<RoomId>>) {
        if self.policy != OverlapPolicy::Serialize {
            return;
        }
        let next = {
            let mut slots = self.slots.lock();
            let Some(slot) = slots.get_mut(&room) else {
                return;
            };
            let next = slot.queue.pop_front();
            slot.running = next.is_some();
            next
        };
        if let Some(job) = next {
            self.spawn_job(job, jobs);
        }
    }

    fn spawn_job(&self, job: Job, jobs: &mut JoinSet<Option<RoomId>>) {
        let system = Arc::clone(&self.system);
        let bus = self.bus.clone();
        jobs.spawn(async move { Some(execute(system, bus, job).await) });
    }

    /// Notifies the system that `source` went live or idle. Caller holds the switch lock.
    fn source_edge(&self, kind: EventKind, source: &Source, room: &Room) {
        let res = contain_sync(|| match kind {
            EventKind::SourceStarted => self.system.source_started(source, room),
            _ => self.system.source_ended(source, room),
        });
        if let Err(e) = res {
            tracing::warn!(
                room = %room.id(),
                source = %source.id(),
                ?kind,
                error = %e,
                "source edge hook panicked"
            );
        }
        self.bus.publish(
            Event::new(kind)
                .with_room(room.id())
                .with_source(source.id()),
        );
    }

    fn reselect(&self, room: &Room) {
        self.bus
            .publish(Event::new(EventKind::SourceReselected).with_room(room.id()));
        for surface in self.surfaces.connected_in(room.id()) {
            if let Err(e) = contain_sync(|| surface.show_main_view()) {
                tracing::warn!(surface = surface.name(), error = %e, "show_main_view panicked");
            }
        }
    }
}

/// Runs the three lifecycle steps of one job.
async fn execute(system: Arc<dyn System>, bus: Bus, job: Job) -> RoomId {
    let Job {
        id,
        room,
        previous,
        next,
        report,
    } = job;
    let started_at = Instant::now();
    let mut ev = Event::new(EventKind::RoomJobStarted)
        .with_room(room.id())
        .with_job(id);
    if let Some(s) = &next {
        ev = ev.with_source(s.id());
    }
    bus.publish(ev);

    let mut failed = Vec::new();
    let steps = [
        (
            JobStep::LoadStarted,
            contain(system.source_load_started(&room, next.as_deref())).await,
        ),
        (
            JobStep::LoadProcess,
            contain(system.source_load_process(&room, previous.as_deref(), next.as_deref())).await,
        ),
        (
            JobStep::LoadEnded,
            contain(system.source_load_ended(&room)).await,
        ),
    ];
    for (step, res) in steps {
        if let Err(e) = res {
            bus.publish(
                Event::new(EventKind::RoomJobStepFailed)
                    .with_room(room.id())
                    .with_job(id)
                    .with_task(step.as_str())
                    .with_reason(e.to_string()),
            );
            failed.push((step, e));
        }
    }

    room.job_done();
    let elapsed = started_at.elapsed();
    bus.publish(
        Event::new(EventKind::RoomJobFinished)
            .with_room(room.id())
            .with_job(id)
            .with_elapsed(elapsed),
    );

    let _ = report.send(JobReport {
        room: room.id(),
        job: id,
        previous: previous.map(|s| s.id()),
        next: next.map(|s| s.id()),
        failed,
        elapsed,
    });
    room.id()
}
