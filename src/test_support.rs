//! Fakes shared by unit tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::broadcast;

use crate::boot::InitTask;
use crate::error::HookError;
use crate::events::Event;
use crate::hooks::{PowerEvent, Restarter, System, UiSurface};
use crate::ids::{PromptId, RoomId};
use crate::prompts::Prompt;
use crate::rooms::{Room, Source};

/// Collects every event currently buffered in `rx`.
pub(crate) fn drain(rx: &mut broadcast::Receiver<Event>) -> Vec<Event> {
    let mut out = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        out.push(ev);
    }
    out
}

/// Panel that records what it was asked to display.
pub(crate) struct FakeSurface {
    name: String,
    room: Option<RoomId>,
    connected: AtomicBool,
    gating: AtomicBool,
    shown: Mutex<Vec<PromptId>>,
    retracted: Mutex<Vec<PromptId>>,
    main_views: AtomicUsize,
    home_pages: Mutex<Vec<PowerEvent>>,
}

impl FakeSurface {
    pub(crate) fn new(name: &str, room: Option<RoomId>) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            room,
            connected: AtomicBool::new(true),
            gating: AtomicBool::new(false),
            shown: Mutex::new(Vec::new()),
            retracted: Mutex::new(Vec::new()),
            main_views: AtomicUsize::new(0),
            home_pages: Mutex::new(Vec::new()),
        })
    }

    /// Makes the panel gate boot, starting in the given connection state.
    pub(crate) fn gating(self: Arc<Self>, connected: bool) -> Arc<Self> {
        self.gating.store(true, Ordering::SeqCst);
        self.connected.store(connected, Ordering::SeqCst);
        self
    }

    pub(crate) fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    pub(crate) fn shown(&self) -> Vec<PromptId> {
        self.shown.lock().clone()
    }

    pub(crate) fn retracted(&self) -> Vec<PromptId> {
        self.retracted.lock().clone()
    }

    pub(crate) fn main_views(&self) -> usize {
        self.main_views.load(Ordering::SeqCst)
    }

    pub(crate) fn home_pages(&self) -> Vec<PowerEvent> {
        self.home_pages.lock().clone()
    }
}

impl UiSurface for FakeSurface {
    fn name(&self) -> &str {
        &self.name
    }
    fn room(&self) -> Option<RoomId> {
        self.room
    }
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
    fn requires_connection_before_boot(&self) -> bool {
        self.gating.load(Ordering::SeqCst)
    }
    fn show_prompt(&self, prompt: &Prompt) {
        self.shown.lock().push(prompt.id);
    }
    fn retract_prompt(&self, id: PromptId) {
        self.retracted.lock().push(id);
    }
    fn show_main_view(&self) {
        self.main_views.fetch_add(1, Ordering::SeqCst);
    }
    fn show_home_page(&self, event: PowerEvent) {
        self.home_pages.lock().push(event);
    }
}

/// System whose hooks all succeed immediately.
#[derive(Default)]
pub(crate) struct NullSystem;

#[async_trait]
impl System for NullSystem {
    fn items_to_initialize(&self) -> Vec<InitTask> {
        Vec::new()
    }
    async fn source_load_started(&self, _: &Room, _: Option<&Source>) -> Result<(), HookError> {
        Ok(())
    }
    async fn source_load_process(
        &self,
        _: &Room,
        _: Option<&Source>,
        _: Option<&Source>,
    ) -> Result<(), HookError> {
        Ok(())
    }
    async fn source_load_ended(&self, _: &Room) -> Result<(), HookError> {
        Ok(())
    }
    async fn power_off(&self, _: &Room, _: PowerEvent) -> Result<(), HookError> {
        Ok(())
    }
}

/// System that records every hook call and can be told to fail steps.
#[derive(Default)]
pub(crate) struct RecordingSystem {
    pub(crate) calls: Mutex<Vec<String>>,
    pub(crate) started: Mutex<Vec<String>>,
    pub(crate) ended: Mutex<Vec<String>>,
    /// `started X` / `ended X` in delivery order.
    pub(crate) edges: Mutex<Vec<String>>,
    /// Source whose `source_ended` blocks the calling thread, and for how long.
    pub(crate) slow_release: Mutex<Option<(String, Duration)>>,
    pub(crate) fail_started: AtomicBool,
    pub(crate) panic_process: AtomicBool,
    pub(crate) process_delay: Mutex<Duration>,
}

impl RecordingSystem {
    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().push(call);
    }
}

fn label(s: Option<&Source>) -> String {
    s.map(|s| s.name().to_string())
        .unwrap_or_else(|| "none".to_string())
}

#[async_trait]
impl System for RecordingSystem {
    fn items_to_initialize(&self) -> Vec<InitTask> {
        Vec::new()
    }

    async fn source_load_started(
        &self,
        room: &Room,
        source: Option<&Source>,
    ) -> Result<(), HookError> {
        self.record(format!("started {} {}", room.name(), label(source)));
        if self.fail_started.load(Ordering::SeqCst) {
            return Err(HookError::failed("matrix offline"));
        }
        Ok(())
    }

    async fn source_load_process(
        &self,
        room: &Room,
        previous: Option<&Source>,
        next: Option<&Source>,
    ) -> Result<(), HookError> {
        self.record(format!(
            "process {} {}->{}",
            room.name(),
            label(previous),
            label(next)
        ));
        let delay = *self.process_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.panic_process.load(Ordering::SeqCst) {
            panic!("codec wedged");
        }
        Ok(())
    }

    async fn source_load_ended(&self, room: &Room) -> Result<(), HookError> {
        self.record(format!("ended {}", room.name()));
        Ok(())
    }

    async fn power_off(&self, room: &Room, event: PowerEvent) -> Result<(), HookError> {
        self.record(format!("power_off {} {:?}", room.name(), event));
        Ok(())
    }

    fn source_started(&self, source: &Source, _room: &Room) {
        self.started.lock().push(source.name().to_string());
        self.edges.lock().push(format!("started {}", source.name()));
    }

    fn source_ended(&self, source: &Source, _room: &Room) {
        let slow = self.slow_release.lock().clone();
        if let Some((name, pause)) = slow {
            if name == source.name() {
                std::thread::sleep(pause);
            }
        }
        self.ended.lock().push(source.name().to_string());
        self.edges.lock().push(format!("ended {}", source.name()));
    }
}

/// Restarter that only counts.
#[derive(Default)]
pub(crate) struct CountingRestarter {
    pub(crate) calls: AtomicUsize,
}

impl Restarter for CountingRestarter {
    fn force_restart(&self) -> Result<(), HookError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
