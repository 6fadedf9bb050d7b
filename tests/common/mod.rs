#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use roomvisor::{
    HookError, InitTask, PowerEvent, Prompt, PromptId, Restarter, Room, RoomId, Source, System,
    UiSurface,
};

/// System whose boot tasks are supplied by the test and whose hooks are logged.
#[derive(Default)]
pub struct ScriptedSystem {
    tasks: Mutex<Vec<InitTask>>,
    pub log: Arc<Mutex<Vec<String>>>,
    pub ended: AtomicUsize,
}

impl ScriptedSystem {
    pub fn with_tasks(tasks: Vec<InitTask>) -> Self {
        Self {
            tasks: Mutex::new(tasks),
            ..Self::default()
        }
    }

    pub fn log(&self) -> Vec<String> {
        self.log.lock().clone()
    }
}

#[async_trait]
impl System for ScriptedSystem {
    fn items_to_initialize(&self) -> Vec<InitTask> {
        std::mem::take(&mut *self.tasks.lock())
    }

    async fn source_load_started(
        &self,
        room: &Room,
        source: Option<&Source>,
    ) -> Result<(), HookError> {
        self.log.lock().push(format!(
            "{} started {}",
            room.name(),
            source.map_or("none", |s| s.name())
        ));
        Ok(())
    }

    async fn source_load_process(
        &self,
        room: &Room,
        _previous: Option<&Source>,
        _next: Option<&Source>,
    ) -> Result<(), HookError> {
        self.log.lock().push(format!("{} process", room.name()));
        Ok(())
    }

    async fn source_load_ended(&self, room: &Room) -> Result<(), HookError> {
        self.log.lock().push(format!("{} ended", room.name()));
        Ok(())
    }

    async fn power_off(&self, room: &Room, event: PowerEvent) -> Result<(), HookError> {
        self.log.lock().push(format!("{} power_off {event:?}", room.name()));
        Ok(())
    }

    fn source_ended(&self, _source: &Source, _room: &Room) {
        self.ended.fetch_add(1, Ordering::SeqCst);
    }
}

/// Always-connected panel that records what it displayed.
pub struct Panel {
    name: String,
    room: Option<RoomId>,
    pub shown: Mutex<Vec<PromptId>>,
    pub main_views: AtomicUsize,
}

impl Panel {
    pub fn new(name: &str, room: Option<RoomId>) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            room,
            shown: Mutex::new(Vec::new()),
            main_views: AtomicUsize::new(0),
        })
    }
}

impl UiSurface for Panel {
    fn name(&self) -> &str {
        &self.name
    }
    fn room(&self) -> Option<RoomId> {
        self.room
    }
    fn is_connected(&self) -> bool {
        true
    }
    fn show_prompt(&self, prompt: &Prompt) {
        self.shown.lock().push(prompt.id);
    }
    fn show_main_view(&self) {
        self.main_views.fetch_add(1, Ordering::SeqCst);
    }
    fn show_home_page(&self, _event: PowerEvent) {}
}

/// Restarter that must never fire in these scenarios.
pub struct NoRestart;

impl Restarter for NoRestart {
    fn force_restart(&self) -> Result<(), HookError> {
        Err(HookError::failed("restart not expected in tests"))
    }
}
