//! # Demo: room_controller
//!
//! A two-room controller with console "panels".
//!
//! Shows how to:
//! - Implement [`System`] with boot tasks (one failing, one with a completion check).
//! - Register [`UiSurface`]s and the built-in [`LogWriter`] / [`BootProgressTracker`].
//! - Switch sources, raise a system prompt and confirm a power off.
//!
//! ## Flow
//! ```text
//! RuntimeBuilder::build()  ──► System::items_to_initialize()
//! Runtime::run()
//!   ├─► boot: projector → dsp (fails) → matrix (completion check) → 100%
//!   ├─► rooms: Boardroom ← Laptop, Lab ← Laptop, Boardroom ← Camera
//!   ├─► system prompt "Fire drill" (times out after 3s)
//!   └─► Lab power off, confirmed from the console panel
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=info cargo run --example room_controller
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use roomvisor::{
    BootProgressTracker, Config, HookError, InitTask, LogWriter, PowerEvent, Prompt, PromptRequest,
    Room, RoomId, RuntimeBuilder, Source, Subscribe, System, UiSurface,
};
use tracing_subscriber::EnvFilter;

struct DemoBuilding {
    matrix_ready: Arc<AtomicBool>,
}

#[async_trait]
impl System for DemoBuilding {
    fn items_to_initialize(&self) -> Vec<InitTask> {
        let ready = Arc::clone(&self.matrix_ready);
        let check = Arc::clone(&self.matrix_ready);
        vec![
            InitTask::new("projector", || async { Ok(()) }),
            InitTask::new("audio dsp", || async {
                Err(HookError::Unavailable {
                    what: "dsp at 10.0.0.12".into(),
                })
            }),
            InitTask::new("video matrix", move || async move {
                tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_secs(2)).await;
                    ready.store(true, Ordering::SeqCst);
                });
                Ok(())
            })
            .with_delay(Duration::from_millis(200))
            .with_completion(move || check.load(Ordering::SeqCst)),
        ]
    }

    async fn source_load_started(
        &self,
        room: &Room,
        source: Option<&Source>,
    ) -> Result<(), HookError> {
        println!("[{}] loading {}", room.name(), source.map_or("nothing", |s| s.name()));
        Ok(())
    }

    async fn source_load_process(
        &self,
        room: &Room,
        previous: Option<&Source>,
        next: Option<&Source>,
    ) -> Result<(), HookError> {
        tokio::time::sleep(Duration::from_millis(300)).await;
        println!(
            "[{}] matrix route {} -> {}",
            room.name(),
            previous.map_or("-", |s| s.name()),
            next.map_or("-", |s| s.name())
        );
        Ok(())
    }

    async fn source_load_ended(&self, room: &Room) -> Result<(), HookError> {
        println!("[{}] source ready", room.name());
        Ok(())
    }

    async fn power_off(&self, room: &Room, event: PowerEvent) -> Result<(), HookError> {
        println!("[{}] powering off ({event:?})", room.name());
        Ok(())
    }

    fn source_started(&self, source: &Source, _room: &Room) {
        println!("[device] {} on", source.name());
    }

    fn source_ended(&self, source: &Source, _room: &Room) {
        println!("[device] {} off", source.name());
    }
}

/// Console panel that prints what it would display.
struct ConsolePanel {
    name: String,
    room: Option<RoomId>,
}

impl UiSurface for ConsolePanel {
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
        let actions: Vec<&str> = prompt.actions.iter().map(|a| &*a.name).collect();
        println!("<{}> PROMPT {} {:?} {actions:?}", self.name, prompt.id, prompt.title);
    }
    fn show_main_view(&self) {
        println!("<{}> main view", self.name);
    }
    fn show_home_page(&self, event: PowerEvent) {
        println!("<{}> home page ({event:?})", self.name);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let progress = Arc::new(BootProgressTracker::new());
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new()), progress.clone()];

    let system = Arc::new(DemoBuilding {
        matrix_ready: Arc::new(AtomicBool::new(false)),
    });
    let rt = RuntimeBuilder::new(Config::default(), system)
        .with_subscribers(subs)
        .build()?;

    let boardroom = rt.rooms().add_room("Boardroom");
    let lab = rt.rooms().add_room("Lab");
    let laptop = rt.rooms().add_source("Laptop");
    let camera = rt.rooms().add_source("Camera");
    for (name, room) in [("boardroom panel", &boardroom), ("lab panel", &lab)] {
        rt.surfaces().register(Arc::new(ConsolePanel {
            name: name.to_string(),
            room: Some(room.id()),
        }));
    }

    let driver = {
        let rt = Arc::clone(&rt);
        tokio::spawn(async move { rt.run().await })
    };

    while !rt.is_boot_complete() {
        tokio::time::sleep(Duration::from_millis(250)).await;
        let p = progress.snapshot();
        println!("boot {:>3}% {}", p.percent, p.message);
    }

    let _ = rt.rooms().request_source_change(&boardroom, Some(Arc::clone(&laptop)));
    let _ = rt.rooms().request_source_change(&lab, Some(Arc::clone(&laptop)));
    if let Some(job) = rt
        .rooms()
        .request_source_change(&boardroom, Some(Arc::clone(&camera)))
        .into_handle()
    {
        if let Some(report) = job.wait().await {
            println!("boardroom switch took {:?}", report.elapsed);
        }
    }

    rt.arbiter().request(
        PromptRequest::system("Fire drill at 14:00").timeout_secs(3),
        |resp| println!("fire drill notice ended: {:?}", resp.state),
    );
    tokio::time::sleep(Duration::from_secs(4)).await;

    let confirm = rt.rooms().power_off_with_confirmation(
        rt.arbiter(),
        &lab,
        PowerEvent::User,
        Duration::from_secs(20),
    );
    tokio::time::sleep(Duration::from_millis(500)).await;
    rt.arbiter().respond(confirm.id, "power_off");
    tokio::time::sleep(Duration::from_secs(2)).await;

    println!(
        "laptop live in {} room(s), camera in {}",
        laptop.room_count(),
        camera.room_count()
    );

    rt.shutdown();
    driver.await??;
    Ok(())
}
