mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use roomvisor::{Config, PowerEvent, RuntimeBuilder};

use common::{NoRestart, Panel, ScriptedSystem};

#[tokio::test]
async fn selecting_then_clearing_a_source_releases_it_once() {
    let system = Arc::new(ScriptedSystem::default());
    let rt = RuntimeBuilder::new(Config::default(), system.clone())
        .with_restarter(Arc::new(NoRestart))
        .build()
        .expect("build");
    let runner = {
        let rt = Arc::clone(&rt);
        tokio::spawn(async move { rt.run().await })
    };

    let room = rt.rooms().add_room("Huddle");
    let laptop = rt.rooms().add_source("Laptop");

    let select = rt.rooms().request_source_change(&room, Some(Arc::clone(&laptop)));
    let clear = rt.rooms().request_source_change(&room, None);
    assert_eq!(laptop.room_count(), 0);

    for change in [select, clear] {
        let report = change.into_handle().expect("job").wait().await.expect("ran");
        assert!(report.is_clean());
    }
    assert_eq!(system.ended.load(Ordering::SeqCst), 1);
    assert!(!room.is_source_change_busy());
    assert_eq!(
        system.log(),
        vec![
            "Huddle started Laptop",
            "Huddle process",
            "Huddle ended",
            "Huddle started none",
            "Huddle process",
            "Huddle ended",
        ]
    );

    rt.shutdown();
    runner.await.expect("join").expect("clean shutdown");
}

#[tokio::test(start_paused = true)]
async fn confirmed_power_off_clears_the_room() {
    let system = Arc::new(ScriptedSystem::default());
    let rt = RuntimeBuilder::new(Config::default(), system.clone())
        .with_restarter(Arc::new(NoRestart))
        .build()
        .expect("build");
    let room = rt.rooms().add_room("Studio");
    let panel = Panel::new("studio panel", Some(room.id()));
    rt.surfaces().register(panel.clone());
    let camera = rt.rooms().add_source("Camera");

    let runner = {
        let rt = Arc::clone(&rt);
        tokio::spawn(async move { rt.run().await })
    };
    tokio::time::sleep(Duration::from_secs(1)).await;

    let _ = rt.rooms().request_source_change(&room, Some(Arc::clone(&camera)));
    let prompt = rt.rooms().power_off_with_confirmation(
        rt.arbiter(),
        &room,
        PowerEvent::User,
        Duration::from_secs(30),
    );
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(*panel.shown.lock(), vec![prompt.id]);

    rt.arbiter().respond(prompt.id, "power_off");
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert!(room.current_source().is_none());
    assert_eq!(camera.room_count(), 0);
    assert_eq!(system.log().last().map(String::as_str), Some("Studio power_off User"));

    rt.shutdown();
    runner.await.expect("join").expect("clean shutdown");
}
