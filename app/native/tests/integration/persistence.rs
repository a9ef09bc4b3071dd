//! The on-disk record: legacy upgrades, atomic rewrites and the handoff
//! between one-shot invocations and the daemon.

use std::sync::Arc;

use serde_json::{Value, json};
use tempfile::TempDir;
use wallcycle_lib::constants::SCHEMA_VERSION;
use wallcycle_lib::rotation::{
    FileStore, ImageLibrary, ReconcileAction, RotationRequest, RotationService, StateStore, Target,
    WallpaperSetter,
};
use wallcycle_lib::scheduler::{DaemonHandoff, ScheduleRequest, TaskScheduler};

use crate::common::*;

fn read_record(dir: &TempDir) -> Value {
    let text = std::fs::read_to_string(dir.path().join("rotation_config.json")).unwrap();
    serde_json::from_str(&text).unwrap()
}

fn service_over(
    dir: &TempDir,
    scheduler: Arc<dyn TaskScheduler>,
    setter: Arc<RecordingSetter>,
) -> RotationService {
    RotationService::new(
        Arc::new(FileStore::new(dir.path())),
        setter as Arc<dyn WallpaperSetter>,
        scheduler,
        ImageLibrary::new(dir.path().join("images")),
    )
}

/// One-shot service, seeded from the stored record the way the CLI does it.
fn cli_service(dir: &TempDir) -> RotationService {
    let record = FileStore::new(dir.path()).load();
    let handoff = DaemonHandoff::new(
        record.task_registered.then(|| ScheduleRequest::every(record.interval_minutes)),
    );
    service_over(dir, Arc::new(handoff), Arc::new(RecordingSetter::default()))
}

// =============================================================================
// Legacy records
// =============================================================================

#[test]
fn test_legacy_flat_record_keeps_rotating_after_upgrade() {
    let dir = TempDir::new().unwrap();
    let outside = TempDir::new().unwrap();
    let a = outside.path().join("a.png");
    let b = outside.path().join("b.png");
    std::fs::write(&a, b"a").unwrap();
    std::fs::write(&b, b"b").unwrap();

    let legacy = json!({
        "imageArray": [format!("file://{}", a.display()), format!("file://{}", b.display())],
        "isRandom": false,
        "screen": "HOME",
        "isTaskRegistered": true,
        "previousIndex": 0,
    });
    std::fs::write(dir.path().join("rotation_config.json"), legacy.to_string()).unwrap();

    let setter = Arc::new(RecordingSetter::default());
    let service = service_over(&dir, Arc::new(ManualScheduler::default()), Arc::clone(&setter));

    let applied = service.select_and_apply_now().unwrap();
    assert_eq!(applied.index, 1);
    assert_eq!(setter.applied(), vec![b.clone()]);

    let record = read_record(&dir);
    assert_eq!(record["schemaVersion"], json!(SCHEMA_VERSION));
    assert_eq!(record["activeAlbum"], json!(0));
    assert_eq!(record["taskRegistered"], json!(true));
    assert_eq!(record["albums"][0]["images"].as_array().unwrap().len(), 2);
    assert!(record.get("imageArray").is_none());
}

#[test]
fn test_deleting_legacy_album_leaves_outside_files_alone() {
    let dir = TempDir::new().unwrap();
    let outside = TempDir::new().unwrap();
    let picture = outside.path().join("family.jpg");
    std::fs::write(&picture, b"keep me").unwrap();

    let legacy = json!({
        "imageArray": [["Family", picture.display().to_string()]],
        "album": 0,
        "isTaskRegistered": false,
    });
    std::fs::write(dir.path().join("rotation_config.json"), legacy.to_string()).unwrap();

    let service = cli_service(&dir);
    let config = service.delete_album(0).unwrap();

    assert!(config.albums.is_empty());
    assert!(picture.is_file());
}

#[test]
fn test_corrupt_record_loads_as_empty() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("rotation_config.json"), "{ not json").unwrap();

    let config = cli_service(&dir).load_config();

    assert!(config.albums.is_empty());
    assert!(!config.task_registered);
}

// =============================================================================
// One-shot invocations and the daemon
// =============================================================================

#[test]
fn test_daemon_follows_start_and_stop_from_cli() {
    let dir = TempDir::new().unwrap();
    let picked = TempDir::new().unwrap();
    let source = picked.path().join("lake.jpg");
    std::fs::write(&source, b"lake").unwrap();

    let daemon_scheduler = Arc::new(ManualScheduler::default());
    let daemon = service_over(
        &dir,
        Arc::clone(&daemon_scheduler) as Arc<dyn TaskScheduler>,
        Arc::new(RecordingSetter::default()),
    );
    assert!(!daemon.resume().unwrap());

    let album = cli_service(&dir).create_album("Lakes", &[source]).unwrap();
    cli_service(&dir)
        .register_rotation(RotationRequest {
            interval_minutes: 45,
            shuffle: false,
            target: Target::Home,
            album,
        })
        .unwrap();

    assert_eq!(daemon.reconcile().unwrap(), ReconcileAction::Registered);
    assert_eq!(daemon_scheduler.registration().map(|r| r.interval_minutes), Some(45));

    let stopper = cli_service(&dir);
    assert!(stopper.registration().is_some());
    stopper.stop_rotation().unwrap();

    assert_eq!(daemon.reconcile().unwrap(), ReconcileAction::Cancelled);
    assert!(!daemon_scheduler.is_registered());
    assert_eq!(read_record(&dir)["taskRegistered"], json!(false));
}

#[test]
fn test_daemon_tick_is_visible_to_next_cli_invocation() {
    let dir = TempDir::new().unwrap();
    let picked = TempDir::new().unwrap();
    let sources: Vec<_> = ["one.jpg", "two.jpg"]
        .iter()
        .map(|name| {
            let path = picked.path().join(name);
            std::fs::write(&path, name.as_bytes()).unwrap();
            path
        })
        .collect();

    let album = cli_service(&dir).create_album("Pair", &sources).unwrap();
    cli_service(&dir)
        .register_rotation(RotationRequest {
            interval_minutes: 30,
            shuffle: false,
            target: Target::Home,
            album,
        })
        .unwrap();

    let daemon_scheduler = Arc::new(ManualScheduler::default());
    let daemon = service_over(
        &dir,
        Arc::clone(&daemon_scheduler) as Arc<dyn TaskScheduler>,
        Arc::new(RecordingSetter::default()),
    );
    assert!(daemon.resume().unwrap());
    daemon_scheduler.fire(false);

    assert_eq!(cli_service(&dir).load_config().recent_indices, vec![0]);
    assert_eq!(cli_service(&dir).select_and_apply_now().unwrap().index, 1);
}

#[test]
fn test_failed_write_keeps_previous_record() {
    let dir = TempDir::new().unwrap();
    let store = FileStore::new(dir.path());
    let mut config = store.load();
    config.shuffle = true;
    store.save(&config).unwrap();

    let before = read_record(&dir);
    let blocked = FileStore::new(dir.path().join("rotation_config.json"));
    assert!(blocked.save(&config).is_err());

    assert_eq!(read_record(&dir), before);
}
