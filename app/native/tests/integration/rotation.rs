//! Starting, stopping and changing rotation, and manual ticks.

use std::collections::HashSet;

use wallcycle_lib::constants::interval;
use wallcycle_lib::error::WallcycleError;
use wallcycle_lib::rotation::{ConfigPatch, RotationRequest, Target};

use crate::common::*;

fn request(album: usize) -> RotationRequest {
    RotationRequest { interval_minutes: 60, shuffle: false, target: Target::Home, album }
}

// =============================================================================
// Starting and stopping
// =============================================================================

#[test]
fn test_register_rotation_registers_then_persists() {
    let fixture = Fixture::new();
    let album = fixture.album("Start", 3);

    let config = fixture
        .service
        .register_rotation(RotationRequest { shuffle: true, target: Target::Both, ..request(album) })
        .unwrap();

    assert_eq!(fixture.scheduler.registers(), 1);
    assert_eq!(fixture.scheduler.registration().map(|r| r.interval_minutes), Some(60));
    assert!(config.task_registered);
    assert_eq!(config.active_album, Some(album));
    assert!(config.shuffle);
    assert_eq!(config.target, Target::Both);
    assert_eq!(fixture.service.load_config(), config);
}

#[test]
fn test_register_rotation_clamps_interval() {
    let fixture = Fixture::new();
    let album = fixture.album("Clamp", 1);

    let config = fixture
        .service
        .register_rotation(RotationRequest { interval_minutes: 1, ..request(album) })
        .unwrap();
    assert_eq!(config.interval_minutes, interval::MIN_MINUTES);

    let config = fixture
        .service
        .register_rotation(RotationRequest { interval_minutes: 100_000, ..request(album) })
        .unwrap();
    assert_eq!(config.interval_minutes, interval::MAX_MINUTES);
    assert_eq!(
        fixture.scheduler.registration().map(|r| r.interval_minutes),
        Some(interval::MAX_MINUTES)
    );
}

#[test]
fn test_register_rotation_rejects_missing_or_empty_album() {
    let fixture = Fixture::new();
    let album = fixture.album("Drained", 1);
    fixture.service.remove_image(album, 0).unwrap();

    assert!(matches!(
        fixture.service.register_rotation(request(album)),
        Err(WallcycleError::AlbumError(_))
    ));
    assert!(matches!(
        fixture.service.register_rotation(request(4)),
        Err(WallcycleError::AlbumError(_))
    ));
    assert_eq!(fixture.scheduler.registers(), 0);
    assert!(!fixture.service.load_config().task_registered);
}

#[test]
fn test_register_rotation_scheduler_refusal_leaves_record_untouched() {
    let fixture = Fixture::new();
    let album = fixture.album("Refused", 2);
    let before = fixture.service.load_config();
    fixture.scheduler.set_fail_register(true);

    let result = fixture.service.register_rotation(request(album));

    assert!(matches!(result, Err(WallcycleError::SchedulerError(_))));
    assert_eq!(fixture.service.load_config(), before);
}

#[test]
fn test_register_rotation_save_failure_rolls_back_schedule() {
    let fixture = Fixture::new();
    let album = fixture.album("Unsaved", 2);
    fixture.store.set_fail_saves(true);

    let result = fixture.service.register_rotation(request(album));

    assert!(matches!(result, Err(WallcycleError::StorageError(_))));
    assert!(!fixture.scheduler.is_registered());
    assert!(!fixture.service.load_config().task_registered);
}

#[test]
fn test_register_rotation_save_failure_restores_previous_interval() {
    let fixture = Fixture::new();
    let album = fixture.album("Keep", 2);
    fixture.service.register_rotation(request(album)).unwrap();
    fixture.store.set_fail_saves(true);

    let result =
        fixture.service.register_rotation(RotationRequest { interval_minutes: 120, ..request(album) });

    assert!(result.is_err());
    assert_eq!(fixture.scheduler.registration().map(|r| r.interval_minutes), Some(60));
}

#[test]
fn test_switching_album_starts_fresh_cycle() {
    let fixture = Fixture::new();
    let first = fixture.album("First", 3);
    let second = fixture.album("Second", 3);
    fixture.service.register_rotation(request(first)).unwrap();
    fixture.service.select_and_apply_now().unwrap();
    fixture.service.select_and_apply_now().unwrap();

    let same = fixture.service.register_rotation(request(first)).unwrap();
    assert_eq!(same.recent_indices, vec![0, 1]);

    let switched = fixture.service.register_rotation(request(second)).unwrap();
    assert!(switched.recent_indices.is_empty());
}

#[test]
fn test_stop_rotation_keeps_albums_and_history() {
    let fixture = Fixture::new();
    let album = fixture.album("Pause", 3);
    fixture.service.register_rotation(request(album)).unwrap();
    fixture.service.select_and_apply_now().unwrap();

    let config = fixture.service.stop_rotation().unwrap();

    assert_eq!(fixture.scheduler.cancels(), 1);
    assert!(!config.task_registered);
    assert_eq!(config.active_album, Some(album));
    assert_eq!(config.recent_indices, vec![0]);
    assert_eq!(config.albums.len(), 1);
}

#[test]
fn test_stop_rotation_save_failure_restores_schedule() {
    let fixture = Fixture::new();
    let album = fixture.album("Unsaved", 2);
    fixture.service.register_rotation(request(album)).unwrap();
    fixture.store.set_fail_saves(true);

    let result = fixture.service.stop_rotation();

    assert!(matches!(result, Err(WallcycleError::StorageError(_))));
    assert!(fixture.service.load_config().task_registered);
    assert_eq!(fixture.scheduler.registration().map(|r| r.interval_minutes), Some(60));
}

#[test]
fn test_stop_rotation_when_stopped_does_not_write() {
    let fixture = Fixture::new();
    fixture.album("Idle", 1);
    let saves = fixture.store.saves();

    fixture.service.stop_rotation().unwrap();

    assert_eq!(fixture.store.saves(), saves);
}

// =============================================================================
// Settings
// =============================================================================

#[test]
fn test_update_config_reschedules_running_rotation_on_interval_change() {
    let fixture = Fixture::new();
    let album = fixture.album("Tune", 2);
    fixture.service.register_rotation(request(album)).unwrap();

    let config = fixture
        .service
        .update_config(ConfigPatch { interval_minutes: Some(90), ..ConfigPatch::default() })
        .unwrap();

    assert_eq!(config.interval_minutes, 90);
    assert_eq!(fixture.scheduler.registers(), 2);
    assert_eq!(fixture.scheduler.registration().map(|r| r.interval_minutes), Some(90));
}

#[test]
fn test_update_config_while_stopped_only_persists() {
    let fixture = Fixture::new();

    let config = fixture
        .service
        .update_config(ConfigPatch {
            shuffle: Some(true),
            target: Some(Target::Lock),
            interval_minutes: Some(45),
        })
        .unwrap();

    assert!(config.shuffle);
    assert_eq!(config.target, Target::Lock);
    assert_eq!(config.interval_minutes, 45);
    assert_eq!(fixture.scheduler.registers(), 0);
    assert_eq!(fixture.service.load_config(), config);
}

#[test]
fn test_update_config_same_interval_does_not_reschedule() {
    let fixture = Fixture::new();
    let album = fixture.album("Same", 2);
    fixture.service.register_rotation(request(album)).unwrap();

    fixture
        .service
        .update_config(ConfigPatch { shuffle: Some(true), interval_minutes: Some(60), ..ConfigPatch::default() })
        .unwrap();

    assert_eq!(fixture.scheduler.registers(), 1);
}

// =============================================================================
// Manual ticks
// =============================================================================

#[test]
fn test_select_and_apply_now_works_without_registration() {
    let fixture = Fixture::new();
    let album = fixture.album("Manual", 3);
    fixture.service.register_rotation(request(album)).unwrap();
    fixture.service.stop_rotation().unwrap();

    let applied = fixture.service.select_and_apply_now().unwrap();

    assert_eq!(applied.index, 0);
    assert_eq!(fixture.setter.calls().len(), 1);
    assert!(!fixture.service.load_config().task_registered);
}

#[test]
fn test_sequential_ticks_wrap_around() {
    let fixture = Fixture::new();
    let album = fixture.album("Loop", 3);
    fixture.service.register_rotation(request(album)).unwrap();

    let order: Vec<usize> =
        (0..7).map(|_| fixture.service.select_and_apply_now().unwrap().index).collect();

    assert_eq!(order, vec![0, 1, 2, 0, 1, 2, 0]);
}

#[test]
fn test_shuffle_shows_every_image_once_per_cycle() {
    let fixture = Fixture::new();
    let album = fixture.album("Mix", 5);
    fixture
        .service
        .register_rotation(RotationRequest { shuffle: true, ..request(album) })
        .unwrap();

    let picks: Vec<usize> =
        (0..20).map(|_| fixture.service.select_and_apply_now().unwrap().index).collect();

    let first_cycle: HashSet<usize> = picks[..5].iter().copied().collect();
    assert_eq!(first_cycle.len(), 5, "first cycle {:?} repeated an image", &picks[..5]);
    for pair in picks.windows(2) {
        assert_ne!(pair[0], pair[1], "immediate repeat in {picks:?}");
    }
}

#[test]
fn test_apply_goes_to_configured_target() {
    let fixture = Fixture::new();
    let album = fixture.album("Lock", 1);
    fixture
        .service
        .register_rotation(RotationRequest { target: Target::Lock, ..request(album) })
        .unwrap();

    fixture.service.select_and_apply_now().unwrap();

    assert_eq!(fixture.setter.calls()[0].0, Target::Lock);
}

#[test]
fn test_failed_apply_does_not_advance_history() {
    let fixture = Fixture::new();
    let album = fixture.album("Fail", 3);
    fixture.service.register_rotation(request(album)).unwrap();
    fixture.service.select_and_apply_now().unwrap();
    fixture.setter.set_fail(true);

    let result = fixture.service.select_and_apply_now();

    assert!(matches!(result, Err(WallcycleError::ApplyError(_))));
    assert_eq!(fixture.service.load_config().recent_indices, vec![0]);
}

#[test]
fn test_missing_image_file_is_reported_without_platform_call() {
    let fixture = Fixture::new();
    let album = fixture.album("Vanish", 2);
    fixture.service.register_rotation(request(album)).unwrap();
    let first = fixture.service.load_config().albums[album].images[0].clone();
    std::fs::remove_file(&first).unwrap();

    let result = fixture.service.select_and_apply_now();

    assert!(matches!(result, Err(WallcycleError::ApplyError(_))));
    assert!(fixture.setter.calls().is_empty());
}

#[test]
fn test_manual_tick_without_album_is_an_album_error() {
    let fixture = Fixture::new();
    assert!(matches!(fixture.service.select_and_apply_now(), Err(WallcycleError::AlbumError(_))));
}
