//! Firings from the host scheduler: ticks, acknowledgement, time budget,
//! resume after restart and reconciliation.

use std::sync::Arc;
use std::time::{Duration, Instant};

use wallcycle_lib::rotation::{
    Album, ImageLibrary, MemoryStore, ReconcileAction, RotationConfig, RotationRequest,
    RotationService, RunnerState, StateStore, Target, WallpaperSetter,
};
use wallcycle_lib::scheduler::{TaskScheduler, TimerScheduler};

use crate::common::*;

fn running(fixture: &Fixture, images: usize) -> usize {
    let album = fixture.album("Live", images);
    fixture
        .service
        .register_rotation(RotationRequest {
            interval_minutes: 30,
            shuffle: false,
            target: Target::Home,
            album,
        })
        .unwrap();
    album
}

// =============================================================================
// Firings
// =============================================================================

#[test]
fn test_firing_applies_and_acknowledges_once() {
    let fixture = Fixture::new();
    running(&fixture, 2);

    let trigger = fixture.scheduler.fire(false);

    assert_eq!(fixture.setter.calls().len(), 1);
    assert_eq!(fixture.scheduler.acked(), vec![trigger]);
    assert_eq!(fixture.service.load_config().recent_indices, vec![0]);
    assert_eq!(fixture.service.runner().state(), RunnerState::Scheduled);
    assert_eq!(fixture.service.runner().counters(), (1, 0));
}

#[test]
fn test_late_timeout_after_completion_is_ignored() {
    let fixture = Fixture::new();
    running(&fixture, 2);

    let trigger = fixture.scheduler.fire(false);
    fixture.scheduler.time_out(&trigger);

    assert_eq!(fixture.scheduler.acked().len(), 1);
    assert_eq!(fixture.service.runner().counters(), (1, 0));
}

#[test]
fn test_timed_out_firing_is_acknowledged_without_work() {
    let fixture = Fixture::new();
    running(&fixture, 2);
    let saves = fixture.store.saves();

    let trigger = fixture.scheduler.fire(true);

    assert!(fixture.setter.calls().is_empty());
    assert_eq!(fixture.store.saves(), saves);
    assert_eq!(fixture.scheduler.acked(), vec![trigger]);
    assert_eq!(fixture.service.runner().counters(), (0, 1));
}

#[test]
fn test_firing_after_stop_in_record_does_nothing() {
    let fixture = Fixture::new();
    running(&fixture, 2);
    // Another process stopped rotation; this one's timer still fires once.
    let mut config = fixture.service.load_config();
    config.task_registered = false;
    fixture.store.save(&config).unwrap();

    let trigger = fixture.scheduler.fire(false);

    assert!(fixture.setter.calls().is_empty());
    assert_eq!(fixture.scheduler.acked(), vec![trigger]);
}

#[test]
fn test_failed_tick_is_still_acknowledged() {
    let fixture = Fixture::new();
    running(&fixture, 2);
    fixture.setter.set_fail(true);

    let trigger = fixture.scheduler.fire(false);

    assert_eq!(fixture.scheduler.acked(), vec![trigger]);
    assert!(fixture.service.load_config().recent_indices.is_empty());
}

#[test]
fn test_each_firing_gets_its_own_acknowledgement() {
    let fixture = Fixture::new();
    running(&fixture, 3);

    let triggers: Vec<_> = (0..3).map(|_| fixture.scheduler.fire(false)).collect();

    assert_eq!(fixture.scheduler.acked(), triggers);
    assert_eq!(fixture.setter.calls().len(), 3);
}

// =============================================================================
// Resume and reconcile
// =============================================================================

fn stored(task_registered: bool, interval_minutes: u32) -> MemoryStore {
    let config = RotationConfig {
        albums: vec![Album::new("Boot", vec!["/nowhere/a.jpg".into()])],
        active_album: Some(0),
        task_registered,
        interval_minutes,
        ..RotationConfig::default()
    };
    MemoryStore::with_config(&config)
}

#[test]
fn test_resume_registers_from_record() {
    let fixture = Fixture::build(stored(true, 120), ManualScheduler::default());

    assert!(fixture.service.resume().unwrap());

    assert_eq!(fixture.scheduler.registration().map(|r| r.interval_minutes), Some(120));
    assert_eq!(fixture.service.runner().state(), RunnerState::Scheduled);
}

#[test]
fn test_resume_when_stopped_registers_nothing() {
    let fixture = Fixture::build(stored(false, 120), ManualScheduler::default());

    assert!(!fixture.service.resume().unwrap());

    assert_eq!(fixture.scheduler.registers(), 0);
    assert_eq!(fixture.service.runner().state(), RunnerState::Unregistered);
}

#[test]
fn test_reconcile_registers_missing_schedule() {
    let fixture = Fixture::build(stored(true, 60), ManualScheduler::default());
    assert_eq!(fixture.service.reconcile().unwrap(), ReconcileAction::Registered);
    assert!(fixture.scheduler.is_registered());
}

#[test]
fn test_reconcile_reschedules_changed_interval() {
    let fixture = Fixture::build(stored(true, 60), ManualScheduler::registered(30));
    assert_eq!(fixture.service.reconcile().unwrap(), ReconcileAction::Rescheduled);
    assert_eq!(fixture.scheduler.registration().map(|r| r.interval_minutes), Some(60));
}

#[test]
fn test_reconcile_cancels_unwanted_schedule() {
    let fixture = Fixture::build(stored(false, 60), ManualScheduler::registered(60));
    assert_eq!(fixture.service.reconcile().unwrap(), ReconcileAction::Cancelled);
    assert!(!fixture.scheduler.is_registered());
}

#[test]
fn test_reconcile_in_agreement_changes_nothing() {
    let fixture = Fixture::build(stored(true, 60), ManualScheduler::registered(60));
    assert_eq!(fixture.service.reconcile().unwrap(), ReconcileAction::Unchanged);
    assert_eq!(fixture.scheduler.registers(), 0);
    assert_eq!(fixture.scheduler.cancels(), 0);
}

// =============================================================================
// Timer scheduler
// =============================================================================

#[test]
fn test_timer_scheduler_drives_rotation() {
    let fixture = Fixture::new();
    let album = fixture.album("Timer", 3);
    let config = fixture.service.load_config();

    let setter = Arc::new(RecordingSetter::default());
    let store: Arc<dyn StateStore> = Arc::new(MemoryStore::with_config(&config));
    let timer = Arc::new(TimerScheduler::new(Duration::from_secs(2)).with_minute(Duration::from_millis(1)));
    let service = RotationService::new(
        Arc::clone(&store),
        Arc::clone(&setter) as Arc<dyn WallpaperSetter>,
        Arc::clone(&timer) as Arc<dyn TaskScheduler>,
        ImageLibrary::new(fixture.library_dir()),
    );

    // 15 interval minutes of 1ms each.
    service
        .register_rotation(RotationRequest {
            interval_minutes: 15,
            shuffle: false,
            target: Target::Home,
            album,
        })
        .unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    while service.runner().counters().0 < 3 && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(10));
    }
    service.stop_rotation().unwrap();

    let applied = setter.applied();
    assert!(applied.len() >= 3, "timer applied {} wallpapers", applied.len());
    assert_eq!(applied[..3], config.albums[album].images[..3]);
    assert!(!timer.is_registered());
}
