//! Album management: imports, removals and deletions with their effect on
//! the rotation record and the recurring task.

use wallcycle_lib::error::WallcycleError;
use wallcycle_lib::rotation::RotationRequest;
use wallcycle_lib::rotation::Target;

use crate::common::*;

fn start(fixture: &Fixture, album: usize) {
    fixture
        .service
        .register_rotation(RotationRequest {
            interval_minutes: 30,
            shuffle: false,
            target: Target::Home,
            album,
        })
        .expect("start rotation");
}

// =============================================================================
// Creating albums
// =============================================================================

#[test]
fn test_create_album_copies_images_into_library() {
    let fixture = Fixture::new();
    let sources = fixture.pick(&["beach.jpg", "dunes.png"]);

    let index = fixture.service.create_album("  Summer ", &sources).unwrap();

    let config = fixture.service.load_config();
    assert_eq!(index, 0);
    assert_eq!(config.albums[0].name, "Summer");
    assert_eq!(config.albums[0].len(), 2);
    for image in &config.albums[0].images {
        assert!(image.starts_with(fixture.library_dir()));
        assert!(image.is_file());
    }
    assert!(sources.iter().all(|s| s.is_file()), "originals must stay in place");
}

#[test]
fn test_create_album_with_colliding_names_keeps_both() {
    let fixture = Fixture::new();
    let first = fixture.pick(&["sunset.jpg"]);
    fixture.service.create_album("A", &first).unwrap();
    fixture.service.create_album("B", &first).unwrap();

    let config = fixture.service.load_config();
    assert_ne!(config.albums[0].images[0], config.albums[1].images[0]);
    assert_eq!(fixture.library_files(), 2);
}

#[test]
fn test_create_album_rejects_blank_name_and_no_images() {
    let fixture = Fixture::new();
    let sources = fixture.pick(&["a.jpg"]);

    let blank = fixture.service.create_album("   ", &sources);
    assert!(matches!(blank, Err(WallcycleError::InvalidArguments(_))));

    let empty = fixture.service.create_album("Empty", &[]);
    assert!(matches!(empty, Err(WallcycleError::InvalidArguments(_))));

    assert!(fixture.service.load_config().albums.is_empty());
    assert_eq!(fixture.store.saves(), 0);
}

#[test]
fn test_create_album_rolls_back_copies_on_missing_source() {
    let fixture = Fixture::new();
    let mut sources = fixture.pick(&["a.jpg", "b.jpg"]);
    sources.push(fixture.dir.path().join("picked/missing.jpg"));

    let result = fixture.service.create_album("Broken", &sources);

    assert!(matches!(result, Err(WallcycleError::FileOpError(_))));
    assert_eq!(fixture.library_files(), 0);
    assert!(fixture.service.load_config().albums.is_empty());
}

#[test]
fn test_create_album_rolls_back_copies_on_save_failure() {
    let fixture = Fixture::new();
    let sources = fixture.pick(&["a.jpg", "b.jpg"]);
    fixture.store.set_fail_saves(true);

    let result = fixture.service.create_album("Unsaved", &sources);

    assert!(matches!(result, Err(WallcycleError::StorageError(_))));
    assert_eq!(fixture.library_files(), 0);
}

#[test]
fn test_import_directory_uses_natural_order() {
    let fixture = Fixture::new();
    let dir = fixture.dir.path().join("picked");
    fixture.pick(&["img10.jpg", "img2.jpg", "img1.jpg", "notes.txt"]);

    let index = fixture.service.import_directory("Sorted", &dir).unwrap();

    let config = fixture.service.load_config();
    let names: Vec<String> = config.albums[index]
        .images
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, ["img1.jpg", "img2.jpg", "img10.jpg"]);
}

#[test]
fn test_add_images_appends_to_album() {
    let fixture = Fixture::new();
    let album = fixture.album("Grow", 1);

    let config = fixture.service.add_images(album, &fixture.pick(&["more.webp"])).unwrap();

    assert_eq!(config.albums[album].len(), 2);
    assert!(matches!(
        fixture.service.add_images(9, &fixture.pick(&["x.jpg"])),
        Err(WallcycleError::AlbumError(_))
    ));
}

// =============================================================================
// Removing images
// =============================================================================

#[test]
fn test_remove_image_deletes_file_and_shifts_history() {
    let fixture = Fixture::new();
    let album = fixture.album("Shift", 4);
    start(&fixture, album);
    for _ in 0..3 {
        fixture.service.select_and_apply_now().unwrap();
    }
    assert_eq!(fixture.service.load_config().recent_indices, vec![0, 1, 2]);

    let removed = fixture.service.load_config().albums[album].images[1].clone();
    let config = fixture.service.remove_image(album, 1).unwrap();

    assert!(!removed.exists());
    assert_eq!(config.albums[album].len(), 3);
    assert_eq!(config.recent_indices, vec![0, 1]);
    assert!(config.task_registered);
    assert_eq!(fixture.scheduler.cancels(), 0);
}

#[test]
fn test_removing_last_image_of_active_album_cancels_exactly_once() {
    let fixture = Fixture::new();
    let album = fixture.album("Solo", 1);
    start(&fixture, album);

    let config = fixture.service.remove_image(album, 0).unwrap();

    assert_eq!(fixture.scheduler.cancels(), 1);
    assert!(!fixture.scheduler.is_registered());
    assert!(!config.task_registered);
    assert!(config.albums[album].is_empty());
    assert!(config.recent_indices.is_empty());
}

#[test]
fn test_remove_image_keeps_schedule_when_cancel_fails() {
    let fixture = Fixture::new();
    let album = fixture.album("Stuck", 1);
    start(&fixture, album);
    fixture.scheduler.set_fail_cancel(true);

    let result = fixture.service.remove_image(album, 0);

    assert!(matches!(result, Err(WallcycleError::SchedulerError(_))));
    let config = fixture.service.load_config();
    assert!(config.task_registered);
    assert_eq!(config.albums[album].len(), 1);
    assert!(config.albums[album].images[0].is_file());
}

#[test]
fn test_remove_last_image_save_failure_restores_schedule() {
    let fixture = Fixture::new();
    let album = fixture.album("Unsaved", 1);
    start(&fixture, album);
    fixture.store.set_fail_saves(true);

    let result = fixture.service.remove_image(album, 0);

    assert!(matches!(result, Err(WallcycleError::StorageError(_))));
    assert!(fixture.service.load_config().task_registered);
    assert_eq!(fixture.scheduler.registration().map(|r| r.interval_minutes), Some(30));
}

#[test]
fn test_remove_image_out_of_range() {
    let fixture = Fixture::new();
    let album = fixture.album("Small", 2);
    assert!(matches!(fixture.service.remove_image(album, 5), Err(WallcycleError::AlbumError(_))));
}

// =============================================================================
// Deleting albums
// =============================================================================

#[test]
fn test_delete_album_before_active_shifts_active_index() {
    let fixture = Fixture::new();
    let first = fixture.album("First", 2);
    let second = fixture.album("Second", 2);
    start(&fixture, second);

    let config = fixture.service.delete_album(first).unwrap();

    assert_eq!(config.active_album, Some(0));
    assert_eq!(config.albums[0].name, "Second");
    assert!(config.task_registered);
    assert_eq!(fixture.scheduler.cancels(), 0);
    assert_eq!(fixture.library_files(), 2);
}

#[test]
fn test_delete_active_album_stops_rotation() {
    let fixture = Fixture::new();
    let album = fixture.album("Gone", 3);
    fixture.album("Kept", 1);
    start(&fixture, album);
    fixture.service.select_and_apply_now().unwrap();

    let config = fixture.service.delete_album(album).unwrap();

    assert_eq!(fixture.scheduler.cancels(), 1);
    assert_eq!(config.active_album, None);
    assert!(!config.task_registered);
    assert!(config.recent_indices.is_empty());
    assert_eq!(config.albums.len(), 1);
    assert_eq!(fixture.library_files(), 1);
}

#[test]
fn test_delete_active_album_save_failure_restores_schedule() {
    let fixture = Fixture::new();
    let album = fixture.album("Unsaved", 2);
    start(&fixture, album);
    fixture.store.set_fail_saves(true);

    let result = fixture.service.delete_album(album);

    assert!(matches!(result, Err(WallcycleError::StorageError(_))));
    assert!(fixture.service.load_config().task_registered);
    assert!(fixture.scheduler.is_registered());
}

#[test]
fn test_delete_album_after_active_keeps_active_index() {
    let fixture = Fixture::new();
    let active = fixture.album("Active", 1);
    let other = fixture.album("Other", 1);
    start(&fixture, active);

    let config = fixture.service.delete_album(other).unwrap();

    assert_eq!(config.active_album, Some(active));
    assert!(config.task_registered);
}

#[test]
fn test_delete_missing_album() {
    let fixture = Fixture::new();
    assert!(matches!(fixture.service.delete_album(0), Err(WallcycleError::AlbumError(_))));
}
