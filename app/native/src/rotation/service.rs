//! Operations offered to the foreground collaborator.
//!
//! Every mutation follows the same order: talk to the scheduler and the file
//! system first, persist the record last, and roll the side effects back when
//! a later step fails. A failed operation therefore never leaves
//! `taskRegistered` claiming a schedule that does not exist.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rand::rngs::StdRng;
use serde::Serialize;

use super::applier::WallpaperSetter;
use super::library::{ImageLibrary, list_images_in_directory};
use super::model::{Album, RotationConfig, Target};
use super::runner::{AppliedWallpaper, BackgroundRunner, TickError, TickOutcome};
use super::store::StateStore;
use crate::constants::interval;
use crate::error::WallcycleError;
use crate::scheduler::{
    FireEvent, ScheduleFlags, ScheduleRequest, SchedulerError, TaskHandlers, TaskScheduler,
    TriggerId,
};

/// Result type of service operations.
pub type Result<T> = std::result::Result<T, WallcycleError>;

/// Partial update of the rotation settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfigPatch {
    /// New shuffle setting.
    pub shuffle: Option<bool>,
    /// New target surface(s).
    pub target: Option<Target>,
    /// New interval; clamped into the supported range.
    pub interval_minutes: Option<u32>,
}

impl ConfigPatch {
    /// Returns whether the patch changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.shuffle.is_none() && self.target.is_none() && self.interval_minutes.is_none()
    }
}

/// Parameters for starting rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationRequest {
    /// Interval between ticks in minutes; clamped into the supported range.
    pub interval_minutes: u32,
    /// Random order without repeats.
    pub shuffle: bool,
    /// Surface(s) receiving the wallpaper.
    pub target: Target,
    /// Index of the album to rotate.
    pub album: usize,
}

/// What [`RotationService::reconcile`] changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ReconcileAction {
    /// Scheduler and record already agreed.
    Unchanged,
    /// A missing schedule was registered.
    Registered,
    /// The schedule was re-registered with a new interval.
    Rescheduled,
    /// A schedule the record no longer wants was cancelled.
    Cancelled,
}

/// Albums, rotation settings and the recurring task, behind one API.
pub struct RotationService {
    store: Arc<dyn StateStore>,
    setter: Arc<dyn WallpaperSetter>,
    scheduler: Arc<dyn TaskScheduler>,
    library: ImageLibrary,
    runner: Arc<BackgroundRunner>,
    flags: ScheduleFlags,
}

impl std::fmt::Debug for RotationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RotationService")
            .field("library", &self.library)
            .field("runner", &self.runner)
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}

impl RotationService {
    /// Creates a service over the given capabilities.
    #[must_use]
    pub fn new(
        store: Arc<dyn StateStore>,
        setter: Arc<dyn WallpaperSetter>,
        scheduler: Arc<dyn TaskScheduler>,
        library: ImageLibrary,
    ) -> Self {
        let runner = Arc::new(BackgroundRunner::new(
            Arc::clone(&store),
            Arc::clone(&setter),
            Arc::clone(&scheduler),
        ));

        Self { store, setter, scheduler, library, runner, flags: ScheduleFlags::default() }
    }

    /// Replaces the runner's random source.
    #[must_use]
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.runner = Arc::new(
            BackgroundRunner::new(
                Arc::clone(&self.store),
                Arc::clone(&self.setter),
                Arc::clone(&self.scheduler),
            )
            .with_rng(rng),
        );
        self
    }

    /// Overrides the lifecycle flags sent with each registration.
    #[must_use]
    pub fn with_flags(mut self, flags: ScheduleFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Returns the background runner.
    #[must_use]
    pub const fn runner(&self) -> &Arc<BackgroundRunner> { &self.runner }

    /// Returns the image library.
    #[must_use]
    pub const fn library(&self) -> &ImageLibrary { &self.library }

    /// Returns the scheduler's live registration.
    #[must_use]
    pub fn registration(&self) -> Option<ScheduleRequest> { self.scheduler.registration() }

    /// Returns the bytes used by imported images.
    #[must_use]
    pub fn storage_usage(&self) -> u64 { self.library.usage_bytes() }

    // ========================================================================
    // Settings
    // ========================================================================

    /// Returns the persisted record, migrated to the current schema.
    #[must_use]
    pub fn load_config(&self) -> RotationConfig { self.store.load() }

    /// Applies a partial settings update.
    ///
    /// Changing the interval while rotation runs re-registers the task.
    ///
    /// # Errors
    ///
    /// Returns an error if re-registration or persisting fails.
    pub fn update_config(&self, patch: ConfigPatch) -> Result<RotationConfig> {
        let mut config = self.store.load();
        let previous_interval = config.interval_minutes;

        if let Some(shuffle) = patch.shuffle {
            config.shuffle = shuffle;
        }
        if let Some(target) = patch.target {
            config.target = target;
        }
        if let Some(minutes) = patch.interval_minutes {
            config.interval_minutes = interval::clamp(minutes);
        }

        let rescheduled = config.task_registered && config.interval_minutes != previous_interval;
        if rescheduled {
            self.register_schedule(config.interval_minutes)?;
        }

        if let Err(err) = self.store.save(&config) {
            if rescheduled {
                self.restore_schedule(true, previous_interval);
            }
            return Err(err.into());
        }

        tracing::debug!(?patch, "rotation settings updated");
        Ok(config)
    }

    // ========================================================================
    // Rotation
    // ========================================================================

    /// Runs one tick now: select, apply and persist.
    ///
    /// Works whether or not the recurring task is registered.
    ///
    /// # Errors
    ///
    /// Returns an error if there is nothing to show, or applying or persisting
    /// fails.
    pub fn select_and_apply_now(&self) -> Result<AppliedWallpaper> {
        match self.runner.run_now() {
            Ok(TickOutcome::Applied(applied)) => Ok(applied),
            Ok(TickOutcome::Skipped(reason)) => Err(WallcycleError::AlbumError(reason.to_string())),
            Err(TickError::Apply(err)) => Err(err.into()),
            Err(TickError::Storage(err)) => Err(err.into()),
        }
    }

    /// Starts rotating `request.album`.
    ///
    /// Selecting a different album than before starts a fresh cycle.
    ///
    /// # Errors
    ///
    /// Returns an error if the album does not exist or is empty, or the
    /// scheduler or store refuses. On failure the previous schedule is kept.
    pub fn register_rotation(&self, request: RotationRequest) -> Result<RotationConfig> {
        let mut config = self.store.load();
        let album = find_album(&config, request.album)?;
        if album.is_empty() {
            return Err(WallcycleError::AlbumError(format!(
                "album '{}' has no images to rotate",
                album.name
            )));
        }

        let minutes = interval::clamp(request.interval_minutes);
        let was_registered = config.task_registered;
        let previous_interval = config.interval_minutes;

        self.register_schedule(minutes)?;

        if config.active_album != Some(request.album) {
            config.recent_indices.clear();
        }
        config.active_album = Some(request.album);
        config.shuffle = request.shuffle;
        config.target = request.target;
        config.interval_minutes = minutes;
        config.task_registered = true;

        if let Err(err) = self.store.save(&config) {
            self.restore_schedule(was_registered, previous_interval);
            return Err(err.into());
        }

        tracing::info!(
            album = request.album,
            interval_minutes = minutes,
            shuffle = request.shuffle,
            target = %request.target,
            "rotation started"
        );
        Ok(config)
    }

    /// Stops rotation. Albums and history are kept.
    ///
    /// # Errors
    ///
    /// Returns an error if the scheduler refuses to cancel or the record
    /// cannot be persisted.
    pub fn stop_rotation(&self) -> Result<RotationConfig> {
        self.cancel_schedule()?;

        let mut config = self.store.load();
        if config.task_registered {
            config.task_registered = false;
            if let Err(err) = self.store.save(&config) {
                self.restore_schedule(true, config.interval_minutes);
                return Err(err.into());
            }
            tracing::info!("rotation stopped");
        }
        Ok(config)
    }

    /// Registers the task again after a restart or reboot, if the record
    /// says rotation was running.
    ///
    /// # Returns
    ///
    /// Whether a task was registered.
    ///
    /// # Errors
    ///
    /// Returns an error if the scheduler refuses.
    pub fn resume(&self) -> Result<bool> {
        let config = self.store.load();
        if !config.task_registered {
            self.runner.mark_unregistered();
            return Ok(false);
        }

        self.register_schedule(config.interval_minutes)?;
        tracing::info!(interval_minutes = config.interval_minutes, "rotation resumed");
        Ok(true)
    }

    /// Brings the scheduler in line with the persisted record, which another
    /// process may have changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the scheduler refuses.
    pub fn reconcile(&self) -> Result<ReconcileAction> {
        let config = self.store.load();
        let action = match (config.task_registered, self.scheduler.registration()) {
            (true, None) => {
                self.register_schedule(config.interval_minutes)?;
                ReconcileAction::Registered
            }
            (true, Some(live)) if live.interval_minutes != config.interval_minutes => {
                self.register_schedule(config.interval_minutes)?;
                ReconcileAction::Rescheduled
            }
            (false, Some(_)) => {
                self.cancel_schedule()?;
                ReconcileAction::Cancelled
            }
            _ => ReconcileAction::Unchanged,
        };

        if action != ReconcileAction::Unchanged {
            tracing::info!(?action, "scheduler reconciled with stored record");
        }
        Ok(action)
    }

    // ========================================================================
    // Albums
    // ========================================================================

    /// Creates an album from copies of `sources`.
    ///
    /// # Returns
    ///
    /// The index of the new album.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is blank, no sources are given, a copy
    /// fails, or the record cannot be persisted. No copies are left behind on
    /// failure.
    pub fn create_album(&self, name: &str, sources: &[PathBuf]) -> Result<usize> {
        let name = name.trim();
        if name.is_empty() {
            return Err(WallcycleError::InvalidArguments("album name cannot be empty".to_string()));
        }
        if sources.is_empty() {
            return Err(WallcycleError::InvalidArguments(
                "an album needs at least one image".to_string(),
            ));
        }

        let images = self.library.import_all(sources)?;
        let mut config = self.store.load();
        config.albums.push(Album::new(name, images.clone()));

        if let Err(err) = self.store.save(&config) {
            self.library.discard(&images);
            return Err(err.into());
        }

        tracing::info!(name, images = images.len(), "album created");
        Ok(config.albums.len() - 1)
    }

    /// Creates an album from every supported image in `dir`, in natural order.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be read or holds no images,
    /// or album creation fails.
    pub fn import_directory(&self, name: &str, dir: &Path) -> Result<usize> {
        let sources = list_images_in_directory(dir)?;
        if sources.is_empty() {
            return Err(WallcycleError::InvalidArguments(format!(
                "no supported images found in {}",
                dir.display()
            )));
        }
        self.create_album(name, &sources)
    }

    /// Appends copies of `sources` to an album.
    ///
    /// # Errors
    ///
    /// Returns an error if the album does not exist, no sources are given, a
    /// copy fails, or the record cannot be persisted.
    pub fn add_images(&self, album: usize, sources: &[PathBuf]) -> Result<RotationConfig> {
        let mut config = self.store.load();
        find_album(&config, album)?;
        if sources.is_empty() {
            return Err(WallcycleError::InvalidArguments("no images given".to_string()));
        }

        let images = self.library.import_all(sources)?;
        config.albums[album].images.extend(images.iter().cloned());

        if let Err(err) = self.store.save(&config) {
            self.library.discard(&images);
            return Err(err.into());
        }

        tracing::info!(album, added = images.len(), "images added");
        Ok(config)
    }

    /// Removes one image from an album and deletes its file.
    ///
    /// Removing the last image of the active album stops rotation.
    ///
    /// # Errors
    ///
    /// Returns an error if the album or image does not exist, the file cannot
    /// be deleted, or the scheduler or store refuses.
    pub fn remove_image(&self, album: usize, image: usize) -> Result<RotationConfig> {
        let mut config = self.store.load();
        let entry = find_album(&config, album)?;
        let Some(path) = entry.images.get(image).cloned() else {
            return Err(WallcycleError::AlbumError(format!(
                "album '{}' has no image at index {image}",
                entry.name
            )));
        };

        let is_active = config.active_album == Some(album);
        let stops_rotation = is_active && config.task_registered && entry.len() == 1;
        if stops_rotation {
            self.cancel_schedule()?;
        }

        if let Err(err) = self.library.remove(&path) {
            if stops_rotation {
                self.restore_schedule(true, config.interval_minutes);
            }
            return Err(err.into());
        }

        config.albums[album].images.remove(image);
        if is_active {
            config.recent_indices.retain(|&i| i != image);
            for index in &mut config.recent_indices {
                if *index > image {
                    *index -= 1;
                }
            }
        }
        if stops_rotation {
            config.task_registered = false;
            tracing::info!(album, "last image removed, rotation stopped");
        }
        config.normalize();

        if let Err(err) = self.store.save(&config) {
            if stops_rotation {
                self.restore_schedule(true, config.interval_minutes);
            }
            return Err(err.into());
        }
        tracing::info!(album, image = %path.display(), "image removed");
        Ok(config)
    }

    /// Deletes an album and all of its files.
    ///
    /// Deleting the active album stops rotation; deleting an album before it
    /// shifts the active index down.
    ///
    /// # Errors
    ///
    /// Returns an error if the album does not exist, a file cannot be
    /// deleted, or the scheduler or store refuses.
    pub fn delete_album(&self, album: usize) -> Result<RotationConfig> {
        let mut config = self.store.load();
        let images = find_album(&config, album)?.images.clone();

        let was_active = config.active_album == Some(album);
        let stops_rotation = was_active && config.task_registered;
        if stops_rotation {
            self.cancel_schedule()?;
        }

        if let Err(err) = self.library.remove_all(&images) {
            if stops_rotation {
                self.restore_schedule(true, config.interval_minutes);
            }
            return Err(err.into());
        }

        let removed = config.albums.remove(album);
        match config.active_album {
            Some(active) if active == album => {
                config.active_album = None;
                config.task_registered = false;
                config.recent_indices.clear();
            }
            Some(active) if active > album => config.active_album = Some(active - 1),
            _ => {}
        }
        config.normalize();

        if let Err(err) = self.store.save(&config) {
            if stops_rotation {
                self.restore_schedule(true, config.interval_minutes);
            }
            return Err(err.into());
        }
        tracing::info!(album, name = %removed.name, stopped = stops_rotation, "album deleted");
        Ok(config)
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn handlers(&self) -> TaskHandlers {
        let fire_runner = Arc::downgrade(&self.runner);
        let timeout_runner = Arc::downgrade(&self.runner);

        TaskHandlers {
            on_fire: Arc::new(move |event: FireEvent| match fire_runner.upgrade() {
                Some(runner) => {
                    runner.handle_fire(event);
                }
                None => tracing::warn!(trigger = %event.trigger, "rotation runner dropped, ignoring firing"),
            }),
            on_timeout: Arc::new(move |trigger: TriggerId| {
                if let Some(runner) = timeout_runner.upgrade() {
                    runner.handle_timeout(&trigger);
                }
            }),
        }
    }

    fn register_schedule(&self, interval_minutes: u32) -> std::result::Result<(), SchedulerError> {
        let request = ScheduleRequest { interval_minutes, flags: self.flags };
        self.scheduler.register(request, self.handlers())?;
        self.runner.mark_scheduled();
        Ok(())
    }

    fn cancel_schedule(&self) -> std::result::Result<(), SchedulerError> {
        self.scheduler.cancel()?;
        self.runner.mark_unregistered();
        Ok(())
    }

    /// Puts the schedule back the way the stored record describes it.
    fn restore_schedule(&self, registered: bool, interval_minutes: u32) {
        let restored = if registered {
            self.register_schedule(interval_minutes)
        } else {
            self.cancel_schedule()
        };
        if let Err(err) = restored {
            tracing::error!(error = %err, "failed to restore rotation schedule after a failed update");
        }
    }
}

fn find_album(config: &RotationConfig, index: usize) -> Result<&Album> {
    config.album(index).ok_or_else(|| {
        WallcycleError::AlbumError(format!(
            "no album at index {index} ({} albums exist)",
            config.albums.len()
        ))
    })
}
