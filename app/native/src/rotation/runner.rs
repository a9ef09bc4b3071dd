//! Headless tick execution.
//!
//! The runner is what the scheduler invokes. A tick reloads the persisted
//! record, picks the next image, applies it, records it as shown and persists
//! the record again. Every firing is acknowledged to the scheduler exactly
//! once, whatever the outcome.

use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use thiserror::Error;

use super::applier::{self, ApplyError, WallpaperSetter};
use super::model::{RotationConfig, Target};
use super::selector;
use super::store::{StateStore, StorageError};
use crate::scheduler::{FireEvent, TaskScheduler, TriggerId};

/// Lifecycle state of the background runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RunnerState {
    /// No recurring task is registered.
    Unregistered,
    /// Waiting for the next firing.
    Scheduled,
    /// A tick is in progress.
    Firing,
    /// The last tick finished and was acknowledged.
    Completed,
    /// The last firing ran out of time and was acknowledged without a tick.
    TimedOut,
}

impl fmt::Display for RunnerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unregistered => "unregistered",
            Self::Scheduled => "scheduled",
            Self::Firing => "firing",
            Self::Completed => "completed",
            Self::TimedOut => "timed out",
        };
        f.write_str(name)
    }
}

/// Why a tick ended without changing the wallpaper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SkipReason {
    /// The persisted record says rotation is stopped.
    NotRegistered,
    /// No album is selected for rotation.
    NoActiveAlbum,
    /// The active album has no images.
    EmptyAlbum,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::NotRegistered => "rotation is not running",
            Self::NoActiveAlbum => "no album is selected for rotation",
            Self::EmptyAlbum => "the active album has no images",
        };
        f.write_str(reason)
    }
}

/// A wallpaper change made by a tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedWallpaper {
    /// Index of the active album.
    pub album: usize,
    /// Index of the image within the album.
    pub index: usize,
    /// The image applied.
    pub image: PathBuf,
    /// Surface(s) that received it.
    pub target: Target,
}

/// Result of a tick that ran to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// The wallpaper was changed and the history persisted.
    Applied(AppliedWallpaper),
    /// Nothing to do.
    Skipped(SkipReason),
}

/// Errors that abort a tick.
#[derive(Debug, Error)]
pub enum TickError {
    /// Applying the wallpaper failed. The history was not advanced.
    #[error(transparent)]
    Apply(#[from] ApplyError),
    /// The wallpaper changed but the history could not be persisted.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Executes ticks on behalf of the scheduler.
pub struct BackgroundRunner {
    store: Arc<dyn StateStore>,
    setter: Arc<dyn WallpaperSetter>,
    scheduler: Arc<dyn TaskScheduler>,
    rng: Mutex<StdRng>,
    state: Mutex<RunnerState>,
    in_flight: Mutex<HashSet<TriggerId>>,
    tick_lock: Mutex<()>,
    completed: AtomicU64,
    timed_out: AtomicU64,
}

impl fmt::Debug for BackgroundRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackgroundRunner")
            .field("state", &*self.state.lock())
            .field("completed", &self.completed.load(Ordering::Relaxed))
            .field("timed_out", &self.timed_out.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl BackgroundRunner {
    /// Creates a runner with an entropy-seeded random source.
    #[must_use]
    pub fn new(
        store: Arc<dyn StateStore>,
        setter: Arc<dyn WallpaperSetter>,
        scheduler: Arc<dyn TaskScheduler>,
    ) -> Self {
        let state = if scheduler.is_registered() {
            RunnerState::Scheduled
        } else {
            RunnerState::Unregistered
        };

        Self {
            store,
            setter,
            scheduler,
            rng: Mutex::new(StdRng::from_rng(&mut rand::rng())),
            state: Mutex::new(state),
            in_flight: Mutex::new(HashSet::new()),
            tick_lock: Mutex::new(()),
            completed: AtomicU64::new(0),
            timed_out: AtomicU64::new(0),
        }
    }

    /// Replaces the random source, e.g. with a seeded one.
    #[must_use]
    pub fn with_rng(self, rng: StdRng) -> Self { Self { rng: Mutex::new(rng), ..self } }

    /// Returns the current lifecycle state.
    #[must_use]
    pub fn state(&self) -> RunnerState { *self.state.lock() }

    /// Returns the number of firings completed and timed out so far.
    #[must_use]
    pub fn counters(&self) -> (u64, u64) {
        (self.completed.load(Ordering::Relaxed), self.timed_out.load(Ordering::Relaxed))
    }

    fn transition(&self, next: RunnerState) {
        let mut state = self.state.lock();
        if *state != next {
            tracing::trace!(from = %*state, to = %next, "runner state changed");
            *state = next;
        }
    }

    /// Marks the recurring task as registered.
    pub fn mark_scheduled(&self) { self.transition(RunnerState::Scheduled); }

    /// Marks the recurring task as cancelled.
    pub fn mark_unregistered(&self) { self.transition(RunnerState::Unregistered); }

    /// Handles one firing from the scheduler.
    ///
    /// A firing delivered as timed out is acknowledged without doing any
    /// work. Otherwise one tick runs; its failures are logged, never
    /// propagated, and the firing is acknowledged afterwards.
    ///
    /// # Returns
    ///
    /// The tick result, or `None` for a timed-out firing.
    pub fn handle_fire(&self, event: FireEvent) -> Option<Result<TickOutcome, TickError>> {
        self.in_flight.lock().insert(event.trigger.clone());

        if event.timed_out {
            tracing::info!(trigger = %event.trigger, "firing arrived timed out, finishing without a tick");
            self.timed_out.fetch_add(1, Ordering::Relaxed);
            self.transition(RunnerState::TimedOut);
            self.finish(&event.trigger);
            return None;
        }

        self.transition(RunnerState::Firing);
        let result = self.tick();
        match &result {
            Ok(TickOutcome::Applied(applied)) => {
                tracing::info!(
                    album = applied.album,
                    index = applied.index,
                    image = %applied.image.display(),
                    target = %applied.target,
                    "wallpaper rotated"
                );
            }
            Ok(TickOutcome::Skipped(reason)) => tracing::debug!(%reason, "tick skipped"),
            Err(err) => tracing::warn!(error = %err, "tick failed"),
        }

        if self.in_flight.lock().contains(&event.trigger) {
            self.completed.fetch_add(1, Ordering::Relaxed);
            self.transition(RunnerState::Completed);
            self.finish(&event.trigger);
        } else {
            tracing::debug!(trigger = %event.trigger, "tick finished after its firing timed out");
        }
        Some(result)
    }

    /// Handles a firing that ran out of time before it was acknowledged.
    pub fn handle_timeout(&self, trigger: &TriggerId) {
        if !self.in_flight.lock().contains(trigger) {
            return;
        }

        tracing::warn!(%trigger, "tick ran out of time");
        self.timed_out.fetch_add(1, Ordering::Relaxed);
        self.transition(RunnerState::TimedOut);
        self.finish(trigger);
    }

    /// Acknowledges `trigger` unless it was already acknowledged, then
    /// settles back to waiting for the next firing.
    fn finish(&self, trigger: &TriggerId) {
        if self.in_flight.lock().remove(trigger) {
            self.scheduler.acknowledge(trigger);
        }

        if self.scheduler.is_registered() {
            self.transition(RunnerState::Scheduled);
        } else {
            self.transition(RunnerState::Unregistered);
        }
    }

    /// Runs one scheduled tick against the persisted record.
    ///
    /// Does nothing when the record says rotation is stopped.
    ///
    /// # Errors
    ///
    /// Returns `TickError` if applying or persisting fails. A failed apply
    /// leaves the record untouched.
    pub fn tick(&self) -> Result<TickOutcome, TickError> {
        let _guard = self.tick_lock.lock();
        let mut config = self.store.load();

        if !config.task_registered {
            return Ok(TickOutcome::Skipped(SkipReason::NotRegistered));
        }
        self.advance(&mut config)
    }

    /// Runs one tick immediately, whether or not rotation is registered.
    ///
    /// # Errors
    ///
    /// Returns `TickError` if applying or persisting fails.
    pub fn run_now(&self) -> Result<TickOutcome, TickError> {
        let _guard = self.tick_lock.lock();
        let mut config = self.store.load();
        self.advance(&mut config)
    }

    fn advance(&self, config: &mut RotationConfig) -> Result<TickOutcome, TickError> {
        let Some(album) = config.active_album else {
            return Ok(TickOutcome::Skipped(SkipReason::NoActiveAlbum));
        };

        let images = config.active_images();
        let next = {
            let mut rng = self.rng.lock();
            selector::next_index(images, &config.recent_indices, config.shuffle, &mut *rng)
        };
        let Some(index) = next else {
            return Ok(TickOutcome::Skipped(SkipReason::EmptyAlbum));
        };

        let image = images[index].clone();
        let album_len = images.len();
        applier::apply(self.setter.as_ref(), &image, config.target)?;

        selector::record_shown(&mut config.recent_indices, index, album_len);
        self.store.save(config)?;

        Ok(TickOutcome::Applied(AppliedWallpaper { album, index, image, target: config.target }))
    }
}
