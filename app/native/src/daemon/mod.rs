//! Rotation host.
//!
//! `wallcycle daemon` stands in for the OS job scheduler: it owns a
//! [`TimerScheduler`], re-registers rotation after a restart, and keeps the
//! timer in step with the persisted record that one-shot CLI invocations
//! rewrite.

pub mod watcher;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::config::get_config;
use crate::constants::IMAGES_SUBDIR;
use crate::data_dir::get_data_dir;
use crate::error::WallcycleError;
use crate::rotation::{FileStore, ImageLibrary, RotationService};
use crate::scheduler::TimerScheduler;
use crate::wallpaper::DesktopWallpaper;

/// Reconcile interval used when file watching is unavailable.
pub const RECONCILE_POLL_SECS: u64 = 30;

/// Runs the rotation host until the process is terminated.
///
/// Only returns on startup failure.
///
/// # Errors
///
/// Returns an error if the data directory cannot be created.
pub fn run() -> Result<(), WallcycleError> {
    let config = get_config();
    let data_dir = get_data_dir();
    std::fs::create_dir_all(&data_dir)?;

    let store = Arc::new(FileStore::new(&data_dir));
    let record_path = store.path();
    let service = RotationService::new(
        store,
        Arc::new(DesktopWallpaper),
        Arc::new(TimerScheduler::new(config.tick_timeout())),
        ImageLibrary::new(data_dir.join(IMAGES_SUBDIR)),
    );

    tracing::info!(
        data_dir = %data_dir.display(),
        tick_timeout = ?config.tick_timeout(),
        "rotation daemon started"
    );

    match service.resume() {
        Ok(true) => {}
        Ok(false) => tracing::info!("rotation is stopped, waiting for 'wallcycle rotation start'"),
        Err(err) => tracing::error!(error = %err, "failed to resume rotation"),
    }

    follow_record(&service, &record_path)
}

/// Reconciles the scheduler with the record whenever the record changes.
///
/// Falls back to polling if the file cannot be watched.
fn follow_record(service: &RotationService, record_path: &Path) -> ! {
    let reconcile = || {
        if let Err(err) = service.reconcile() {
            tracing::error!(error = %err, "failed to reconcile rotation schedule");
        }
    };

    if let Err(err) = watcher::watch_record(record_path, &reconcile) {
        tracing::warn!(
            error = %err,
            poll_secs = RECONCILE_POLL_SECS,
            "cannot watch rotation record, polling instead"
        );
    }

    loop {
        std::thread::sleep(Duration::from_secs(RECONCILE_POLL_SECS));
        reconcile();
    }
}
