//! Rotation record watcher.
//!
//! Follows the record file other processes rewrite and reports each settled
//! change once.

use std::ffi::OsString;
use std::path::Path;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Duration;

use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};

/// Quiet period after the last file event before a change is reported.
/// Atomic saves show up as several events (create temp, write, rename).
pub const RECORD_DEBOUNCE_MS: u64 = 200;

/// Watches `record_path` and calls `on_change` after each burst of events.
///
/// Blocks until the watcher channel closes.
///
/// # Errors
///
/// Returns an error if the watcher cannot be created or the record's parent
/// directory cannot be watched.
pub fn watch_record<F>(record_path: &Path, mut on_change: F) -> notify::Result<()>
where F: FnMut() {
    let record_name: OsString = record_path.file_name().map(ToOwned::to_owned).unwrap_or_default();

    let (tx, rx) = mpsc::channel::<notify::Result<Event>>();
    let mut watcher: RecommendedWatcher = notify::recommended_watcher(tx)?;

    // Atomic saves replace the file, so watch the directory.
    let watch_path = record_path.parent().unwrap_or(record_path);
    watcher.watch(watch_path, RecursiveMode::NonRecursive)?;
    tracing::debug!(path = %record_path.display(), "watching rotation record");

    let debounce = Duration::from_millis(RECORD_DEBOUNCE_MS);

    loop {
        match rx.recv() {
            Ok(Ok(event)) if touches(&event, &record_name) => {
                let open = settle(&rx, debounce);
                on_change();
                if !open {
                    break;
                }
            }
            Ok(Ok(_)) => {}
            Ok(Err(err)) => tracing::warn!(error = %err, "rotation record watch error"),
            Err(_) => break,
        }
    }

    Ok(())
}

/// Drains events until none arrive for `debounce`.
///
/// Returns `false` if the channel closed while draining.
fn settle(rx: &mpsc::Receiver<notify::Result<Event>>, debounce: Duration) -> bool {
    loop {
        match rx.recv_timeout(debounce) {
            Ok(_) => {}
            Err(RecvTimeoutError::Timeout) => return true,
            Err(RecvTimeoutError::Disconnected) => return false,
        }
    }
}

fn touches(event: &Event, record_name: &OsString) -> bool {
    event.paths.iter().any(|p| p.file_name().is_some_and(|name| name == record_name))
}
