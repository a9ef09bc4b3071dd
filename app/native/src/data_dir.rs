//! Data directory utilities.
//!
//! Provides a centralized way to get the directory holding the rotation record
//! and imported images. Uses the configured `dataDir` when set, otherwise the
//! platform data directory (`~/.local/share/wallcycle` on Linux,
//! `~/Library/Application Support/wallcycle` on macOS), with a fallback to
//! `/tmp/wallcycle` if neither is available.

use std::path::{Path, PathBuf};

use crate::config::{get_config, get_config_path};
use crate::constants::APP_ID;
use crate::platform::path::{expand, expand_and_resolve};

/// Resolves the data directory from an optional configured value.
///
/// # Arguments
///
/// * `configured` - The `dataDir` config value; `~` is expanded
/// * `base_dir` - Directory a relative `dataDir` is resolved against,
///   usually the one holding the configuration file
#[must_use]
pub fn resolve_data_dir(configured: Option<&str>, base_dir: Option<&Path>) -> PathBuf {
    if let Some(dir) = configured.map(str::trim).filter(|d| !d.is_empty()) {
        return base_dir.map_or_else(|| expand(dir), |base| expand_and_resolve(dir, base));
    }

    dirs::data_dir().map_or_else(|| PathBuf::from(format!("/tmp/{APP_ID}")), |data| data.join(APP_ID))
}

/// Returns the data directory for the loaded configuration.
#[must_use]
pub fn get_data_dir() -> PathBuf {
    let base_dir = get_config_path().and_then(|path| path.parent());
    resolve_data_dir(get_config().data_dir.as_deref(), base_dir)
}

/// Returns a data subdirectory (e.g. `images`).
#[must_use]
pub fn get_data_subdir(subdir: &str) -> PathBuf { get_data_dir().join(subdir) }

/// Calculates the total size of a directory in bytes.
///
/// A missing directory has size zero.
///
/// # Errors
///
/// Returns an error if a directory entry cannot be read.
pub fn calculate_dir_size(path: &Path) -> std::io::Result<u64> {
    let mut total = 0u64;

    if path.is_dir() {
        for entry in std::fs::read_dir(path)? {
            let entry = entry?;
            let path = entry.path();
            if path.is_dir() {
                total += calculate_dir_size(&path)?;
            } else {
                total += entry.metadata().map(|m| m.len()).unwrap_or(0);
            }
        }
    }

    Ok(total)
}

/// Formats a byte count as a human-readable string.
///
/// # Arguments
///
/// * `bytes` - The number of bytes
///
/// # Returns
///
/// A human-readable string like "1.50 MB" or "256 bytes"
#[must_use]
#[allow(clippy::cast_precision_loss)] // Precision loss is acceptable for human-readable output
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} bytes")
    }
}
