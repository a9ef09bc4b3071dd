//! Durable storage for the rotation record.
//!
//! The record lives under a fixed key. Reads never fail: an absent or
//! unreadable record yields the migrated defaults. Writes replace the whole
//! record atomically.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::Mutex;
use serde_json::Value;
use tempfile::NamedTempFile;
use thiserror::Error;

use super::migrate::migrate;
use super::model::RotationConfig;
use crate::constants::STORAGE_KEY;

/// Errors that can occur while persisting the rotation record.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The record could not be serialized.
    #[error("failed to serialize rotation record: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The record could not be written to disk.
    #[error("failed to write {}: {source}", path.display())]
    Write {
        /// Destination of the failed write.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },

    /// The backing store refused the write.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Key-value persistence of the single rotation record.
pub trait StateStore: Send + Sync {
    /// Returns the stored record migrated to the current schema, or defaults.
    fn load(&self) -> RotationConfig;

    /// Replaces the stored record.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record could not be durably written.
    fn save(&self, config: &RotationConfig) -> Result<(), StorageError>;
}

/// File-backed store writing `<dir>/rotation_config.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Creates a store rooted at `dir`. The directory is created on first save.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self { Self { dir: dir.into() } }

    /// Returns the path of the record file.
    #[must_use]
    pub fn path(&self) -> PathBuf { self.dir.join(format!("{STORAGE_KEY}.json")) }

    /// Reads the raw stored JSON. Absent or malformed content yields `Null`.
    #[must_use]
    pub fn read_raw(&self) -> Value {
        let path = self.path();
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no stored rotation record");
                return Value::Null;
            }
            Err(err) => {
                tracing::warn!(error = %err, path = %path.display(), "failed to read rotation record");
                return Value::Null;
            }
        };

        serde_json::from_str(&content).unwrap_or_else(|err| {
            tracing::warn!(error = %err, path = %path.display(), "rotation record is not valid JSON, using defaults");
            Value::Null
        })
    }

    fn write_atomic(&self, bytes: &[u8]) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let mut file = NamedTempFile::new_in(&self.dir)?;
        file.write_all(bytes)?;
        file.as_file().sync_all()?;
        file.persist(self.path()).map_err(|err| err.error)?;
        Ok(())
    }
}

impl StateStore for FileStore {
    fn load(&self) -> RotationConfig { migrate(&self.read_raw()) }

    fn save(&self, config: &RotationConfig) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec_pretty(config)?;
        self.write_atomic(&bytes).map_err(|source| StorageError::Write { path: self.path(), source })?;
        tracing::trace!(path = %self.path().display(), "rotation record saved");
        Ok(())
    }
}

/// In-memory store holding the raw record.
///
/// Counts reads and writes, and can be told to reject writes.
#[derive(Debug, Default)]
pub struct MemoryStore {
    raw: Mutex<Value>,
    loads: AtomicUsize,
    saves: AtomicUsize,
    fail_saves: AtomicBool,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Creates a store pre-filled with raw, possibly legacy, JSON.
    #[must_use]
    pub fn with_raw(raw: Value) -> Self { Self { raw: Mutex::new(raw), ..Self::default() } }

    /// Creates a store holding `config`.
    #[must_use]
    pub fn with_config(config: &RotationConfig) -> Self {
        Self::with_raw(serde_json::to_value(config).unwrap_or(Value::Null))
    }

    /// Returns the raw stored JSON.
    #[must_use]
    pub fn raw(&self) -> Value { self.raw.lock().clone() }

    /// Number of `load` calls so far.
    #[must_use]
    pub fn loads(&self) -> usize { self.loads.load(Ordering::SeqCst) }

    /// Number of successful `save` calls so far.
    #[must_use]
    pub fn saves(&self) -> usize { self.saves.load(Ordering::SeqCst) }

    /// Makes subsequent saves fail (or succeed again).
    pub fn set_fail_saves(&self, fail: bool) { self.fail_saves.store(fail, Ordering::SeqCst); }
}

impl StateStore for MemoryStore {
    fn load(&self) -> RotationConfig {
        self.loads.fetch_add(1, Ordering::SeqCst);
        migrate(&self.raw.lock())
    }

    fn save(&self, config: &RotationConfig) -> Result<(), StorageError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("writes rejected".to_string()));
        }
        let value = serde_json::to_value(config)?;
        *self.raw.lock() = value;
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Returns whether a record file exists in `dir`.
#[must_use]
pub fn record_exists(dir: &Path) -> bool { FileStore::new(dir).path().is_file() }
