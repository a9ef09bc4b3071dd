//! Persisted rotation record and album types.
//!
//! `RotationConfig` is the single durable record shared by the foreground
//! collaborator and the background runner. It serializes with camelCase
//! field names; `activeAlbum` uses `-1` on the wire for "no album".

use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::constants::{SCHEMA_VERSION, interval};

/// Device surface(s) receiving the wallpaper.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Target {
    /// Home screen only.
    #[default]
    Home,
    /// Lock screen only.
    Lock,
    /// Home and lock screen in one platform call.
    Both,
}

impl Target {
    /// Returns the wire representation (`HOME`, `LOCK`, `BOTH`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Home => "HOME",
            Self::Lock => "LOCK",
            Self::Both => "BOTH",
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for Target {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "HOME" => Ok(Self::Home),
            "LOCK" => Ok(Self::Lock),
            "BOTH" => Ok(Self::Both),
            _ => Err(format!(
                "Invalid target '{s}'. Expected 'home', 'lock', or 'both'."
            )),
        }
    }
}

/// Named, ordered collection of app-owned image files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct Album {
    /// User-chosen name. Uniqueness is not enforced.
    pub name: String,

    /// Image files in display and rotation order.
    pub images: Vec<PathBuf>,
}

impl Album {
    /// Creates an album from a name and its images.
    #[must_use]
    pub fn new(name: impl Into<String>, images: Vec<PathBuf>) -> Self {
        Self { name: name.into(), images }
    }

    /// Returns the number of images.
    #[must_use]
    pub const fn len(&self) -> usize { self.images.len() }

    /// Returns whether the album has no images.
    #[must_use]
    pub const fn is_empty(&self) -> bool { self.images.is_empty() }
}

/// The persisted rotation record, one per installation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct RotationConfig {
    /// Schema version of this record.
    pub schema_version: u32,

    /// Albums in insertion order.
    pub albums: Vec<Album>,

    /// Index of the album used for rotation, `-1` when none.
    #[serde(with = "active_album_serde")]
    #[schemars(with = "i64")]
    pub active_album: Option<usize>,

    /// Random order without repeats instead of sequential order.
    pub shuffle: bool,

    /// Surface(s) receiving the wallpaper.
    pub target: Target,

    /// Whether a recurring background task is registered with the scheduler.
    pub task_registered: bool,

    /// Indices of the active album already shown in the current cycle.
    pub recent_indices: Vec<usize>,

    /// Interval of the registered task, kept for boot rescheduling.
    pub interval_minutes: u32,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            albums: Vec::new(),
            active_album: None,
            shuffle: false,
            target: Target::default(),
            task_registered: false,
            recent_indices: Vec::new(),
            interval_minutes: interval::DEFAULT_MINUTES,
        }
    }
}

impl RotationConfig {
    /// Returns the active album, if any.
    #[must_use]
    pub fn active(&self) -> Option<&Album> { self.active_album.and_then(|i| self.albums.get(i)) }

    /// Returns the active album's images, or an empty slice.
    #[must_use]
    pub fn active_images(&self) -> &[PathBuf] { self.active().map_or(&[], |a| a.images.as_slice()) }

    /// Returns whether the active album exists and has at least one image.
    #[must_use]
    pub fn has_rotatable_album(&self) -> bool { !self.active_images().is_empty() }

    /// Returns the album at `index`.
    #[must_use]
    pub fn album(&self, index: usize) -> Option<&Album> { self.albums.get(index) }

    /// Enforces the record invariants in place.
    ///
    /// - `activeAlbum` is none or a valid index.
    /// - No rotatable album means no registered task and no history.
    /// - `recentIndices` holds distinct in-range indices and never covers the
    ///   whole album; a full history collapses to its newest entry.
    /// - The interval lies within the supported bounds.
    pub fn normalize(&mut self) {
        self.schema_version = SCHEMA_VERSION;
        self.interval_minutes = interval::clamp(self.interval_minutes);

        if self.active_album.is_some_and(|i| i >= self.albums.len()) {
            self.active_album = None;
        }

        let len = self.active_images().len();
        if len == 0 {
            self.task_registered = false;
            self.recent_indices.clear();
            return;
        }

        let mut seen = HashSet::new();
        self.recent_indices.retain(|&i| i < len && seen.insert(i));

        if len > 1
            && self.recent_indices.len() >= len
            && let Some(&newest) = self.recent_indices.last()
        {
            self.recent_indices = vec![newest];
        }
    }
}

/// Maps `Option<usize>` to the `-1` sentinel used by the persisted record.
mod active_album_serde {
    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::ref_option)] // Signature required by `serde(with)`
    pub fn serialize<S>(value: &Option<usize>, serializer: S) -> Result<S::Ok, S::Error>
    where S: Serializer {
        match value {
            Some(index) => serializer.serialize_i64(i64::try_from(*index).unwrap_or(-1)),
            None => serializer.serialize_i64(-1),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<usize>, D::Error>
    where D: Deserializer<'de> {
        let raw = Option::<i64>::deserialize(deserializer)?;
        Ok(raw.and_then(|i| usize::try_from(i).ok()))
    }
}
