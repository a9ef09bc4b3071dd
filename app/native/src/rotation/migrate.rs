//! Upgrades any stored rotation record to the current schema.
//!
//! Known layouts:
//!
//! | Version | Shape |
//! |---------|-------|
//! | 0 | `{imageArray: string[], isRandom, screen, isTaskRegistered, previousIndex}` |
//! | 1 | `imageArray: string[][]` where element 0 of each array is the album name, plus `album` |
//! | 2 | `{schemaVersion: 2, albums, activeAlbum, shuffle, target, taskRegistered, previousIndex}` |
//! | 3 | [`RotationConfig`] |
//!
//! Records without `schemaVersion` are legacy (0 or 1, told apart by the shape
//! of `imageArray`). Each step upgrades exactly one version. Nothing in here
//! fails outward: a record that cannot be read falls back to defaults.

use std::path::PathBuf;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use thiserror::Error;

use super::model::{Album, RotationConfig, Target};
use crate::constants::{LEGACY_ALBUM_NAME, SCHEMA_VERSION};

const FILE_URI_PREFIX: &str = "file://";

#[derive(Debug, Error)]
enum StepError {
    #[error("version {version} record is malformed: {source}")]
    Malformed {
        version: u32,
        #[source]
        source: serde_json::Error,
    },
}

/// Version 0: one flat image list.
#[derive(Debug, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct FlatRecord {
    image_array: Vec<String>,
    is_random: bool,
    screen: Option<String>,
    is_task_registered: bool,
    previous_index: i64,
}

impl Default for FlatRecord {
    fn default() -> Self {
        Self {
            image_array: Vec::new(),
            is_random: false,
            screen: None,
            is_task_registered: false,
            previous_index: -1,
        }
    }
}

/// Version 1: name-prefixed image arrays.
#[derive(Debug, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct NestedRecord {
    image_array: Vec<Vec<String>>,
    album: i64,
    is_random: bool,
    screen: Option<String>,
    is_task_registered: bool,
    previous_index: i64,
}

impl Default for NestedRecord {
    fn default() -> Self {
        Self {
            image_array: Vec::new(),
            album: -1,
            is_random: false,
            screen: None,
            is_task_registered: false,
            previous_index: -1,
        }
    }
}

/// Version 2: structured albums with a single previous index.
#[derive(Debug, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct StructuredRecord {
    albums: Vec<Album>,
    active_album: Option<i64>,
    shuffle: bool,
    target: Option<String>,
    task_registered: bool,
    previous_index: Option<i64>,
    interval_minutes: Option<u32>,
}

impl Default for StructuredRecord {
    fn default() -> Self {
        Self {
            albums: Vec::new(),
            active_album: None,
            shuffle: false,
            target: None,
            task_registered: false,
            previous_index: None,
            interval_minutes: None,
        }
    }
}

/// Migrates a raw stored record to the current schema.
///
/// Never fails: `Null`, non-object and unreadable records yield defaults, and
/// the result always satisfies the record invariants.
///
/// # Arguments
///
/// * `raw` - The stored JSON, or `Null` when nothing is stored
#[must_use]
pub fn migrate(raw: &Value) -> RotationConfig {
    if raw.is_null() {
        return RotationConfig::default();
    }
    if !raw.is_object() {
        tracing::warn!("stored rotation record is not an object, using defaults");
        return RotationConfig::default();
    }

    let version = detect_version(raw);
    match upgrade(raw.clone(), version) {
        Ok(mut config) => {
            config.normalize();
            config
        }
        Err(err) => {
            tracing::warn!(error = %err, "failed to migrate rotation record, using defaults");
            RotationConfig::default()
        }
    }
}

/// Returns the schema version of a raw record.
#[must_use]
pub fn detect_version(raw: &Value) -> u32 {
    if let Some(version) = raw.get("schemaVersion").and_then(Value::as_u64) {
        return u32::try_from(version).unwrap_or(u32::MAX);
    }

    match raw.get("imageArray").and_then(Value::as_array) {
        Some(items) if items.iter().any(Value::is_array) => 1,
        _ => 0,
    }
}

fn upgrade(mut raw: Value, mut version: u32) -> Result<RotationConfig, StepError> {
    while version < SCHEMA_VERSION {
        raw = match version {
            0 => flat_to_nested(raw)?,
            1 => nested_to_structured(raw)?,
            _ => structured_to_current(raw)?,
        };
        version += 1;
        tracing::debug!(version, "rotation record upgraded");
    }

    if version > SCHEMA_VERSION {
        tracing::warn!(version, "rotation record is newer than this build, reading known fields");
    }

    serde_json::from_value(raw).map_err(|source| StepError::Malformed { version, source })
}

fn parse<T: DeserializeOwned>(raw: Value, version: u32) -> Result<T, StepError> {
    serde_json::from_value(raw).map_err(|source| StepError::Malformed { version, source })
}

/// Wraps the flat list into one album named [`LEGACY_ALBUM_NAME`].
fn flat_to_nested(raw: Value) -> Result<Value, StepError> {
    let record: FlatRecord = parse(raw, 0)?;

    let has_images = !record.image_array.is_empty();
    let image_array: Vec<Vec<String>> = if has_images {
        let mut album = Vec::with_capacity(record.image_array.len() + 1);
        album.push(LEGACY_ALBUM_NAME.to_string());
        album.extend(record.image_array);
        vec![album]
    } else {
        Vec::new()
    };
    let album = if record.is_task_registered && has_images { 0 } else { -1 };

    Ok(json!({
        "imageArray": image_array,
        "album": album,
        "isRandom": record.is_random,
        "screen": record.screen,
        "isTaskRegistered": record.is_task_registered,
        "previousIndex": record.previous_index,
    }))
}

/// Splits name-prefixed arrays into structured albums.
fn nested_to_structured(raw: Value) -> Result<Value, StepError> {
    let record: NestedRecord = parse(raw, 1)?;

    let albums: Vec<Album> = record
        .image_array
        .into_iter()
        .map(|mut entries| {
            let name = if entries.is_empty() { String::new() } else { entries.remove(0) };
            Album::new(name, entries.iter().map(|uri| strip_file_uri(uri)).collect())
        })
        .collect();

    let active = usize::try_from(record.album)
        .ok()
        .filter(|&i| record.is_task_registered && i < albums.len())
        .map_or(-1, |i| i64::try_from(i).unwrap_or(-1));

    Ok(json!({
        "schemaVersion": 2,
        "albums": albums,
        "activeAlbum": active,
        "shuffle": record.is_random,
        "target": legacy_target(record.screen.as_deref()),
        "taskRegistered": record.is_task_registered,
        "previousIndex": record.previous_index,
    }))
}

/// Replaces the single previous index with the recent-index history.
fn structured_to_current(raw: Value) -> Result<Value, StepError> {
    let record: StructuredRecord = parse(raw, 2)?;

    let active = record.active_album.and_then(|i| usize::try_from(i).ok());
    let album_len = active.and_then(|i| record.albums.get(i)).map_or(0, Album::len);
    let recent: Vec<usize> = record
        .previous_index
        .and_then(|i| usize::try_from(i).ok())
        .filter(|&i| i < album_len)
        .into_iter()
        .collect();

    let target = legacy_target(record.target.as_deref());

    let mut value = json!({
        "schemaVersion": SCHEMA_VERSION,
        "albums": record.albums,
        "activeAlbum": record.active_album.unwrap_or(-1),
        "shuffle": record.shuffle,
        "target": target,
        "taskRegistered": record.task_registered,
        "recentIndices": recent,
    });
    if let (Some(minutes), Some(object)) = (record.interval_minutes, value.as_object_mut()) {
        object.insert("intervalMinutes".to_string(), json!(minutes));
    }
    Ok(value)
}

/// Strips a leading `file://` scheme from a stored image reference.
#[must_use]
pub fn strip_file_uri(uri: &str) -> PathBuf {
    PathBuf::from(uri.strip_prefix(FILE_URI_PREFIX).unwrap_or(uri))
}

/// Reads a legacy surface name. Unknown values selected both surfaces.
fn legacy_target(screen: Option<&str>) -> Target {
    screen.map_or(Target::Home, |s| s.parse().unwrap_or(Target::Both))
}
