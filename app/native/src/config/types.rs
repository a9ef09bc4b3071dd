//! Host configuration types and loading.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::constants::{APP_ID, interval};
use crate::rotation::Target;

/// Default budget for one tick before the scheduler declares it timed out.
pub const DEFAULT_TICK_TIMEOUT_SECONDS: u64 = 30;

/// Host configuration for Wallcycle.
///
/// This is separate from the persisted rotation record: it only holds
/// defaults and host settings, never albums or rotation state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct WallcycleConfig {
    /// Directory holding the rotation record and imported images.
    /// Supports `~`. Defaults to the platform data directory.
    pub data_dir: Option<String>,

    /// Interval used by `rotation start` when none is given, in minutes.
    /// Clamped to 15..=2880.
    pub default_interval_minutes: u32,

    /// Surface(s) used by `rotation start` when none is given.
    pub default_target: Target,

    /// Whether `rotation start` shuffles when not told otherwise.
    pub default_shuffle: bool,

    /// Seconds a background tick may run before it is finished as timed out.
    pub tick_timeout_seconds: u64,

    /// Log filter used when `WALLCYCLE_LOG` is not set (e.g. `info`, `debug`).
    pub log_level: Option<String>,
}

impl Default for WallcycleConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            default_interval_minutes: interval::DEFAULT_MINUTES,
            default_target: Target::Home,
            default_shuffle: false,
            tick_timeout_seconds: DEFAULT_TICK_TIMEOUT_SECONDS,
            log_level: None,
        }
    }
}

impl WallcycleConfig {
    /// Returns the default interval clamped into the supported range.
    #[must_use]
    pub const fn interval_minutes(&self) -> u32 { interval::clamp(self.default_interval_minutes) }

    /// Returns the tick budget, at least one second.
    #[must_use]
    pub fn tick_timeout(&self) -> Duration { Duration::from_secs(self.tick_timeout_seconds.max(1)) }
}

/// Errors that can occur when loading the configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// No configuration file was found in any of the expected locations.
    NotFound,
    /// The configuration file exists but could not be read.
    IoError(std::io::Error),
    /// The configuration file contains invalid JSON.
    ParseError(serde_json::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => write!(
                f,
                "No configuration file found. Expected at ~/.config/{APP_ID}/config.jsonc, \
                the platform config directory, or ~/.{APP_ID}.jsonc"
            ),
            Self::IoError(err) => write!(f, "Failed to read configuration file: {err}"),
            Self::ParseError(err) => write!(f, "Failed to parse configuration file: {err}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::IoError(err) => Some(err),
            Self::ParseError(err) => Some(err),
            Self::NotFound => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self { Self::IoError(err) }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self { Self::ParseError(err) }
}

/// Configuration file names to search for (in priority order).
const CONFIG_FILE_NAMES: &[&str] = &["config.jsonc", "config.json"];

/// Returns the possible configuration file paths in priority order.
///
/// The function checks the following locations (both `.jsonc` and `.json` variants):
/// 1. `$XDG_CONFIG_HOME/wallcycle/config.jsonc`, if `$XDG_CONFIG_HOME` is set
/// 2. `~/.config/wallcycle/config.jsonc`
/// 3. the platform config directory (`~/Library/Application Support/wallcycle` on macOS)
/// 4. `~/.wallcycle.jsonc` or `~/.wallcycle.json`
#[must_use]
pub fn config_paths() -> Vec<PathBuf> {
    fn push_dir(dir: &Path, paths: &mut Vec<PathBuf>) {
        for filename in CONFIG_FILE_NAMES {
            let path = dir.join(filename);
            // XDG_CONFIG_HOME might be ~/.config
            if !paths.contains(&path) {
                paths.push(path);
            }
        }
    }

    let mut paths = Vec::new();

    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        push_dir(&PathBuf::from(xdg_config).join(APP_ID), &mut paths);
    }

    if let Some(home) = dirs::home_dir() {
        push_dir(&home.join(".config").join(APP_ID), &mut paths);
    }

    if let Some(config_dir) = dirs::config_dir() {
        push_dir(&config_dir.join(APP_ID), &mut paths);
    }

    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(format!(".{APP_ID}.jsonc")));
        paths.push(home.join(format!(".{APP_ID}.json")));
    }

    paths
}

/// Loads the configuration from the first available config file.
///
/// The configuration file supports JSONC format (JSON with comments).
///
/// # Errors
///
/// Returns `ConfigError::NotFound` if no configuration file exists in any of the expected locations.
/// Returns `ConfigError::IoError` if a configuration file exists but could not be read.
/// Returns `ConfigError::ParseError` if the configuration file contains invalid JSON.
pub fn load_config() -> Result<(WallcycleConfig, PathBuf), ConfigError> {
    config_paths()
        .into_iter()
        .find(|path| path.exists())
        .map_or(Err(ConfigError::NotFound), |path| load_config_from_path(&path))
}

/// Loads the configuration from a specific file.
///
/// # Errors
///
/// Returns `ConfigError::NotFound` if the file does not exist, or an IO or
/// parse error otherwise.
pub fn load_config_from_path(path: &Path) -> Result<(WallcycleConfig, PathBuf), ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound);
    }

    let file = fs::File::open(path)?;
    let reader = json_comments::StripComments::new(file);
    let config: WallcycleConfig = serde_json::from_reader(reader)?;
    Ok((config, path.to_path_buf()))
}

/// Parses configuration from a JSONC string.
///
/// # Errors
///
/// Returns `ConfigError::ParseError` if the content is not valid JSON.
pub fn parse_config(content: &str) -> Result<WallcycleConfig, ConfigError> {
    let reader = json_comments::StripComments::new(content.as_bytes());
    Ok(serde_json::from_reader(reader)?)
}
