//! Application-wide constants.

/// Application identifier used for data, config and thread names.
pub const APP_ID: &str = "wallcycle";

/// Fixed storage key of the persisted rotation record.
pub const STORAGE_KEY: &str = "rotation_config";

/// Current schema version of the persisted rotation record.
pub const SCHEMA_VERSION: u32 = 3;

/// Name given to the album synthesized from a legacy flat image list.
pub const LEGACY_ALBUM_NAME: &str = "Album 1";

/// Subdirectory of the data directory holding imported images.
pub const IMAGES_SUBDIR: &str = "images";

/// Image extensions accepted at import time.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

/// Rotation interval bounds, in minutes.
pub mod interval {
    /// Shortest interval the host schedulers accept.
    pub const MIN_MINUTES: u32 = 15;

    /// Longest interval offered (two days).
    pub const MAX_MINUTES: u32 = 2880;

    /// Interval used when nothing else is configured.
    pub const DEFAULT_MINUTES: u32 = 30;

    /// Clamps an interval into the supported range.
    #[must_use]
    pub const fn clamp(minutes: u32) -> u32 {
        if minutes < MIN_MINUTES {
            MIN_MINUTES
        } else if minutes > MAX_MINUTES {
            MAX_MINUTES
        } else {
            minutes
        }
    }
}

/// Environment variable holding the log filter directive.
pub const LOG_ENV_VAR: &str = "WALLCYCLE_LOG";
