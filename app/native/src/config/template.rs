//! Configuration template generation.
//!
//! Generates a commented configuration template with all available options.

use std::fs;
use std::path::Path;

/// Generates a configuration template with all options commented out.
#[must_use]
pub fn generate_config_template() -> String {
    r#"// Wallcycle Configuration File
// ============================
// This file uses JSONC format (JSON with comments).
// All options below are commented out and show their default values.
// Uncomment and modify the options you want to configure.
//
// Albums and rotation state are not stored here. They live in
// rotation_config.json inside the data directory.

{
  // Directory holding the rotation record and imported images.
  // Defaults to the platform data directory (e.g. ~/.local/share/wallcycle).
  // "dataDir": "~/Pictures/wallcycle",

  // Interval used by `wallcycle rotation start` when none is given, in
  // minutes. Values are clamped to 15..2880.
  // "defaultIntervalMinutes": 30,

  // Surface(s) used when none is given: "HOME", "LOCK" or "BOTH".
  // "defaultTarget": "HOME",

  // Shuffle without repeats instead of sequential order.
  // "defaultShuffle": false,

  // Seconds a background tick may run before it is finished as timed out.
  // "tickTimeoutSeconds": 30,

  // Log filter used when WALLCYCLE_LOG is not set.
  // "logLevel": "info"
}
"#
    .to_string()
}

/// Creates a configuration file with the template at the specified path.
///
/// Creates parent directories if they don't exist.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn create_config_file(path: &Path) -> Result<(), std::io::Error> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    fs::write(path, generate_config_template())
}
