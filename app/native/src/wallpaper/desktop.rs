//! Desktop wallpaper backend.
//!
//! Desktops have a single background surface, which maps to the home screen.
//! Lock screen targets are reported as unsupported rather than silently
//! applied to the desktop.

use std::path::Path;

use crate::rotation::{PlatformError, Target, WallpaperSetter};

/// Sets the desktop background of the current session.
#[derive(Debug, Clone, Copy, Default)]
pub struct DesktopWallpaper;

impl DesktopWallpaper {
    /// Returns the current desktop wallpaper path, if the platform reports one.
    #[must_use]
    pub fn current() -> Option<String> {
        match wallpaper::get() {
            Ok(path) if !path.is_empty() => Some(path),
            Ok(_) => None,
            Err(err) => {
                tracing::debug!(error = %err, "failed to read current wallpaper");
                None
            }
        }
    }
}

impl WallpaperSetter for DesktopWallpaper {
    fn set_home(&self, path: &Path) -> Result<(), PlatformError> {
        let path_str = path.display().to_string();
        wallpaper::set_from_path(&path_str).map_err(|e| PlatformError::Rejected(e.to_string()))
    }

    fn set_lock(&self, _path: &Path) -> Result<(), PlatformError> {
        Err(PlatformError::Unsupported(Target::Lock))
    }

    fn set_both(&self, _path: &Path) -> Result<(), PlatformError> {
        Err(PlatformError::Unsupported(Target::Both))
    }
}
