//! Applies one image to the configured wallpaper surface(s).

use std::path::{Path, PathBuf};

use thiserror::Error;

use super::model::Target;

/// Failure reported by a platform wallpaper capability.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// The platform cannot set this surface.
    #[error("{0} wallpaper is not supported on this platform")]
    Unsupported(Target),

    /// The platform call failed.
    #[error("{0}")]
    Rejected(String),
}

/// Errors that can occur when applying a wallpaper.
#[derive(Debug, Error)]
pub enum ApplyError {
    /// The image file no longer exists. No platform call was made.
    #[error("wallpaper file not found: {}", .0.display())]
    FileMissing(PathBuf),

    /// The platform rejected the wallpaper.
    #[error("failed to set {target} wallpaper from {}: {source}", path.display())]
    Platform {
        /// The surface(s) requested.
        target: Target,
        /// The image that was rejected.
        path: PathBuf,
        /// The platform's failure.
        #[source]
        source: PlatformError,
    },
}

/// Platform capability that sets a wallpaper from a local file.
pub trait WallpaperSetter: Send + Sync {
    /// Sets the home screen wallpaper.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError` if the platform refuses the image.
    fn set_home(&self, path: &Path) -> Result<(), PlatformError>;

    /// Sets the lock screen wallpaper.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError` if the platform refuses the image.
    fn set_lock(&self, path: &Path) -> Result<(), PlatformError>;

    /// Sets home and lock screen in one call.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError` if the platform refuses the image.
    fn set_both(&self, path: &Path) -> Result<(), PlatformError>;
}

/// Sets `image` as the wallpaper of `target`.
///
/// Exactly one platform call is made, and only when the file exists.
///
/// # Errors
///
/// Returns `ApplyError::FileMissing` if the file is gone, or
/// `ApplyError::Platform` if the platform call fails.
pub fn apply(setter: &dyn WallpaperSetter, image: &Path, target: Target) -> Result<(), ApplyError> {
    if !image.is_file() {
        return Err(ApplyError::FileMissing(image.to_path_buf()));
    }

    let result = match target {
        Target::Home => setter.set_home(image),
        Target::Lock => setter.set_lock(image),
        Target::Both => setter.set_both(image),
    };

    result.map_err(|source| ApplyError::Platform { target, path: image.to_path_buf(), source })?;
    tracing::debug!(path = %image.display(), %target, "wallpaper applied");
    Ok(())
}
