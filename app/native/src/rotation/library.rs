//! App-owned image files.
//!
//! Imported images are copied into the library directory under their original
//! file name; a name already taken gets a ` (n)` suffix instead of being
//! overwritten. Only files inside the library directory are ever deleted.

use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use natord::compare;
use thiserror::Error;

use crate::constants::SUPPORTED_EXTENSIONS;
use crate::data_dir::calculate_dir_size;

/// Errors that can occur when copying or deleting image files.
#[derive(Debug, Error)]
pub enum FileOpError {
    /// The source image does not exist.
    #[error("source image not found: {}", .0.display())]
    SourceMissing(PathBuf),

    /// The source is not a supported image type.
    #[error("unsupported image type: {} (expected {})", .0.display(), SUPPORTED_EXTENSIONS.join(", "))]
    Unsupported(PathBuf),

    /// The library directory could not be created.
    #[error("failed to create image directory {}: {source}", path.display())]
    Directory {
        /// The library directory.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },

    /// Copying an image into the library failed.
    #[error("failed to copy {} into app storage: {source}", from.display())]
    Copy {
        /// The source image.
        from: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },

    /// Deleting an app-owned image failed.
    #[error("failed to delete {}: {source}", path.display())]
    Delete {
        /// The image that could not be deleted.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

/// Checks if a file has a supported image extension.
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    path.extension().and_then(OsStr::to_str).is_some_and(|ext| {
        SUPPORTED_EXTENSIONS.iter().any(|supported| supported.eq_ignore_ascii_case(ext))
    })
}

/// Lists all supported images in a directory, sorted in natural order.
///
/// # Errors
///
/// Returns an error if the directory cannot be read.
pub fn list_images_in_directory(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut images: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_supported_image(path))
        .collect();

    images.sort_by(|a, b| compare(&a.to_string_lossy(), &b.to_string_lossy()));
    Ok(images)
}

/// Directory of app-owned image copies.
#[derive(Debug, Clone)]
pub struct ImageLibrary {
    dir: PathBuf,
}

impl ImageLibrary {
    /// Creates a library rooted at `dir`. The directory is created on first import.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self { Self { dir: dir.into() } }

    /// Returns the library directory.
    #[must_use]
    pub fn dir(&self) -> &Path { &self.dir }

    /// Returns whether `path` lies inside the library directory.
    #[must_use]
    pub fn owns(&self, path: &Path) -> bool { path.parent() == Some(self.dir.as_path()) }

    /// Copies one image into the library.
    ///
    /// # Returns
    ///
    /// The path of the app-owned copy.
    ///
    /// # Errors
    ///
    /// Returns `FileOpError` if the source is missing or unsupported, or the
    /// copy fails.
    pub fn import(&self, source: &Path) -> Result<PathBuf, FileOpError> {
        if !source.is_file() {
            return Err(FileOpError::SourceMissing(source.to_path_buf()));
        }
        if !is_supported_image(source) {
            return Err(FileOpError::Unsupported(source.to_path_buf()));
        }
        let Some(file_name) = source.file_name() else {
            return Err(FileOpError::SourceMissing(source.to_path_buf()));
        };

        fs::create_dir_all(&self.dir)
            .map_err(|source| FileOpError::Directory { path: self.dir.clone(), source })?;

        let destination = self.unique_destination(file_name);
        fs::copy(source, &destination)
            .map_err(|err| FileOpError::Copy { from: source.to_path_buf(), source: err })?;

        tracing::debug!(from = %source.display(), to = %destination.display(), "image imported");
        Ok(destination)
    }

    /// Copies every source into the library, all or nothing.
    ///
    /// On failure, copies already made by this call are deleted again.
    ///
    /// # Errors
    ///
    /// Returns the first `FileOpError` encountered.
    pub fn import_all(&self, sources: &[PathBuf]) -> Result<Vec<PathBuf>, FileOpError> {
        let mut imported = Vec::with_capacity(sources.len());

        for source in sources {
            match self.import(source) {
                Ok(path) => imported.push(path),
                Err(err) => {
                    self.discard(&imported);
                    return Err(err);
                }
            }
        }

        Ok(imported)
    }

    /// Deletes an app-owned image.
    ///
    /// A file that is already gone counts as deleted. Paths outside the
    /// library are left untouched.
    ///
    /// # Errors
    ///
    /// Returns `FileOpError::Delete` if the file exists but cannot be removed.
    pub fn remove(&self, image: &Path) -> Result<(), FileOpError> {
        if !self.owns(image) {
            tracing::warn!(path = %image.display(), "image is outside app storage, not deleting");
            return Ok(());
        }

        match fs::remove_file(image) {
            Ok(()) => {
                tracing::debug!(path = %image.display(), "image deleted");
                Ok(())
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                tracing::warn!(path = %image.display(), "image already missing");
                Ok(())
            }
            Err(source) => Err(FileOpError::Delete { path: image.to_path_buf(), source }),
        }
    }

    /// Deletes every listed image, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns the first `FileOpError` encountered.
    pub fn remove_all(&self, images: &[PathBuf]) -> Result<(), FileOpError> {
        images.iter().try_for_each(|image| self.remove(image))
    }

    /// Best-effort deletion used to roll back a failed operation.
    pub fn discard(&self, images: &[PathBuf]) {
        for image in images {
            if let Err(err) = self.remove(image) {
                tracing::warn!(error = %err, "failed to roll back imported image");
            }
        }
    }

    /// Returns the bytes used by the library.
    #[must_use]
    pub fn usage_bytes(&self) -> u64 {
        calculate_dir_size(&self.dir).unwrap_or_else(|err| {
            tracing::warn!(error = %err, "failed to measure image storage");
            0
        })
    }

    fn unique_destination(&self, file_name: &OsStr) -> PathBuf {
        let candidate = self.dir.join(file_name);
        if !candidate.exists() {
            return candidate;
        }

        let name = Path::new(file_name);
        let stem = name.file_stem().map_or_else(String::new, |s| s.to_string_lossy().into_owned());
        let extension = name.extension().map(|e| e.to_string_lossy().into_owned());

        (1..)
            .map(|n| {
                let renamed = extension
                    .as_ref()
                    .map_or_else(|| format!("{stem} ({n})"), |ext| format!("{stem} ({n}).{ext}"));
                self.dir.join(renamed)
            })
            .find(|path| !path.exists())
            .unwrap_or(candidate)
    }
}
