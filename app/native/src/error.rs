//! Error types for Wallcycle.
//!
//! This module provides the unified error type returned by the UI-facing
//! rotation service and by every CLI command. Engine components keep their own
//! narrower error enums (`StorageError`, `ApplyError`, `FileOpError`,
//! `SchedulerError`) which convert into this one.

use serde::Serialize;
use thiserror::Error;

use crate::rotation::{ApplyError, FileOpError, StorageError};
use crate::scheduler::SchedulerError;

/// Errors that can occur during application execution.
///
/// Serializes as `{"kind": ..., "message": ...}` so a UI collaborator can
/// render a structured failure notice.
#[derive(Debug, Error, Serialize)]
#[serde(tag = "kind", content = "message")]
pub enum WallcycleError {
    /// Invalid command arguments.
    #[error("{0}")]
    InvalidArguments(String),
    /// Persisted state could not be written.
    #[error("Storage error: {0}")]
    StorageError(String),
    /// The platform rejected the wallpaper.
    #[error("Wallpaper error: {0}")]
    ApplyError(String),
    /// Copying or deleting an image file failed.
    #[error("File error: {0}")]
    FileOpError(String),
    /// The recurring task could not be registered or cancelled.
    #[error("Scheduler error: {0}")]
    SchedulerError(String),
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),
    /// Album index out of range or album unusable for the request.
    #[error("Album error: {0}")]
    AlbumError(String),
    /// IO error.
    #[error("IO error: {0}")]
    IoError(String),
    /// Generic command error.
    #[error("{0}")]
    CommandError(String),
}

impl From<std::io::Error> for WallcycleError {
    fn from(err: std::io::Error) -> Self { Self::IoError(err.to_string()) }
}

impl From<serde_json::Error> for WallcycleError {
    fn from(err: serde_json::Error) -> Self { Self::CommandError(err.to_string()) }
}

impl From<String> for WallcycleError {
    fn from(msg: String) -> Self { Self::CommandError(msg) }
}

impl From<&str> for WallcycleError {
    fn from(msg: &str) -> Self { Self::CommandError(msg.to_string()) }
}

impl From<StorageError> for WallcycleError {
    fn from(err: StorageError) -> Self { Self::StorageError(err.to_string()) }
}

impl From<ApplyError> for WallcycleError {
    fn from(err: ApplyError) -> Self { Self::ApplyError(err.to_string()) }
}

impl From<FileOpError> for WallcycleError {
    fn from(err: FileOpError) -> Self { Self::FileOpError(err.to_string()) }
}

impl From<SchedulerError> for WallcycleError {
    fn from(err: SchedulerError) -> Self { Self::SchedulerError(err.to_string()) }
}
