//! Wallpaper rotation engine.
//!
//! This module owns the persisted rotation record and everything that acts
//! on it:
//!
//! - [`model`] - `RotationConfig`, `Album` and `Target`
//! - [`store`] - durable key-value persistence of the record
//! - [`migrate`] - upgrades older record layouts to the current schema
//! - [`selector`] - sequential and no-repeat shuffle selection
//! - [`applier`] - platform wallpaper capability and file checks
//! - [`library`] - app-owned image copies
//! - [`runner`] - headless tick execution for the scheduler
//! - [`service`] - the operations offered to the foreground collaborator

pub mod applier;
pub mod library;
pub mod migrate;
pub mod model;
pub mod runner;
pub mod selector;
pub mod service;
pub mod store;

pub use applier::{ApplyError, PlatformError, WallpaperSetter, apply};
pub use library::{FileOpError, ImageLibrary, is_supported_image, list_images_in_directory};
pub use migrate::migrate;
pub use model::{Album, RotationConfig, Target};
pub use runner::{AppliedWallpaper, BackgroundRunner, RunnerState, SkipReason, TickError, TickOutcome};
pub use selector::{next_index, record_shown};
pub use service::{ConfigPatch, ReconcileAction, RotationRequest, RotationService};
pub use store::{FileStore, MemoryStore, StateStore, StorageError};
