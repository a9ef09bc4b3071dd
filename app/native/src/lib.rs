//! Wallcycle - background wallpaper rotation engine.
//!
//! Albums of app-owned image copies, a versioned persisted rotation record,
//! sequential and no-repeat shuffle selection, and a scheduler abstraction
//! whose ticks run headless with exactly-once acknowledgement.
//!
//! The `cli` module drives the engine from one-shot commands and the
//! `daemon` module hosts the recurring timer.

pub mod cli;
pub mod config;
pub mod constants;
pub mod daemon;
pub mod data_dir;
pub mod error;
pub mod platform;
pub mod rotation;
pub mod scheduler;
pub mod schema;
pub mod wallpaper;
