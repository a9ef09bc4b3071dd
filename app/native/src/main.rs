#![allow(clippy::multiple_crate_versions)]

//! Wallcycle - wallpaper rotation from your own albums.
//!
//! This binary serves both the one-shot CLI (`wallcycle album ...`,
//! `wallcycle rotation ...`) and the long-running rotation host
//! (`wallcycle daemon`).

fn main() {
    if let Err(err) = wallcycle_lib::cli::run() {
        eprintln!("wallcycle: {err}");
        std::process::exit(1);
    }
}
