//! Platform wallpaper backends.
//!
//! - [`desktop`] - sets the desktop background through the `wallpaper` crate

pub mod desktop;

pub use desktop::DesktopWallpaper;
