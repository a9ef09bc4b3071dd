//! Shared types for CLI commands.

use std::str::FromStr;

use crate::rotation::Target;

/// A 1-based index for addressing albums and images.
///
/// Users count from one; the rotation engine counts from zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(transparent)]
pub struct Position(usize);

impl Position {
    /// Creates a new `Position` from a 1-based index.
    #[cfg(test)]
    #[must_use]
    pub const fn new(index: usize) -> Self { Self(index) }

    /// Returns the 1-based index value.
    #[cfg(test)]
    #[must_use]
    pub const fn get(self) -> usize { self.0 }

    /// Returns the 0-based index used by the engine.
    #[must_use]
    pub const fn as_zero_based(self) -> usize { self.0.saturating_sub(1) }

    /// Converts an engine index to a user-facing position.
    #[must_use]
    pub const fn from_zero_based(index: usize) -> Self { Self(index + 1) }
}

impl FromStr for Position {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().parse::<usize>() {
            Ok(0) | Err(_) => {
                Err(format!("Invalid position '{s}'. Expected a positive integer (1 = first)."))
            }
            Ok(index) => Ok(Self(index)),
        }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "{}", self.0) }
}

/// Wallpaper surface (CLI representation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CliTarget {
    /// Home screen / desktop background.
    Home,
    /// Lock screen.
    Lock,
    /// Both surfaces.
    Both,
}

impl From<CliTarget> for Target {
    fn from(target: CliTarget) -> Self {
        match target {
            CliTarget::Home => Self::Home,
            CliTarget::Lock => Self::Lock,
            CliTarget::Both => Self::Both,
        }
    }
}
