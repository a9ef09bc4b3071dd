//! Host platform helpers.
//!
//! - [`path`] - shell-like path expansion for user-supplied paths
//! - [`thread`] - named background threads

pub mod path;
pub mod thread;
