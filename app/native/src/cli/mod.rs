//! CLI module for Wallcycle.
//!
//! One-shot commands read and write the persisted rotation record directly.
//! The `daemon` command hosts the timer that fires rotation ticks and picks up
//! the changes one-shot commands leave behind.

mod commands;
mod output;

use clap::Parser;
pub use commands::Cli;
use tracing_subscriber::EnvFilter;

use crate::config;
use crate::constants::LOG_ENV_VAR;
use crate::error::WallcycleError;

/// Runs the CLI.
///
/// Parses command-line arguments, installs logging and executes the
/// appropriate command.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn run() -> Result<(), WallcycleError> {
    let cli = Cli::parse();
    cli.apply_config_override()?;
    init_logging();
    cli.execute()
}

/// Installs the stderr log subscriber.
///
/// The filter comes from `WALLCYCLE_LOG`, then the configured `logLevel`,
/// then `info`.
fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| {
        let level = config::get_config().log_level.as_deref().unwrap_or("info");
        EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"))
    });

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
