//! CLI command definitions using Clap.
//!
//! This module defines all CLI commands and their arguments, organized into
//! domain-specific submodules:
//!
//! - `album` - Album management commands
//! - `config_cmd` - Configuration file commands
//! - `rotation` - Rotation control commands
//! - `types` - Shared types used across commands

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Generator, Shell, generate};

use crate::constants::IMAGES_SUBDIR;
use crate::error::WallcycleError;
use crate::rotation::{FileStore, ImageLibrary, RotationService, StateStore};
use crate::scheduler::{DaemonHandoff, ScheduleRequest};
use crate::schema::{SchemaKind, generate_schema_json};
use crate::wallpaper::DesktopWallpaper;
use crate::{config, daemon, data_dir};

pub mod album;
pub mod config_cmd;
pub mod rotation;
pub mod types;

pub use album::AlbumCommands;
pub use config_cmd::ConfigCommands;
pub use rotation::RotationCommands;

/// Application version from Cargo.toml.
const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Wallcycle CLI - rotate wallpapers from your own albums.
#[derive(Parser, Debug)]
#[command(name = "wallcycle")]
#[command(author, version = APP_VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to a custom configuration file.
    ///
    /// Overrides the default configuration file search paths.
    /// Supports JSONC format (JSON with comments).
    #[arg(long, short, global = true, value_name = "PATH")]
    pub config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Which document `wallcycle schema` describes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum SchemaTarget {
    /// The persisted rotation record (`rotation_config.json`).
    #[default]
    Record,
    /// The host configuration file.
    Config,
}

impl From<SchemaTarget> for SchemaKind {
    fn from(target: SchemaTarget) -> Self {
        match target {
            SchemaTarget::Record => Self::Record,
            SchemaTarget::Config => Self::Config,
        }
    }
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
#[command(next_display_order = None)]
pub enum Commands {
    /// Album management commands.
    ///
    /// Create, inspect and delete albums of imported images.
    #[command(subcommand)]
    Album(AlbumCommands),

    /// Rotation control commands.
    ///
    /// Start, stop and inspect the recurring wallpaper change.
    #[command(subcommand)]
    Rotation(RotationCommands),

    /// Configuration file management commands.
    ///
    /// Initialize and locate the configuration file.
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Run the rotation host in the foreground.
    ///
    /// Owns the timer that fires rotation ticks, resumes rotation after a
    /// restart, and follows changes made by other `wallcycle` invocations.
    Daemon,

    /// Output a JSON Schema.
    ///
    /// Outputs the JSON Schema of the persisted rotation record (default) or
    /// of the configuration file. Can be redirected to a file for use with
    /// editors that support JSON Schema validation.
    Schema {
        /// The document to describe.
        #[arg(value_enum, default_value_t)]
        document: SchemaTarget,
    },

    /// Generate shell completions.
    ///
    /// Outputs shell completion script to stdout for the specified shell.
    /// Can be used with eval or redirected to a file.
    ///
    /// Usage:
    ///   eval "$(wallcycle completions --shell zsh)"
    ///   wallcycle completions --shell bash > ~/.local/share/bash-completion/completions/wallcycle
    ///   wallcycle completions --shell fish > ~/.config/fish/completions/wallcycle.fish
    Completions {
        /// The shell to generate completions for.
        #[arg(long, short, value_enum)]
        shell: Shell,
    },
}

impl Cli {
    /// Returns the custom config path if specified via --config flag.
    #[must_use]
    pub fn config_path(&self) -> Option<PathBuf> { self.config.as_ref().map(PathBuf::from) }

    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command execution fails.
    pub fn execute(&self) -> Result<(), WallcycleError> {
        match &self.command {
            Commands::Album(cmd) => album::execute(cmd),
            Commands::Rotation(cmd) => rotation::execute(cmd),
            Commands::Config(cmd) => config_cmd::execute(cmd),
            Commands::Daemon => daemon::run(),

            Commands::Schema { document } => {
                println!("{}", generate_schema_json((*document).into()));
                Ok(())
            }

            Commands::Completions { shell } => {
                Self::print_completions(*shell);
                Ok(())
            }
        }
    }

    /// Applies the `--config` flag.
    ///
    /// # Errors
    ///
    /// Returns an error if the given file does not exist.
    pub fn apply_config_override(&self) -> Result<(), WallcycleError> {
        if let Some(path) = self.config_path() {
            if !path.exists() {
                return Err(WallcycleError::ConfigError(format!(
                    "Configuration file not found: {}",
                    path.display()
                )));
            }
            config::set_custom_config_path(path);
        }
        Ok(())
    }

    /// Print shell completions to stdout.
    fn print_completions<G: Generator>(generator: G) {
        let mut cmd = Self::command();
        generate(generator, &mut cmd, "wallcycle", &mut io::stdout());
    }
}

/// Builds the rotation service used by one-shot commands.
///
/// The scheduler is a [`DaemonHandoff`] seeded from the stored record, so
/// start and stop only persist intent and the daemon does the timing.
pub(crate) fn open_service() -> RotationService {
    let data_dir = data_dir::get_data_dir();
    let store: Arc<dyn StateStore> = Arc::new(FileStore::new(&data_dir));

    let record = store.load();
    let registration = record
        .task_registered
        .then(|| ScheduleRequest::every(record.interval_minutes));

    RotationService::new(
        store,
        Arc::new(DesktopWallpaper),
        Arc::new(DaemonHandoff::new(registration)),
        ImageLibrary::new(data_dir.join(IMAGES_SUBDIR)),
    )
}
