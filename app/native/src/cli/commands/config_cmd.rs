//! Config CLI commands.
//!
//! Commands for managing the Wallcycle configuration file.

use std::path::{Path, PathBuf};

use clap::Subcommand;
use colored::Colorize;

use crate::config::template::{create_config_file, generate_config_template};
use crate::config::{config_paths, get_config_path, preferred_config_path};
use crate::data_dir::get_data_dir;
use crate::error::WallcycleError;
use crate::rotation::FileStore;
use crate::rotation::store::record_exists;

/// Config management commands.
#[derive(Subcommand, Debug)]
#[command(next_display_order = None)]
pub enum ConfigCommands {
    /// Initialize a new configuration file with all options documented.
    ///
    /// Creates a new configuration file at the default location with all
    /// available options commented out.
    #[command(
        name = "init",
        after_long_help = r#"Examples:
  wallcycle config init              # Create config at default location
  wallcycle config init --force      # Overwrite existing config
  wallcycle config init --path ~/my-config.jsonc  # Create at custom path
  wallcycle config init --stdout     # Print template to stdout"#
    )]
    Init {
        /// Overwrite existing configuration file if it exists.
        #[arg(long, short)]
        force: bool,

        /// Custom path for the configuration file.
        /// If not specified, uses ~/.config/wallcycle/config.jsonc
        #[arg(long, short, value_name = "PATH")]
        path: Option<PathBuf>,

        /// Print the configuration template to stdout instead of writing to a file.
        #[arg(long)]
        stdout: bool,
    },

    /// Show the configuration search paths and the data directory.
    Path,
}

/// Execute config subcommands.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cmd: &ConfigCommands) -> Result<(), WallcycleError> {
    match cmd {
        ConfigCommands::Init { force, path, stdout } => {
            if *stdout {
                println!("{}", generate_config_template());
                Ok(())
            } else {
                init_config(*force, path.clone())
            }
        }
        ConfigCommands::Path => {
            show_config_path();
            Ok(())
        }
    }
}

/// Initialize a new configuration file.
fn init_config(force: bool, custom_path: Option<PathBuf>) -> Result<(), WallcycleError> {
    let config_path = custom_path
        .or_else(preferred_config_path)
        .unwrap_or_else(|| PathBuf::from("config.jsonc"));

    write_template(&config_path, force)?;

    println!("Configuration file created at: {}", config_path.display());
    println!("\nAll options are commented out by default.");
    println!("Edit the file and uncomment the options you want to configure.");
    Ok(())
}

fn write_template(path: &Path, force: bool) -> Result<(), WallcycleError> {
    if path.exists() && !force {
        return Err(WallcycleError::ConfigError(format!(
            "Configuration file already exists at: {}\nUse --force to overwrite.",
            path.display()
        )));
    }

    create_config_file(path).map_err(|e| {
        WallcycleError::ConfigError(format!("Failed to create config file {}: {e}", path.display()))
    })
}

/// Show the configuration file path.
fn show_config_path() {
    crate::config::init();
    println!("Configuration file search paths (in priority order):\n");

    let active = get_config_path();
    let mut found_config = false;

    for (i, path) in config_paths().iter().enumerate() {
        let marker = if active == Some(path) || (active.is_none() && path.exists() && !found_config) {
            found_config = true;
            " (active)".green().to_string()
        } else if path.exists() {
            " (exists)".to_string()
        } else {
            String::new()
        };

        println!("  {}. {}{}", i + 1, path.display(), marker);
    }

    if let Some(path) = active.filter(|p| !config_paths().contains(p)) {
        println!("\nUsing custom configuration: {}", path.display());
        found_config = true;
    }

    if !found_config {
        println!("\nNo configuration file found.");
        println!("Run 'wallcycle config init' to create one.");
    }

    let data_dir = get_data_dir();
    println!("\nData directory: {}", data_dir.display());
    let record = FileStore::new(&data_dir).path();
    if record_exists(&data_dir) {
        println!("Rotation record: {}", record.display());
    } else {
        println!("Rotation record: {} {}", record.display(), "(not created yet)".dimmed());
    }
}
