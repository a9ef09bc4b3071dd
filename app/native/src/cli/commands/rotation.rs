//! Rotation CLI commands.

use clap::Subcommand;
use colored::Colorize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use super::open_service;
use super::types::{CliTarget, Position};
use crate::cli::output;
use crate::config::get_config;
use crate::data_dir::{format_bytes, get_data_dir};
use crate::error::WallcycleError;
use crate::rotation::{ConfigPatch, RotationRequest};
use crate::wallpaper::DesktopWallpaper;

/// Rotation control commands.
#[derive(Subcommand, Debug)]
#[command(next_display_order = None)]
pub enum RotationCommands {
    /// Start rotating an album.
    ///
    /// Settings not given fall back to the configured defaults. Picking a
    /// different album than before starts a fresh cycle.
    #[command(
        verbatim_doc_comment,
        after_long_help = r#"Examples:
  wallcycle rotation start 1                       # Album 1 with configured defaults
  wallcycle rotation start 2 --interval 60         # Every hour
  wallcycle rotation start 2 --shuffle --target both"#
    )]
    Start {
        /// The album position (1 = first).
        album: Position,

        /// Minutes between changes (15 to 2880).
        #[arg(long, short, value_name = "MINUTES")]
        interval: Option<u32>,

        /// Random order without repeats until every image was shown.
        #[arg(long, short)]
        shuffle: bool,

        /// Surface(s) receiving the wallpaper.
        #[arg(long, short, value_enum)]
        target: Option<CliTarget>,
    },

    /// Stop rotating. Albums and history are kept.
    Stop,

    /// Change to the next wallpaper now.
    Next,

    /// Change rotation settings without restarting it.
    Set {
        /// Minutes between changes (15 to 2880).
        #[arg(long, short, value_name = "MINUTES")]
        interval: Option<u32>,

        /// Turn shuffle on or off.
        #[arg(long, short, value_name = "BOOL")]
        shuffle: Option<bool>,

        /// Surface(s) receiving the wallpaper.
        #[arg(long, short, value_enum)]
        target: Option<CliTarget>,
    },

    /// Show the rotation state.
    Status {
        /// Output the stored record as JSON.
        #[arg(long, short)]
        json: bool,
    },
}

/// Execute rotation subcommands.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cmd: &RotationCommands) -> Result<(), WallcycleError> {
    match cmd {
        RotationCommands::Start { album, interval, shuffle, target } => {
            execute_start(*album, *interval, *shuffle, *target)
        }
        RotationCommands::Stop => execute_stop(),
        RotationCommands::Next => execute_next(),
        RotationCommands::Set { interval, shuffle, target } => {
            execute_set(ConfigPatch {
                shuffle: *shuffle,
                target: target.map(Into::into),
                interval_minutes: *interval,
            })
        }
        RotationCommands::Status { json } => {
            execute_status(*json);
            Ok(())
        }
    }
}

/// Execute rotation start command.
fn execute_start(
    album: Position,
    interval: Option<u32>,
    shuffle: bool,
    target: Option<CliTarget>,
) -> Result<(), WallcycleError> {
    let defaults = get_config();
    let request = RotationRequest {
        interval_minutes: interval.unwrap_or_else(|| defaults.interval_minutes()),
        shuffle: shuffle || defaults.default_shuffle,
        target: target.map_or(defaults.default_target, Into::into),
        album: album.as_zero_based(),
    };

    let config = open_service().register_rotation(request)?;
    println!(
        "{} rotating album {album} every {} minutes ({}, {}).",
        "Started".green(),
        config.interval_minutes,
        if config.shuffle { "shuffle" } else { "in order" },
        config.target
    );
    Ok(())
}

/// Execute rotation stop command.
fn execute_stop() -> Result<(), WallcycleError> {
    let service = open_service();
    let was_running = service.load_config().task_registered;
    service.stop_rotation()?;

    if was_running {
        println!("Rotation stopped.");
    } else {
        println!("{}", "Rotation was not running.".dimmed());
    }
    Ok(())
}

/// Execute rotation next command.
fn execute_next() -> Result<(), WallcycleError> {
    let applied = open_service().select_and_apply_now()?;
    println!(
        "Applied image {} of album {} to {}: {}",
        Position::from_zero_based(applied.index),
        Position::from_zero_based(applied.album),
        applied.target,
        applied.image.display()
    );
    Ok(())
}

/// Execute rotation set command.
fn execute_set(patch: ConfigPatch) -> Result<(), WallcycleError> {
    if patch.is_empty() {
        return Err(WallcycleError::InvalidArguments(
            "Nothing to change. Pass --interval, --shuffle or --target.".to_string(),
        ));
    }

    let config = open_service().update_config(patch)?;
    println!(
        "Settings saved: every {} minutes, {}, {}.",
        config.interval_minutes,
        if config.shuffle { "shuffle" } else { "in order" },
        config.target
    );
    Ok(())
}

/// Execute rotation status command.
fn execute_status(json: bool) {
    #[derive(Tabled)]
    struct StatusRow {
        #[tabled(rename = "Setting")]
        key: &'static str,
        #[tabled(rename = "Value")]
        value: String,
    }

    let service = open_service();
    let config = service.load_config();

    if json {
        output::print_highlighted_json(&serde_json::json!(config));
        return;
    }

    let active = config.active().map_or_else(
        || "none".dimmed().to_string(),
        |album| {
            let position = config.active_album.map_or(0, |i| i + 1);
            format!("{position}. {} ({} images)", album.name, album.len())
        },
    );

    let rows = vec![
        StatusRow { key: "Running", value: output::format_bool(config.task_registered) },
        StatusRow { key: "Active album", value: active },
        StatusRow { key: "Interval", value: format!("{} minutes", config.interval_minutes) },
        StatusRow { key: "Shuffle", value: output::format_bool(config.shuffle) },
        StatusRow { key: "Target", value: config.target.to_string() },
        StatusRow {
            key: "Shown this cycle",
            value: format!("{} of {}", config.recent_indices.len(), config.active_images().len()),
        },
        StatusRow {
            key: "Current wallpaper",
            value: DesktopWallpaper::current().unwrap_or_else(|| "unknown".dimmed().to_string()),
        },
        StatusRow { key: "Storage used", value: format_bytes(service.storage_usage()) },
        StatusRow { key: "Data directory", value: get_data_dir().display().to_string() },
    ];

    println!("{}", Table::new(rows).with(Style::rounded()));
}
