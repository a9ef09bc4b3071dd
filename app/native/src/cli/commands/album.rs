//! Album CLI commands.
//!
//! Albums hold app-owned copies of the picked images. Positions on the
//! command line are 1-based.

use std::path::{Path, PathBuf};

use clap::Subcommand;
use colored::Colorize;
use tabled::settings::object::Columns;
use tabled::settings::{Alignment, Modify, Style};
use tabled::{Table, Tabled};

use super::open_service;
use super::types::Position;
use crate::cli::output;
use crate::error::WallcycleError;
use crate::rotation::RotationConfig;

/// Album management commands.
#[derive(Subcommand, Debug)]
#[command(next_display_order = None)]
pub enum AlbumCommands {
    /// List all albums.
    List {
        /// Output the stored albums as JSON.
        #[arg(long, short)]
        json: bool,
    },

    /// Show the images of one album.
    Show {
        /// The album position (1 = first).
        album: Position,

        /// Output as JSON.
        #[arg(long, short)]
        json: bool,
    },

    /// Create an album from image files.
    ///
    /// The files are copied into the data directory; the originals are left
    /// untouched.
    #[command(
        verbatim_doc_comment,
        after_long_help = r#"Examples:
  wallcycle album create Beaches ~/Pictures/a.jpg ~/Pictures/b.png
  wallcycle album create Forests --from ~/Pictures/forests"#
    )]
    Create {
        /// The album name.
        name: String,

        /// Image files to import.
        #[arg(value_name = "IMAGE", conflicts_with = "from", required_unless_present = "from")]
        images: Vec<PathBuf>,

        /// Import every supported image in a directory instead.
        #[arg(long, value_name = "DIR")]
        from: Option<PathBuf>,
    },

    /// Add image files to an existing album.
    Add {
        /// The album position (1 = first).
        album: Position,

        /// Image files to import.
        #[arg(value_name = "IMAGE", required = true)]
        images: Vec<PathBuf>,
    },

    /// Remove one image from an album and delete its copy.
    Remove {
        /// The album position (1 = first).
        album: Position,

        /// The image position within the album (1 = first).
        image: Position,
    },

    /// Delete an album and all of its copied images.
    Delete {
        /// The album position (1 = first).
        album: Position,
    },
}

/// Execute album subcommands.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cmd: &AlbumCommands) -> Result<(), WallcycleError> {
    match cmd {
        AlbumCommands::List { json } => {
            execute_list(*json);
            Ok(())
        }
        AlbumCommands::Show { album, json } => execute_show(*album, *json),
        AlbumCommands::Create { name, images, from } => {
            execute_create(name, images, from.as_deref())
        }
        AlbumCommands::Add { album, images } => execute_add(*album, images),
        AlbumCommands::Remove { album, image } => execute_remove(*album, *image),
        AlbumCommands::Delete { album } => execute_delete(*album),
    }
}

/// Execute album list command.
fn execute_list(json: bool) {
    #[derive(Tabled)]
    struct AlbumRow {
        #[tabled(rename = "#")]
        position: Position,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Images")]
        images: usize,
        #[tabled(rename = "Active")]
        active: String,
    }

    let config = open_service().load_config();

    if json {
        output::print_highlighted_json(&serde_json::json!(config.albums));
        return;
    }

    if config.albums.is_empty() {
        println!("{}", "No albums yet. Create one with 'wallcycle album create'.".dimmed());
        return;
    }

    let rows: Vec<AlbumRow> = config
        .albums
        .iter()
        .enumerate()
        .map(|(index, album)| AlbumRow {
            position: Position::from_zero_based(index),
            name: output::truncate(&album.name, 40),
            images: album.len(),
            active: output::format_bool(config.active_album == Some(index)),
        })
        .collect();

    let table = Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(2..)).with(Alignment::center()))
        .to_string();
    println!("{table}");
}

/// Execute album show command.
fn execute_show(album: Position, json: bool) -> Result<(), WallcycleError> {
    #[derive(Tabled)]
    struct ImageRow {
        #[tabled(rename = "#")]
        position: Position,
        #[tabled(rename = "File")]
        file: String,
        #[tabled(rename = "Recent")]
        recent: String,
    }

    let config = open_service().load_config();
    let index = album.as_zero_based();
    let Some(entry) = config.album(index) else {
        return Err(missing_album(album, &config));
    };

    if json {
        output::print_highlighted_json(&serde_json::json!(entry));
        return Ok(());
    }

    println!("{} ({} images)", entry.name.bold(), entry.len());
    if entry.is_empty() {
        return Ok(());
    }

    let is_active = config.active_album == Some(index);
    let rows: Vec<ImageRow> = entry
        .images
        .iter()
        .enumerate()
        .map(|(i, path)| ImageRow {
            position: Position::from_zero_based(i),
            file: output::truncate(&file_label(path), 60),
            recent: output::format_bool(is_active && config.recent_indices.contains(&i)),
        })
        .collect();

    println!("{}", Table::new(rows).with(Style::rounded()));
    Ok(())
}

/// Execute album create command.
fn execute_create(
    name: &str,
    images: &[PathBuf],
    from: Option<&Path>,
) -> Result<(), WallcycleError> {
    let service = open_service();
    let index = match from {
        Some(dir) => service.import_directory(name, dir)?,
        None => service.create_album(name, images)?,
    };

    let config = service.load_config();
    let count = config.album(index).map_or(0, |a| a.len());
    println!(
        "{} album {} '{}' with {count} images.",
        "Created".green(),
        Position::from_zero_based(index),
        name.trim()
    );
    Ok(())
}

/// Execute album add command.
fn execute_add(album: Position, images: &[PathBuf]) -> Result<(), WallcycleError> {
    let config = open_service().add_images(album.as_zero_based(), images)?;
    let total = config.album(album.as_zero_based()).map_or(0, |a| a.len());
    println!("Added {} images to album {album} ({total} total).", images.len());
    Ok(())
}

/// Execute album remove command.
fn execute_remove(album: Position, image: Position) -> Result<(), WallcycleError> {
    let service = open_service();
    let was_running = service.load_config().task_registered;
    let config = service.remove_image(album.as_zero_based(), image.as_zero_based())?;

    println!("Removed image {image} from album {album}.");
    if was_running && !config.task_registered {
        println!("{}", "The active album is now empty; rotation stopped.".yellow());
    }
    Ok(())
}

/// Execute album delete command.
fn execute_delete(album: Position) -> Result<(), WallcycleError> {
    let service = open_service();
    let was_running = service.load_config().task_registered;
    let config = service.delete_album(album.as_zero_based())?;

    println!("Deleted album {album}.");
    if was_running && !config.task_registered {
        println!("{}", "It was the active album; rotation stopped.".yellow());
    }
    Ok(())
}

fn missing_album(album: Position, config: &RotationConfig) -> WallcycleError {
    WallcycleError::AlbumError(format!(
        "no album at position {album} ({} albums exist)",
        config.albums.len()
    ))
}

fn file_label(path: &Path) -> String {
    path.file_name().map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}
