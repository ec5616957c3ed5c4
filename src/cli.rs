//! Command-line interface module for filesorter.
//!
//! This module handles all CLI-related functionality including:
//! - Argument parsing
//! - Configuration loading
//! - Scan preview printing
//! - Running sort and restore in the background with a progress bar

use crate::config::SorterConfig;
use crate::file_organizer::OperationKind;
use crate::output::{OutputFormatter, outcome_message};
use crate::worker::Worker;
use clap::{Parser, Subcommand};
use indicatif::ProgressBar;
use std::path::{Path, PathBuf};

/// Sort the files of a folder into category subfolders by extension.
#[derive(Debug, Parser)]
#[command(name = "filesorter", version, about)]
pub struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: OrganizeCommand,
}

/// Represents a CLI command to execute.
#[derive(Debug, Clone, Subcommand)]
pub enum OrganizeCommand {
    /// Preview how the files of a folder would be sorted.
    Scan {
        directory: PathBuf,
        /// Print the preview as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Move the files of a folder into category subfolders.
    Sort { directory: PathBuf },
    /// Move files out of the subfolders back into the folder.
    Restore { directory: PathBuf },
}

impl OrganizeCommand {
    pub fn directory(&self) -> &Path {
        match self {
            Self::Scan { directory, .. } | Self::Sort { directory } | Self::Restore { directory } => {
                directory.as_path()
            }
        }
    }
}

/// Runs the CLI application with the given command.
///
/// # Examples
///
/// ```no_run
/// use filesorter::cli::{run_cli, OrganizeCommand};
/// use std::path::PathBuf;
///
/// let command = OrganizeCommand::Sort { directory: PathBuf::from("/path/to/directory") };
/// match run_cli(command) {
///     Ok(()) => println!("Operation completed successfully"),
///     Err(e) => eprintln!("Error: {}", e),
/// }
/// ```
pub fn run_cli(command: OrganizeCommand) -> Result<(), String> {
    run_cli_with_config(command, None)
}

/// Runs the CLI application with an optional configuration file.
///
/// Returns `Err` with a printable message when the command fails, including a
/// sort or restore that stopped part way.
pub fn run_cli_with_config(
    command: OrganizeCommand,
    config_path: Option<&Path>,
) -> Result<(), String> {
    let config = SorterConfig::load(config_path)
        .map_err(|e| format!("Error loading configuration: {}", e))?;
    let organizer = config
        .organizer()
        .map_err(|e| format!("Error in configuration: {}", e))?;

    match command {
        OrganizeCommand::Scan { directory, json } => {
            let result = organizer.scan(&directory).map_err(|e| e.to_string())?;
            if json {
                let text = serde_json::to_string_pretty(&result)
                    .map_err(|e| format!("Error serializing preview: {}", e))?;
                OutputFormatter::plain(&text);
            } else {
                OutputFormatter::preview(&directory, &result);
            }
            Ok(())
        }
        OrganizeCommand::Sort { directory } => {
            run_operation(Worker::new(organizer), OperationKind::Sort, &directory)
        }
        OrganizeCommand::Restore { directory } => {
            run_operation(Worker::new(organizer), OperationKind::Restore, &directory)
        }
    }
}

/// Runs a sort or restore on a worker thread, drawing progress as it arrives.
fn run_operation(worker: Worker, kind: OperationKind, directory: &Path) -> Result<(), String> {
    let verb = match kind {
        OperationKind::Sort => "Sorting",
        OperationKind::Restore => "Restoring",
    };
    OutputFormatter::info(&format!("{} files in: {}", verb, directory.display()));

    let handle = worker.spawn(kind, directory).map_err(|e| e.to_string())?;
    let mut progress: Option<ProgressBar> = None;
    let outcome = handle.wait_with(|event| {
        let pb = progress
            .get_or_insert_with(|| OutputFormatter::create_progress_bar(event.total as u64));
        pb.set_position(event.processed as u64);
    });
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    // Failures are printed by the caller along with every other error.
    if outcome.is_success() {
        OutputFormatter::outcome(kind, &outcome);
        Ok(())
    } else {
        Err(outcome_message(kind, &outcome))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scan_with_json() {
        let cli = Cli::try_parse_from(["filesorter", "scan", "/tmp/x", "--json"]).unwrap();
        assert!(matches!(
            cli.command,
            OrganizeCommand::Scan { json: true, .. }
        ));
        assert_eq!(cli.command.directory(), Path::new("/tmp/x"));
    }

    #[test]
    fn test_parse_global_flags() {
        let cli = Cli::try_parse_from([
            "filesorter",
            "-vv",
            "restore",
            "/tmp/x",
            "--config",
            "sorter.toml",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.config.as_deref(), Some(Path::new("sorter.toml")));
        assert!(matches!(cli.command, OrganizeCommand::Restore { .. }));
    }

    #[test]
    fn test_directory_is_required() {
        assert!(Cli::try_parse_from(["filesorter", "sort"]).is_err());
    }
}
