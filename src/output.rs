//! Output formatting and styling module.
//!
//! Provides a centralized interface for all CLI output: colored status lines,
//! the progress bar for sort/restore, and the scan preview listing.

use crate::file_organizer::{OperationKind, OperationOutcome, ScanResult};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;

/// Number of file names listed per category in a preview.
pub const PREVIEW_FILES_PER_CATEGORY: usize = 5;

/// Manages all CLI output with consistent styling and formatting.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use filesorter::output::OutputFormatter;
    /// OutputFormatter::success("Successfully sorted 4 files!");
    /// ```
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a regular message without styling.
    pub fn plain(message: &str) {
        println!("{}", message);
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Creates and returns a progress bar for file operations.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use filesorter::output::OutputFormatter;
    /// let pb = OutputFormatter::create_progress_bar(100);
    /// pb.set_position(1);
    /// pb.finish_and_clear();
    /// ```
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░");
        pb.set_style(style);
        pb
    }

    /// Prints the preview of a scan.
    pub fn preview(directory: &Path, result: &ScanResult) {
        let mut lines = preview_lines(directory, result).into_iter();
        if let Some(first) = lines.next() {
            Self::header(&first);
        }
        for line in lines {
            if line.starts_with("📂") {
                println!("{}", line.bold());
            } else {
                Self::plain(&line);
            }
        }
    }

    /// Prints how an operation ended.
    pub fn outcome(kind: OperationKind, outcome: &OperationOutcome) {
        let message = outcome_message(kind, outcome);
        match outcome {
            OperationOutcome::Success { moved: 0 } => Self::warning(&message),
            OperationOutcome::Success { .. } => Self::success(&message),
            OperationOutcome::Failure { .. } => Self::error(&message),
        }
    }
}

/// Builds the preview text, one entry per line.
///
/// Each category lists at most [`PREVIEW_FILES_PER_CATEGORY`] names, followed
/// by a count of the ones left out.
pub fn preview_lines(directory: &Path, result: &ScanResult) -> Vec<String> {
    let folder_name = directory
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| directory.display().to_string());

    let mut lines = vec![
        format!("📊 Folder: {}", folder_name),
        format!("📁 Found {} {}", result.total, plural(result.total)),
        "=".repeat(60),
    ];

    if result.is_empty() {
        lines.push("No files to sort in this folder".to_string());
        return lines;
    }

    for (category, files) in &result.groups {
        lines.push(format!(
            "📂 {} ({} {})",
            category,
            files.len(),
            plural(files.len())
        ));
        for file in files.iter().take(PREVIEW_FILES_PER_CATEGORY) {
            lines.push(format!("   • {}", file));
        }
        if files.len() > PREVIEW_FILES_PER_CATEGORY {
            lines.push(format!(
                "   ... {} more {}",
                files.len() - PREVIEW_FILES_PER_CATEGORY,
                plural(files.len() - PREVIEW_FILES_PER_CATEGORY)
            ));
        }
    }
    lines
}

/// The user-facing summary of an outcome.
pub fn outcome_message(kind: OperationKind, outcome: &OperationOutcome) -> String {
    match (kind, outcome) {
        (OperationKind::Sort, OperationOutcome::Success { moved: 0 }) => {
            "No files to sort in this folder".to_string()
        }
        (OperationKind::Restore, OperationOutcome::Success { moved: 0 }) => {
            "No files to restore".to_string()
        }
        (OperationKind::Sort, OperationOutcome::Success { moved }) => {
            format!("Successfully sorted {} {}!", moved, plural(*moved))
        }
        (OperationKind::Restore, OperationOutcome::Success { moved }) => {
            format!("Successfully restored {} {}!", moved, plural(*moved))
        }
        (OperationKind::Sort, OperationOutcome::Failure { moved, error }) => {
            format!("Sorting failed after {} {}: {}", moved, plural(*moved), error)
        }
        (OperationKind::Restore, OperationOutcome::Failure { moved, error }) => {
            format!(
                "Restoration failed after {} {}: {}",
                moved,
                plural(*moved),
                error
            )
        }
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 { "file" } else { "files" }
}
