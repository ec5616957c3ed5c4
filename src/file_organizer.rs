/// Sorting files into category directories.
///
/// This module owns the scan/move engine: it enumerates the immediate children
/// of a directory, classifies each regular file with a [`CategoryTable`], and
/// moves files into category subfolders while reporting progress. The reverse
/// pass lives in [`crate::restore`].
use crate::config::CompiledFilters;
use crate::file_category::CategoryTable;
use log::{debug, error, info};
use serde::Serialize;
use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during scan, sort and restore.
#[derive(Debug, Error)]
pub enum OrganizeError {
    /// The target path does not exist or is not a directory.
    #[error("Directory not found: {}", path.display())]
    DirectoryNotFound { path: PathBuf },
    /// Listing a directory failed.
    #[error("Failed to read directory {}: {source}", path.display())]
    ReadDirFailed { path: PathBuf, source: io::Error },
    /// Moving a file failed.
    #[error("Failed to move {} to {}: {source}", from.display(), to.display())]
    MoveFailed {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },
    /// A category subfolder could not be created.
    #[error("Failed to create directory {}: {source}", path.display())]
    DirectoryCreateFailed { path: PathBuf, source: io::Error },
    /// Another sort or restore is still running on this directory.
    #[error("An operation is already running on {}", path.display())]
    Busy { path: PathBuf },
    /// The background thread stopped without reporting an outcome.
    #[error("Operation on {} ended unexpectedly", path.display())]
    Interrupted { path: PathBuf },
}

/// Result type for file organization operations.
pub type OrganizeResult<T> = Result<T, OrganizeError>;

/// A regular file directly inside the directory being processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// The file name, lossily converted for display and classification.
    pub name: String,
    /// The full path to the file.
    pub path: PathBuf,
}

impl FileEntry {
    /// The raw file name used when building destination paths.
    pub(crate) fn os_name(&self) -> &OsStr {
        self.path
            .file_name()
            .unwrap_or_else(|| OsStr::new(&self.name))
    }
}

/// Preview of how a directory would be sorted.
///
/// Categories are keyed by label, so iteration is alphabetical. Within a
/// category the file names keep directory iteration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanResult {
    /// File names grouped by category label.
    pub groups: BTreeMap<String, Vec<String>>,
    /// Number of files found.
    pub total: usize,
}

impl ScanResult {
    /// Returns true if the directory has no files to sort.
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// The files that would go into the given category.
    pub fn files_in(&self, category: &str) -> &[String] {
        self.groups.get(category).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// One step of progress: `processed` files moved out of a fixed `total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressEvent {
    pub processed: usize,
    pub total: usize,
}

impl ProgressEvent {
    /// Whole-number percentage of completion.
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        (self.processed.min(self.total) * 100 / self.total) as u8
    }
}

/// Lifecycle of a single sort or restore.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationState {
    Idle,
    Counting,
    Moving,
    Completed,
    Failed,
}

impl OperationState {
    /// Returns true once the operation can no longer change.
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Which pass to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    /// Move loose files into category subfolders.
    Sort,
    /// Move files out of subfolders back into the directory.
    Restore,
}

/// How a sort or restore ended.
#[derive(Debug)]
pub enum OperationOutcome {
    /// Every planned file was moved.
    Success { moved: usize },
    /// The pass stopped at the first error. Files moved before it stay moved.
    Failure { moved: usize, error: OrganizeError },
}

impl OperationOutcome {
    /// Number of files moved, whether or not the pass completed.
    pub fn moved(&self) -> usize {
        match self {
            Self::Success { moved } | Self::Failure { moved, .. } => *moved,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Success with nothing moved: the directory had nothing to process.
    pub fn is_nothing_to_do(&self) -> bool {
        matches!(self, Self::Success { moved: 0 })
    }

    pub fn error(&self) -> Option<&OrganizeError> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { error, .. } => Some(error),
        }
    }

    /// Converts into a plain result, dropping the partial count on failure.
    pub fn into_result(self) -> OrganizeResult<usize> {
        match self {
            Self::Success { moved } => Ok(moved),
            Self::Failure { error, .. } => Err(error),
        }
    }
}

/// Receives progress from a running sort or restore.
///
/// `on_progress` is called exactly once per moved file, in order, from the
/// thread running the operation.
pub trait ProgressObserver {
    /// Called on every state transition.
    fn on_state(&mut self, _state: OperationState) {}

    /// Called after each successful move.
    fn on_progress(&mut self, event: ProgressEvent);
}

/// Adapts a plain closure to [`ProgressObserver`].
pub struct ProgressCallback<F>(pub F);

impl<F: FnMut(ProgressEvent)> ProgressObserver for ProgressCallback<F> {
    fn on_progress(&mut self, event: ProgressEvent) {
        (self.0)(event)
    }
}

/// Sorts and restores files of a single directory.
///
/// The organizer holds only immutable configuration, so one instance can be
/// shared between threads and reused for any number of directories.
#[derive(Debug, Clone, Default)]
pub struct FileOrganizer {
    table: CategoryTable,
    filters: CompiledFilters,
}

impl FileOrganizer {
    /// Creates an organizer that considers every regular file.
    pub fn new(table: CategoryTable) -> Self {
        Self {
            table,
            filters: CompiledFilters::default(),
        }
    }

    /// Replaces the filters applied when choosing files to sort.
    pub fn with_filters(mut self, filters: CompiledFilters) -> Self {
        self.filters = filters;
        self
    }

    pub fn table(&self) -> &CategoryTable {
        &self.table
    }

    /// Previews the sort of `directory` without touching anything.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryNotFound` if the path is missing or not a directory,
    /// and `ReadDirFailed` if it cannot be listed.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use filesorter::file_category::CategoryTable;
    /// use filesorter::file_organizer::FileOrganizer;
    /// use std::path::Path;
    ///
    /// let organizer = FileOrganizer::new(CategoryTable::reference());
    /// let preview = organizer.scan(Path::new("/path/to/downloads"))?;
    /// for (category, files) in &preview.groups {
    ///     println!("{}: {} files", category, files.len());
    /// }
    /// # Ok::<(), filesorter::file_organizer::OrganizeError>(())
    /// ```
    pub fn scan(&self, directory: &Path) -> OrganizeResult<ScanResult> {
        let mut result = ScanResult::default();
        for entry in self.sortable_files(directory)? {
            let category = self.table.classify(&entry.name);
            result
                .groups
                .entry(category.to_string())
                .or_default()
                .push(entry.name);
            result.total += 1;
        }
        debug!(
            "Scanned {}: {} files in {} categories",
            directory.display(),
            result.total,
            result.groups.len()
        );
        Ok(result)
    }

    /// Moves every regular file of `directory` into its category subfolder.
    ///
    /// The file list is taken up front, so the total in each progress event
    /// stays fixed. An existing file with the same name in the category folder
    /// is replaced. The first error stops the pass; nothing is rolled back.
    pub fn sort<F>(&self, directory: &Path, on_progress: F) -> OperationOutcome
    where
        F: FnMut(ProgressEvent),
    {
        self.sort_observed(directory, &mut ProgressCallback(on_progress))
    }

    /// Same as [`FileOrganizer::sort`], reporting to an observer.
    pub fn sort_observed<O>(&self, directory: &Path, observer: &mut O) -> OperationOutcome
    where
        O: ProgressObserver + ?Sized,
    {
        info!("Sorting files in {}", directory.display());
        let mut moved = 0;
        let result = self.sort_pass(directory, observer, &mut moved);
        finish(OperationKind::Sort, directory, observer, moved, result)
    }

    /// Runs either pass.
    pub fn run<O>(&self, kind: OperationKind, directory: &Path, observer: &mut O) -> OperationOutcome
    where
        O: ProgressObserver + ?Sized,
    {
        match kind {
            OperationKind::Sort => self.sort_observed(directory, observer),
            OperationKind::Restore => self.restore_observed(directory, observer),
        }
    }

    fn sort_pass<O>(&self, directory: &Path, observer: &mut O, moved: &mut usize) -> OrganizeResult<()>
    where
        O: ProgressObserver + ?Sized,
    {
        observer.on_state(OperationState::Counting);
        let plan = self.sortable_files(directory)?;
        let total = plan.len();
        if total == 0 {
            return Ok(());
        }

        observer.on_state(OperationState::Moving);
        for entry in &plan {
            let category_path = directory.join(self.table.classify(&entry.name));
            ensure_category_dir(&category_path)?;
            move_file(&entry.path, &category_path.join(entry.os_name()))?;
            *moved += 1;
            observer.on_progress(ProgressEvent {
                processed: *moved,
                total,
            });
        }
        Ok(())
    }

    /// Regular files of `directory` that pass the filters, in iteration order.
    fn sortable_files(&self, directory: &Path) -> OrganizeResult<Vec<FileEntry>> {
        let files = regular_files(directory)?;
        Ok(files
            .into_iter()
            .filter(|entry| self.filters.should_include(&entry.name))
            .collect())
    }
}

/// Turns the result of a pass into its outcome and reports the final state.
pub(crate) fn finish<O>(
    kind: OperationKind,
    directory: &Path,
    observer: &mut O,
    moved: usize,
    result: OrganizeResult<()>,
) -> OperationOutcome
where
    O: ProgressObserver + ?Sized,
{
    match result {
        Ok(()) => {
            info!("{:?} of {} complete: {} files", kind, directory.display(), moved);
            observer.on_state(OperationState::Completed);
            OperationOutcome::Success { moved }
        }
        Err(error) => {
            error!(
                "{:?} of {} failed after {} files: {}",
                kind,
                directory.display(),
                moved,
                error
            );
            observer.on_state(OperationState::Failed);
            OperationOutcome::Failure { moved, error }
        }
    }
}

/// Fails with `DirectoryNotFound` unless `path` is an existing directory.
pub(crate) fn ensure_directory(path: &Path) -> OrganizeResult<()> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(OrganizeError::DirectoryNotFound {
            path: path.to_path_buf(),
        })
    }
}

/// Lists the entries of a directory, mapping a vanished directory to
/// `DirectoryNotFound`.
pub(crate) fn read_entries(path: &Path) -> OrganizeResult<Vec<fs::DirEntry>> {
    ensure_directory(path)?;
    let read_failed = |source: io::Error| {
        if source.kind() == io::ErrorKind::NotFound {
            OrganizeError::DirectoryNotFound {
                path: path.to_path_buf(),
            }
        } else {
            OrganizeError::ReadDirFailed {
                path: path.to_path_buf(),
                source,
            }
        }
    };
    fs::read_dir(path)
        .map_err(read_failed)?
        .map(|entry| entry.map_err(read_failed))
        .collect()
}

/// Regular files directly inside `path`. Symlinks and directories are skipped.
pub(crate) fn regular_files(path: &Path) -> OrganizeResult<Vec<FileEntry>> {
    let mut files = Vec::new();
    for entry in read_entries(path)? {
        if entry.file_type().is_ok_and(|file_type| file_type.is_file()) {
            files.push(FileEntry {
                name: entry.file_name().to_string_lossy().to_string(),
                path: entry.path(),
            });
        }
    }
    Ok(files)
}

/// Creates a category directory; an existing directory is reused.
fn ensure_category_dir(path: &Path) -> OrganizeResult<()> {
    match fs::create_dir(path) {
        Ok(()) => {
            debug!("Created category directory {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists && path.is_dir() => Ok(()),
        Err(source) => Err(OrganizeError::DirectoryCreateFailed {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Moves a file, replacing any existing file at the destination.
///
/// Falls back to copy and delete when source and destination are on
/// different filesystems.
pub(crate) fn move_file(from: &Path, to: &Path) -> OrganizeResult<()> {
    let result = match fs::rename(from, to) {
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            debug!("Cross-device move of {}, copying", from.display());
            fs::copy(from, to).and_then(|_| fs::remove_file(from))
        }
        other => other,
    };
    result.map_err(|source| OrganizeError::MoveFailed {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    })?;
    debug!("Moved {} -> {}", from.display(), to.display());
    Ok(())
}
