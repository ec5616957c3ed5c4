/// Restoring sorted files back into their parent directory.
///
/// Restore is the inverse of sorting: every regular file found directly inside
/// an immediate subdirectory is moved up one level, and each subdirectory is
/// removed once it has been emptied.
use crate::file_organizer::{
    FileEntry, FileOrganizer, OperationKind, OperationOutcome, OperationState, OrganizeResult,
    ProgressCallback, ProgressEvent, ProgressObserver, finish, move_file, read_entries,
    regular_files,
};
use log::{info, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// Files to restore from one subdirectory.
#[derive(Debug)]
struct FolderPlan {
    folder: PathBuf,
    files: Vec<FileEntry>,
}

impl FileOrganizer {
    /// Flattens the immediate subdirectories of `directory` back into it.
    ///
    /// Files already present in `directory` under the same name are replaced.
    /// Subdirectories that cannot be removed afterwards (not empty, permission
    /// denied) are left in place without failing the operation. The first move
    /// error stops the pass; files restored before it stay restored.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use filesorter::file_category::CategoryTable;
    /// use filesorter::file_organizer::FileOrganizer;
    /// use std::path::Path;
    ///
    /// let organizer = FileOrganizer::new(CategoryTable::reference());
    /// let outcome = organizer.restore(Path::new("/path/to/downloads"), |event| {
    ///     println!("{}/{}", event.processed, event.total);
    /// });
    /// println!("Restored {} files", outcome.moved());
    /// ```
    pub fn restore<F>(&self, directory: &Path, on_progress: F) -> OperationOutcome
    where
        F: FnMut(ProgressEvent),
    {
        self.restore_observed(directory, &mut ProgressCallback(on_progress))
    }

    /// Same as [`FileOrganizer::restore`], reporting to an observer.
    pub fn restore_observed<O>(&self, directory: &Path, observer: &mut O) -> OperationOutcome
    where
        O: ProgressObserver + ?Sized,
    {
        info!("Restoring files in {}", directory.display());
        let mut moved = 0;
        let result = restore_pass(directory, observer, &mut moved);
        finish(OperationKind::Restore, directory, observer, moved, result)
    }
}

fn restore_pass<O>(directory: &Path, observer: &mut O, moved: &mut usize) -> OrganizeResult<()>
where
    O: ProgressObserver + ?Sized,
{
    observer.on_state(OperationState::Counting);
    let plan = restore_plan(directory)?;
    let total: usize = plan.iter().map(|folder| folder.files.len()).sum();
    if total == 0 {
        return Ok(());
    }

    observer.on_state(OperationState::Moving);
    for FolderPlan { folder, files } in &plan {
        for entry in files {
            move_file(&entry.path, &directory.join(entry.os_name()))?;
            *moved += 1;
            observer.on_progress(ProgressEvent {
                processed: *moved,
                total,
            });
        }

        if let Err(e) = fs::remove_dir(folder) {
            warn!("Leaving {} in place: {}", folder.display(), e);
        }
    }
    Ok(())
}

/// Lists every immediate subdirectory with the regular files it holds.
fn restore_plan(directory: &Path) -> OrganizeResult<Vec<FolderPlan>> {
    let mut plan = Vec::new();
    for entry in read_entries(directory)? {
        if entry.file_type().is_ok_and(|file_type| file_type.is_dir()) {
            let folder = entry.path();
            let files = regular_files(&folder)?;
            plan.push(FolderPlan { folder, files });
        }
    }
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_category::CategoryTable;
    use crate::file_organizer::OrganizeError;
    use tempfile::TempDir;

    fn organizer() -> FileOrganizer {
        FileOrganizer::new(CategoryTable::reference())
    }

    #[test]
    fn test_restore_flattens_and_removes_folders() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();
        fs::create_dir(base.join("Images")).unwrap();
        fs::create_dir(base.join("Documents")).unwrap();
        fs::write(base.join("Images/a.png"), "a").unwrap();
        fs::write(base.join("Images/b.png"), "b").unwrap();
        fs::write(base.join("Documents/c.txt"), "c").unwrap();

        let mut events = Vec::new();
        let outcome = organizer().restore(base, |event| events.push(event));

        assert!(outcome.is_success());
        assert_eq!(outcome.moved(), 3);
        assert_eq!(
            events.iter().map(|e| e.processed).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert!(events.iter().all(|e| e.total == 3));
        assert!(base.join("a.png").is_file());
        assert!(base.join("c.txt").is_file());
        assert!(!base.join("Images").exists());
        assert!(!base.join("Documents").exists());
    }

    #[test]
    fn test_restore_ignores_loose_files() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();
        fs::write(base.join("loose.txt"), "x").unwrap();

        let outcome = organizer().restore(base, |_| {});

        assert!(outcome.is_nothing_to_do());
        assert!(base.join("loose.txt").is_file());
    }

    #[test]
    fn test_restore_with_only_empty_folders_is_nothing_to_do() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();
        fs::create_dir(base.join("Empty")).unwrap();

        let outcome = organizer().restore(base, |_| {});

        assert!(outcome.is_nothing_to_do());
        // Nothing to do means nothing is touched, empty folders included.
        assert!(base.join("Empty").is_dir());
    }

    #[test]
    fn test_restore_keeps_non_empty_folder() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();
        fs::create_dir_all(base.join("Projects/nested")).unwrap();
        fs::write(base.join("Projects/readme.md"), "x").unwrap();
        fs::write(base.join("Projects/nested/deep.txt"), "x").unwrap();

        let outcome = organizer().restore(base, |_| {});

        assert_eq!(outcome.moved(), 1);
        assert!(outcome.is_success());
        assert!(base.join("readme.md").is_file());
        // Only one level is flattened; the nested folder keeps its parent alive.
        assert!(base.join("Projects/nested/deep.txt").is_file());
    }

    #[test]
    fn test_restore_overwrites_existing_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();
        fs::write(base.join("same.txt"), "top").unwrap();
        fs::create_dir(base.join("Documents")).unwrap();
        fs::write(base.join("Documents/same.txt"), "sorted").unwrap();

        let outcome = organizer().restore(base, |_| {});

        assert_eq!(outcome.moved(), 1);
        assert_eq!(fs::read_to_string(base.join("same.txt")).unwrap(), "sorted");
    }

    #[test]
    fn test_restore_missing_directory() {
        let outcome = organizer().restore(Path::new("/non/existent/path"), |_| {});
        assert!(matches!(
            outcome.error(),
            Some(OrganizeError::DirectoryNotFound { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_restore_skips_symlinks() {
        use std::os::unix::fs::symlink;

        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let outside = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();
        fs::write(outside.path().join("kept.txt"), "x").unwrap();
        symlink(outside.path(), base.join("linked_folder")).unwrap();
        fs::create_dir(base.join("Documents")).unwrap();
        fs::write(base.join("Documents/a.txt"), "a").unwrap();
        symlink(
            outside.path().join("kept.txt"),
            base.join("Documents/link.txt"),
        )
        .unwrap();

        let outcome = organizer().restore(base, |_| {});

        assert_eq!(outcome.moved(), 1);
        assert!(outcome.is_success());
        assert!(base.join("a.txt").is_file());
        // The linked folder is never entered and its contents stay put.
        assert!(outside.path().join("kept.txt").is_file());
        assert!(!base.join("kept.txt").exists());
        let link_type = fs::symlink_metadata(base.join("linked_folder")).unwrap().file_type();
        assert!(link_type.is_symlink());
        // The file link is not moved, so its folder cannot be removed.
        assert!(fs::symlink_metadata(base.join("Documents/link.txt")).is_ok());
        assert!(!base.join("link.txt").exists());
    }
}
