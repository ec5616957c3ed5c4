//! Running sorts and restores off the caller's thread.
//!
//! A [`Worker`] starts each operation on its own thread and hands progress back
//! through a channel, so a front end can keep drawing while files move. It also
//! refuses to start a second operation on a directory that already has one
//! running.

use crate::file_organizer::{
    FileOrganizer, OperationKind, OperationOutcome, OperationState, OrganizeError,
    OrganizeResult, ProgressEvent, ProgressObserver,
};
use crossbeam_channel::{Receiver, Sender, unbounded};
use log::error;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Messages sent from the operation thread to the caller.
///
/// Each operation sends zero or more `Progress` messages followed by exactly
/// one `Finished`.
#[derive(Debug)]
pub enum WorkerMessage {
    Progress(ProgressEvent),
    Finished(OperationOutcome),
}

type BusySet = Arc<Mutex<HashSet<PathBuf>>>;

/// Starts operations on background threads, one at a time per directory.
#[derive(Debug, Clone)]
pub struct Worker {
    organizer: Arc<FileOrganizer>,
    busy: BusySet,
}

impl Worker {
    pub fn new(organizer: FileOrganizer) -> Self {
        Self {
            organizer: Arc::new(organizer),
            busy: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn organizer(&self) -> &FileOrganizer {
        &self.organizer
    }

    /// Returns true while an operation on `directory` has not resolved.
    pub fn is_busy(&self, directory: &Path) -> bool {
        self.busy.lock().contains(&busy_key(directory))
    }

    /// Starts `kind` on `directory` in a new thread.
    ///
    /// # Errors
    ///
    /// Returns `Busy` if another operation on the same directory is still
    /// running. Every other failure is reported through the handle.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use filesorter::file_category::CategoryTable;
    /// use filesorter::file_organizer::{FileOrganizer, OperationKind};
    /// use filesorter::worker::Worker;
    /// use std::path::Path;
    ///
    /// let worker = Worker::new(FileOrganizer::new(CategoryTable::reference()));
    /// let handle = worker.spawn(OperationKind::Sort, Path::new("/path/to/downloads"))?;
    /// let outcome = handle.wait_with(|event| println!("{}%", event.percent()));
    /// println!("Sorted {} files", outcome.moved());
    /// # Ok::<(), filesorter::file_organizer::OrganizeError>(())
    /// ```
    pub fn spawn(&self, kind: OperationKind, directory: &Path) -> OrganizeResult<OperationHandle> {
        let guard = self.claim(directory)?;
        let (tx, rx) = unbounded();
        let state = Arc::new(Mutex::new(OperationState::Idle));

        let organizer = Arc::clone(&self.organizer);
        let target = directory.to_path_buf();
        let mut observer = ChannelObserver {
            tx: tx.clone(),
            state: Arc::clone(&state),
        };
        let thread = thread::spawn(move || {
            let outcome = organizer.run(kind, &target, &mut observer);
            // Release the directory before announcing the end, so a caller that
            // reacts to `Finished` can start the next operation right away.
            drop(guard);
            let _ = tx.send(WorkerMessage::Finished(outcome));
        });

        Ok(OperationHandle {
            kind,
            directory: directory.to_path_buf(),
            rx,
            state,
            thread: Some(thread),
        })
    }

    fn claim(&self, directory: &Path) -> OrganizeResult<BusyGuard> {
        let key = busy_key(directory);
        let mut busy = self.busy.lock();
        if !busy.insert(key.clone()) {
            return Err(OrganizeError::Busy {
                path: directory.to_path_buf(),
            });
        }
        Ok(BusyGuard {
            busy: Arc::clone(&self.busy),
            key,
        })
    }
}

fn busy_key(directory: &Path) -> PathBuf {
    directory
        .canonicalize()
        .unwrap_or_else(|_| directory.to_path_buf())
}

/// Removes a directory from the busy set when dropped, panics included.
struct BusyGuard {
    busy: BusySet,
    key: PathBuf,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.busy.lock().remove(&self.key);
    }
}

struct ChannelObserver {
    tx: Sender<WorkerMessage>,
    state: Arc<Mutex<OperationState>>,
}

impl ProgressObserver for ChannelObserver {
    fn on_state(&mut self, state: OperationState) {
        *self.state.lock() = state;
    }

    fn on_progress(&mut self, event: ProgressEvent) {
        // The caller may have stopped listening; the operation still finishes.
        let _ = self.tx.send(WorkerMessage::Progress(event));
    }
}

/// A running operation.
#[derive(Debug)]
pub struct OperationHandle {
    kind: OperationKind,
    directory: PathBuf,
    rx: Receiver<WorkerMessage>,
    state: Arc<Mutex<OperationState>>,
    thread: Option<JoinHandle<()>>,
}

impl OperationHandle {
    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// The latest state reported by the operation thread.
    pub fn state(&self) -> OperationState {
        *self.state.lock()
    }

    /// The channel carrying progress and the final outcome, for callers that
    /// poll from an event loop.
    pub fn messages(&self) -> &Receiver<WorkerMessage> {
        &self.rx
    }

    /// Blocks until the operation finishes.
    pub fn wait(self) -> OperationOutcome {
        self.wait_with(|_| {})
    }

    /// Blocks until the operation finishes, forwarding each progress event.
    pub fn wait_with<F>(mut self, mut on_progress: F) -> OperationOutcome
    where
        F: FnMut(ProgressEvent),
    {
        let mut outcome = None;
        for message in self.rx.iter() {
            match message {
                WorkerMessage::Progress(event) => on_progress(event),
                WorkerMessage::Finished(result) => {
                    outcome = Some(result);
                    break;
                }
            }
        }

        if let Some(thread) = self.thread.take()
            && thread.join().is_err()
        {
            error!("Worker thread for {} panicked", self.directory.display());
        }

        outcome.unwrap_or_else(|| OperationOutcome::Failure {
            moved: 0,
            error: OrganizeError::Interrupted {
                path: self.directory.clone(),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_category::CategoryTable;
    use std::fs;
    use tempfile::TempDir;

    fn worker() -> Worker {
        Worker::new(FileOrganizer::new(CategoryTable::reference()))
    }

    #[test]
    fn test_spawned_sort_reports_progress_and_outcome() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        for name in ["a.png", "b.mp3", "c.zip"] {
            fs::write(temp_dir.path().join(name), "x").unwrap();
        }
        let worker = worker();

        let handle = worker.spawn(OperationKind::Sort, temp_dir.path()).unwrap();
        let mut seen = Vec::new();
        let outcome = handle.wait_with(|event| seen.push(event.processed));

        assert!(outcome.is_success());
        assert_eq!(outcome.moved(), 3);
        assert_eq!(seen, vec![1, 2, 3]);
        assert!(temp_dir.path().join("Images/a.png").exists());
        assert!(!worker.is_busy(temp_dir.path()));
    }

    #[test]
    fn test_second_operation_on_same_directory_is_refused() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let worker = worker();

        let guard = worker.claim(temp_dir.path()).unwrap();
        assert!(worker.is_busy(temp_dir.path()));
        let refused = worker.spawn(OperationKind::Restore, temp_dir.path());
        assert!(matches!(refused, Err(OrganizeError::Busy { .. })));

        drop(guard);
        assert!(!worker.is_busy(temp_dir.path()));
        let handle = worker
            .spawn(OperationKind::Restore, temp_dir.path())
            .unwrap();
        assert!(handle.wait().is_nothing_to_do());
    }

    #[test]
    fn test_different_directories_run_independently() {
        let first = TempDir::new().expect("Failed to create temp directory");
        let second = TempDir::new().expect("Failed to create temp directory");
        let worker = worker();

        let _guard = worker.claim(first.path()).unwrap();
        let handle = worker.spawn(OperationKind::Sort, second.path()).unwrap();
        assert!(handle.wait().is_success());
    }

    #[test]
    fn test_state_is_final_after_wait() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        fs::write(temp_dir.path().join("a.txt"), "x").unwrap();
        let worker = worker();

        let handle = worker.spawn(OperationKind::Sort, temp_dir.path()).unwrap();
        let state = Arc::clone(&handle.state);
        let outcome = handle.wait();

        assert!(outcome.is_success());
        assert_eq!(*state.lock(), OperationState::Completed);
    }

    #[test]
    fn test_failure_is_delivered_through_handle() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let missing = temp_dir.path().join("missing");
        let worker = worker();

        let handle = worker.spawn(OperationKind::Sort, &missing).unwrap();
        assert_eq!(handle.kind(), OperationKind::Sort);
        let outcome = handle.wait();

        assert!(matches!(
            outcome.error(),
            Some(OrganizeError::DirectoryNotFound { .. })
        ));
        assert!(!worker.is_busy(&missing));
    }
}
