//! filesorter - sort the files of a folder into category subfolders
//!
//! This library classifies files by extension, previews how a directory would
//! be sorted, moves loose files into category subfolders, and restores them
//! back out again, reporting progress as it goes. Sorting and restoring can run
//! on a background thread through [`Worker`].

pub mod cli;
pub mod config;
pub mod file_category;
pub mod file_organizer;
pub mod output;
pub mod restore;
pub mod worker;

pub use config::{CompiledFilters, ConfigError, SorterConfig};
pub use file_category::{CategoryEntry, CategoryTable};
pub use file_organizer::{
    FileEntry, FileOrganizer, OperationKind, OperationOutcome, OperationState, OrganizeError,
    ProgressEvent, ProgressObserver, ScanResult,
};
pub use worker::{OperationHandle, Worker, WorkerMessage};

pub use cli::{OrganizeCommand, run_cli};
