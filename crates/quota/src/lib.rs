//! # quota
//!
//! Per-directory disk quota enforcement.
//!
//! Each configured directory has a maximum size. When the files directly
//! inside a directory add up to more than that, the oldest files (by
//! modification time) are deleted until the directory fits again.
//!
//! ## Failure handling
//!
//! Enforcement is meant to run unattended, so one bad file or directory never
//! stops the rest of the run:
//!
//! - A directory that cannot be listed is reported and skipped.
//! - A file that cannot be inspected is left out of the size and never deleted.
//! - A file that cannot be deleted because of permissions (or because it is
//!   already gone) is set aside and the next-oldest file is tried.
//! - Any other delete failure stops eviction in that directory only.
//!
//! Every one of these is reported as an [`Event`] to an [`EventSink`].
//!
//! ## Recursive quotas
//!
//! With `recursive` set, every subdirectory is enforced against the same
//! limit, on its own files only. Subtrees never share a budget.
//! Symlinked directories are not followed.
//!
//! ## Example
//!
//! ```no_run
//! use quota::{DirectoryQuota, Enforcer, FsBackend, NoSink};
//!
//! let fs = FsBackend::new();
//! let enforcer = Enforcer::new(fs, fs, NoSink);
//!
//! let outcome = enforcer
//!     .enforce(&DirectoryQuota::new("/var/spool/capture", 500).recursive(true))
//!     .expect("directory should be readable");
//!
//! println!("freed {} MB", outcome.freed_mb());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

/// Directory listing and file deletion backends.
pub mod backend;
/// Parser for the `key=value` configuration format.
pub mod config;
/// The quota enforcer.
pub mod enforcer;
/// Error types for quota operations.
pub mod error;
/// Structured events and sinks.
pub mod events;
/// Quotas, directory entries, and enforcement outcomes.
pub mod types;

pub use backend::{DirectoryLister, DryRunDeleter, FileDeleter, FsBackend};
pub use enforcer::Enforcer;
pub use error::{Error, Result};
pub use events::{Event, EventSink, NoSink, RecordingSink};
pub use types::{
    DirectoryQuota, DirectoryResult, EnforceOptions, EvictionOutcome, FileEntry, Listing, MB,
    OutcomeStatus, RunSummary,
};
