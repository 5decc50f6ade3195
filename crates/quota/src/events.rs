use chrono::{DateTime, Local};
use serde::Serialize;
use std::cell::RefCell;
use std::path::PathBuf;

use crate::types::{MB, OutcomeStatus, lossy_path};

/// Structured progress and error events emitted during enforcement.
///
/// The enforcer never formats log text; sinks decide how to render these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    /// A run over the configured directories started
    RunStarted {
        /// Local start time
        at: DateTime<Local>,
        /// Number of configured directories
        directories: usize,
    },
    /// A directory was listed and its size measured
    DirectoryStarted {
        /// Directory being enforced
        #[serde(serialize_with = "lossy_path")]
        path: PathBuf,
        /// Sum of the sizes of its files
        total_bytes: u64,
        /// Enforced limit
        limit_bytes: u64,
        /// Number of files eligible for eviction
        candidates: usize,
    },
    /// A directory could not be listed and was skipped
    ListFailed {
        /// Directory that could not be listed
        #[serde(serialize_with = "lossy_path")]
        path: PathBuf,
        /// Reason
        error: String,
    },
    /// Metadata of one entry could not be read; the entry is ignored
    StatFailed {
        /// Entry that could not be inspected
        #[serde(serialize_with = "lossy_path")]
        path: PathBuf,
        /// Reason
        error: String,
    },
    /// A file was deleted
    FileDeleted {
        /// Deleted file
        #[serde(serialize_with = "lossy_path")]
        path: PathBuf,
        /// Size recorded at listing time
        size_bytes: u64,
    },
    /// A file could not be deleted (permission denied or already gone) and was skipped
    DeleteDenied {
        /// File that was skipped
        #[serde(serialize_with = "lossy_path")]
        path: PathBuf,
        /// Reason
        error: String,
    },
    /// An unexpected delete failure stopped eviction in the directory
    DeleteFailed {
        /// File whose deletion failed
        #[serde(serialize_with = "lossy_path")]
        path: PathBuf,
        /// Reason
        error: String,
    },
    /// Too many consecutive skipped files; eviction in the directory stopped
    DenialLimitReached {
        /// Directory where eviction stopped
        #[serde(serialize_with = "lossy_path")]
        path: PathBuf,
        /// Consecutive skipped files
        denials: u32,
    },
    /// Enforcement of one directory finished
    DirectorySummary {
        /// Directory that was enforced
        #[serde(serialize_with = "lossy_path")]
        path: PathBuf,
        /// Bytes freed in this directory (subdirectories excluded)
        freed_bytes: u64,
        /// Size of the directory's files after eviction
        final_size_bytes: u64,
        /// Enforced limit
        limit_bytes: u64,
        /// How enforcement ended
        status: OutcomeStatus,
    },
    /// All configured directories were processed
    RunFinished {
        /// Directories visited, subdirectories included
        directories: usize,
        /// Directories that failed to list or aborted
        failed: usize,
        /// Total bytes freed
        freed_bytes: u64,
    },
}

impl Event {
    /// Freed bytes in whole megabytes for summary events.
    pub fn freed_mb(&self) -> Option<u64> {
        match self {
            Self::DirectorySummary { freed_bytes, .. } | Self::RunFinished { freed_bytes, .. } => {
                Some(freed_bytes / MB)
            }
            _ => None,
        }
    }

}

/// Receiver for enforcement events.
pub trait EventSink {
    /// Called once per state transition.
    fn emit(&self, event: &Event);
}

/// Sink that discards every event.
pub struct NoSink;

impl EventSink for NoSink {
    fn emit(&self, _event: &Event) {}
}

/// Sink that keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: RefCell<Vec<Event>>,
}

impl RecordingSink {
    /// Create an empty recording sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events recorded so far
    pub fn events(&self) -> Vec<Event> {
        self.events.borrow().clone()
    }

    /// Consume the sink and return its events
    pub fn into_events(self) -> Vec<Event> {
        self.events.into_inner()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: &Event) {
        self.events.borrow_mut().push(event.clone());
    }
}

impl<S: EventSink + ?Sized> EventSink for &S {
    fn emit(&self, event: &Event) {
        (**self).emit(event);
    }
}
