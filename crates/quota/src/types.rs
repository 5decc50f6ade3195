use serde::{Serialize, Serializer};
use std::collections::BTreeSet;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::error::Error;

/// Bytes per megabyte as used by quota sizes (binary megabytes).
pub const MB: u64 = 1024 * 1024;

/// Quota configuration for one directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryQuota {
    /// Directory to enforce
    pub path: PathBuf,
    /// Maximum allowed size of the directory's own files, in megabytes
    pub max_size_mb: u64,
    /// Also enforce the same quota on every subdirectory
    pub recursive: bool,
}

impl DirectoryQuota {
    /// Create a non-recursive quota
    pub fn new(path: impl Into<PathBuf>, max_size_mb: u64) -> Self {
        Self {
            path: path.into(),
            max_size_mb,
            recursive: false,
        }
    }

    /// Set the recursive flag
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Quota limit in bytes.
    pub fn limit_bytes(&self) -> u64 {
        self.max_size_mb.saturating_mul(MB)
    }

    /// Quota for the subdirectory `name`, inheriting size and recursion.
    pub fn child(&self, name: &OsStr) -> Self {
        Self {
            path: self.path.join(name),
            max_size_mb: self.max_size_mb,
            recursive: self.recursive,
        }
    }
}

/// Snapshot of one directory entry, taken at listing time.
///
/// The snapshot may go stale at any moment: another process can modify or
/// remove the file before it is evicted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// File name relative to the listed directory, exactly as the OS
    /// reports it
    pub name: OsString,
    /// Size in bytes at listing time
    pub size_bytes: u64,
    /// Last modification time at listing time
    pub modified_at: SystemTime,
    /// Whether this entry is a directory
    pub is_dir: bool,
}

impl FileEntry {
    /// Create a regular file entry
    pub fn file(name: impl Into<OsString>, size_bytes: u64, modified_at: SystemTime) -> Self {
        Self {
            name: name.into(),
            size_bytes,
            modified_at,
            is_dir: false,
        }
    }

    /// Create a directory entry
    pub fn dir(name: impl Into<OsString>, modified_at: SystemTime) -> Self {
        Self {
            name: name.into(),
            size_bytes: 0,
            modified_at,
            is_dir: true,
        }
    }
}

/// Immediate contents of a directory as returned by a lister.
#[derive(Debug, Default)]
pub struct Listing {
    /// Entries whose metadata could be read, in listing order
    pub entries: Vec<FileEntry>,
    /// Entries whose metadata could not be read, with the reason
    pub unreadable: Vec<(OsString, Error)>,
}

impl Listing {
    /// Create a listing from readable entries only
    pub fn new(entries: Vec<FileEntry>) -> Self {
        Self {
            entries,
            unreadable: Vec::new(),
        }
    }
}

/// Tuning knobs for an enforcement run.
#[derive(Debug, Clone, Default)]
pub struct EnforceOptions {
    /// Stop evicting in a directory after this many consecutive tolerated
    /// delete failures. `None` tries every candidate once.
    pub max_consecutive_denials: Option<u32>,
}

/// How enforcement of a single directory ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    /// The directory is at or under its limit
    Completed,
    /// Candidates ran out (or the denial limit was hit) while still over the limit
    UnderFreed,
    /// An unexpected delete failure stopped eviction in this directory
    Aborted,
}

/// Result of enforcing the quota on one directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvictionOutcome {
    /// Directory that was enforced
    #[serde(serialize_with = "lossy_path")]
    pub path: PathBuf,
    /// Limit that was enforced, in bytes
    pub limit_bytes: u64,
    /// Size of the directory's files before eviction
    pub initial_size_bytes: u64,
    /// Bytes freed by successful deletions
    pub freed_bytes: u64,
    /// Size of the directory's files after eviction
    pub final_size_bytes: u64,
    /// Names of deleted files, in deletion order
    #[serde(serialize_with = "lossy_names")]
    pub deleted_files: Vec<OsString>,
    /// Names of files set aside after a tolerated delete failure
    #[serde(serialize_with = "lossy_names")]
    pub skipped_files: BTreeSet<OsString>,
    /// How enforcement ended
    pub status: OutcomeStatus,
    /// Results for subdirectories (recursive quotas only)
    pub subdirectories: Vec<DirectoryResult>,
}

impl EvictionOutcome {
    /// Freed space in whole megabytes (rounded down).
    pub fn freed_mb(&self) -> u64 {
        self.freed_bytes / MB
    }

    /// Whether the directory ended at or under its limit.
    pub fn is_within_quota(&self) -> bool {
        self.final_size_bytes <= self.limit_bytes
    }

    /// Bytes freed in this directory and all enforced subdirectories.
    pub fn tree_freed_bytes(&self) -> u64 {
        self.freed_bytes
            + self
                .subdirectories
                .iter()
                .map(DirectoryResult::freed_bytes)
                .sum::<u64>()
    }
}

/// Outcome for one directory of a run: enforced, or skipped because its
/// listing failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum DirectoryResult {
    /// The directory was listed and enforced
    Enforced(EvictionOutcome),
    /// The directory could not be listed and was skipped
    ListFailed {
        /// Directory that could not be listed
        #[serde(serialize_with = "lossy_path")]
        path: PathBuf,
        /// Why listing failed
        error: String,
    },
}

impl DirectoryResult {
    /// Bytes freed in this directory and its subtree
    pub fn freed_bytes(&self) -> u64 {
        match self {
            Self::Enforced(outcome) => outcome.tree_freed_bytes(),
            Self::ListFailed { .. } => 0,
        }
    }

    /// Number of directories in this subtree that were visited
    pub fn directories(&self) -> usize {
        match self {
            Self::Enforced(outcome) => {
                1 + outcome
                    .subdirectories
                    .iter()
                    .map(DirectoryResult::directories)
                    .sum::<usize>()
            }
            Self::ListFailed { .. } => 1,
        }
    }

    /// Number of directories in this subtree that failed to list or aborted
    pub fn failures(&self) -> usize {
        match self {
            Self::Enforced(outcome) => {
                usize::from(outcome.status == OutcomeStatus::Aborted)
                    + outcome
                        .subdirectories
                        .iter()
                        .map(DirectoryResult::failures)
                        .sum::<usize>()
            }
            Self::ListFailed { .. } => 1,
        }
    }
}

/// Summary of a whole run over all configured directories.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// One result per configured directory, in configuration order
    pub directories: Vec<DirectoryResult>,
    /// Total bytes freed across every directory and subtree
    pub freed_bytes: u64,
}

impl RunSummary {
    /// Record the result of one configured directory
    pub fn add(&mut self, result: DirectoryResult) {
        self.freed_bytes += result.freed_bytes();
        self.directories.push(result);
    }

    /// Directories visited, subdirectories included
    pub fn processed(&self) -> usize {
        self.directories.iter().map(DirectoryResult::directories).sum()
    }

    /// Directories that failed to list or aborted, subdirectories included
    pub fn failed(&self) -> usize {
        self.directories.iter().map(DirectoryResult::failures).sum()
    }

    /// Check if every directory was enforced without errors
    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }
}

/// Serialize a path as text, replacing invalid UTF-8 with U+FFFD.
pub(crate) fn lossy_path<S: Serializer>(path: &Path, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&path.to_string_lossy())
}

/// Serialize file names as a sequence of lossy strings.
fn lossy_names<'a, I, S>(names: I, serializer: S) -> Result<S::Ok, S::Error>
where
    I: IntoIterator<Item = &'a OsString>,
    S: Serializer,
{
    serializer.collect_seq(names.into_iter().map(|name| name.to_string_lossy()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(path: &str, freed: u64, status: OutcomeStatus) -> EvictionOutcome {
        EvictionOutcome {
            path: PathBuf::from(path),
            limit_bytes: 10 * MB,
            initial_size_bytes: 10 * MB + freed,
            freed_bytes: freed,
            final_size_bytes: 10 * MB,
            deleted_files: Vec::new(),
            skipped_files: BTreeSet::new(),
            status,
            subdirectories: Vec::new(),
        }
    }

    #[test]
    fn test_limit_bytes() {
        assert_eq!(DirectoryQuota::new("/tmp", 50).limit_bytes(), 50 * MB);
        assert_eq!(DirectoryQuota::new("/tmp", 0).limit_bytes(), 0);
        assert_eq!(DirectoryQuota::new("/tmp", u64::MAX).limit_bytes(), u64::MAX);
    }

    #[test]
    fn test_child_inherits_quota() {
        let parent = DirectoryQuota::new("/var/spool", 20).recursive(true);
        let child = parent.child(OsStr::new("incoming"));
        assert_eq!(child.path, PathBuf::from("/var/spool/incoming"));
        assert_eq!(child.max_size_mb, 20);
        assert!(child.recursive);
    }

    #[test]
    fn test_freed_mb_rounds_down() {
        let mut o = outcome("/a", 3 * MB - 1, OutcomeStatus::Completed);
        assert_eq!(o.freed_mb(), 2);
        o.freed_bytes = 3 * MB;
        assert_eq!(o.freed_mb(), 3);
    }

    #[test]
    fn test_run_summary_counts_subtrees() {
        let mut parent = outcome("/a", 5 * MB, OutcomeStatus::Completed);
        parent.subdirectories.push(DirectoryResult::Enforced(outcome(
            "/a/b",
            2 * MB,
            OutcomeStatus::Aborted,
        )));
        parent.subdirectories.push(DirectoryResult::ListFailed {
            path: PathBuf::from("/a/c"),
            error: "permission denied".to_string(),
        });

        let mut summary = RunSummary::default();
        summary.add(DirectoryResult::Enforced(parent));
        summary.add(DirectoryResult::Enforced(outcome(
            "/d",
            MB,
            OutcomeStatus::UnderFreed,
        )));

        assert_eq!(summary.freed_bytes, 8 * MB);
        assert_eq!(summary.processed(), 4);
        assert_eq!(summary.failed(), 2);
        assert!(!summary.is_success());
    }

    #[cfg(unix)]
    #[test]
    fn test_outcome_serializes_non_utf8_names_lossily() {
        use std::os::unix::ffi::OsStrExt;

        let mut o = outcome("/a", MB, OutcomeStatus::Completed);
        o.path = PathBuf::from(OsStr::from_bytes(b"/a/sub\xfe"));
        o.deleted_files
            .push(OsStr::from_bytes(b"capture-\xff.pcap").to_os_string());
        o.skipped_files.insert(OsString::from("locked"));

        let json = serde_json::to_value(&o).unwrap();
        assert_eq!(json["path"], "/a/sub\u{fffd}");
        assert_eq!(json["deleted_files"][0], "capture-\u{fffd}.pcap");
        assert_eq!(json["skipped_files"][0], "locked");
    }
}
