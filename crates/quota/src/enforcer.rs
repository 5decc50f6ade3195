//! Quota enforcement: size accounting and oldest-first eviction.

use chrono::Local;
use std::collections::{BTreeSet, VecDeque};

use crate::backend::{DirectoryLister, FileDeleter};
use crate::error::Result;
use crate::events::{Event, EventSink};
use crate::types::{
    DirectoryQuota, DirectoryResult, EnforceOptions, EvictionOutcome, FileEntry, OutcomeStatus,
    RunSummary,
};

/// Working set for one directory: files not yet deleted or skipped, oldest
/// first, and the running size of the directory's files.
///
/// `total_bytes` starts as the sum of listed file sizes and drops by the
/// listing-time size of each successfully deleted file, exactly once.
#[derive(Debug)]
pub(crate) struct DirectoryState {
    candidates: VecDeque<FileEntry>,
    total_bytes: u64,
}

impl DirectoryState {
    pub(crate) fn new(entries: &[FileEntry]) -> Self {
        let mut files: Vec<FileEntry> = entries.iter().filter(|e| !e.is_dir).cloned().collect();
        // Stable: equal mtimes keep listing order
        files.sort_by_key(|e| e.modified_at);

        let total_bytes = files
            .iter()
            .fold(0u64, |acc, e| acc.saturating_add(e.size_bytes));

        Self {
            candidates: files.into(),
            total_bytes,
        }
    }

    pub(crate) fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    pub(crate) fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Take the oldest remaining candidate out of the working set.
    pub(crate) fn next_oldest(&mut self) -> Option<FileEntry> {
        self.candidates.pop_front()
    }

    pub(crate) fn record_deleted(&mut self, entry: &FileEntry) {
        self.total_bytes = self.total_bytes.saturating_sub(entry.size_bytes);
    }
}

/// Enforces directory quotas using a lister, a deleter, and an event sink.
///
/// Each directory is handled in isolation: a failure in one directory is
/// reported through the sink and never affects siblings or subdirectories.
pub struct Enforcer<L, D, S> {
    lister: L,
    deleter: D,
    sink: S,
    options: EnforceOptions,
}

impl<L, D, S> Enforcer<L, D, S>
where
    L: DirectoryLister,
    D: FileDeleter,
    S: EventSink,
{
    /// Create an enforcer with default options.
    pub fn new(lister: L, deleter: D, sink: S) -> Self {
        Self {
            lister,
            deleter,
            sink,
            options: EnforceOptions::default(),
        }
    }

    /// Replace the enforcement options.
    pub fn with_options(mut self, options: EnforceOptions) -> Self {
        self.options = options;
        self
    }

    /// Enforce every quota in order and summarize the run.
    ///
    /// Each configured directory, including its subtree when recursive, is
    /// fully processed before the next one starts.
    pub fn run(&self, quotas: &[DirectoryQuota]) -> RunSummary {
        self.sink.emit(&Event::RunStarted {
            at: Local::now(),
            directories: quotas.len(),
        });

        let mut summary = RunSummary::default();
        for quota in quotas {
            summary.add(self.enforce_directory(quota));
        }

        self.sink.emit(&Event::RunFinished {
            directories: summary.processed(),
            failed: summary.failed(),
            freed_bytes: summary.freed_bytes,
        });
        summary
    }

    /// Enforce `quota` on one directory and, if recursive, its subdirectories.
    ///
    /// Fails only when the directory itself cannot be listed; that failure
    /// is emitted as [`Event::ListFailed`] and nothing is deleted.
    pub fn enforce(&self, quota: &DirectoryQuota) -> Result<EvictionOutcome> {
        let listing = match self.lister.list(&quota.path) {
            Ok(listing) => listing,
            Err(e) => {
                self.sink.emit(&Event::ListFailed {
                    path: quota.path.clone(),
                    error: e.to_string(),
                });
                return Err(e);
            }
        };

        for (name, err) in &listing.unreadable {
            self.sink.emit(&Event::StatFailed {
                path: quota.path.join(name),
                error: err.to_string(),
            });
        }

        let limit_bytes = quota.limit_bytes();
        let mut state = DirectoryState::new(&listing.entries);
        let initial_size_bytes = state.total_bytes();

        self.sink.emit(&Event::DirectoryStarted {
            path: quota.path.clone(),
            total_bytes: initial_size_bytes,
            limit_bytes,
            candidates: state.len(),
        });

        let mut outcome = EvictionOutcome {
            path: quota.path.clone(),
            limit_bytes,
            initial_size_bytes,
            freed_bytes: 0,
            final_size_bytes: initial_size_bytes,
            deleted_files: Vec::new(),
            skipped_files: BTreeSet::new(),
            status: OutcomeStatus::Completed,
            subdirectories: Vec::new(),
        };

        let aborted = self.evict(quota, &mut state, &mut outcome);

        outcome.final_size_bytes = state.total_bytes();
        outcome.status = if aborted {
            OutcomeStatus::Aborted
        } else if outcome.is_within_quota() {
            OutcomeStatus::Completed
        } else {
            OutcomeStatus::UnderFreed
        };

        self.sink.emit(&Event::DirectorySummary {
            path: quota.path.clone(),
            freed_bytes: outcome.freed_bytes,
            final_size_bytes: outcome.final_size_bytes,
            limit_bytes,
            status: outcome.status,
        });

        if quota.recursive {
            for entry in listing.entries.iter().filter(|e| e.is_dir) {
                let child = quota.child(&entry.name);
                outcome.subdirectories.push(self.enforce_directory(&child));
            }
        }

        Ok(outcome)
    }

    fn enforce_directory(&self, quota: &DirectoryQuota) -> DirectoryResult {
        match self.enforce(quota) {
            Ok(outcome) => DirectoryResult::Enforced(outcome),
            Err(e) => DirectoryResult::ListFailed {
                path: quota.path.clone(),
                error: e.to_string(),
            },
        }
    }

    /// Delete oldest candidates until the directory fits its limit.
    ///
    /// Returns true if an unexpected delete failure stopped eviction.
    fn evict(
        &self,
        quota: &DirectoryQuota,
        state: &mut DirectoryState,
        outcome: &mut EvictionOutcome,
    ) -> bool {
        let mut consecutive_denials = 0u32;

        while state.total_bytes() > outcome.limit_bytes {
            // Every candidate is attempted at most once, so this terminates
            let Some(entry) = state.next_oldest() else {
                break;
            };
            let path = quota.path.join(&entry.name);

            match self.deleter.delete(&path) {
                Ok(()) => {
                    state.record_deleted(&entry);
                    outcome.freed_bytes += entry.size_bytes;
                    consecutive_denials = 0;
                    self.sink.emit(&Event::FileDeleted {
                        path,
                        size_bytes: entry.size_bytes,
                    });
                    outcome.deleted_files.push(entry.name);
                }
                Err(e) if e.is_tolerable() => {
                    consecutive_denials += 1;
                    self.sink.emit(&Event::DeleteDenied {
                        path,
                        error: e.to_string(),
                    });
                    outcome.skipped_files.insert(entry.name);

                    if let Some(max) = self.options.max_consecutive_denials
                        && consecutive_denials >= max
                    {
                        self.sink.emit(&Event::DenialLimitReached {
                            path: quota.path.clone(),
                            denials: consecutive_denials,
                        });
                        break;
                    }
                }
                Err(e) => {
                    self.sink.emit(&Event::DeleteFailed {
                        path,
                        error: e.to_string(),
                    });
                    return true;
                }
            }
        }

        false
    }
}
