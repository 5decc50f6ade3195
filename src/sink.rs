use log::Level;
use quota::{Event, EventSink, OutcomeStatus};

use crate::ui::format_size;

/// Renders enforcement events as log lines.
pub struct LogSink {
    dry_run: bool,
}

impl LogSink {
    pub fn new(dry_run: bool) -> Self {
        Self { dry_run }
    }

    /// Level and message for one event.
    pub fn render(&self, event: &Event) -> (Level, String) {
        match event {
            Event::RunStarted { at, directories } => (
                Level::Info,
                format!(
                    "Run started at {} with {} configured director{}{}",
                    at.format("%Y-%m-%d %H:%M:%S"),
                    directories,
                    if *directories == 1 { "y" } else { "ies" },
                    if self.dry_run { " (dry run)" } else { "" }
                ),
            ),
            Event::DirectoryStarted {
                path,
                total_bytes,
                limit_bytes,
                candidates,
            } => (
                Level::Debug,
                format!(
                    "Checking {}: {} in {} files, limit {}",
                    path.display(),
                    format_size(*total_bytes),
                    candidates,
                    format_size(*limit_bytes)
                ),
            ),
            Event::ListFailed { path, error } => (
                Level::Error,
                format!("Could not read directory {}: {}", path.display(), error),
            ),
            Event::StatFailed { path, error } => (
                Level::Warn,
                format!("Could not read file info for {}: {}", path.display(), error),
            ),
            Event::FileDeleted { path, size_bytes } => (
                Level::Info,
                format!(
                    "{} {} ({})",
                    if self.dry_run { "Would delete" } else { "Deleted" },
                    path.display(),
                    format_size(*size_bytes)
                ),
            ),
            Event::DeleteDenied { path, error } => (
                Level::Warn,
                format!("Skipping {}: {}", path.display(), error),
            ),
            Event::DeleteFailed { path, error } => (
                Level::Error,
                format!(
                    "Could not delete {}: {}; stopping in this directory",
                    path.display(),
                    error
                ),
            ),
            Event::DenialLimitReached { path, denials } => (
                Level::Warn,
                format!(
                    "{} files in a row could not be deleted in {}; moving on",
                    denials,
                    path.display()
                ),
            ),
            Event::DirectorySummary {
                path,
                final_size_bytes,
                limit_bytes,
                status,
                ..
            } => {
                let level = match status {
                    OutcomeStatus::Completed => Level::Info,
                    OutcomeStatus::UnderFreed | OutcomeStatus::Aborted => Level::Warn,
                };
                let note = match status {
                    OutcomeStatus::Completed => String::new(),
                    OutcomeStatus::UnderFreed => format!(
                        "; still over quota ({} > {})",
                        format_size(*final_size_bytes),
                        format_size(*limit_bytes)
                    ),
                    OutcomeStatus::Aborted => "; stopped after an error".to_string(),
                };
                (
                    level,
                    format!(
                        "{} {} MB in directory {}{}",
                        if self.dry_run { "Would free" } else { "Freed" },
                        event.freed_mb().unwrap_or_default(),
                        path.display(),
                        note
                    ),
                )
            }
            Event::RunFinished {
                directories,
                failed,
                ..
            } => (
                Level::Info,
                format!(
                    "Run finished: {} directories, {} with errors, {} MB freed",
                    directories,
                    failed,
                    event.freed_mb().unwrap_or_default()
                ),
            ),
        }
    }
}

impl EventSink for LogSink {
    fn emit(&self, event: &Event) {
        let (level, message) = self.render(event);
        log::log!(level, "{message}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quota::MB;
    use std::path::PathBuf;

    #[test]
    fn test_summary_reports_whole_megabytes() {
        let sink = LogSink::new(false);
        let (level, message) = sink.render(&Event::DirectorySummary {
            path: PathBuf::from("/data"),
            freed_bytes: 40 * MB + MB / 2,
            final_size_bytes: 50 * MB,
            limit_bytes: 50 * MB,
            status: OutcomeStatus::Completed,
        });
        assert_eq!(level, Level::Info);
        assert_eq!(message, "Freed 40 MB in directory /data");
    }

    #[test]
    fn test_under_freed_summary_is_a_warning() {
        let sink = LogSink::new(false);
        let (level, message) = sink.render(&Event::DirectorySummary {
            path: PathBuf::from("/data"),
            freed_bytes: 0,
            final_size_bytes: 60 * MB,
            limit_bytes: 10 * MB,
            status: OutcomeStatus::UnderFreed,
        });
        assert_eq!(level, Level::Warn);
        assert!(message.contains("still over quota (60.0 MB > 10.0 MB)"));
    }

    #[test]
    fn test_error_levels() {
        let sink = LogSink::new(false);
        let list = Event::ListFailed {
            path: PathBuf::from("/locked"),
            error: "permission denied: /locked".to_string(),
        };
        assert_eq!(sink.render(&list).0, Level::Error);

        let denied = Event::DeleteDenied {
            path: PathBuf::from("/data/f"),
            error: "permission denied: /data/f".to_string(),
        };
        assert_eq!(sink.render(&denied).0, Level::Warn);

        let failed = Event::DeleteFailed {
            path: PathBuf::from("/data/f"),
            error: "IO error".to_string(),
        };
        let (level, message) = sink.render(&failed);
        assert_eq!(level, Level::Error);
        assert!(message.contains("stopping in this directory"));
    }

    #[test]
    fn test_dry_run_wording() {
        let sink = LogSink::new(true);
        let (_, message) = sink.render(&Event::FileDeleted {
            path: PathBuf::from("/data/old.log"),
            size_bytes: 2048,
        });
        assert_eq!(message, "Would delete /data/old.log (2.0 KB)");
    }

    #[test]
    fn test_run_finished_reports_whole_megabytes() {
        let sink = LogSink::new(false);
        let (level, message) = sink.render(&Event::RunFinished {
            directories: 3,
            failed: 1,
            freed_bytes: 2 * MB - 1,
        });
        assert_eq!(level, Level::Info);
        assert_eq!(message, "Run finished: 3 directories, 1 with errors, 1 MB freed");
    }
}
