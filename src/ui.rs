use colored::Colorize;
use quota::RunSummary;
use std::path::Path;

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a warning message
pub fn warn(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print the one-line outcome of a run. Details live in the log file.
pub fn run_summary(summary: &RunSummary, dry_run: bool, log_path: &Path) {
    let line = summary_line(summary, dry_run);
    if summary.is_success() {
        success(&line);
    } else {
        warn(&format!("{line} (see {})", log_path.display()));
    }
}

fn summary_line(summary: &RunSummary, dry_run: bool) -> String {
    let verb = if dry_run { "Would free" } else { "Freed" };
    let processed = summary.processed();
    let mut line = format!(
        "{verb} {} across {processed} director{}",
        format_size(summary.freed_bytes),
        if processed == 1 { "y" } else { "ies" }
    );
    let failed = summary.failed();
    if failed > 0 {
        line.push_str(&format!(", {failed} with errors"));
    }
    line
}

// ============================================================================
// Size Formatting
// ============================================================================

const KB: u64 = 1024;
const MB: u64 = KB * 1024;
const GB: u64 = MB * 1024;
const TB: u64 = GB * 1024;

/// Format bytes as human-readable size
pub fn format_size(bytes: u64) -> String {
    if bytes >= TB {
        format!("{:.2} TB", bytes as f64 / TB as f64)
    } else if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

// ============================================================================
// Tests
// ============================================================================
