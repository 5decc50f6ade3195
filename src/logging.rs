//! Log file setup.
//!
//! All run output goes through the `log` facade into an append-only file;
//! nothing per-file is printed to the terminal.

use anyhow::{Context, Result};
use chrono::Local;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

/// Map `-v` occurrences to a level filter. The log file records info by default.
pub fn level_for(verbose: u8) -> log::LevelFilter {
    match verbose {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    }
}

/// Open `path` for appending, creating it if needed.
pub fn open_log(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Could not open log file {}", path.display()))
}

/// Route the global logger into the log file at `path`.
pub fn init(path: &Path, verbose: u8) -> Result<()> {
    let file = open_log(path)?;

    env_logger::Builder::new()
        .filter_level(level_for(verbose))
        .write_style(env_logger::WriteStyle::Never)
        .format(|buf, record| {
            writeln!(
                buf,
                "{} {:<5} {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(file)))
        .try_init()
        .context("Could not initialize logging")
}
