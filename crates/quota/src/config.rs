//! Parser for the `key=value` quota configuration format.
//!
//! ```text
//! # spool is trimmed to 500 MB, subdirectories included
//! directory_path=/var/spool/capture
//! max_directory_size=500
//! recursive=true
//!
//! directory_path=~/Downloads
//! max_directory_size=2048
//! ```
//!
//! A `directory_path` line opens a block that runs until the next
//! `directory_path` line or the end of input. Every block must set
//! `max_directory_size`; `recursive` is optional and defaults to false.
//! Blank lines, `#` comments, lines without `=` and unknown keys are ignored.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::types::DirectoryQuota;

const DIRECTORY_PATH: &str = "directory_path";
const MAX_DIRECTORY_SIZE: &str = "max_directory_size";
const RECURSIVE: &str = "recursive";

/// Load quotas from a config file.
pub fn load(path: &Path) -> Result<Vec<DirectoryQuota>> {
    let content = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;
    parse_str(&content)
}

/// Parse quotas from config text, in file order.
pub fn parse_str(content: &str) -> Result<Vec<DirectoryQuota>> {
    let mut quotas = Vec::new();
    let mut block: Option<Block> = None;

    for (idx, line) in content.lines().enumerate() {
        let line_num = idx + 1;
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let (key, value) = (key.trim(), value.trim());

        match key {
            DIRECTORY_PATH => {
                if let Some(done) = block.take() {
                    quotas.push(done.finish()?);
                }
                if value.is_empty() {
                    return Err(config_error(line_num, "directory_path is empty"));
                }
                block = Some(Block::new(expand_path(value), line_num));
            }
            MAX_DIRECTORY_SIZE => {
                let current = open_block(&mut block, key, line_num)?;
                if current.max_size_mb.is_some() {
                    return Err(duplicate_key(key, line_num));
                }
                current.max_size_mb = Some(parse_size(value, line_num)?);
            }
            RECURSIVE => {
                let current = open_block(&mut block, key, line_num)?;
                if current.recursive.is_some() {
                    return Err(duplicate_key(key, line_num));
                }
                current.recursive = Some(parse_bool(value, line_num)?);
            }
            _ => {}
        }
    }

    if let Some(done) = block {
        quotas.push(done.finish()?);
    }

    Ok(quotas)
}

/// One `directory_path` block being assembled.
struct Block {
    path: PathBuf,
    line: usize,
    max_size_mb: Option<u64>,
    recursive: Option<bool>,
}

impl Block {
    fn new(path: PathBuf, line: usize) -> Self {
        Self {
            path,
            line,
            max_size_mb: None,
            recursive: None,
        }
    }

    fn finish(self) -> Result<DirectoryQuota> {
        let max_size_mb = self.max_size_mb.ok_or_else(|| {
            config_error(
                self.line,
                &format!(
                    "directory_path {} has no max_directory_size",
                    self.path.display()
                ),
            )
        })?;

        Ok(DirectoryQuota {
            path: self.path,
            max_size_mb,
            recursive: self.recursive.unwrap_or(false),
        })
    }
}

fn open_block<'a>(block: &'a mut Option<Block>, key: &str, line: usize) -> Result<&'a mut Block> {
    block
        .as_mut()
        .ok_or_else(|| config_error(line, &format!("{key} appears before any directory_path")))
}

fn parse_size(value: &str, line: usize) -> Result<u64> {
    value.parse().map_err(|_| {
        config_error(
            line,
            &format!("invalid max_directory_size '{value}': expected a whole number of megabytes"),
        )
    })
}

fn parse_bool(value: &str, line: usize) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(config_error(
            line,
            &format!("invalid recursive '{value}': expected true or false"),
        )),
    }
}

/// Expand a leading `~` to the home directory.
fn expand_path(value: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(value).as_ref())
}

fn duplicate_key(key: &str, line: usize) -> Error {
    config_error(line, &format!("{key} is set twice for the same directory"))
}

fn config_error(line: usize, message: &str) -> Error {
    Error::Config {
        line,
        message: message.to_string(),
    }
}
