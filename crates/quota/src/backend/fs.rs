//! std::fs backend.
//!
//! Entries are inspected without following symlinks: a symlink is listed as
//! a file of its own (link) size and deleting it removes only the link, so
//! recursive enforcement never escapes the configured tree.

use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::types::{FileEntry, Listing};

use super::{DirectoryLister, FileDeleter};

/// Lister and deleter backed by the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsBackend;

impl FsBackend {
    /// Create a new filesystem backend
    pub fn new() -> Self {
        Self
    }

    fn read_entry(entry: &fs::DirEntry) -> Result<FileEntry> {
        let path = entry.path();

        // DirEntry::metadata does not traverse symlinks
        let metadata = entry.metadata().map_err(|e| Error::from_io(&path, e))?;
        let modified_at = metadata.modified().map_err(|e| Error::from_io(&path, e))?;

        Ok(FileEntry {
            name: entry.file_name(),
            size_bytes: if metadata.is_dir() { 0 } else { metadata.len() },
            modified_at,
            is_dir: metadata.is_dir(),
        })
    }
}

impl DirectoryLister for FsBackend {
    fn list(&self, path: &Path) -> Result<Listing> {
        let read_dir = fs::read_dir(path).map_err(|e| Error::from_io(path, e))?;

        let mut listing = Listing::default();
        for entry in read_dir {
            let entry = entry.map_err(|e| Error::from_io(path, e))?;
            match Self::read_entry(&entry) {
                Ok(file) => listing.entries.push(file),
                Err(e) => listing.unreadable.push((entry.file_name(), e)),
            }
        }

        // read_dir order is filesystem dependent
        listing.entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(listing)
    }
}

impl FileDeleter for FsBackend {
    fn delete(&self, path: &Path) -> Result<()> {
        fs::remove_file(path).map_err(|e| Error::from_io(path, e))
    }
}
