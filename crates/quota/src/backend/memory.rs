//! In-memory filesystem double with failure injection.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::error::{Error, Result};
use crate::types::{FileEntry, Listing};

use super::{DirectoryLister, FileDeleter};

/// Timestamp `secs` seconds after the epoch.
pub fn at(secs: u64) -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(secs)
}

/// Directory tree held in memory; deletions update it.
#[derive(Default)]
pub struct MemoryFs {
    dirs: RefCell<BTreeMap<PathBuf, Listing>>,
    unlistable: HashSet<PathBuf>,
    denied: HashSet<PathBuf>,
    vanished: HashSet<PathBuf>,
    broken: HashSet<PathBuf>,
    attempts: RefCell<Vec<PathBuf>>,
}

impl MemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a directory with the given entries, in listing order.
    pub fn dir(self, path: &str, entries: Vec<FileEntry>) -> Self {
        self.dirs
            .borrow_mut()
            .insert(PathBuf::from(path), Listing::new(entries));
        self
    }

    /// Report `name` in `dir` as unreadable.
    pub fn unreadable(self, dir: &str, name: &str) -> Self {
        if let Some(listing) = self.dirs.borrow_mut().get_mut(Path::new(dir)) {
            listing.unreadable.push((
                OsString::from(name),
                Error::PermissionDenied(Path::new(dir).join(name)),
            ));
        }
        self
    }

    /// Listing `path` fails with permission denied.
    pub fn unlistable(mut self, path: &str) -> Self {
        self.unlistable.insert(PathBuf::from(path));
        self
    }

    /// Deleting `path` fails with permission denied.
    pub fn denied(mut self, path: &str) -> Self {
        self.denied.insert(PathBuf::from(path));
        self
    }

    /// `path` disappears before it can be deleted.
    pub fn vanished(mut self, path: &str) -> Self {
        self.vanished.insert(PathBuf::from(path));
        self
    }

    /// Deleting `path` fails with an unexpected IO error.
    pub fn broken(mut self, path: &str) -> Self {
        self.broken.insert(PathBuf::from(path));
        self
    }

    /// Every delete attempt, in order.
    pub fn attempts(&self) -> Vec<PathBuf> {
        self.attempts.borrow().clone()
    }

    /// Names of the files still present in `dir`.
    pub fn remaining(&self, dir: &str) -> Vec<String> {
        self.dirs
            .borrow()
            .get(Path::new(dir))
            .map(|l| {
                l.entries
                    .iter()
                    .filter(|e| !e.is_dir)
                    .map(|e| e.name.to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl DirectoryLister for MemoryFs {
    fn list(&self, path: &Path) -> Result<Listing> {
        if self.unlistable.contains(path) {
            return Err(Error::PermissionDenied(path.to_path_buf()));
        }
        let dirs = self.dirs.borrow();
        let listing = dirs
            .get(path)
            .ok_or_else(|| Error::NotFound(path.to_path_buf()))?;

        Ok(Listing {
            entries: listing.entries.clone(),
            unreadable: listing
                .unreadable
                .iter()
                .map(|(name, _)| (name.clone(), Error::PermissionDenied(path.join(name))))
                .collect(),
        })
    }
}

impl FileDeleter for MemoryFs {
    fn delete(&self, path: &Path) -> Result<()> {
        self.attempts.borrow_mut().push(path.to_path_buf());

        if self.denied.contains(path) {
            return Err(Error::PermissionDenied(path.to_path_buf()));
        }
        if self.vanished.contains(path) {
            return Err(Error::NotFound(path.to_path_buf()));
        }
        if self.broken.contains(path) {
            return Err(Error::Io {
                path: path.to_path_buf(),
                source: std::io::Error::other("input/output error"),
            });
        }

        let parent = path.parent().unwrap_or(Path::new("/"));
        let name = path.file_name();
        let mut dirs = self.dirs.borrow_mut();
        let listing = dirs
            .get_mut(parent)
            .ok_or_else(|| Error::NotFound(path.to_path_buf()))?;
        let before = listing.entries.len();
        listing
            .entries
            .retain(|e| e.is_dir || Some(e.name.as_os_str()) != name);
        if listing.entries.len() == before {
            return Err(Error::NotFound(path.to_path_buf()));
        }
        Ok(())
    }
}
