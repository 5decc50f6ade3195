use std::path::Path;

use crate::error::Result;
use crate::types::Listing;

pub mod fs;
#[cfg(test)]
pub(crate) mod memory;

/// Lists the immediate entries of a directory.
///
/// This trait abstracts the filesystem so the enforcer can run against
/// std::fs in production and against in-memory doubles in tests.
pub trait DirectoryLister {
    /// List the immediate entries of `path`.
    ///
    /// Fails with `NotFound`, `PermissionDenied`, `NotADirectory` or `Io`
    /// when the directory itself cannot be read. Entries whose metadata
    /// cannot be read are reported in [`Listing::unreadable`].
    fn list(&self, path: &Path) -> Result<Listing>;
}

/// Removes single files.
pub trait FileDeleter {
    /// Remove the file at `path`.
    ///
    /// `PermissionDenied` and `NotFound` are tolerated by the enforcer;
    /// any other error stops eviction in the current directory.
    fn delete(&self, path: &Path) -> Result<()>;
}

/// Deleter that reports success without touching anything.
pub struct DryRunDeleter;

impl FileDeleter for DryRunDeleter {
    fn delete(&self, _path: &Path) -> Result<()> {
        Ok(())
    }
}

impl<L: DirectoryLister + ?Sized> DirectoryLister for &L {
    fn list(&self, path: &Path) -> Result<Listing> {
        (**self).list(path)
    }
}

impl<D: FileDeleter + ?Sized> FileDeleter for &D {
    fn delete(&self, path: &Path) -> Result<()> {
        (**self).delete(path)
    }
}

pub use fs::FsBackend;
