use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while listing, deleting, or loading configuration.
///
/// Delete failures are split into two classes: tolerable ones (see
/// [`Error::is_tolerable`]) set the file aside and eviction continues, any
/// other failure stops eviction in the current directory.
#[derive(Debug, Error)]
pub enum Error {
    /// File or directory not found
    #[error("path not found: {0}")]
    NotFound(PathBuf),

    /// Permission denied
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// Path exists but is not a directory
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),

    /// Any other IO failure on a path
    #[error("IO error on {path}: {source}")]
    Io {
        /// Path the operation was applied to
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Config file could not be read
    #[error("could not read config {path}: {source}")]
    ConfigRead {
        /// Path of the config file
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Config file content is malformed
    #[error("invalid config at line {line}: {message}")]
    Config {
        /// 1-based line number
        line: usize,
        /// What is wrong with the line
        message: String,
    },
}

impl Error {
    /// Classify an IO error raised while operating on `path`.
    pub fn from_io(path: &Path, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Error::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => Error::PermissionDenied(path.to_path_buf()),
            std::io::ErrorKind::NotADirectory => Error::NotADirectory(path.to_path_buf()),
            _ => Error::Io {
                path: path.to_path_buf(),
                source: err,
            },
        }
    }

    /// Returns true if a failed delete should skip the file and move on.
    ///
    /// A file that vanished between listing and deletion is treated like a
    /// denied one: it frees nothing but is no reason to stop.
    pub fn is_tolerable(&self) -> bool {
        matches!(self, Error::PermissionDenied(_) | Error::NotFound(_))
    }
}

/// Result type for quota operations
pub type Result<T> = std::result::Result<T, Error>;
