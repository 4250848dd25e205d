//! Error types for storage operations.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A read kept failing after every retry.
    #[error("failed to read {path:?} after {attempts} attempts: {source}")]
    ReadFailed {
        /// The file being read.
        path: PathBuf,
        /// How many attempts were made.
        attempts: u32,
        /// The error from the last attempt.
        #[source]
        source: io::Error,
    },

    /// The file was read but is not valid UTF-8.
    #[error("{path:?} is not valid UTF-8: {source}")]
    NotText {
        /// The file being read.
        path: PathBuf,
        /// The decoding failure.
        #[source]
        source: std::string::FromUtf8Error,
    },

    /// An atomic rewrite failed. The previous content has been restored.
    #[error("failed to write {path:?}: {source}")]
    WriteFailed {
        /// The file being written.
        path: PathBuf,
        /// The underlying failure.
        #[source]
        source: io::Error,
    },

    /// Restoring a file from a backup copy failed.
    #[error("failed to restore {path:?} from backup: {source}")]
    RestoreFailed {
        /// The file being restored.
        path: PathBuf,
        /// The underlying failure.
        #[source]
        source: io::Error,
    },
}
