//! Storage Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.
//!
//! TODO: Fold `WriteFailure` and `Io` together once the pipeline stops
//!       needing to tell "the original is untouched" apart from plain I/O.

use cachepress_compress::error::{Error as CompressionError, ErrorKind as CompressionErrorKind};
use derive_more::{Display, Error};
use std::io::Error as IoError;
use std::path::PathBuf;

/// A storage error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for storage operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// File or directory does not exist
    #[display("file not found: {}", _0.display())]
    NotFound(#[error(not(source))] PathBuf),
    /// Access denied
    #[display("permission denied: {}", _0.display())]
    PermissionDenied(#[error(not(source))] PathBuf),
    /// Underlying I/O error
    #[display("I/O error: {_0}")]
    Io(IoError),
    /// Path contains invalid characters or escapes root
    #[display("invalid path: {}", _0.display())]
    InvalidPath(#[error(not(source))] PathBuf),
    /// Compression of a sibling variant failed
    #[display("compression error: {_0}")]
    Compression(CompressionErrorKind),
    /// Another run holds the lock. Stop quietly.
    #[display("lock already held: {}", _0.display())]
    LockHeld(#[error(not(source))] PathBuf),
    /// Replacing a file failed; the original content is still in place.
    #[display("could not write: {}", _0.display())]
    WriteFailure(#[error(not(source))] PathBuf),
}
impl From<IoError> for ErrorKind {
    fn from(err: IoError) -> Self {
        Self::Io(err)
    }
}
impl ErrorKind {
    /// Convert a compression error into a storage error, preserving the
    /// compress crate's `Exn` frame (error tree) as a child in its own
    /// error tree.
    #[track_caller]
    pub fn compression(err: CompressionError) -> Error {
        let inner = (*err).clone();
        err.raise(ErrorKind::Compression(inner))
    }

    pub(crate) fn from_io(err: IoError, path: impl Into<PathBuf>) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::NotFound(path.into()),
            std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied(path.into()),
            _ => ErrorKind::Io(err),
        }
    }
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_) | Self::LockHeld(_) | Self::WriteFailure(_))
    }
}
