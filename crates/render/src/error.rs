//! Render Error Types
//!
//! Everything that can go wrong while driving an external command. The
//! pipeline treats all of them as "no result for this page" and moves on.

use derive_more::{Display, Error};
use std::time::Duration;

/// A render or purge error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for render and purge operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The configured program is not on `PATH`. Fix the configuration.
    #[display("command not found: {_0}")]
    CommandNotFound(#[error(not(source))] String),
    /// The command was killed after running past its timeout.
    #[display("command timed out after {_0:?}")]
    Timeout(#[error(not(source))] Duration),
    /// The command exited with a non-zero exit code, or was killed by a signal (-1).
    #[display("command exited with code: {_0}")]
    Failed(#[error(not(source))] i32),
    /// The command succeeded but printed nothing.
    #[display("command produced no output")]
    EmptyOutput,
    Io,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // A busy machine is the usual reason for a timeout.
        matches!(self, ErrorKind::Timeout(_) | ErrorKind::Io)
    }
}
