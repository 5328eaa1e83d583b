//! HTML Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// An HTML processing error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for HTML operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The document is not a complete cached page. Leave the file alone.
    #[display("malformed HTML: {_0}")]
    MalformedHtml(#[error(not(source))] String),
    /// A configured CSS selector does not parse.
    #[display("invalid selector: {_0}")]
    InvalidSelector(#[error(not(source))] String),
    /// A scratch file for inline CSS could not be written.
    #[display("could not materialize inline stylesheet")]
    Materialize,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // The HTML is either valid or it's not.
        matches!(self, ErrorKind::Materialize)
    }
}
