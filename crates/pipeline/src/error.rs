//! Pipeline Error Types
//!
//! Uses [`exn`] for automatic location tracking and error tree construction.
//! Errors from the crates below are raised into one of these kinds, keeping
//! the original error as a child in the tree.

use derive_more::{Display, Error};

/// A pipeline error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Why a page (or the whole run) could not be processed.
///
/// ### Fatal, raised before any page is touched
/// - [`ErrorKind::Setup`]
/// - [`ErrorKind::Discovery`]
///
/// ### Per page, the file is left exactly as it was
/// - [`ErrorKind::Read`]
/// - [`ErrorKind::MalformedHtml`]
/// - [`ErrorKind::Scratch`]
/// - [`ErrorKind::RenderUnavailable`]
/// - [`ErrorKind::PurgeUnavailable`]
/// - [`ErrorKind::WriteFailure`]
#[derive(Debug, Display, Error, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// An external tool or a configured selector could not be prepared.
    #[display("could not prepare the pipeline")]
    Setup,
    /// The cache root could not be listed.
    #[display("could not list the cache")]
    Discovery,
    #[display("could not read cached page")]
    Read,
    /// The page (before or after rewriting) is not a complete document.
    #[display("malformed HTML")]
    MalformedHtml,
    /// Temporary files for the external tools could not be created.
    #[display("could not create scratch files")]
    Scratch,
    #[display("render collaborator unavailable")]
    RenderUnavailable,
    #[display("purge tool unavailable")]
    PurgeUnavailable,
    /// The original file is unmodified.
    #[display("could not write optimised page")]
    WriteFailure,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorKind::Read
                | ErrorKind::Scratch
                | ErrorKind::RenderUnavailable
                | ErrorKind::PurgeUnavailable
                | ErrorKind::WriteFailure
        )
    }
}
