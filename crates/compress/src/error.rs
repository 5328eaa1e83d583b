//! Errors raised while encoding a sibling variant.

use derive_more::{Display, Error};

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Writing the encoded output failed.
    #[display("I/O error")]
    Io,
}
