//! Compressed sibling variants of page cache files.
//!
//! The page cache writes every HTML file twice: the plain document and a
//! pre-compressed copy beside it, which the web server hands out directly to
//! clients that accept it. This crate wraps the encoder behind a small
//! [`Compression`] enum, providing:
//!
//! - **Variant detection** from cache file names ([`Compression::from_path`])
//! - **Sibling naming** for a plain cache file ([`Compression::variant_path`])
//! - **In-memory** compression ([`Compression::compress`])
//!
//! Gzip uses the same moderate level the cache layer uses, so rewritten
//! siblings are indistinguishable from the ones it produced.

mod detect;
pub mod error;
mod ops;
mod util;

/// A compressed variant format.
///
/// Defaults to [`None`](Self::None) (the plain document).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Compression {
    /// Uncompressed
    #[default]
    None,
    /// Gzip compression (`_gzip` sibling)
    Gzip,
}
