//! Filesystem side of the page cache: finding cached pages, probing whether a
//! URL has been cached, holding the run lock, and replacing pages atomically.

mod discover;
pub mod error;
mod lock;
mod path;
mod probe;
mod write;

pub use crate::discover::{CacheFile, Discovery, discover};
pub use crate::lock::RunLock;
pub use crate::path::validate as validate_path;
pub use crate::probe::{CACHED_PAGE, CacheProbe};
pub use crate::write::{evict, write_atomic, write_with_variant};
