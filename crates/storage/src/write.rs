//! Atomic replacement of cache files.
//!
//! A cached page is either the old version or the new version, never a
//! partial write: content goes to a temporary file in the same directory,
//! which is flushed to disk and renamed over the target.

use crate::error::{ErrorKind, Result};
use cachepress_compress::Compression;
use exn::{OptionExt, ResultExt};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::instrument;

#[cfg(unix)]
const DEFAULT_MODE: u32 = 0o644;

/// Replace `path` with `bytes`.
///
/// The permissions of the file being replaced are kept; new files are
/// world-readable so the web server can hand them out.
#[instrument(skip(path, bytes), fields(path = %path.display(), size = bytes.len()))]
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let failure = || ErrorKind::WriteFailure(path.to_path_buf());
    let parent = path.parent().ok_or_raise(failure)?;
    let mut temp = NamedTempFile::new_in(parent).or_raise(failure)?;
    temp.write_all(bytes).or_raise(failure)?;
    temp.as_file().sync_all().or_raise(failure)?;

    match fs::metadata(path) {
        Ok(metadata) => temp.as_file().set_permissions(metadata.permissions()).or_raise(failure)?,
        #[cfg(unix)]
        Err(_) => {
            use std::os::unix::fs::PermissionsExt;
            temp.as_file().set_permissions(fs::Permissions::from_mode(DEFAULT_MODE)).or_raise(failure)?;
        },
        #[cfg(not(unix))]
        Err(_) => {},
    }

    temp.persist(path).or_raise(failure)?;
    Ok(())
}

/// Replace `path` and then its compressed sibling.
///
/// The sibling is only written once the plain file is in place, so a failure
/// never leaves a sibling that is newer than its page.
pub fn write_with_variant(path: &Path, bytes: &[u8], variant: Compression) -> Result<()> {
    write_atomic(path, bytes)?;
    if variant == Compression::None {
        return Ok(());
    }
    let compressed = variant.compress(bytes).map_err(ErrorKind::compression)?;
    write_atomic(&variant.variant_path(path), &compressed)
}

/// Delete a cached page and its `_gzip` sibling. Missing files are ignored.
pub fn evict(path: &Path) -> Result<()> {
    for target in [path.to_path_buf(), Compression::Gzip.variant_path(path)] {
        match fs::remove_file(&target) {
            Ok(()) => tracing::debug!(path = %target.display(), "Evicted"),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {},
            Err(err) => exn::bail!(ErrorKind::from_io(err, target)),
        }
    }
    Ok(())
}
