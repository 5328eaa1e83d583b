//! Per-page temporary files handed to the external tools.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Prefix of every temporary directory a run creates.
pub const TEMP_PREFIX: &str = "cachepress-";

/// A temporary directory for one page, deleted when dropped (whatever the
/// outcome of the page).
#[derive(Debug)]
pub(crate) struct Scratch {
    dir: TempDir,
    written: usize,
}

impl Scratch {
    pub(crate) fn new_in(parent: impl AsRef<Path>) -> io::Result<Self> {
        let dir = tempfile::Builder::new().prefix(TEMP_PREFIX).tempdir_in(parent)?;
        Ok(Self { dir, written: 0 })
    }

    /// Write `content` to a new file named after `name`.
    pub(crate) fn write(&mut self, name: &str, content: impl AsRef<[u8]>) -> io::Result<PathBuf> {
        self.written += 1;
        let path = self.dir.path().join(format!("{:03}-{name}", self.written));
        fs::write(&path, content)?;
        Ok(path)
    }
}

/// Remove temporary directories and files left behind by runs that crashed
/// before cleaning up. Only safe while holding the run lock.
pub fn sweep_stale(temp_dir: &Path) -> usize {
    let entries = match fs::read_dir(temp_dir) {
        Ok(entries) => entries,
        Err(err) => {
            tracing::warn!(path = %temp_dir.display(), error = %err, "Could not list temporary directory");
            return 0;
        },
    };
    let mut removed = 0;
    for entry in entries.flatten() {
        if !entry.file_name().to_string_lossy().starts_with(TEMP_PREFIX) {
            continue;
        }
        let path = entry.path();
        let result = match entry.file_type() {
            Ok(kind) if kind.is_dir() => fs::remove_dir_all(&path),
            Ok(_) => fs::remove_file(&path),
            Err(err) => Err(err),
        };
        match result {
            Ok(()) => removed += 1,
            Err(err) => tracing::warn!(path = %path.display(), error = %err, "Could not remove stale artifact"),
        }
    }
    if removed > 0 {
        tracing::info!(removed, "Removed stale temporary artifacts");
    }
    removed
}
