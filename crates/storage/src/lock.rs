//! Single-run lock.
//!
//! Optimisation runs are started by cron and can easily outlive their
//! interval; a second run must not touch the cache while the first is still
//! writing. The lock is an exclusive advisory lock on a well-known file, which
//! also carries a heartbeat (Unix timestamp) for anyone inspecting a stuck run.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use fs4::fs_std::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use time::UtcDateTime;

/// Exclusive lock held for the lifetime of a run.
///
/// Released when dropped (the file handle is closed).
#[derive(Debug)]
pub struct RunLock {
    file: File,
    path: PathBuf,
}

impl RunLock {
    /// Take the lock without blocking.
    ///
    /// Returns [`LockHeld`](ErrorKind::LockHeld) if another process (or
    /// another handle in this one) already holds it.
    #[tracing::instrument(fields(path = %path.as_ref().display()), skip(path))]
    pub fn acquire(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        // Never truncate before holding the lock: the heartbeat belongs to the holder.
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|e| ErrorKind::from_io(e, path))?;
        match file.try_lock_exclusive() {
            Ok(()) => {},
            Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {
                exn::bail!(ErrorKind::LockHeld(path.to_path_buf()))
            },
            Err(err) => exn::bail!(ErrorKind::Io(err)),
        }
        let mut lock = Self { file, path: path.to_path_buf() };
        lock.heartbeat()?;
        tracing::debug!("Run lock acquired");
        Ok(lock)
    }

    /// Replace the lock file content with the current Unix timestamp.
    pub fn heartbeat(&mut self) -> Result<()> {
        let now = UtcDateTime::now().unix_timestamp();
        let path = &self.path;
        self.file.set_len(0).or_raise(|| ErrorKind::WriteFailure(path.clone()))?;
        self.file.seek(SeekFrom::Start(0)).or_raise(|| ErrorKind::WriteFailure(path.clone()))?;
        write!(self.file, "{now}").or_raise(|| ErrorKind::WriteFailure(path.clone()))?;
        self.file.sync_data().or_raise(|| ErrorKind::WriteFailure(path.clone()))?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
