//! Subscriber setup.
//!
//! With `write_log` enabled every event is appended to the status file (the
//! run log). Otherwise only warnings reach stderr and the status file is
//! reduced to a last-run marker: the Unix timestamp of this invocation.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::Mutex;
use time::UtcDateTime;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

/// Install the global subscriber. `RUST_LOG` overrides the level entirely.
pub fn init(status_file: &Path, write_log: bool, verbosity: u8) {
    if write_log {
        match OpenOptions::new().create(true).append(true).open(status_file) {
            Ok(file) => {
                tracing_subscriber::fmt()
                    .with_env_filter(filter(LevelFilter::INFO, verbosity))
                    .with_ansi(false)
                    .with_writer(Mutex::new(file))
                    .init();
                return;
            },
            Err(err) => {
                stderr(verbosity);
                tracing::warn!(path = %status_file.display(), %err, "Could not open run log; logging to stderr");
                return;
            },
        }
    }
    stderr(verbosity);
    if let Err(err) = mark_last_run(status_file) {
        tracing::warn!(path = %status_file.display(), %err, "Could not write last-run marker");
    }
}

fn stderr(verbosity: u8) {
    tracing_subscriber::fmt().with_env_filter(filter(LevelFilter::WARN, verbosity)).with_writer(io::stderr).init();
}

fn filter(base: LevelFilter, verbosity: u8) -> EnvFilter {
    EnvFilter::builder().with_default_directive(raise(base, verbosity).into()).from_env_lossy()
}

/// Each `-v` lowers the threshold by one level, stopping at `TRACE`.
fn raise(base: LevelFilter, verbosity: u8) -> LevelFilter {
    const LEVELS: [LevelFilter; 5] =
        [LevelFilter::ERROR, LevelFilter::WARN, LevelFilter::INFO, LevelFilter::DEBUG, LevelFilter::TRACE];
    let start = LEVELS.iter().position(|level| *level == base).unwrap_or(1);
    LEVELS[(start + usize::from(verbosity)).min(LEVELS.len() - 1)]
}

fn mark_last_run(path: &Path) -> io::Result<()> {
    let mut file = File::create(path)?;
    writeln!(file, "{}", UtcDateTime::now().unix_timestamp())
}
