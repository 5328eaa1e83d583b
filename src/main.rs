//! `cachepress`: optimise a WP-Rocket page cache in place.
//!
//! Meant to be run from cron. Only one run works on the cache at a time; a
//! run that finds the lock taken exits immediately, successfully and silently.

mod logging;

use cachepress_config::Config;
use cachepress_pipeline::{Context, Reporter, RunEvent, Summary, run};
use cachepress_storage::RunLock;
use cachepress_storage::error::ErrorKind as StorageErrorKind;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

/// Inline critical CSS and defer scripts in cached pages
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Config file path (default: config.toml in the platform config directory)
    #[arg(short = 'C', long, value_hint = clap::ValueHint::FilePath)]
    config: Option<PathBuf>,

    /// Do everything except replace or delete cache files
    #[arg(long)]
    dry_run: bool,

    /// Log more; repeat for more detail
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Refreshes the lock's heartbeat after every page.
struct Heartbeat<'a> {
    lock: &'a mut RunLock,
    summary: Summary,
}

impl Reporter for Heartbeat<'_> {
    fn report(&mut self, event: RunEvent) {
        if matches!(event, RunEvent::Processed { .. }) {
            if let Err(err) = self.lock.heartbeat() {
                tracing::warn!(path = %self.lock.path().display(), error = ?err, "Could not refresh heartbeat");
            }
        }
        self.summary.report(event);
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("cachepress: {err:?}");
            return ExitCode::FAILURE;
        },
    };
    let mut lock = match RunLock::acquire(&config.lock_file) {
        Ok(lock) => lock,
        Err(err) if matches!(*err, StorageErrorKind::LockHeld(_)) => return ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("cachepress: {err:?}");
            return ExitCode::FAILURE;
        },
    };
    logging::init(&config.status_file, config.write_log, cli.verbose);

    let ctx = match Context::new(config, cli.dry_run) {
        Ok(ctx) => ctx,
        Err(err) => {
            tracing::error!(error = ?err, "Setup failed");
            return ExitCode::FAILURE;
        },
    };
    let mut reporter = Heartbeat { lock: &mut lock, summary: Summary::default() };
    match run(&ctx, &mut reporter) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = ?err, "Run aborted");
            ExitCode::FAILURE
        },
    }
}
