use crate::context::Context;
use crate::entry::{Action, Reason, process_entry};
use crate::error::{ErrorKind, Result};
use crate::scratch::sweep_stale;
use cachepress_storage::discover;
use exn::ResultExt;
use std::path::PathBuf;
use tracing::instrument;

/// Progress events emitted by [`run`].
///
/// Events follow a strict ordering:
/// 1. [`Started`](Self::Started) exactly once.
/// 2. [`DiscoveryComplete`](Self::DiscoveryComplete) exactly once, with the
///    number of pages to process.
/// 3. [`Evicted`](Self::Evicted) once per zero-byte page removed.
/// 4. [`Processed`](Self::Processed) once per page, in discovery order.
/// 5. [`Complete`](Self::Complete) exactly once.
///
/// A discovery failure ends the run before `DiscoveryComplete`; a failing
/// page never does.
#[derive(Debug)]
pub enum RunEvent {
    Started,
    DiscoveryComplete(usize),
    Evicted(PathBuf),
    Processed { path: PathBuf, outcome: Result<Action> },
    Complete,
}

/// Receives every [`RunEvent`] as it happens.
pub trait Reporter {
    fn report(&mut self, event: RunEvent);
}

impl<F> Reporter for F
where
    F: FnMut(RunEvent),
{
    fn report(&mut self, event: RunEvent) {
        self(event)
    }
}

/// Counts outcomes and logs each page as it is processed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    pub discovered: usize,
    pub evicted: usize,
    pub optimised: usize,
    pub annotated: usize,
    pub unchanged: usize,
    pub failed: usize,
}

impl Summary {
    fn record(&mut self, path: &std::path::Path, outcome: &Result<Action>) {
        let path = path.display();
        match outcome {
            Ok(action @ Action::Optimised { original_css, inlined_css }) => {
                self.optimised += 1;
                let reduction = action.reduction().map(|percent| format!("{percent:.1}%"));
                tracing::info!(%path, original_css, inlined_css, reduction, "Optimised");
            },
            Ok(Action::Annotated { links }) => {
                self.annotated += 1;
                tracing::info!(%path, links, "Annotated links");
            },
            Ok(Action::Unchanged(reason)) => {
                self.unchanged += 1;
                if matches!(reason, Reason::AlreadyOptimised) {
                    tracing::debug!(%path, %reason, "Unchanged");
                } else {
                    tracing::info!(%path, %reason, "Unchanged");
                }
            },
            Err(err) => {
                self.failed += 1;
                tracing::warn!(%path, kind = %**err, error = ?err, "Page left untouched");
            },
        }
    }
}

impl Reporter for Summary {
    fn report(&mut self, event: RunEvent) {
        match event {
            RunEvent::Started => tracing::debug!("Run started"),
            RunEvent::DiscoveryComplete(count) => {
                self.discovered = count;
                tracing::info!(count, "Discovered cached pages");
            },
            RunEvent::Evicted(path) => {
                self.evicted += 1;
                tracing::info!(path = %path.display(), "Evicted empty page");
            },
            RunEvent::Processed { path, outcome } => self.record(&path, &outcome),
            RunEvent::Complete => tracing::info!(
                optimised = self.optimised,
                annotated = self.annotated,
                unchanged = self.unchanged,
                failed = self.failed,
                evicted = self.evicted,
                "Run complete"
            ),
        }
    }
}

/// Process every cached page of the configured domain, one at a time.
///
/// Only a failure to list the cache is returned as an error; each page's own
/// outcome goes to `reporter`.
#[instrument(skip_all, fields(root = %ctx.config.cache_root.display()))]
pub fn run(ctx: &Context, reporter: &mut dyn Reporter) -> Result<()> {
    reporter.report(RunEvent::Started);
    sweep_stale(&ctx.scratch_root);

    let discovery =
        discover(&ctx.config.cache_root, &ctx.config.domain, !ctx.dry_run).or_raise(|| ErrorKind::Discovery)?;
    reporter.report(RunEvent::DiscoveryComplete(discovery.entries.len()));
    for path in discovery.evicted {
        reporter.report(RunEvent::Evicted(path));
    }

    for entry in discovery.entries {
        let outcome = process_entry(ctx, &entry.path);
        reporter.report(RunEvent::Processed { path: entry.path, outcome });
    }
    reporter.report(RunEvent::Complete);
    Ok(())
}
