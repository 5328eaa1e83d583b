//! The optimisation pipeline.
//!
//! [`run`] walks the cache store and hands each page to [`process_entry`],
//! which decides what the page needs:
//!
//! - **incomplete or a 404 page**: left alone;
//! - **already optimised**: only new cache-status annotations on its links;
//! - **otherwise**: stylesheets collected, page rendered, CSS purged and
//!   combined, the document rewritten, re-validated and atomically replaced.
//!
//! Every outcome is reported to a [`Reporter`]; a failing page never stops
//! the run.

mod context;
mod entry;
pub mod error;
mod run;
mod scratch;

pub use crate::context::Context;
pub use crate::entry::{Action, Reason, process_entry};
pub use crate::run::{Reporter, RunEvent, Summary, run};
pub use crate::scratch::{TEMP_PREFIX, sweep_stale};

#[cfg(all(test, unix))]
mod tests;
