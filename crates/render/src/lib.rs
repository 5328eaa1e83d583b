//! Drivers for the two external tools in the optimisation pipeline, and the
//! assembly of their output into one critical stylesheet.
//!
//! - [`Renderer`] runs the headless-browser script against a cached page and
//!   parses the rendered DOM and font metadata out of its stdout.
//! - [`Purger`] runs the purge tool over the page's stylesheets.
//! - [`CombinedCss`] joins the purge output with the sizing hints and the
//!   supplemental stylesheet and minifies the result.
//!
//! Both tools run with a timeout; a page whose tool fails is simply skipped
//! by the caller.

mod css;
pub mod error;
mod process;
mod purge;
mod render;

pub use crate::css::{CombinedCss, load_supplemental, minify_css};
pub use crate::purge::{PurgeFragment, Purger, parse_purge_output};
pub use crate::render::{RenderResult, Renderer};
