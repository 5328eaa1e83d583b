//! Cached page handling: completeness checks, stylesheet discovery and the
//! rewrite passes that inline critical CSS, defer scripts and hoist preloads.
//!
//! Pages are parsed once into a [`Document`], mutated in place by the passes
//! and serialized once. Nothing in this crate writes to the cache store.

mod consts;
pub mod css;
mod document;
pub mod error;
mod fonts;
mod rewrite;
pub mod sources;
mod truncate;
mod validate;

pub use crate::css::FontImport;
pub use crate::document::{Document, ProcessingState};
pub use crate::fonts::{FontAsset, FontFormat, collect_fonts};
pub use crate::rewrite::{CacheLookup, Rewrite, RewriteStats, Substitutions, annotate_anchors};
pub use crate::sources::{CssSource, Origin, resolve_href};
pub use crate::truncate::safe_html_truncate;
pub use crate::validate::{MIN_DOCUMENT_SIZE, is_valid, validate};

/// Returns `true` for the "not found" page the cache stores under real URLs.
/// These are never optimised.
pub fn is_not_found(html: &str) -> bool {
    html.contains(consts::NOT_FOUND_MARKER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_pages() {
        assert!(is_not_found("<title>Page not found</title><h1>Error 404</h1>"));
        assert!(!is_not_found("<title>Home</title>"));
    }
}
