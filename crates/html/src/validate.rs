//! Completeness check for cached pages.
//!
//! The cache layer occasionally leaves truncated or placeholder files behind.
//! A page is only read or replaced when it looks like a complete, styled
//! document; anything else is left exactly as it is.

use crate::error::{ErrorKind, Result};
use crate::safe_html_truncate;
use tracing::instrument;

/// Pages smaller than this are partial writes or placeholders.
pub const MIN_DOCUMENT_SIZE: usize = 10_000;
const SNIPPET_SIZE: usize = 80;
const DOCTYPE: &str = "<!DOCTYPE html";

/// Returns `true` if `html` looks like a complete cached page.
///
/// # Validation criteria
/// - At least [`MIN_DOCUMENT_SIZE`] bytes
/// - Contains `<body`, `<style` and `</body>`
/// - Starts with an HTML5 doctype (leading whitespace allowed)
pub fn is_valid(html: &str) -> bool {
    failed_check(html).is_none()
}

/// Like [`is_valid`], but reports the start of the offending document.
#[instrument(skip(html), fields(html_size = html.len()))]
pub fn validate(html: &str) -> Result<()> {
    match failed_check(html) {
        None => Ok(()),
        Some(check) => {
            tracing::debug!(check, "Document failed validation");
            let snippet = safe_html_truncate(html.trim(), SNIPPET_SIZE);
            exn::bail!(ErrorKind::MalformedHtml(snippet.to_string()))
        },
    }
}

fn failed_check(html: &str) -> Option<&'static str> {
    if html.len() < MIN_DOCUMENT_SIZE {
        return Some("size");
    }
    for marker in ["<body", "<style", "</body>"] {
        if !html.contains(marker) {
            return Some(marker);
        }
    }
    if !html.trim_start().starts_with(DOCTYPE) {
        return Some("doctype");
    }
    None
}
