//! Stylesheets referenced by a cached page.
//!
//! Every stylesheet a page uses, linked or inline, is collected so the purge
//! tool can reduce their union to the rules the rendered page needs.

use crate::consts;
use crate::document::{Document, set_attr};
use crate::error::{ErrorKind, Result};
use cachepress_storage::validate_path;
use exn::ResultExt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// A `<link rel="stylesheet">` resolved to a file under the site root.
    Linked,
    /// The text of a `<style>` element, written out to a scratch file.
    Inline,
}

/// A stylesheet and where its content came from. Read, never modified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CssSource {
    pub origin: Origin,
    pub path: PathBuf,
    pub content: String,
}

/// Strip the site's own scheme and host, and any query or fragment, from a
/// stylesheet reference.
///
/// Returns `None` for references to other hosts.
fn strip_href<'a>(href: &'a str, domain: &str) -> Option<&'a str> {
    let href = href.trim();
    let mut local = href;
    for prefix in ["https://", "http://", "//"] {
        if let Some(rest) = strip_prefix_ignore_case(href, prefix)
            && let Some(rest) = strip_prefix_ignore_case(rest, domain)
        {
            local = rest;
            break;
        }
    }
    if local.starts_with("//") || local.contains("://") {
        return None;
    }
    let end = local.find(['?', '#']).unwrap_or(local.len());
    let local = &local[..end];
    // "https://example.com.evil.org/x" strips to ".evil.org/x"
    if !local.starts_with('/') {
        return None;
    }
    Some(local)
}

fn strip_prefix_ignore_case<'a>(value: &'a str, prefix: &str) -> Option<&'a str> {
    let head = value.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &value[prefix.len()..])
}

/// Map a stylesheet `href` onto the filesystem path it is served from.
///
/// Pure: the file is not checked for existence. References to other hosts,
/// and paths escaping `site_root`, resolve to `None`.
///
/// ```
/// use std::path::Path;
/// use cachepress_html::resolve_href;
///
/// assert_eq!(
///     resolve_href("https://example.com/wp-content/style.css?ver=6.4", "example.com", Path::new("/var/www")),
///     Some(Path::new("/var/www/wp-content/style.css").to_path_buf())
/// );
/// assert_eq!(resolve_href("https://cdn.example.org/a.css", "example.com", Path::new("/var/www")), None);
/// ```
pub fn resolve_href(href: &str, domain: &str, site_root: &Path) -> Option<PathBuf> {
    let local = strip_href(href, domain)?;
    let relative = validate_path(local).ok()?;
    Some(site_root.join(relative))
}

/// Find the file behind a stylesheet reference.
///
/// Tries the site root first, then the stripped reference as an absolute
/// path (stylesheets that live outside the site root but are still served,
/// such as those of a shared mu-plugin install).
pub fn locate(href: &str, domain: &str, site_root: &Path) -> Option<PathBuf> {
    if let Some(path) = resolve_href(href, domain, site_root)
        && path.is_file()
    {
        return Some(path);
    }
    let local = strip_href(href, domain)?;
    let absolute = Path::new("/").join(validate_path(local).ok()?);
    let is_css = absolute.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("css"));
    (is_css && absolute.is_file()).then_some(absolute)
}

/// Collect the page's stylesheets in document order.
///
/// Inline styles are handed to `materialize`, which writes them to a scratch
/// file and returns its path. Linked stylesheets that were found are
/// re-tagged `rel="to_compress"`, so later passes can tell which links were
/// folded into the combined stylesheet. Unreadable files are skipped.
#[tracing::instrument(skip_all, fields(sources))]
pub fn collect(
    document: &mut Document,
    domain: &str,
    site_root: &Path,
    mut materialize: impl FnMut(&str) -> std::io::Result<PathBuf>,
) -> Result<Vec<CssSource>> {
    let mut sources = Vec::new();
    for id in document.select_ids(&consts::CSS_SOURCE_SELECTOR) {
        let Some(element) = document.element(id) else { continue };
        if element.name() == "style" {
            if document.is_noscript(id) {
                continue;
            }
            let content = document.text(id);
            let path = materialize(&content).or_raise(|| ErrorKind::Materialize)?;
            sources.push(CssSource { origin: Origin::Inline, path, content });
            continue;
        }

        let is_stylesheet = element.attr("rel").is_some_and(|rel| rel.eq_ignore_ascii_case("stylesheet"));
        let Some(href) = element.attr("href").filter(|_| is_stylesheet) else { continue };
        let Some(path) = locate(href, domain, site_root) else {
            tracing::debug!(href, "Stylesheet not found locally");
            continue;
        };
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "Could not read stylesheet");
                continue;
            },
        };
        document.with_element(id, |element| set_attr(element, "rel", consts::TOMBSTONE_REL));
        sources.push(CssSource { origin: Origin::Linked, path, content });
    }
    tracing::Span::current().record("sources", sources.len());
    Ok(sources)
}
