//! URL paths as filesystem paths.
//!
//! Links and stylesheet references found in cached pages are untrusted input.
//! Their path part is turned into a relative path by [`validate`] before it is
//! joined onto the cache or site root, so nothing can point outside it.

use crate::error::{ErrorKind, Result};
use std::path::PathBuf;

/// Turn the path part of a URL (`/blog/./post/?page=2`) into a relative
/// filesystem path (`blog/post`).
///
/// Segments are split on `/` only, as a web server would. Empty and `.`
/// segments are dropped, `..` removes the previous segment, and the query or
/// fragment is ignored. A path that climbs above its root, names nothing, or
/// holds a backslash or NUL byte in a segment is rejected with
/// [`InvalidPath`](ErrorKind::InvalidPath).
///
/// ```
/// use std::path::Path;
/// use cachepress_storage::validate_path;
///
/// assert_eq!(validate_path("/wp-content/themes/site/style.css?ver=6").unwrap(), Path::new("wp-content/themes/site/style.css"));
/// assert_eq!(validate_path("example.com//blog/./a/../#top").unwrap(), Path::new("example.com/blog"));
/// assert!(validate_path("/../etc/passwd").is_err());
/// assert!(validate_path("/a/..\\..\\b").is_err());
/// ```
pub fn validate(url_path: &str) -> Result<PathBuf> {
    let invalid = || ErrorKind::InvalidPath(PathBuf::from(url_path));
    let end = url_path.find(['?', '#']).unwrap_or(url_path.len());
    let mut segments = Vec::new();
    for segment in url_path[..end].split('/') {
        match segment {
            "" | "." => {},
            ".." => {
                if segments.pop().is_none() {
                    exn::bail!(invalid());
                }
            },
            // Some servers treat `\` as a separator; NUL truncates in syscalls.
            _ if segment.contains(['\\', '\0']) => exn::bail!(invalid()),
            _ => segments.push(segment),
        }
    }
    if segments.is_empty() {
        exn::bail!(invalid());
    }
    Ok(segments.into_iter().collect())
}
