//! Cache entry discovery.
//!
//! Walks the cache store and yields every plain HTML page written for the
//! configured domain, shortest path first (so parents are processed before
//! their children).

use crate::error::{ErrorKind, Result};
use crate::write::evict;
use cachepress_compress::Compression;
use std::fs::{self, DirEntry};
use std::path::{Component, Path, PathBuf};
use tracing::instrument;

/// The required base extension of a cached page.
const HTML_EXTENSION: &str = "html";

/// A cached page found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheFile {
    pub path: PathBuf,
}

/// Result of walking the cache store.
#[derive(Debug, Default)]
pub struct Discovery {
    /// Pages to process, ordered ascending by path length.
    pub entries: Vec<CacheFile>,
    /// Zero-byte pages that were (or, without `delete_empty`, would have been)
    /// removed along with their compressed sibling.
    pub evicted: Vec<PathBuf>,
}

enum WalkEntry {
    File(CacheFile),
    Empty(PathBuf),
    Descend(PathBuf),
    Skip,
}

/// Enumerate the cached pages of `domain` under `cache_root`.
///
/// Only content metadata is read. Zero-byte pages are never returned; when
/// `delete_empty` is set they are deleted together with their `_gzip` sibling.
#[instrument(skip(cache_root), fields(root = %cache_root.display(), entries, evicted))]
pub fn discover(cache_root: &Path, domain: &str, delete_empty: bool) -> Result<Discovery> {
    let mut discovery = Discovery::default();
    let mut stack = vec![cache_root.to_path_buf()];

    while let Some(current) = stack.pop() {
        let entries = match fs::read_dir(&current) {
            Ok(entries) => entries,
            Err(err) if current == cache_root => exn::bail!(ErrorKind::from_io(err, &current)),
            // Directories can vanish while the cache layer purges pages.
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => continue,
            Err(err) => {
                tracing::warn!(path = %current.display(), error = %err, "Skipping unreadable cache directory");
                continue;
            },
        };
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::warn!(path = %current.display(), error = %err, "Skipping unreadable cache entry");
                    continue;
                },
            };
            match process_entry(&entry, cache_root, domain) {
                Ok(WalkEntry::File(file)) => discovery.entries.push(file),
                Ok(WalkEntry::Empty(path)) => {
                    if delete_empty && let Err(err) = evict(&path) {
                        tracing::warn!(path = %path.display(), error = ?err, "Could not evict empty cache entry");
                        continue;
                    }
                    discovery.evicted.push(path);
                },
                Ok(WalkEntry::Descend(dir)) => stack.push(dir),
                Ok(WalkEntry::Skip) => {},
                Err(err) => tracing::warn!(error = ?err, "Skipping cache entry"),
            }
        }
    }

    // Sorting by name first keeps runs reproducible regardless of directory order.
    discovery.entries.sort_by(|a, b| a.path.cmp(&b.path));
    discovery.entries.sort_by_key(|file| file.path.as_os_str().len());
    let span = tracing::Span::current();
    span.record("entries", discovery.entries.len());
    span.record("evicted", discovery.evicted.len());
    Ok(discovery)
}

fn process_entry(entry: &DirEntry, cache_root: &Path, domain: &str) -> Result<WalkEntry> {
    let path = entry.path();
    let metadata = entry.metadata().map_err(|e| ErrorKind::from_io(e, &path))?;
    if metadata.is_dir() {
        return Ok(WalkEntry::Descend(path));
    }
    if !metadata.is_file() {
        // Note: silently drop what is most likely a broken symlink.
        return Ok(WalkEntry::Skip);
    }
    let relative = path.strip_prefix(cache_root).unwrap_or(&path);
    if !is_cached_page(relative, domain) {
        return Ok(WalkEntry::Skip);
    }
    match metadata.len() {
        0 => Ok(WalkEntry::Empty(path)),
        _ => Ok(WalkEntry::File(CacheFile { path })),
    }
}

/// A plain `.html` page stored under a directory named exactly `domain`, and
/// not under any subdomain of it.
fn is_cached_page(relative: &Path, domain: &str) -> bool {
    if Compression::from_path(relative) != Compression::None {
        return false;
    }
    let is_html = relative
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(HTML_EXTENSION));
    if !is_html {
        return false;
    }
    let subdomain = format!(".{domain}");
    let directories = relative.parent().into_iter().flat_map(Path::components).filter_map(|c| match c {
        Component::Normal(name) => name.to_str(),
        _ => None,
    });
    let mut matched = false;
    for name in directories {
        let name = name.to_lowercase();
        if name.ends_with(&subdomain) {
            return false;
        }
        matched |= name == domain;
    }
    matched
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn touch(root: &Path, relative: &str, content: &[u8]) -> PathBuf {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    #[rstest]
    #[case("example.com/index-https.html", true)]
    #[case("example.com/blog/post/index-https.html", true)]
    #[case("Example.com/index-https.html", true)]
    #[case("example.com/index-https.html_gzip", false)]
    #[case("example.com/index-https.html.gz", false)]
    #[case("example.com/statusfile.txt", false)]
    #[case("www.example.com/index-https.html", false)]
    #[case("shop.example.com/example.com/index-https.html", false)]
    #[case("example.com.au/index-https.html", false)]
    #[case("notexample.com/index-https.html", false)]
    #[case("index-https.html", false)]
    fn test_is_cached_page(#[case] path: &str, #[case] expected: bool) {
        assert_eq!(is_cached_page(Path::new(path), "example.com"), expected);
    }

    #[test]
    fn entries_are_ordered_by_path_length() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let long = touch(root, "example.com/a-much-longer-path/nested/index-https.html", b"x");
        let short = touch(root, "example.com/index-https.html", b"x");
        let medium = touch(root, "example.com/about/index-https.html", b"x");
        touch(root, "example.com/about/index-https.html_gzip", b"x");
        touch(root, "www.example.com/index-https.html", b"x");

        let discovery = discover(root, "example.com", true).unwrap();
        let paths: Vec<_> = discovery.entries.iter().map(|e| e.path.clone()).collect();
        assert_eq!(paths, vec![short, medium, long]);
        assert!(discovery.evicted.is_empty());
    }

    #[test]
    fn zero_byte_entries_are_evicted() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let empty = touch(root, "example.com/empty/index-https.html", b"");
        let sibling = touch(root, "example.com/empty/index-https.html_gzip", b"\x1f\x8b");
        let kept = touch(root, "example.com/index-https.html", b"<!DOCTYPE html>");

        let discovery = discover(root, "example.com", true).unwrap();
        assert_eq!(discovery.entries, vec![CacheFile { path: kept }]);
        assert_eq!(discovery.evicted, vec![empty.clone()]);
        assert!(!empty.exists());
        assert!(!sibling.exists());
    }

    #[test]
    fn zero_byte_entries_survive_without_delete() {
        let dir = tempfile::tempdir().unwrap();
        let empty = touch(dir.path(), "example.com/index-https.html", b"");
        let discovery = discover(dir.path(), "example.com", false).unwrap();
        assert!(discovery.entries.is_empty());
        assert_eq!(discovery.evicted, vec![empty.clone()]);
        assert!(empty.exists());
    }

    #[test]
    fn missing_root_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = discover(&dir.path().join("missing"), "example.com", true).unwrap_err();
        assert!(matches!(*err, ErrorKind::NotFound(_)));
    }
}
