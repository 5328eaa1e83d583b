//! Cache-status probe.
//!
//! The page cache stores `https://example.com/blog/` as
//! `<cache root>/example.com/blog/index-https.html`. Probing a link means
//! mapping it onto that layout and checking whether the page exists.

use crate::path::validate;
use std::path::PathBuf;

/// Name of the cached page inside each URL directory.
pub const CACHED_PAGE: &str = "index-https.html";

#[derive(Debug, Clone)]
pub struct CacheProbe {
    cache_root: PathBuf,
    domain: String,
}

impl CacheProbe {
    pub fn new(cache_root: impl Into<PathBuf>, domain: impl Into<String>) -> Self {
        Self { cache_root: cache_root.into(), domain: domain.into() }
    }

    /// Map a link target onto the cache store layout.
    ///
    /// Returns `None` for anything that cannot be a cached page: fragments,
    /// relative links, non-HTTP schemes, or paths escaping the host directory.
    ///
    /// ```
    /// use std::path::Path;
    /// use cachepress_storage::CacheProbe;
    ///
    /// let probe = CacheProbe::new("/cache", "example.com");
    /// assert_eq!(
    ///     probe.path_for("https://example.com/blog/?page=2"),
    ///     Some(Path::new("/cache/example.com/blog/index-https.html").to_path_buf())
    /// );
    /// assert_eq!(probe.path_for("mailto:someone@example.com"), None);
    /// ```
    pub fn path_for(&self, url: &str) -> Option<PathBuf> {
        let url = url.trim();
        let without_scheme = if let Some(rest) = url.strip_prefix("//") {
            rest.to_string()
        } else if url.starts_with('/') {
            format!("{}{url}", self.domain)
        } else {
            let (scheme, rest) = url.split_once("://")?;
            if !(scheme.eq_ignore_ascii_case("https") || scheme.eq_ignore_ascii_case("http")) {
                return None;
            }
            rest.to_string()
        };
        let end = without_scheme.find(['?', '#']).unwrap_or(without_scheme.len());
        let location = &without_scheme[..end];
        let (host, path) = location.split_once('/').unwrap_or((location, ""));
        // Drop credentials and port; the cache is keyed on the bare host name.
        let host = host.rsplit('@').next().unwrap_or(host);
        let host = host.split(':').next().unwrap_or(host).to_lowercase();
        if host.is_empty() || host.starts_with('.') {
            return None;
        }
        let relative = validate(&format!("{host}/{path}")).ok()?;
        if !relative.starts_with(&host) {
            return None;
        }
        Some(self.cache_root.join(relative).join(CACHED_PAGE))
    }

    /// Whether the page behind `url` is already in the cache store.
    pub fn is_cached(&self, url: &str) -> bool {
        self.path_for(url).is_some_and(|path| path.is_file())
    }
}
