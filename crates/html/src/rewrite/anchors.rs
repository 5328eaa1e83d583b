use crate::consts;
use crate::document::{Document, set_attr};

/// Answers whether the page behind a link is already in the page cache.
pub trait CacheLookup {
    fn is_cached(&self, url: &str) -> bool;
}

impl<F> CacheLookup for F
where
    F: Fn(&str) -> bool,
{
    fn is_cached(&self, url: &str) -> bool {
        self(url)
    }
}

/// Mark links to cached pages with `data-is-rocket-cached="1"`, so the cache
/// preloader only warms pages that exist.
///
/// Anchors that already carry the attribute are not probed again; running
/// this twice never changes the document the second time.
pub fn annotate_anchors(document: &mut Document, cache: &dyn CacheLookup) -> usize {
    let mut annotated = 0;
    for id in document.select_ids(&consts::ANCHOR_SELECTOR) {
        if document.attr(id, consts::CACHED_ATTRIBUTE).is_some() {
            continue;
        }
        let cached = document.attr(id, "href").is_some_and(|href| cache.is_cached(href));
        if cached {
            document.with_element(id, |element| set_attr(element, consts::CACHED_ATTRIBUTE, "1"));
            annotated += 1;
        }
    }
    if annotated > 0 {
        tracing::debug!(annotated, "Marked links as cached");
    }
    annotated
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_cached_links_are_marked_once() {
        let mut document = Document::parse(
            r##"<html><body>
            <a href="/cached/">a</a>
            <a href="/uncached/">b</a>
            <a href="/also-cached/" data-is-rocket-cached="1">c</a>
            <a href="#top">d</a>
            </body></html>"##,
        );
        let lookup = |url: &str| url.contains("cached/") && !url.contains("uncached");
        assert_eq!(annotate_anchors(&mut document, &lookup), 1);
        let html = document.html();
        assert!(html.contains(r#"<a data-is-rocket-cached="1" href="/cached/">a</a>"#), "{html}");
        assert!(html.contains(r#"<a href="/uncached/">b</a>"#), "{html}");
        assert_eq!(annotate_anchors(&mut document, &lookup), 0);
        assert_eq!(document.html(), html);
    }
}
