//! The set of tree passes that turn a cached page into an optimised one.
//!
//! A [`Rewrite`] is configured once per page with everything the renderer and
//! purge tool produced, then applied to a parsed [`Document`]. The document is
//! serialized by the caller afterwards, exactly once.

mod anchors;
mod images;
mod scripts;
mod styles;

pub use self::anchors::{CacheLookup, annotate_anchors};
pub use self::images::Substitutions;

use crate::css::FontImport;
use crate::document::Document;
use crate::error::{ErrorKind, Result};
use crate::fonts::FontAsset;
use exn::OptionExt;
use time::UtcDateTime;
use tracing::instrument;

/// Counts of what each pass changed, for logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewriteStats {
    pub stylesheets_removed: usize,
    pub styles_cleared: usize,
    pub anchors_annotated: usize,
    pub scripts_deferred: usize,
    pub images_replaced: usize,
    pub styles_fixed: usize,
    pub font_preloads: usize,
    pub preload_triggers: usize,
}

pub struct Rewrite<'a> {
    footprint: &'a str,
    css: Option<&'a str>,
    fonts: &'a [FontAsset],
    font_imports: &'a [FontImport],
    substitutions: Option<&'a Substitutions>,
    cache: Option<&'a dyn CacheLookup>,
    preload_delay: Option<u64>,
}

impl<'a> Rewrite<'a> {
    pub fn new(footprint: &'a str) -> Self {
        Self {
            footprint,
            css: None,
            fonts: &[],
            font_imports: &[],
            substitutions: None,
            cache: None,
            preload_delay: None,
        }
    }

    /// The combined, minified stylesheet to inline after `<title>`.
    pub fn with_css(mut self, css: &'a str) -> Self {
        self.css = Some(css);
        self
    }

    pub fn with_fonts(mut self, fonts: &'a [FontAsset]) -> Self {
        self.fonts = fonts;
        self
    }

    pub fn with_font_imports(mut self, imports: &'a [FontImport]) -> Self {
        self.font_imports = imports;
        self
    }

    pub fn with_substitutions(mut self, substitutions: &'a Substitutions) -> Self {
        self.substitutions = Some(substitutions);
        self
    }

    /// Annotate anchors to pages `cache` reports as cached.
    pub fn with_cache(mut self, cache: &'a dyn CacheLookup) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_preload_delay(mut self, delay: Option<u64>) -> Self {
        self.preload_delay = delay;
        self
    }

    /// Run every pass over `document`.
    ///
    /// After `</title>` the head reads: font preloads, the lazy-load
    /// bootstrap, then the inlined stylesheet. A document without a `<title>`
    /// gets them at the start of `<head>`.
    #[instrument(skip_all, fields(fonts = self.fonts.len(), css_size = self.css.map(str::len)))]
    pub fn apply(&self, document: &mut Document) -> Result<RewriteStats> {
        let head = document.head().ok_or_raise(|| ErrorKind::MalformedHtml("document has no <head>".to_string()))?;
        let mut stats = RewriteStats {
            stylesheets_removed: styles::remove_stylesheets(document),
            styles_cleared: styles::clear_inline(document),
            ..RewriteStats::default()
        };
        if let Some(cache) = self.cache {
            stats.anchors_annotated = annotate_anchors(document, cache);
        }
        let deferred = scripts::defer(document);
        stats.scripts_deferred = deferred.external + deferred.inline;
        if let Some(substitutions) = self.substitutions {
            stats.images_replaced = substitutions.apply(document);
        }
        stats.styles_fixed = styles::fix_remaining(document, self.font_imports);
        if let Some(delay) = self.preload_delay {
            stats.preload_triggers = scripts::add_preload_trigger(document, delay);
        }

        let mut hoisted = Vec::new();
        for href in self.fonts.iter().filter_map(FontAsset::preload_href) {
            let attrs = [("rel", "preload"), ("href", href.as_str()), ("as", "font"), ("crossorigin", "")];
            if let Some(id) = document.create_element("link", &attrs, "") {
                hoisted.push(id);
                stats.font_preloads += 1;
            }
        }
        hoisted.extend(deferred.bootstrap);
        if let Some(css) = self.css {
            let style = document
                .create_element("style", &[], css)
                .ok_or_raise(|| ErrorKind::MalformedHtml("could not create <style>".to_string()))?;
            hoisted.push(style);
        }
        match document.title() {
            Some(title) => document.insert_after(title, &hoisted),
            None => document.prepend(head, &hoisted),
        }

        let stamp = UtcDateTime::now().unix_timestamp();
        document.append_comment(&format!(" {} @{stamp}", self.footprint.trim()));
        tracing::debug!(?stats, "Rewrote document");
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ProcessingState;
    use crate::fonts::collect_fonts;

    const PAGE: &str = r#"<!DOCTYPE html><html><head><meta charset="utf-8"><title>Home</title>
<link rel="stylesheet" href="/style.css"><link rel="to_compress" href="/b.css">
<style>.big{font-size:3em}</style>
<noscript><style>.lazy{background: url( '' )}</style></noscript>
<script src="/wp-includes/js/jquery/jquery.min.js"></script>
</head><body>
<a href="/about/">About</a>
<img src="data:image/svg+xml,%3Csvg%3E">
<script src="/app.js" async></script>
<script src="/wp-content/plugins/wp-rocket/assets/js/lazyload/17.8/lazyload.min.js"></script>
<script>window.x=function(e){e._addUserInteractionListener(e)}</script>
</body></html>"#;

    #[test]
    fn full_rewrite() {
        let mut document = Document::parse(PAGE);
        let fonts = collect_fonts(["/f/a.woff", "/f/a.woff2", "/f/b.ttf"]);
        let substitutions = Substitutions::new(Some("data:image/gif;base64,R0lG".to_string()));
        let cache = |url: &str| url == "/about/";
        let stats = Rewrite::new("Optimised by cachepress")
            .with_css("body{margin:0}")
            .with_fonts(&fonts)
            .with_substitutions(&substitutions)
            .with_cache(&cache)
            .with_preload_delay(Some(1000))
            .apply(&mut document)
            .unwrap();

        assert_eq!(
            stats,
            RewriteStats {
                stylesheets_removed: 2,
                styles_cleared: 1,
                anchors_annotated: 1,
                scripts_deferred: 1,
                images_replaced: 1,
                styles_fixed: 1,
                font_preloads: 2,
                preload_triggers: 1,
            }
        );
        let html = document.html();
        let expected_head = concat!(
            "<title>Home</title>",
            r#"<link as="font" crossorigin="" href="/f/a.woff2" rel="preload">"#,
            r#"<link as="font" crossorigin="" href="/f/b.ttf" rel="preload">"#,
            r#"<script src="/wp-content/plugins/wp-rocket/assets/js/lazyload/17.8/lazyload.min.js"></script>"#,
            "<style>body{margin:0}</style>",
        );
        assert!(html.contains(expected_head), "{html}");
        assert!(!html.contains("/style.css"));
        assert!(html.contains("<style></style>"));
        assert!(html.contains("<noscript><style>.lazy{}</style></noscript>"), "{html}");
        assert!(html.contains(r#"<a data-is-rocket-cached="1" href="/about/">"#));
        assert!(html.contains(r#"data-rocket-src="/app.js""#));
        assert!(html.contains("},1000);"));
        assert!(html.contains("<!-- Optimised by cachepress @"));
        assert_eq!(Document::parse(&html).state("Optimised by cachepress"), ProcessingState::Annotated);
    }

    #[test]
    fn missing_title_falls_back_to_head() {
        let mut document = Document::parse("<html><head><meta charset=utf-8></head><body></body></html>");
        Rewrite::new("fp").with_css("a{}").apply(&mut document).unwrap();
        let html = document.html();
        assert!(html.contains("<head><style>a{}</style><meta"), "{html}");
        assert!(html.contains("<!-- fp @"), "{html}");
    }
}
