use crate::purge::PurgeFragment;
use cachepress_html::FontImport;
use cachepress_html::css::{inline_font_imports, strip_empty_urls, unpreserve_comments};
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use std::path::Path;

/// Minify a stylesheet. `None` when it doesn't parse.
pub fn minify_css(source: &str) -> Option<String> {
    let options = ParserOptions { error_recovery: true, ..ParserOptions::default() };
    let mut stylesheet = StyleSheet::parse(source, options).ok()?;
    stylesheet.minify(MinifyOptions::default()).ok()?;
    let result = stylesheet.to_css(PrinterOptions { minify: true, ..PrinterOptions::default() }).ok()?;
    Some(result.code)
}

/// Read the curated stylesheet appended to every page. A missing or
/// unreadable file is logged and treated as empty.
pub fn load_supplemental(path: &Path) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(css) => Some(css),
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "Supplemental stylesheet not loaded");
            None
        },
    }
}

/// The critical stylesheet for one page, assembled from the purge output,
/// the renderer's sizing hints and the curated supplemental stylesheet.
#[derive(Debug, Clone, Default)]
pub struct CombinedCss {
    fragments: Vec<String>,
    intrinsic: Option<String>,
    supplemental: Option<String>,
}

impl CombinedCss {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fragments(mut self, fragments: impl IntoIterator<Item = PurgeFragment>) -> Self {
        self.fragments.extend(fragments.into_iter().map(|fragment| fragment.css));
        self
    }

    pub fn with_intrinsic(mut self, css: Option<String>) -> Self {
        self.intrinsic = css;
        self
    }

    pub fn with_supplemental(mut self, css: Option<&str>) -> Self {
        self.supplemental = css.map(str::to_string);
        self
    }

    /// Concatenate (fragments, then sizing hints, then supplemental), inline
    /// the captured font imports and minify.
    pub fn finish(&self, imports: &[FontImport]) -> String {
        let combined: String =
            self.fragments.iter().chain(&self.intrinsic).chain(&self.supplemental).map(String::as_str).collect();
        let combined = unpreserve_comments(&combined);
        let combined = inline_font_imports(&combined, imports);
        let combined = strip_empty_urls(&combined);
        match minify_css(&combined) {
            Some(minified) => minified,
            None => {
                tracing::warn!(size = combined.len(), "Minifier rejected the combined stylesheet; inlining it as is");
                combined.into_owned()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragment(css: &str) -> PurgeFragment {
        PurgeFragment { file: "/tmp/all.css".to_string(), css: css.to_string() }
    }

    #[test]
    fn minifies() {
        assert_eq!(minify_css("body {\n  color: #ff0000;\n}\n").as_deref(), Some("body{color:red}"));
    }

    #[test]
    fn order_and_cleanup() {
        let css = CombinedCss::new()
            .with_fragments([fragment("/*! keep? */ h1 { margin: 0 }"), fragment(".a { background: url( '' ) }")])
            .with_intrinsic(Some("section { content-visibility: auto }".to_string()))
            .with_supplemental(Some(".b { color: blue }"))
            .finish(&[]);
        assert!(!css.contains("keep?"), "{css}");
        assert!(!css.contains("url("), "{css}");
        let h1 = css.find("h1").unwrap();
        let section = css.find("section").unwrap();
        let b = css.find(".b").unwrap();
        assert!(h1 < section && section < b, "{css}");
    }

    #[test]
    fn font_imports_are_inlined() {
        let imports = [FontImport {
            source: "https://fonts.googleapis.com/css?family=Lato".to_string(),
            css: "@font-face{font-family:Lato}".to_string(),
        }];
        let css = CombinedCss::new()
            .with_fragments([fragment("@import url(https://fonts.googleapis.com/css?family=Lato);p{color:red}")])
            .finish(&imports);
        assert!(css.contains("@font-face{font-family:Lato}"), "{css}");
        assert!(!css.contains("@import"), "{css}");
    }

    #[test]
    fn missing_supplemental_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load_supplemental(&dir.path().join("missing.css")), None);
        std::fs::write(dir.path().join("extra.css"), ".x{}").unwrap();
        assert_eq!(load_supplemental(&dir.path().join("extra.css")).as_deref(), Some(".x{}"));
    }
}
