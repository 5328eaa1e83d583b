//! Font preload selection.

use crate::consts::FONT_FORMAT_REGEX;
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Web font formats, in preload priority order (best first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FontFormat {
    Woff2,
    Woff,
    Otf,
    Ttf,
}

impl FontFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            FontFormat::Woff2 => "woff2",
            FontFormat::Woff => "woff",
            FontFormat::Otf => "otf",
            FontFormat::Ttf => "ttf",
        }
    }

    fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "woff2" => Some(FontFormat::Woff2),
            "woff" => Some(FontFormat::Woff),
            "otf" => Some(FontFormat::Otf),
            "ttf" => Some(FontFormat::Ttf),
            _ => None,
        }
    }
}

impl Display for FontFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.extension())
    }
}

/// A font file, independent of format, and the formats the page loaded it in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontAsset {
    /// URL without query string or format extension.
    pub base: String,
    pub formats: Vec<FontFormat>,
}

impl FontAsset {
    /// The single format worth preloading.
    pub fn preferred(&self) -> Option<FontFormat> {
        self.formats.iter().min().copied()
    }

    pub fn preload_href(&self) -> Option<String> {
        self.preferred().map(|format| format!("{}.{format}", self.base))
    }
}

/// Group font URLs by base name, in order of first appearance.
///
/// URLs that aren't one of the known font formats are ignored.
///
/// ```
/// use cachepress_html::collect_fonts;
///
/// let fonts = collect_fonts(["/f/a.woff2", "/f/a.woff?v=3", "/f/b.ttf"]);
/// let hrefs: Vec<_> = fonts.iter().filter_map(|font| font.preload_href()).collect();
/// assert_eq!(hrefs, vec!["/f/a.woff2", "/f/b.ttf"]);
/// ```
pub fn collect_fonts<I, S>(urls: I) -> Vec<FontAsset>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut assets: Vec<FontAsset> = Vec::new();
    for url in urls {
        let url = url.as_ref().trim();
        let url = &url[..url.find(['?', '#']).unwrap_or(url.len())];
        let Some(captures) = FONT_FORMAT_REGEX.captures(url) else {
            tracing::debug!(url, "Ignoring font of unknown format");
            continue;
        };
        let Some(whole) = captures.get(0) else { continue };
        let Some(format) = captures.get(1).and_then(|m| FontFormat::from_extension(m.as_str())) else { continue };
        let base = &url[..whole.start()];
        match assets.iter_mut().find(|asset| asset.base == base) {
            Some(asset) if !asset.formats.contains(&format) => asset.formats.push(format),
            Some(_) => {},
            None => assets.push(FontAsset { base: base.to_string(), formats: vec![format] }),
        }
    }
    assets
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(&[FontFormat::Ttf, FontFormat::Woff], FontFormat::Woff)]
    #[case(&[FontFormat::Otf, FontFormat::Ttf], FontFormat::Otf)]
    #[case(&[FontFormat::Woff, FontFormat::Woff2, FontFormat::Ttf], FontFormat::Woff2)]
    fn test_preferred(#[case] formats: &[FontFormat], #[case] expected: FontFormat) {
        let asset = FontAsset { base: "/a".to_string(), formats: formats.to_vec() };
        assert_eq!(asset.preferred(), Some(expected));
    }

    #[test]
    fn one_preload_per_base_name() {
        let fonts = collect_fonts(["a.woff2", "a.woff", "b.ttf"]);
        let hrefs: Vec<_> = fonts.iter().filter_map(FontAsset::preload_href).collect();
        assert_eq!(hrefs, vec!["a.woff2", "b.ttf"]);
    }

    #[test]
    fn query_strings_and_unknown_formats() {
        let fonts = collect_fonts([
            "https://example.com/fonts/icons.TTF?ver=5.1",
            "https://example.com/fonts/icons.ttf#iefix",
            "https://example.com/fonts/icons.svg",
            "https://example.com/fonts/icons.eot?#iefix",
        ]);
        assert_eq!(
            fonts,
            vec![FontAsset { base: "https://example.com/fonts/icons".to_string(), formats: vec![FontFormat::Ttf] }]
        );
    }
}
