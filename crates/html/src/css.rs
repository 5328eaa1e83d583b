//! Text-level stylesheet fixes shared by the combined stylesheet and the
//! styles left in the page.

use crate::consts::EMPTY_URL_REGEX;
use std::borrow::Cow;

/// A third-party font stylesheet (Google Fonts and the like) that the
/// renderer fetched, keyed by the URL the page imports it from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontImport {
    pub source: String,
    pub css: String,
}

/// Replace `@import url(<source>);` rules with the imported stylesheet, saving
/// the browser a blocking request.
pub fn inline_font_imports<'a>(css: &'a str, imports: &[FontImport]) -> Cow<'a, str> {
    let mut css = Cow::Borrowed(css);
    for import in imports {
        for rule in [
            format!("@import url({});", import.source),
            format!("@import url('{}');", import.source),
            format!("@import url(\"{}\");", import.source),
        ] {
            if css.contains(&rule) {
                css = Cow::Owned(css.replace(&rule, &import.css));
            }
        }
    }
    css
}

/// Remove `url('')` placeholders (and the `background:` shorthand wrapping
/// them) that lazy-loading plugins leave behind; each one is a request for
/// the page itself.
pub fn strip_empty_urls(css: &str) -> Cow<'_, str> {
    EMPTY_URL_REGEX.replace_all(css, "")
}

/// Turn `/*! ... */` comments into ordinary ones so the minifier drops them.
pub fn unpreserve_comments(css: &str) -> Cow<'_, str> {
    match css.contains("/*!") {
        true => Cow::Owned(css.replace("/*!", "/*")),
        false => Cow::Borrowed(css),
    }
}
