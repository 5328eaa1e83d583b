use regex::Regex;
use scraper::Selector;
use std::sync::LazyLock;

macro_rules! selector {
    ($name:ident, $css:expr) => {
        pub(crate) static $name: LazyLock<Selector> = LazyLock::new(|| Selector::parse($css).unwrap());
    };
}

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        pub(crate) static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

/// Lazy-load type the page cache gives to scripts it delays until interaction.
pub(crate) const LAZY_SCRIPT_TYPE: &str = "rocketlazyloadscript";
/// Script that dispatches the delayed scripts; never deferred itself.
pub(crate) const DISPATCHER: &str = "RocketLazyLoadScripts";
/// Core library that later inline scripts depend on synchronously.
pub(crate) const CORE_LIBRARY: &str = "jquery.min.js";
/// The lazy-load bootstrap, hoisted into the head.
pub(crate) const LAZYLOAD_BOOTSTRAP: &str = "lazyload.min.js";
pub(crate) const CACHED_ATTRIBUTE: &str = "data-is-rocket-cached";
pub(crate) const ROCKET_SRC_ATTRIBUTE: &str = "data-rocket-src";
/// Replacement `rel` marking a stylesheet link whose content has been collected.
pub(crate) const TOMBSTONE_REL: &str = "to_compress";
pub(crate) const NOT_FOUND_MARKER: &str = "Error 404";

selector!(TITLE_SELECTOR, "title");
selector!(HEAD_SELECTOR, "head");
selector!(STYLE_SELECTOR, "style");
selector!(STYLE_ATTRIBUTE_SELECTOR, "[style]");
selector!(NOSCRIPT_SELECTOR, "noscript");
selector!(STYLESHEET_SELECTOR, "link[rel]");
selector!(CSS_SOURCE_SELECTOR, "style, link[rel]");
selector!(ANCHOR_SELECTOR, "a[href]");
selector!(ANNOTATED_ANCHOR_SELECTOR, "a[data-is-rocket-cached]");
selector!(EXTERNAL_SCRIPT_SELECTOR, "script[src]");
selector!(INLINE_SCRIPT_SELECTOR, "script:not([src])");
selector!(IMAGE_SELECTOR, "img[src]");

regex!(EMPTY_URL_REGEX, r#"(?:background\s*:\s*)?url\(\s*(?:''|"")\s*\)"#);
regex!(FONT_FORMAT_REGEX, r"(?i)\.(woff2|woff|ttf|otf)$");
