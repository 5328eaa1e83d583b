use crate::consts;
use crate::css::{FontImport, inline_font_imports, strip_empty_urls};
use crate::document::{Document, set_attr};
use std::borrow::Cow;

/// Remove stylesheet links, including the ones already folded into the
/// combined stylesheet.
pub(crate) fn remove_stylesheets(document: &mut Document) -> usize {
    let links: Vec<_> = document
        .select_ids(&consts::STYLESHEET_SELECTOR)
        .into_iter()
        .filter(|&id| {
            document.attr(id, "rel").is_some_and(|rel| {
                rel.eq_ignore_ascii_case("stylesheet") || rel.eq_ignore_ascii_case(consts::TOMBSTONE_REL)
            })
        })
        .collect();
    for &id in &links {
        document.detach(id);
    }
    links.len()
}

/// Empty every `<style>` that isn't a noscript fallback.
pub(crate) fn clear_inline(document: &mut Document) -> usize {
    let mut cleared = 0;
    for id in document.select_ids(&consts::STYLE_SELECTOR) {
        if !document.is_noscript(id) {
            document.set_text(id, "");
            cleared += 1;
        }
    }
    cleared
}

/// Inline captured font imports and drop empty `url('')` placeholders in the
/// style text that survives (noscript fallbacks). Placeholders in `style`
/// attributes go too.
pub(crate) fn fix_remaining(document: &mut Document, imports: &[FontImport]) -> usize {
    let mut targets = document.select_ids(&consts::STYLE_SELECTOR);
    targets.extend(document.select_ids(&consts::NOSCRIPT_SELECTOR));
    let mut changed = 0;
    for id in targets {
        let fixed = document.map_text(id, |text| {
            let inlined = inline_font_imports(text, imports);
            let stripped = strip_empty_urls(&inlined);
            (stripped != text).then(|| stripped.into_owned())
        });
        changed += usize::from(fixed);
    }
    for id in document.select_ids(&consts::STYLE_ATTRIBUTE_SELECTOR) {
        let fixed = document.with_element(id, |element| {
            let Some(style) = element.attr("style") else {
                return false;
            };
            let stripped = match strip_empty_urls(style) {
                Cow::Owned(stripped) => stripped,
                Cow::Borrowed(_) => return false,
            };
            set_attr(element, "style", stripped.trim());
            true
        });
        changed += usize::from(fixed.unwrap_or(false));
    }
    changed
}
