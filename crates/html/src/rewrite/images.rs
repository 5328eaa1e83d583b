use crate::consts;
use crate::document::{Document, set_attr};
use crate::error::{ErrorKind, Result};
use scraper::Selector;

const SVG_PLACEHOLDER: &str = "data:image/svg";

/// Image sources to swap in: a raster placeholder for the inline SVG
/// placeholders lazy loaders leave in `src`, and fixed images for elements
/// matching a selector (site logos, typically).
#[derive(Debug, Clone, Default)]
pub struct Substitutions {
    placeholder: Option<String>,
    rules: Vec<(Selector, String)>,
}

impl Substitutions {
    pub fn new(placeholder: Option<String>) -> Self {
        Self { placeholder, rules: Vec::new() }
    }

    pub fn with_selector(mut self, selector: &str, image: impl Into<String>) -> Result<Self> {
        let parsed = Selector::parse(selector).map_err(|_| ErrorKind::InvalidSelector(selector.to_string()))?;
        self.rules.push((parsed, image.into()));
        Ok(self)
    }

    pub(crate) fn apply(&self, document: &mut Document) -> usize {
        let mut replaced = 0;
        if let Some(placeholder) = &self.placeholder {
            for id in document.select_ids(&consts::IMAGE_SELECTOR) {
                if document.attr(id, "src").is_some_and(|src| src.contains(SVG_PLACEHOLDER)) {
                    document.with_element(id, |element| set_attr(element, "src", placeholder));
                    replaced += 1;
                }
            }
        }
        for (selector, image) in &self.rules {
            for id in document.select_ids(selector) {
                document.with_element(id, |element| set_attr(element, "src", image));
                replaced += 1;
            }
        }
        replaced
    }
}
