//! Parsed cached page.
//!
//! Wraps a `scraper` document and adds the handful of tree mutations the
//! rewrite passes need. Nodes are always collected by id first and mutated
//! afterwards, so a selection never observes its own edits.

use crate::consts;
use ego_tree::NodeId;
use html5ever::serialize::{SerializeOpts, TraversalScope, serialize};
use html5ever::tendril::StrTendril;
use html5ever::{LocalName, Namespace, QualName};
use scraper::node::{Comment, Element, Text};
use scraper::{ElementRef, Html, Node, Selector};

/// How far a cached page has already been through the optimiser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingState {
    /// No footprint: the page still has its original stylesheets.
    Unprocessed,
    /// Footprint present, but no anchors annotated yet.
    Optimized,
    /// Footprint present and at least one anchor carries the cache-status attribute.
    Annotated,
}

impl ProcessingState {
    pub fn is_processed(&self) -> bool {
        !matches!(self, ProcessingState::Unprocessed)
    }
}

#[derive(Debug)]
pub struct Document {
    html: Html,
}

impl Document {
    pub fn parse(html: &str) -> Self {
        Self { html: Html::parse_document(html) }
    }

    /// Serialize the whole document, doctype included.
    ///
    /// Pages are parsed with scripting enabled, so `<noscript>` content is raw
    /// text and has to be written back unescaped.
    pub fn html(&self) -> String {
        let opts = SerializeOpts {
            scripting_enabled: true,
            traversal_scope: TraversalScope::IncludeNode,
            create_missing_parent: false,
        };
        let mut buffer = Vec::new();
        if let Err(err) = serialize(&mut buffer, &self.html, opts) {
            // Whatever was written is incomplete and fails validation.
            tracing::error!(%err, "Could not serialize document");
        }
        String::from_utf8_lossy(&buffer).into_owned()
    }

    /// Determine the processing state from the parsed tree.
    ///
    /// The footprint is recognised as a comment node whose text starts with
    /// `footprint`; the same words in visible text or an attribute don't count.
    pub fn state(&self, footprint: &str) -> ProcessingState {
        let footprint = footprint.trim();
        let has_footprint = self.html.tree.nodes().any(|node| match node.value() {
            Node::Comment(comment) => comment.comment.trim_start().starts_with(footprint),
            _ => false,
        });
        if !has_footprint {
            return ProcessingState::Unprocessed;
        }
        match self.html.select(&consts::ANNOTATED_ANCHOR_SELECTOR).next() {
            Some(_) => ProcessingState::Annotated,
            None => ProcessingState::Optimized,
        }
    }

    pub(crate) fn select_ids(&self, selector: &Selector) -> Vec<NodeId> {
        self.html.select(selector).map(|element| element.id()).collect()
    }

    pub(crate) fn element(&self, id: NodeId) -> Option<&Element> {
        self.html.tree.get(id)?.value().as_element()
    }

    pub(crate) fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)?.attr(name)
    }

    pub(crate) fn with_element<R>(&mut self, id: NodeId, f: impl FnOnce(&mut Element) -> R) -> Option<R> {
        let mut node = self.html.tree.get_mut(id)?;
        match node.value() {
            Node::Element(element) => Some(f(element)),
            _ => None,
        }
    }

    /// Concatenated text of every descendant text node.
    pub(crate) fn text(&self, id: NodeId) -> String {
        self.html
            .tree
            .get(id)
            .and_then(ElementRef::wrap)
            .map(|element| element.text().collect())
            .unwrap_or_default()
    }

    /// Replace all children of `id` with a single text node (or nothing).
    pub(crate) fn set_text(&mut self, id: NodeId, text: &str) {
        let children: Vec<NodeId> = match self.html.tree.get(id) {
            Some(node) => node.children().map(|child| child.id()).collect(),
            None => return,
        };
        for child in children {
            self.detach(child);
        }
        if !text.is_empty()
            && let Some(mut node) = self.html.tree.get_mut(id)
        {
            node.append(Node::Text(Text { text: StrTendril::from_slice(text) }));
        }
    }

    /// Rewrite every text node directly below `id` in place.
    pub(crate) fn map_text(&mut self, id: NodeId, mut f: impl FnMut(&str) -> Option<String>) -> bool {
        let children: Vec<NodeId> = match self.html.tree.get(id) {
            Some(node) => node.children().map(|child| child.id()).collect(),
            None => return false,
        };
        let mut changed = false;
        for child in children {
            if let Some(mut node) = self.html.tree.get_mut(child)
                && let Node::Text(text) = node.value()
                && let Some(replacement) = f(&text.text)
            {
                text.text = StrTendril::from_slice(&replacement);
                changed = true;
            }
        }
        changed
    }

    pub(crate) fn detach(&mut self, id: NodeId) {
        if let Some(mut node) = self.html.tree.get_mut(id) {
            node.detach();
        }
    }

    /// Move `nodes` (in order) to directly after `anchor`.
    pub(crate) fn insert_after(&mut self, anchor: NodeId, nodes: &[NodeId]) {
        let mut previous = anchor;
        for &id in nodes {
            if let Some(mut node) = self.html.tree.get_mut(previous) {
                node.insert_id_after(id);
                previous = id;
            }
        }
    }

    /// Move `nodes` (in order) to the start of `parent`.
    pub(crate) fn prepend(&mut self, parent: NodeId, nodes: &[NodeId]) {
        for &id in nodes.iter().rev() {
            if let Some(mut node) = self.html.tree.get_mut(parent) {
                node.prepend_id(id);
            }
        }
    }

    /// Create a detached element with the given attributes and text.
    ///
    /// `tag` must be an element that may appear in a document body.
    pub(crate) fn create_element(&mut self, tag: &str, attrs: &[(&str, &str)], text: &str) -> Option<NodeId> {
        let fragment = Html::parse_fragment(&format!("<{tag}></{tag}>"));
        let mut element = fragment
            .tree
            .nodes()
            .filter_map(|node| node.value().as_element())
            .find(|element| element.name() == tag)?
            .clone();
        for (name, value) in attrs {
            set_attr(&mut element, name, value);
        }
        let mut node = self.html.tree.orphan(Node::Element(element));
        if !text.is_empty() {
            node.append(Node::Text(Text { text: StrTendril::from_slice(text) }));
        }
        Some(node.id())
    }

    /// Append a comment after everything else in the document.
    pub(crate) fn append_comment(&mut self, text: &str) {
        self.html.tree.root_mut().append(Node::Comment(Comment { comment: StrTendril::from_slice(text) }));
    }

    /// Styles inside `<noscript>`, or tagged `rel="noscript"`, are the page's
    /// fallback for visitors without JavaScript and are never touched.
    pub(crate) fn is_noscript(&self, id: NodeId) -> bool {
        if self.attr(id, "rel").is_some_and(|rel| rel.eq_ignore_ascii_case("noscript")) {
            return true;
        }
        self.html.tree.get(id).is_some_and(|node| {
            node.ancestors()
                .filter_map(|ancestor| ancestor.value().as_element())
                .any(|element| element.name() == "noscript")
        })
    }

    /// The `<title>` element, where everything hoisted into the head goes.
    pub(crate) fn title(&self) -> Option<NodeId> {
        self.select_ids(&consts::TITLE_SELECTOR).into_iter().next()
    }

    pub(crate) fn head(&self) -> Option<NodeId> {
        self.select_ids(&consts::HEAD_SELECTOR).into_iter().next()
    }
}

fn attribute_name(name: &str) -> QualName {
    QualName::new(None, Namespace::from(""), LocalName::from(name))
}

/// Set an attribute, keeping the attribute list in the sorted order `scraper`
/// relies on for lookups.
pub(crate) fn set_attr(element: &mut Element, name: &str, value: &str) {
    let name = attribute_name(name);
    let value = StrTendril::from_slice(value);
    match element.attrs.iter_mut().find(|(key, _)| *key == name) {
        Some((_, existing)) => *existing = value,
        None => {
            let position = element.attrs.partition_point(|(key, _)| *key < name);
            element.attrs.insert(position, (name, value));
        },
    }
}

pub(crate) fn remove_attr(element: &mut Element, name: &str) -> bool {
    let name = attribute_name(name);
    let before = element.attrs.len();
    element.attrs.retain(|(key, _)| *key != name);
    element.attrs.len() != before
}
