use crate::consts::{self, CORE_LIBRARY, DISPATCHER, LAZY_SCRIPT_TYPE, LAZYLOAD_BOOTSTRAP, ROCKET_SRC_ATTRIBUTE};
use crate::document::{Document, remove_attr, set_attr};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use ego_tree::NodeId;

const INLINE_SCRIPT_PREFIX: &str = "data:text/javascript;base64,";
const DISPATCHER_CALL: &str = "e._addUserInteractionListener(e)";

#[derive(Debug, Default)]
pub(crate) struct DeferredScripts {
    pub(crate) external: usize,
    pub(crate) inline: usize,
    /// The lazy-load bootstrap, detached and waiting to be placed in the head.
    pub(crate) bootstrap: Option<NodeId>,
}

/// Hand every script except the core library and the lazy-load bootstrap to
/// the page cache's lazy loader, which runs them on first interaction.
pub(crate) fn defer(document: &mut Document) -> DeferredScripts {
    let mut deferred = DeferredScripts::default();
    // Both lists are taken up front: deferring an external script turns it into
    // something that looks like an inline one.
    let external = document.select_ids(&consts::EXTERNAL_SCRIPT_SELECTOR);
    let inline = document.select_ids(&consts::INLINE_SCRIPT_SELECTOR);

    for id in external {
        let Some(src) = document.attr(id, "src").map(str::to_string) else { continue };
        if src.contains(LAZYLOAD_BOOTSTRAP) {
            if deferred.bootstrap.is_none() {
                document.detach(id);
                deferred.bootstrap = Some(id);
            }
            continue;
        }
        if src.contains(CORE_LIBRARY) {
            continue;
        }
        document.with_element(id, |element| {
            remove_attr(element, "src");
            remove_attr(element, "async");
            set_attr(element, "defer", "defer");
            set_attr(element, "type", LAZY_SCRIPT_TYPE);
            set_attr(element, ROCKET_SRC_ATTRIBUTE, &src);
        });
        deferred.external += 1;
    }

    for id in inline {
        let is_lazy = document.attr(id, "type").is_some_and(|kind| kind.eq_ignore_ascii_case(LAZY_SCRIPT_TYPE));
        if !is_lazy {
            continue;
        }
        let body = document.text(id);
        if !body.contains("jQuery") || body.contains(DISPATCHER) {
            continue;
        }
        let source = format!("{INLINE_SCRIPT_PREFIX}{}", BASE64.encode(body.as_bytes()));
        document.with_element(id, |element| {
            remove_attr(element, "async");
            set_attr(element, "defer", "defer");
            set_attr(element, ROCKET_SRC_ATTRIBUTE, &source);
        });
        document.set_text(id, "");
        deferred.inline += 1;
    }
    deferred
}

/// Make the lazy loader fire on its own `delay` milliseconds after it starts
/// listening for interaction, unless the page installed its own readystate
/// handler.
pub(crate) fn add_preload_trigger(document: &mut Document, delay: u64) -> usize {
    let trigger = format!(
        "{DISPATCHER_CALL};setTimeout(function() {{  if(typeof(document.onreadystatechange)!=\"function\") \
         {{ e._loadEverythingNow(); e._removeUserInteractionListener();}} }},{delay});"
    );
    let mut changed = 0;
    for id in document.select_ids(&consts::INLINE_SCRIPT_SELECTOR) {
        let fixed = document.map_text(id, |text| {
            (text.contains(DISPATCHER_CALL) && !text.contains(&trigger)).then(|| text.replace(DISPATCHER_CALL, &trigger))
        });
        changed += usize::from(fixed);
    }
    changed
}
