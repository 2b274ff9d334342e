//! Markup transform: rewrite image elements into their lazy-loadable form.
//!
//! This is the producer side of the attribute contract the observer
//! consumes: real attributes move behind the deferred prefix, the marker
//! class is added, an optional placeholder URI takes over `src`, and a
//! `<noscript>` clone of the untouched element is inserted as the
//! no-JavaScript fallback.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::dom::{DomTree, NodeId};
use crate::LoaderConfig;

/// Options for [`lazify`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformOptions {
    /// Attribute names to move behind the deferred prefix.
    pub deferred_attrs: Vec<String>,
    /// Placeholder URI set as the `src` of deferred `<img>` elements
    /// (typically a pre-encoded `data:` URI). Passed through verbatim.
    pub placeholder: Option<String>,
    /// Whether to insert a `<noscript>` fallback after each rewritten
    /// element.
    pub noscript_fallback: bool,
}

impl Default for TransformOptions {
    fn default() -> Self {
        TransformOptions {
            deferred_attrs: vec!["src".to_string(), "srcset".to_string(), "sizes".to_string()],
            placeholder: None,
            noscript_fallback: true,
        }
    }
}

/// Rewrite every candidate image under `root` into lazy form.
///
/// Candidates are `<picture>` containers (rewritten as a unit, marker on the
/// container only) and `<img>` elements outside any `<picture>`. Elements
/// already carrying the marker or loaded class are left alone, as is
/// anything inside `<noscript>`, so running the transform twice changes
/// nothing. Returns the number of elements rewritten.
pub fn lazify(
    dom: &mut DomTree,
    root: NodeId,
    config: &LoaderConfig,
    options: &TransformOptions,
) -> usize {
    let candidates: Vec<NodeId> = dom
        .descendants(root)
        .into_iter()
        .filter(|&n| is_candidate(dom, n, root, config))
        .collect();

    for &target in &candidates {
        let fallback = if options.noscript_fallback {
            Some(dom.clone_subtree(target))
        } else {
            None
        };

        if dom.tag_name(target) == Some("picture") {
            let children = dom.children(target).to_vec();
            for child in children {
                if dom.tag_name(child).is_none() {
                    continue;
                }
                defer_attributes(dom, child, config, options);
                if dom.tag_name(child) == Some("img") {
                    apply_placeholder(dom, child, options);
                }
            }
        } else {
            defer_attributes(dom, target, config, options);
            apply_placeholder(dom, target, options);
        }
        dom.add_class(target, &config.marker_class);

        if let Some(clone) = fallback {
            let noscript = dom.create_element("noscript");
            dom.append_child(noscript, clone);
            dom.insert_after(target, noscript);
        }
    }

    debug!("lazify: rewrote {} element(s)", candidates.len());
    candidates.len()
}

fn is_candidate(dom: &DomTree, id: NodeId, root: NodeId, config: &LoaderConfig) -> bool {
    let tag = match dom.tag_name(id) {
        Some(t) => t,
        None => return false,
    };
    let image_like = match tag {
        "picture" => true,
        // An <img> inside <picture> is rewritten with its container.
        "img" => !has_ancestor(dom, id, "picture", root),
        _ => return false,
    };
    image_like
        && !has_ancestor(dom, id, "noscript", root)
        && !dom.has_class(id, &config.marker_class)
        && !dom.has_class(id, &config.loaded_class)
}

fn has_ancestor(dom: &DomTree, id: NodeId, tag: &str, root: NodeId) -> bool {
    let mut cursor = dom.parent(id);
    while let Some(node) = cursor {
        if dom.tag_name(node) == Some(tag) {
            return true;
        }
        if node == root {
            break;
        }
        cursor = dom.parent(node);
    }
    false
}

/// Move each configured attribute behind the deferred prefix, removing the
/// original so the browser does not fetch eagerly.
fn defer_attributes(dom: &mut DomTree, id: NodeId, config: &LoaderConfig, options: &TransformOptions) {
    for name in &options.deferred_attrs {
        if let Some(value) = dom.remove_attr(id, name) {
            let deferred = format!("{}{}", config.deferred_prefix, name);
            dom.set_attr(id, &deferred, &value);
        }
    }
}

fn apply_placeholder(dom: &mut DomTree, id: NodeId, options: &TransformOptions) {
    if let Some(placeholder) = &options.placeholder {
        dom.set_attr(id, "src", placeholder);
    }
}
