//! The lazy-load observer: scan subtrees for deferred images, watch them,
//! and promote their attributes as they near the viewport.
//!
//! Per candidate element the lifecycle is `unmarked -> registered ->
//! promoted`, never backward. Elements are selected fresh on every scan (the
//! subtree may have changed between calls), registered with the watcher at
//! most once, and promoted at most once. Without watcher capability the
//! whole feature degrades to eager loading: every candidate found by a scan
//! is promoted synchronously before `attach` returns.

use std::collections::HashMap;

use log::debug;

use crate::dom::{DomTree, NodeId};
use crate::watcher::{IntersectionEntry, IntersectionWatcher, Rect, ViewportWatcher};
use crate::{LoaderConfig, Result, Viewport};

/// Why the host is detaching a subtree.
///
/// Only `Unload` (the subtree is being permanently removed from the
/// document) releases subscriptions; every other reason is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetachReason {
    Unload,
    Move,
    Serialize,
}

/// The lazy-load observer.
///
/// Owns the intersection watcher for its lifetime; `None` means the runtime
/// lacks intersection-observation capability and the fallback path applies.
pub struct LazyLoader {
    config: LoaderConfig,
    watcher: Option<Box<dyn IntersectionWatcher>>,
}

impl LazyLoader {
    /// Build a loader from configuration, constructing the default
    /// [`ViewportWatcher`] when the capability flag is set.
    pub fn new(config: LoaderConfig) -> Result<Self> {
        config.validate()?;
        let watcher: Option<Box<dyn IntersectionWatcher>> = if config.observe_supported {
            Some(Box::new(ViewportWatcher::new(
                config.root_margin_px,
                config.threshold,
            )))
        } else {
            None
        };
        Ok(LazyLoader { config, watcher })
    }

    /// Build a loader around a caller-supplied watcher implementation.
    pub fn with_watcher(config: LoaderConfig, watcher: Box<dyn IntersectionWatcher>) -> Result<Self> {
        config.validate()?;
        Ok(LazyLoader {
            config,
            watcher: Some(watcher),
        })
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Whether the element currently holds a watcher subscription.
    pub fn is_registered(&self, target: NodeId) -> bool {
        self.watcher
            .as_ref()
            .map(|w| w.is_observed(target))
            .unwrap_or(false)
    }

    /// Number of elements currently registered with the watcher.
    pub fn registered_count(&self) -> usize {
        self.watcher.as_ref().map(|w| w.observed_count()).unwrap_or(0)
    }

    /// Deterministic notification batch for a simulated scroll position;
    /// empty in fallback mode. Feed the result to [`Self::on_intersect`].
    pub fn sweep(
        &self,
        layout: &HashMap<NodeId, Rect>,
        viewport: Viewport,
        scroll_y: i32,
    ) -> Vec<IntersectionEntry> {
        self.watcher
            .as_ref()
            .map(|w| w.sweep(layout, viewport, scroll_y))
            .unwrap_or_default()
    }

    /// Scan `root`'s subtree for unprocessed candidates and register each
    /// with the watcher, or promote each immediately when there is no
    /// watcher capability.
    ///
    /// Safe to call repeatedly on overlapping subtrees: already-promoted
    /// elements are excluded by the loaded-class check and registration is
    /// at-most-once per element.
    pub fn attach(&mut self, dom: &mut DomTree, root: NodeId) {
        let candidates = self.unprocessed(dom, root);
        if let Some(watcher) = self.watcher.as_mut() {
            for &target in &candidates {
                watcher.observe(target);
            }
            debug!("attach: {} candidate(s) registered", candidates.len());
        } else {
            for &target in &candidates {
                self.promote(dom, target);
            }
            debug!("attach: promoted {} candidate(s) eagerly", candidates.len());
        }
    }

    /// Release watcher subscriptions for a subtree being removed from the
    /// document. Reasons other than [`DetachReason::Unload`] are ignored.
    pub fn detach(&mut self, dom: &DomTree, root: NodeId, reason: DetachReason) {
        if reason != DetachReason::Unload {
            return;
        }
        let candidates = self.unprocessed(dom, root);
        if let Some(watcher) = self.watcher.as_mut() {
            for &target in &candidates {
                watcher.unobserve(target);
            }
            debug!("detach: released {} subscription(s)", candidates.len());
        }
    }

    /// Process a watcher notification batch.
    ///
    /// Each entry whose signal clears the threshold and whose target is
    /// still subscribed is unsubscribed first, then promoted. Entries for
    /// unsubscribed targets (torn down, or promoted earlier in the batch)
    /// are ignored. A no-op in fallback mode, where nothing is ever
    /// registered.
    pub fn on_intersect(&mut self, dom: &mut DomTree, entries: &[IntersectionEntry]) {
        let due = match self.watcher.as_mut() {
            Some(watcher) => {
                let mut due = Vec::new();
                for entry in entries {
                    if !watcher.is_observed(entry.target) || !watcher.crossed(&entry.signal) {
                        continue;
                    }
                    watcher.unobserve(entry.target);
                    due.push(entry.target);
                }
                due
            }
            None => return,
        };
        for target in due {
            self.promote(dom, target);
        }
    }

    /// Fresh selection of marker-class elements not yet carrying the loaded
    /// class, in document order.
    fn unprocessed(&self, dom: &DomTree, root: NodeId) -> Vec<NodeId> {
        dom.descendants(root)
            .into_iter()
            .filter(|&n| {
                dom.has_class(n, &self.config.marker_class)
                    && !dom.has_class(n, &self.config.loaded_class)
            })
            .collect()
    }

    /// Promote an element: copy deferred attributes live and mark it loaded.
    ///
    /// A `<picture>` container is the unit of promotion: every element child
    /// gets its attributes copied, the loaded class goes on the container
    /// only. Promoting an already-loaded element is a no-op.
    fn promote(&self, dom: &mut DomTree, id: NodeId) {
        if dom.has_class(id, &self.config.loaded_class) {
            return;
        }
        if dom.tag_name(id) == Some("picture") {
            let children = dom.children(id).to_vec();
            for child in children {
                if dom.tag_name(child).is_some() {
                    self.copy_deferred(dom, child);
                }
            }
        } else {
            self.copy_deferred(dom, id);
        }
        dom.add_class(id, &self.config.loaded_class);
    }

    /// Apply every `<prefix><name>` attribute as `<name>` with the same
    /// value, working from a snapshot of the attribute list.
    fn copy_deferred(&self, dom: &mut DomTree, id: NodeId) {
        for (name, value) in dom.attrs(id) {
            if let Some(real) = name.strip_prefix(self.config.deferred_prefix.as_str()) {
                if !real.is_empty() {
                    dom.set_attr(id, real, &value);
                }
            }
        }
    }
}
