//! Viewport-intersection watcher seam.
//!
//! The observer talks to the watcher through the [`IntersectionWatcher`]
//! trait so the runtime facility stays swappable; [`ViewportWatcher`] is the
//! in-memory implementation with a deterministic sweep harness used by tests
//! and the CLI simulation.

use std::collections::{HashMap, HashSet};

use crate::dom::NodeId;
use crate::Viewport;

/// Bounding box of an element in page coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Visibility signal reported for an element.
///
/// Watcher implementations across runtimes expose either a boolean
/// "is intersecting" flag or a numeric visible-area ratio; both are accepted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IntersectionSignal {
    Intersecting(bool),
    Ratio(f32),
}

/// One watcher notification: a target element and its visibility signal.
#[derive(Debug, Clone, PartialEq)]
pub struct IntersectionEntry {
    pub target: NodeId,
    pub signal: IntersectionSignal,
}

/// Subscription registry plus threshold policy.
///
/// `observe`/`unobserve` are idempotent: an element holds at most one active
/// subscription, and unsubscribing an element that was never subscribed is
/// safe.
pub trait IntersectionWatcher {
    /// Subscribe an element. Observing an already-observed element is a no-op.
    fn observe(&mut self, target: NodeId);

    /// Cancel an element's subscription, if any.
    fn unobserve(&mut self, target: NodeId);

    /// Whether the element currently holds a subscription.
    fn is_observed(&self, target: NodeId) -> bool;

    /// Number of active subscriptions.
    fn observed_count(&self) -> usize;

    /// Whether a signal clears the configured threshold.
    fn crossed(&self, signal: &IntersectionSignal) -> bool;

    /// Deterministic notification batch for a simulated scroll position.
    ///
    /// Implementations without a geometry model report nothing; real
    /// runtimes deliver entries through their own callback machinery
    /// instead.
    fn sweep(
        &self,
        layout: &HashMap<NodeId, Rect>,
        viewport: Viewport,
        scroll_y: i32,
    ) -> Vec<IntersectionEntry> {
        let _ = (layout, viewport, scroll_y);
        Vec::new()
    }
}

/// In-memory watcher with a fixed pre-fetch margin and ratio threshold.
pub struct ViewportWatcher {
    margin_px: u32,
    threshold: f32,
    subscriptions: HashSet<NodeId>,
}

impl ViewportWatcher {
    pub fn new(margin_px: u32, threshold: f32) -> Self {
        ViewportWatcher {
            margin_px,
            threshold,
            subscriptions: HashSet::new(),
        }
    }
}

impl IntersectionWatcher for ViewportWatcher {
    fn observe(&mut self, target: NodeId) {
        self.subscriptions.insert(target);
    }

    fn unobserve(&mut self, target: NodeId) {
        self.subscriptions.remove(&target);
    }

    fn is_observed(&self, target: NodeId) -> bool {
        self.subscriptions.contains(&target)
    }

    fn observed_count(&self) -> usize {
        self.subscriptions.len()
    }

    fn crossed(&self, signal: &IntersectionSignal) -> bool {
        match signal {
            IntersectionSignal::Intersecting(flag) => *flag,
            IntersectionSignal::Ratio(ratio) => *ratio >= self.threshold,
        }
    }

    /// `layout` maps elements to their page-coordinate boxes; elements
    /// without a box never intersect. The viewport band is expanded by the
    /// pre-fetch margin on both edges (vertical-scroll model). Only
    /// subscribed elements with a non-zero visible ratio are reported, in
    /// ascending node order so batches are reproducible.
    fn sweep(
        &self,
        layout: &HashMap<NodeId, Rect>,
        viewport: Viewport,
        scroll_y: i32,
    ) -> Vec<IntersectionEntry> {
        let top = scroll_y - self.margin_px as i32;
        let bottom = scroll_y + viewport.height as i32 + self.margin_px as i32;

        let mut targets: Vec<NodeId> = self.subscriptions.iter().copied().collect();
        targets.sort();

        let mut entries = Vec::new();
        for target in targets {
            let rect = match layout.get(&target) {
                Some(r) => r,
                None => continue,
            };
            let ratio = visible_ratio(rect, top, bottom);
            if ratio > 0.0 {
                entries.push(IntersectionEntry {
                    target,
                    signal: IntersectionSignal::Ratio(ratio),
                });
            }
        }
        entries
    }
}

/// Fraction of `rect`'s height inside the `[top, bottom)` band.
/// Zero-height boxes count as fully visible while inside the band.
fn visible_ratio(rect: &Rect, top: i32, bottom: i32) -> f32 {
    let r_top = rect.y;
    let r_bottom = rect.y + rect.height as i32;
    if rect.height == 0 {
        return if r_top >= top && r_top <= bottom { 1.0 } else { 0.0 };
    }
    let overlap = r_bottom.min(bottom) - r_top.max(top);
    if overlap <= 0 {
        return 0.0;
    }
    (overlap as f32 / rect.height as f32).min(1.0)
}
