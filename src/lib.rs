//! Lazy Image Engine
//!
//! A lazy-image loading engine for DOM pipelines that defers below-the-fold
//! images until they approach the viewport.
//!
//! # Features
//!
//! - **Markup transform**: rewrites `<img>`/`<picture>` markup into a
//!   deferred form with a `<noscript>` fallback and optional placeholder
//! - **Intersection-driven observer**: registers deferred elements with a
//!   viewport watcher and promotes their attributes as they near the
//!   viewport
//! - **Graceful degradation**: without watcher capability the observer
//!   promotes eagerly, so pages still load every image
//!
//! # Example
//!
//! ```
//! use lazyimg::{DomTree, LazyLoader, LoaderConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut dom = DomTree::parse_fragment(
//!     "<img class=\"lazyload\" data-lazy-src=\"/hero.png\">",
//! );
//!
//! // No watcher capability: attach promotes synchronously.
//! let config = LoaderConfig { observe_supported: false, ..Default::default() };
//! let mut loader = LazyLoader::new(config)?;
//! let root = dom.root();
//! loader.attach(&mut dom, root);
//!
//! assert!(dom.to_html().contains("src=\"/hero.png\""));
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};

pub mod error;
pub use error::{Error, Result};

pub mod dom;
pub mod markup;
pub mod observer;
pub mod watcher;

pub use dom::{DomTree, NodeId};
pub use markup::{lazify, TransformOptions};
pub use observer::{DetachReason, LazyLoader};
pub use watcher::{
    IntersectionEntry, IntersectionSignal, IntersectionWatcher, Rect, ViewportWatcher,
};

/// Configuration for the lazy loader.
///
/// The defaults follow the current markup contract: marker class `lazyload`,
/// loaded class `is-loaded`, deferred prefix `data-lazy-`, a 20px pre-fetch
/// margin and a 0.2 intersection threshold. Earlier markup revisions used
/// `js-lazy-image` with bare `data-` attributes; deployments on that contract
/// set `marker_class` and `deferred_prefix` accordingly.
///
/// # Examples
///
/// ```
/// let cfg = lazyimg::LoaderConfig::default();
/// assert_eq!(cfg.marker_class, "lazyload");
/// assert!(cfg.observe_supported);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Class marking an element as a lazy-load candidate
    pub marker_class: String,
    /// Class marking an element as promoted; excluded from future scans
    pub loaded_class: String,
    /// Attribute-name prefix hiding deferred attributes until promotion
    pub deferred_prefix: String,
    /// Pre-fetch margin: elements start loading this many pixels before
    /// they scroll into view
    pub root_margin_px: u32,
    /// Minimum visible-area ratio before a ratio signal counts as
    /// intersecting (boolean signals are taken as-is)
    pub threshold: f32,
    /// Whether the runtime offers intersection observation; when false the
    /// observer promotes eagerly on attach
    pub observe_supported: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            marker_class: "lazyload".to_string(),
            loaded_class: "is-loaded".to_string(),
            deferred_prefix: "data-lazy-".to_string(),
            root_margin_px: 20,
            threshold: 0.2,
            observe_supported: true,
        }
    }
}

impl LoaderConfig {
    /// Check the configuration for values the scan and promotion routines
    /// cannot work with.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("marker_class", &self.marker_class),
            ("loaded_class", &self.loaded_class),
        ] {
            if value.is_empty() || value.chars().any(|c| c.is_whitespace()) {
                return Err(Error::ConfigError(format!(
                    "{} must be a single non-empty class token, got {:?}",
                    field, value
                )));
            }
        }
        if self.marker_class == self.loaded_class {
            return Err(Error::ConfigError(
                "marker_class and loaded_class must differ".to_string(),
            ));
        }
        if self.deferred_prefix.is_empty() || self.deferred_prefix.chars().any(|c| c.is_whitespace()) {
            return Err(Error::ConfigError(format!(
                "deferred_prefix must be non-empty without whitespace, got {:?}",
                self.deferred_prefix
            )));
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(Error::ConfigError(format!(
                "threshold must be within 0.0..=1.0, got {}",
                self.threshold
            )));
        }
        Ok(())
    }
}

/// Viewport dimensions
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

/// Create a loader with the default watcher selection for the configuration.
pub fn new_loader(config: LoaderConfig) -> Result<LazyLoader> {
    LazyLoader::new(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LoaderConfig::default();
        assert_eq!(config.marker_class, "lazyload");
        assert_eq!(config.loaded_class, "is-loaded");
        assert_eq!(config.deferred_prefix, "data-lazy-");
        assert_eq!(config.root_margin_px, 20);
        assert!(config.observe_supported);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let config = LoaderConfig {
            threshold: 1.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = LoaderConfig {
            marker_class: "two words".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = LoaderConfig {
            loaded_class: "lazyload".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = LoaderConfig {
            deferred_prefix: String::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_viewport() {
        let viewport = Viewport::default();
        assert_eq!(viewport.width, 1280);
        assert_eq!(viewport.height, 720);
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = LoaderConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: LoaderConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.marker_class, config.marker_class);
        assert_eq!(back.threshold, config.threshold);

        // Partial configs fall back to defaults per field.
        let partial: LoaderConfig =
            serde_json::from_str("{\"marker_class\": \"js-lazy-image\"}").unwrap();
        assert_eq!(partial.marker_class, "js-lazy-image");
        assert_eq!(partial.loaded_class, "is-loaded");
    }
}
