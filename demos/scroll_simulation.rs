//! Drives the observer with the deterministic sweep harness: images laid out
//! down a synthetic page get promoted as the scroll position approaches them.
//!
//! Run with: cargo run --example scroll_simulation

use std::collections::HashMap;

use lazyimg::{DomTree, LazyLoader, LoaderConfig, NodeId, Rect, Viewport};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("lazyimg - Scroll Simulation Example\n");

    let html: String = (0..6)
        .map(|i| format!("<img class=\"lazyload\" data-lazy-src=\"/photos/{}.png\">", i))
        .collect();
    let mut dom = DomTree::parse_fragment(&html);

    let mut loader = LazyLoader::new(LoaderConfig::default())?;
    let root = dom.root();
    loader.attach(&mut dom, root);
    println!("registered after attach: {}", loader.registered_count());

    // Stack the images 1000px apart down the page.
    let imgs: Vec<NodeId> = dom
        .descendants(dom.root())
        .into_iter()
        .filter(|&n| dom.tag_name(n) == Some("img"))
        .collect();
    let layout: HashMap<NodeId, Rect> = imgs
        .iter()
        .enumerate()
        .map(|(i, &id)| {
            (
                id,
                Rect {
                    x: 0,
                    y: i as i32 * 1000,
                    width: 1280,
                    height: 600,
                },
            )
        })
        .collect();

    let viewport = Viewport::default();
    let mut scroll_y = 0;
    while loader.registered_count() > 0 {
        let entries = loader.sweep(&layout, viewport, scroll_y);
        loader.on_intersect(&mut dom, &entries);
        let loaded = imgs
            .iter()
            .filter(|&&img| dom.has_class(img, "is-loaded"))
            .count();
        println!("scroll_y={:5}  loaded {}/{}", scroll_y, loaded, imgs.len());
        scroll_y += 500;
    }

    println!("\nFinal document:\n{}", dom.to_html());
    Ok(())
}
