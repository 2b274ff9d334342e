//! Minimal example of the eager fallback path: without intersection-watcher
//! capability, attach promotes every deferred image synchronously.
//!
//! Run with: cargo run --example eager_fallback

use lazyimg::{DomTree, LazyLoader, LoaderConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("lazyimg - Eager Fallback Example\n");

    let html = r#"<body>
<img class="lazyload" data-lazy-src="/photos/alpha.png" alt="alpha">
<img class="lazyload" data-lazy-src="/photos/beta.png" alt="beta">
<picture class="lazyload">
  <source data-lazy-srcset="/photos/gamma.webp" type="image/webp">
  <img data-lazy-src="/photos/gamma.png" alt="gamma">
</picture>
</body>"#;

    let mut dom = DomTree::parse_document(html);

    // A runtime without intersection observation degrades to eager loading.
    let config = LoaderConfig {
        observe_supported: false,
        ..Default::default()
    };
    let mut loader = LazyLoader::new(config)?;
    let root = dom.root();
    loader.attach(&mut dom, root);

    println!("Promoted document:\n{}", dom.to_html());
    println!("registered after attach: {}", loader.registered_count());
    Ok(())
}
