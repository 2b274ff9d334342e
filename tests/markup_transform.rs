//! Tests for the lazy markup transform

use lazyimg::{lazify, DomTree, LazyLoader, LoaderConfig, NodeId, TransformOptions};

fn imgs_outside_noscript(dom: &DomTree) -> Vec<NodeId> {
    dom.descendants(dom.root())
        .into_iter()
        .filter(|&n| dom.tag_name(n) == Some("img"))
        .filter(|&n| {
            let mut cursor = dom.parent(n);
            while let Some(p) = cursor {
                if dom.tag_name(p) == Some("noscript") {
                    return false;
                }
                cursor = dom.parent(p);
            }
            true
        })
        .collect()
}

#[test]
fn image_gets_marker_class_and_deferred_src() {
    let mut dom = DomTree::parse_document("<body><img src=\"/files/photo.png\"></body>");
    let config = LoaderConfig::default();
    let root = dom.root();
    lazify(&mut dom, root, &config, &TransformOptions::default());

    let img = imgs_outside_noscript(&dom)[0];
    assert!(dom.has_class(img, "lazyload"));
    assert_eq!(dom.attr(img, "src"), None);
    assert_eq!(dom.attr(img, "data-lazy-src"), Some("/files/photo.png"));
}

#[test]
fn srcset_moves_without_leaving_the_original() {
    let mut dom = DomTree::parse_document(
        "<body><img src=\"/a.png\" srcset=\"/a-300.png 300w, /b-200.png 200w\" sizes=\"100vw\"></body>",
    );
    let config = LoaderConfig::default();
    let root = dom.root();
    lazify(&mut dom, root, &config, &TransformOptions::default());

    let img = imgs_outside_noscript(&dom)[0];
    assert_eq!(dom.attr(img, "srcset"), None);
    assert_eq!(
        dom.attr(img, "data-lazy-srcset"),
        Some("/a-300.png 300w, /b-200.png 200w")
    );
    assert_eq!(dom.attr(img, "sizes"), None);
    assert_eq!(dom.attr(img, "data-lazy-sizes"), Some("100vw"));
}

#[test]
fn placeholder_becomes_the_visible_src() {
    let mut dom = DomTree::parse_document("<body><img src=\"/a.png\"></body>");
    let config = LoaderConfig::default();
    let options = TransformOptions {
        placeholder: Some("data:image/png;base64,iVBORw0KGgoAAAANSUhEUg==".to_string()),
        ..TransformOptions::default()
    };
    let root = dom.root();
    lazify(&mut dom, root, &config, &options);

    let img = imgs_outside_noscript(&dom)[0];
    assert!(dom.attr(img, "src").unwrap().starts_with("data:image/png;base64"));
    assert_eq!(dom.attr(img, "data-lazy-src"), Some("/a.png"));
}

#[test]
fn fallback_markup_is_rendered_inside_noscript() {
    let mut dom = DomTree::parse_document("<body><img src=\"/a.png\" alt=\"photo\"></body>");
    let config = LoaderConfig::default();
    let root = dom.root();
    lazify(&mut dom, root, &config, &TransformOptions::default());

    let html = dom.to_html();
    assert!(
        html.contains("<noscript><img src=\"/a.png\" alt=\"photo\"></noscript>"),
        "got: {}",
        html
    );
    // The fallback is not a lazy candidate itself.
    let noscript_img = dom
        .descendants(dom.root())
        .into_iter()
        .filter(|&n| dom.tag_name(n) == Some("img"))
        .find(|&n| dom.attr(n, "src") == Some("/a.png"))
        .unwrap();
    assert!(!dom.has_class(noscript_img, "lazyload"));
}

#[test]
fn repeat_transform_leaves_the_document_unchanged() {
    let mut dom = DomTree::parse_document(
        "<body><img src=\"/a.png\"><picture><img src=\"/b.png\"></picture></body>",
    );
    let config = LoaderConfig::default();
    let options = TransformOptions::default();
    let root = dom.root();
    assert_eq!(lazify(&mut dom, root, &config, &options), 2);
    let first = dom.to_html();
    let root = dom.root();
    assert_eq!(lazify(&mut dom, root, &config, &options), 0);
    assert_eq!(dom.to_html(), first);
}

#[test]
fn transformed_markup_is_what_the_observer_consumes() {
    let mut dom = DomTree::parse_document("<body><img src=\"/a.png\"></body>");
    let config = LoaderConfig::default();
    let root = dom.root();
    lazify(&mut dom, root, &config, &TransformOptions::default());

    let mut loader = LazyLoader::new(LoaderConfig {
        observe_supported: false,
        ..LoaderConfig::default()
    })
    .unwrap();
    let root = dom.root();
    loader.attach(&mut dom, root);

    let img = imgs_outside_noscript(&dom)[0];
    assert_eq!(dom.attr(img, "src"), Some("/a.png"));
    assert!(dom.has_class(img, "is-loaded"));
}

#[test]
fn legacy_contract_uses_bare_data_attributes() {
    // Deployments on the older markup contract configure the prefix; the
    // transform then emits img.js-lazy-image with data-src.
    let mut dom = DomTree::parse_document("<body><img src=\"/a.png\"></body>");
    let config = LoaderConfig {
        marker_class: "js-lazy-image".to_string(),
        deferred_prefix: "data-".to_string(),
        ..LoaderConfig::default()
    };
    let root = dom.root();
    lazify(&mut dom, root, &config, &TransformOptions::default());

    let img = imgs_outside_noscript(&dom)[0];
    assert!(dom.has_class(img, "js-lazy-image"));
    assert_eq!(dom.attr(img, "data-src"), Some("/a.png"));
    assert_eq!(dom.attr(img, "src"), None);
}
