//! A small mutable element tree for DOM rewriting.
//!
//! Parsing is delegated to `scraper`; the parsed document is converted into
//! an arena of nodes that the observer and the markup transform can mutate
//! (attribute promotion, class toggling, fallback insertion). `scraper`'s own
//! tree is a read-only query structure, so mutation lives here.

use scraper::Html;

/// Handle to a node inside a [`DomTree`] arena.
///
/// Ids are only meaningful for the tree that produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

/// Node payload: the synthetic tree root, an element, or a text run.
#[derive(Debug, Clone)]
pub enum NodeData {
    Root,
    Element(ElementData),
    Text(String),
}

/// Element name plus attributes in document order of first appearance.
#[derive(Debug, Clone)]
pub struct ElementData {
    pub name: String,
    pub attrs: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    data: NodeData,
}

/// Elements that never take a closing tag when serialized.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta",
    "param", "source", "track", "wbr",
];

/// An arena-backed mutable DOM subtree.
#[derive(Debug, Clone)]
pub struct DomTree {
    nodes: Vec<Node>,
}

impl DomTree {
    /// Create an empty tree containing only the synthetic root.
    pub fn new() -> Self {
        DomTree {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                data: NodeData::Root,
            }],
        }
    }

    /// Parse a full HTML document.
    pub fn parse_document(html: &str) -> Self {
        let parsed = Html::parse_document(html);
        let mut tree = DomTree::new();
        let root = tree.root();
        tree.convert_children(root, parsed.tree.root());
        tree
    }

    /// Parse an HTML fragment.
    ///
    /// The parser wraps fragments in an `<html>` element; that wrapper is
    /// spliced out so the fragment's own nodes sit directly under the root.
    pub fn parse_fragment(html: &str) -> Self {
        let parsed = Html::parse_fragment(html);
        let mut tree = DomTree::new();
        let root = tree.root();
        tree.convert_children(root, parsed.tree.root());

        let wrapper = match tree.children(root).first().copied() {
            Some(only) if tree.children(root).len() == 1 && tree.tag_name(only) == Some("html") => {
                only
            }
            _ => return tree,
        };
        let grandchildren = tree.children(wrapper).to_vec();
        tree.nodes[root.0].children = grandchildren.clone();
        for gc in grandchildren {
            tree.nodes[gc.0].parent = Some(root);
        }
        tree.nodes[wrapper.0].children.clear();
        tree.nodes[wrapper.0].parent = None;
        tree
    }

    fn convert_children(&mut self, parent: NodeId, src: ego_tree::NodeRef<'_, scraper::Node>) {
        for child in src.children() {
            match child.value() {
                scraper::Node::Element(el) => {
                    let id = self.create_element(el.name());
                    for (name, value) in el.attrs() {
                        self.set_attr(id, name, value);
                    }
                    self.append_child(parent, id);
                    self.convert_children(id, child);
                }
                scraper::Node::Text(t) => {
                    let id = self.create_text(&t.text);
                    self.append_child(parent, id);
                }
                // Doctype, comments and processing instructions are dropped.
                _ => {}
            }
        }
    }

    /// The synthetic root node.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Create a detached element node.
    pub fn create_element(&mut self, name: &str) -> NodeId {
        self.push_node(NodeData::Element(ElementData {
            name: name.to_ascii_lowercase(),
            attrs: Vec::new(),
        }))
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push_node(NodeData::Text(text.to_string()))
    }

    fn push_node(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: None,
            children: Vec::new(),
            data,
        });
        id
    }

    /// Append `child` as the last child of `parent`, detaching it from any
    /// previous parent first.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Insert `node` as the next sibling of `anchor`. No-op when `anchor` has
    /// no parent.
    pub fn insert_after(&mut self, anchor: NodeId, node: NodeId) {
        let parent = match self.nodes[anchor.0].parent {
            Some(p) => p,
            None => return,
        };
        self.detach(node);
        self.nodes[node.0].parent = Some(parent);
        let siblings = &mut self.nodes[parent.0].children;
        let pos = siblings.iter().position(|&c| c == anchor).map(|i| i + 1);
        match pos {
            Some(i) => siblings.insert(i, node),
            None => siblings.push(node),
        }
    }

    fn detach(&mut self, node: NodeId) {
        if let Some(old) = self.nodes[node.0].parent.take() {
            self.nodes[old.0].children.retain(|&c| c != node);
        }
    }

    /// Deep-copy the subtree rooted at `node`; returns the detached clone.
    pub fn clone_subtree(&mut self, node: NodeId) -> NodeId {
        let data = self.nodes[node.0].data.clone();
        let clone = self.push_node(data);
        let children = self.nodes[node.0].children.clone();
        for child in children {
            let child_clone = self.clone_subtree(child);
            self.append_child(clone, child_clone);
        }
        clone
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Preorder listing of all descendants of `root` (exclusive of `root`),
    /// computed fresh on every call.
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.nodes[root.0].children.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            for &child in self.nodes[id.0].children.iter().rev() {
                stack.push(child);
            }
        }
        out
    }

    /// Whether `id` is `root` itself or one of its descendants.
    pub fn is_within(&self, id: NodeId, root: NodeId) -> bool {
        let mut cursor = Some(id);
        while let Some(c) = cursor {
            if c == root {
                return true;
            }
            cursor = self.nodes[c.0].parent;
        }
        false
    }

    /// Element tag name, lowercase. `None` for non-element nodes.
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].data {
            NodeData::Element(el) => Some(el.name.as_str()),
            _ => None,
        }
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        match &self.nodes[id.0].data {
            NodeData::Element(el) => el
                .attrs
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }

    /// Set (or replace) an attribute. No-op on non-element nodes.
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        if let NodeData::Element(el) = &mut self.nodes[id.0].data {
            match el.attrs.iter_mut().find(|(n, _)| n == name) {
                Some((_, v)) => *v = value.to_string(),
                None => el.attrs.push((name.to_string(), value.to_string())),
            }
        }
    }

    /// Remove an attribute; returns its former value if present.
    pub fn remove_attr(&mut self, id: NodeId, name: &str) -> Option<String> {
        if let NodeData::Element(el) = &mut self.nodes[id.0].data {
            if let Some(pos) = el.attrs.iter().position(|(n, _)| n == name) {
                return Some(el.attrs.remove(pos).1);
            }
        }
        None
    }

    /// Snapshot of the element's attributes as owned name/value pairs.
    ///
    /// Callers that mutate attributes while iterating (attribute promotion)
    /// work from this snapshot.
    pub fn attrs(&self, id: NodeId) -> Vec<(String, String)> {
        match &self.nodes[id.0].data {
            NodeData::Element(el) => el.attrs.clone(),
            _ => Vec::new(),
        }
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.attr(id, "class")
            .map(|list| list.split_ascii_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }

    /// Add a class token; a class already present is not duplicated.
    pub fn add_class(&mut self, id: NodeId, class: &str) {
        if self.has_class(id, class) {
            return;
        }
        let merged = match self.attr(id, "class") {
            Some(existing) if !existing.trim().is_empty() => {
                format!("{} {}", existing.trim(), class)
            }
            _ => class.to_string(),
        };
        self.set_attr(id, "class", &merged);
    }

    /// Serialize the tree back to HTML.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_children(self.root(), &mut out);
        out
    }

    /// Serialize a single subtree (the node itself included).
    pub fn node_to_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(id, &mut out);
        out
    }

    fn write_children(&self, id: NodeId, out: &mut String) {
        for &child in &self.nodes[id.0].children {
            self.write_node(child, out);
        }
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        match &self.nodes[id.0].data {
            NodeData::Root => self.write_children(id, out),
            NodeData::Text(text) => out.push_str(&escape_text(text)),
            NodeData::Element(el) => {
                out.push('<');
                out.push_str(&el.name);
                for (name, value) in &el.attrs {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    out.push_str(&escape_attr(value));
                    out.push('"');
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&el.name.as_str()) {
                    return;
                }
                self.write_children(id, out);
                out.push_str("</");
                out.push_str(&el.name);
                out.push('>');
            }
        }
    }
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

fn escape_text(raw: &str) -> String {
    raw.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn escape_attr(raw: &str) -> String {
    raw.replace('&', "&amp;").replace('"', "&quot;").replace('<', "&lt;")
}
