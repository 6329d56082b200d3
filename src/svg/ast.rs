//! Arena-backed vector document tree.
//!
//! Nodes live in a flat table and refer to each other by index, so the
//! transformer can walk depth-first and mutate in place without cyclic
//! ownership. Detached nodes stay in the arena but are never serialized.
//!
//! ```text
//! nodes: [ svg(root) , style , #text , path , title ]
//!           │  children: [1, 3]
//!           └── parent of 1, 3
//! ```
//!
//! Parsing keeps elements, text, CDATA and comments inside the root element.
//! The XML declaration, DOCTYPE and processing instructions are dropped.

use std::borrow::Cow;

use quick_xml::Reader;
use quick_xml::escape::{escape, partial_escape, resolve_predefined_entity, unescape};
use quick_xml::events::Event;

use super::TransformError;

/// Index of a node in its document's arena.
pub type NodeId = usize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attr {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Element { name: String, attrs: Vec<Attr> },
    Text(String),
    CData(String),
    Comment(String),
}

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

/// A parsed vector document.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Document {
    // ========================================================================
    // Parse / serialize
    // ========================================================================

    /// Parse markup into a tree rooted at its top-level element.
    pub fn parse(markup: &str) -> Result<Self, TransformError> {
        let mut reader = Reader::from_str(markup);
        let mut nodes: Vec<Node> = Vec::new();
        let mut stack: Vec<NodeId> = Vec::new();
        let mut root: Option<NodeId> = None;

        loop {
            let event = reader
                .read_event()
                .map_err(|err| xml_error(&reader, err))?;

            match &event {
                Event::Start(start) | Event::Empty(start) => {
                    if root.is_some() && stack.is_empty() {
                        return Err(TransformError::Xml(
                            "more than one top-level element".into(),
                        ));
                    }
                    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
                    let mut attrs = Vec::new();
                    for attr in start.attributes() {
                        let attr = attr.map_err(|err| xml_error(&reader, err))?;
                        let raw = String::from_utf8_lossy(&attr.value);
                        attrs.push(Attr {
                            name: String::from_utf8_lossy(attr.key.as_ref()).into_owned(),
                            // Unknown DTD entities stay as written.
                            value: unescape(&raw).map_or_else(|_| raw.to_string(), Cow::into_owned),
                        });
                    }

                    let id = push_node(&mut nodes, &stack, NodeKind::Element { name, attrs });
                    root.get_or_insert(id);
                    if matches!(event, Event::Start(_)) {
                        stack.push(id);
                    }
                }
                Event::End(_) => {
                    stack.pop();
                }
                Event::Text(text) => {
                    if !stack.is_empty() {
                        push_text(&mut nodes, &stack, &String::from_utf8_lossy(&**text));
                    }
                }
                Event::GeneralRef(reference) => {
                    if !stack.is_empty() {
                        let name = String::from_utf8_lossy(&**reference).into_owned();
                        push_text(&mut nodes, &stack, &resolve_reference(&name));
                    }
                }
                Event::CData(cdata) => {
                    if !stack.is_empty() {
                        let text = String::from_utf8_lossy(&**cdata).into_owned();
                        push_node(&mut nodes, &stack, NodeKind::CData(text));
                    }
                }
                Event::Comment(comment) => {
                    if !stack.is_empty() {
                        let text = String::from_utf8_lossy(&**comment).into_owned();
                        push_node(&mut nodes, &stack, NodeKind::Comment(text));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !stack.is_empty() {
            return Err(TransformError::Xml("unclosed element at end of document".into()));
        }
        let root = root.ok_or_else(|| TransformError::Xml("document has no root element".into()))?;
        Ok(Self { nodes, root })
    }

    /// Serialize the tree reachable from the root.
    pub fn to_markup(&self) -> String {
        let mut out = String::with_capacity(self.nodes.len() * 64);
        self.write_node(self.root, &mut out);
        out
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        let node = &self.nodes[id];
        match &node.kind {
            NodeKind::Element { name, attrs } => {
                out.push('<');
                out.push_str(name);
                for attr in attrs {
                    out.push(' ');
                    out.push_str(&attr.name);
                    out.push_str("=\"");
                    out.push_str(&escape(attr.value.as_str()));
                    out.push('"');
                }
                if node.children.is_empty() {
                    out.push_str("/>");
                    return;
                }
                out.push('>');
                for &child in &node.children {
                    self.write_node(child, out);
                }
                out.push_str("</");
                out.push_str(name);
                out.push('>');
            }
            NodeKind::Text(text) => out.push_str(&partial_escape(text.as_str())),
            NodeKind::CData(text) => {
                out.push_str("<![CDATA[");
                out.push_str(text);
                out.push_str("]]>");
            }
            NodeKind::Comment(text) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
        }
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id].children
    }

    /// Element name, `None` for non-element nodes.
    pub fn name(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id].kind {
            NodeKind::Element { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Check whether a node is an element with the given local name.
    pub fn is_element(&self, id: NodeId, local: &str) -> bool {
        self.name(id).is_some_and(|name| local_name(name) == local)
    }

    /// Depth-first, pre-order list of nodes attached under the root.
    pub fn descendants(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.nodes[id].children.iter().rev());
        }
        order
    }

    /// Concatenated text and CDATA content of a node's direct children.
    pub fn text_content(&self, id: NodeId) -> String {
        self.nodes[id]
            .children
            .iter()
            .filter_map(|&child| match &self.nodes[child].kind {
                NodeKind::Text(text) | NodeKind::CData(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    // ========================================================================
    // Attributes
    // ========================================================================

    pub fn attrs(&self, id: NodeId) -> &[Attr] {
        match &self.nodes[id].kind {
            NodeKind::Element { attrs, .. } => attrs,
            _ => &[],
        }
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attrs(id)
            .iter()
            .find(|attr| attr.name == name)
            .map(|attr| attr.value.as_str())
    }

    /// Set an attribute, replacing in place or appending.
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: impl Into<String>) {
        if let NodeKind::Element { attrs, .. } = &mut self.nodes[id].kind {
            let value = value.into();
            match attrs.iter_mut().find(|attr| attr.name == name) {
                Some(attr) => attr.value = value,
                None => attrs.push(Attr {
                    name: name.to_string(),
                    value,
                }),
            }
        }
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) -> Option<String> {
        let mut removed = None;
        self.retain_attrs(id, |attr| {
            if attr.name == name {
                removed = Some(attr.value.clone());
                false
            } else {
                true
            }
        });
        removed
    }

    pub fn retain_attrs(&mut self, id: NodeId, keep: impl FnMut(&Attr) -> bool) {
        if let NodeKind::Element { attrs, .. } = &mut self.nodes[id].kind {
            attrs.retain(keep);
        }
    }

    /// Mutable access to every attribute of an element.
    pub fn attrs_mut(&mut self, id: NodeId) -> Option<&mut Vec<Attr>> {
        match &mut self.nodes[id].kind {
            NodeKind::Element { attrs, .. } => Some(attrs),
            _ => None,
        }
    }

    // ========================================================================
    // Structure
    // ========================================================================

    /// Create a detached element.
    pub fn create_element(&mut self, name: &str, attrs: Vec<Attr>) -> NodeId {
        self.nodes.push(Node {
            kind: NodeKind::Element {
                name: name.to_string(),
                attrs,
            },
            parent: None,
            children: Vec::new(),
        });
        self.nodes.len() - 1
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.nodes.push(Node {
            kind: NodeKind::Text(text.to_string()),
            parent: None,
            children: Vec::new(),
        });
        self.nodes.len() - 1
    }

    /// Insert a detached node into `parent` at `index`.
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        self.detach(child);
        let children = &mut self.nodes[parent].children;
        children.insert(index.min(children.len()), child);
        self.nodes[child].parent = Some(parent);
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        let len = self.nodes[parent].children.len();
        self.insert_child(parent, len, child);
    }

    /// Unlink a node from its parent. The node keeps its own subtree.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id].parent.take() {
            self.nodes[parent].children.retain(|&child| child != id);
        }
    }
}

/// Local part of a possibly prefixed name (`svg:title` -> `title`).
pub fn local_name(name: &str) -> &str {
    name.rsplit_once(':').map_or(name, |(_, local)| local)
}

fn push_node(nodes: &mut Vec<Node>, stack: &[NodeId], kind: NodeKind) -> NodeId {
    let id = nodes.len();
    let parent = stack.last().copied();
    nodes.push(Node {
        kind,
        parent,
        children: Vec::new(),
    });
    if let Some(parent) = parent {
        nodes[parent].children.push(id);
    }
    id
}

/// Append text, merging with a directly preceding text node.
fn push_text(nodes: &mut Vec<Node>, stack: &[NodeId], text: &str) {
    let Some(&parent) = stack.last() else {
        return;
    };
    if let Some(&last) = nodes[parent].children.last()
        && let NodeKind::Text(existing) = &mut nodes[last].kind
    {
        existing.push_str(text);
        return;
    }
    push_node(nodes, stack, NodeKind::Text(text.to_string()));
}

/// Resolve `&name;` into text: char references and predefined entities.
fn resolve_reference(name: &str) -> String {
    let code = if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
        u32::from_str_radix(hex, 16).ok()
    } else if let Some(dec) = name.strip_prefix('#') {
        dec.parse().ok()
    } else {
        None
    };

    if let Some(ch) = code.and_then(char::from_u32) {
        return ch.to_string();
    }
    match resolve_predefined_entity(name) {
        Some(resolved) => resolved.to_string(),
        None => format!("&{name};"),
    }
}

fn xml_error(reader: &Reader<&[u8]>, err: impl std::fmt::Display) -> TransformError {
    TransformError::Xml(format!("{err} at byte {}", reader.buffer_position()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ICON: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!-- Generator: vendor tool -->
<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 18 18"><defs><style>.cls-1{fill:#0078d4;}</style></defs><title>Old &amp; stale</title><path class="cls-1" d="M0 0h18v18H0z" data-name="Path 1"/></svg>"#;

    /// (element name, attributes) in document order.
    fn shape(doc: &Document) -> Vec<(String, Vec<Attr>)> {
        doc.descendants()
            .into_iter()
            .filter_map(|id| doc.name(id).map(|n| (n.to_string(), doc.attrs(id).to_vec())))
            .collect()
    }

    #[test]
    fn test_parse_structure() {
        let doc = Document::parse(ICON).unwrap();
        let root = doc.root();
        assert!(doc.is_element(root, "svg"));
        assert_eq!(doc.attr(root, "viewBox"), Some("0 0 18 18"));

        let names: Vec<_> = shape(&doc).into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["svg", "defs", "style", "title", "path"]);
    }

    #[test]
    fn test_entities_resolved_in_text() {
        let doc = Document::parse(ICON).unwrap();
        let title = doc
            .descendants()
            .into_iter()
            .find(|&id| doc.is_element(id, "title"))
            .unwrap();
        assert_eq!(doc.text_content(title), "Old & stale");
        assert_eq!(resolve_reference("#x41"), "A");
        assert_eq!(resolve_reference("#65"), "A");
        assert_eq!(resolve_reference("ns_svg"), "&ns_svg;");
    }

    #[test]
    fn test_round_trip_preserves_elements_and_attributes() {
        let doc = Document::parse(ICON).unwrap();
        let markup = doc.to_markup();
        let reparsed = Document::parse(&markup).unwrap();
        assert_eq!(shape(&doc), shape(&reparsed));
        assert!(markup.contains("Old &amp; stale"));
        assert!(!markup.contains("<?xml"));
    }

    #[test]
    fn test_mutation_helpers() {
        let mut doc = Document::parse(r#"<svg a="1"><g/></svg>"#).unwrap();
        let root = doc.root();
        doc.set_attr(root, "a", "2");
        doc.set_attr(root, "b", "3");
        assert_eq!(doc.remove_attr(root, "a"), Some("2".into()));

        let title = doc.create_element("title", Vec::new());
        let text = doc.create_text("x < y");
        doc.append_child(title, text);
        doc.insert_child(root, 0, title);
        assert_eq!(doc.to_markup(), r#"<svg b="3"><title>x &lt; y</title><g/></svg>"#);

        doc.detach(title);
        assert_eq!(doc.to_markup(), r#"<svg b="3"><g/></svg>"#);
    }

    #[test]
    fn test_malformed_markup() {
        assert!(Document::parse("<svg><g></svg>").is_err());
        assert!(Document::parse("<svg>").is_err());
        assert!(Document::parse("just text").is_err());
    }

    #[test]
    fn test_local_name() {
        assert_eq!(local_name("svg:title"), "title");
        assert_eq!(local_name("title"), "title");
    }
}
