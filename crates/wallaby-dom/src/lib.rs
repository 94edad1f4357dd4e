//! Arena document tree consumed by the Wallaby selector engine.
//!
//! # Design
//!
//! The tree uses arena allocation with [`NodeId`] indices for all
//! relationships, providing O(1) access and traversal without borrow
//! checker issues. The selector engine only ever reads a snapshot of the
//! tree; it needs a node's tag identity, its ordered attribute list, its
//! parent, its children, its preceding siblings, and its text content.
//! Everything in this crate exists to serve that capability set.

use strum_macros::{Display, EnumString};

/// A type-safe index into the document tree.
///
/// [§ 4.4 Interface Node](https://dom.spec.whatwg.org/#interface-node)
/// "Each node has an associated node document..."
///
/// `NodeId` provides O(1) access to any node in the tree without
/// borrowing issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

impl NodeId {
    /// The root document node is always at index 0.
    pub const ROOT: NodeId = NodeId(0);
}

/// The name of an HTML element, as a closed enum.
///
/// [§ 3.2.2 Elements in the DOM](https://html.spec.whatwg.org/multipage/dom.html#elements-in-the-dom)
///
/// Selector matching compares tag identities rather than strings, so tag
/// names are interned into this enum once, at tree-construction and
/// selector-parse time. Names are ASCII-lowercased before interning;
/// anything outside the known set lands in [`Tag::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
#[allow(missing_docs)] // variant names are the HTML element names themselves
pub enum Tag {
    Html,
    Head,
    Title,
    Meta,
    Link,
    Style,
    Script,
    Noscript,
    Body,
    Div,
    Span,
    P,
    A,
    Img,
    Ul,
    Ol,
    Li,
    Dl,
    Dt,
    Dd,
    Table,
    Thead,
    Tbody,
    Tfoot,
    Tr,
    Td,
    Th,
    Caption,
    H1,
    H2,
    H3,
    H4,
    H5,
    H6,
    Br,
    Hr,
    Em,
    Strong,
    B,
    I,
    U,
    S,
    Small,
    Mark,
    Sub,
    Sup,
    Code,
    Pre,
    Blockquote,
    Q,
    Cite,
    Abbr,
    Time,
    Form,
    Input,
    Button,
    Select,
    Option,
    Textarea,
    Label,
    Fieldset,
    Legend,
    Nav,
    Header,
    Footer,
    Section,
    Article,
    Aside,
    Main,
    Figure,
    Figcaption,
    Details,
    Summary,
    Iframe,
    Video,
    Audio,
    Source,
    Canvas,
    Svg,
    Template,
    /// Any element name outside the known set, stored lowercased.
    #[strum(default)]
    Other(String),
}

impl Tag {
    /// Intern a raw element name.
    ///
    /// The name is ASCII-lowercased first; unrecognized names become
    /// [`Tag::Other`] carrying the lowercased string, so interning never
    /// fails.
    #[must_use]
    pub fn from_name(name: &str) -> Tag {
        let lower = name.to_ascii_lowercase();
        match lower.parse() {
            Ok(tag) => tag,
            Err(_) => Tag::Other(lower),
        }
    }
}

/// Element-specific data.
///
/// Per [§ 4.9 Interface Element](https://dom.spec.whatwg.org/#interface-element):
/// "Elements have an associated namespace, namespace prefix, local name..."
/// "An element has an associated attribute list."
///
/// Attributes are kept as an ordered list of name/value pairs, in document
/// order, because the selector engine's contract is an ordered attribute
/// list. Lookups are linear; real-world attribute counts are tiny.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementData {
    /// The element's tag identity.
    pub tag: Tag,
    /// The element's attributes, in document order.
    pub attrs: Vec<(String, String)>,
}

impl ElementData {
    /// Create element data for a tag with no attributes.
    #[must_use]
    pub fn new(tag: Tag) -> ElementData {
        ElementData {
            tag,
            attrs: Vec::new(),
        }
    }

    /// Get the value of the first attribute with the given name.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Check whether an attribute with the given name is present.
    #[must_use]
    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.iter().any(|(n, _)| n == name)
    }
}

/// [§ 4.4 Interface Node](https://dom.spec.whatwg.org/#interface-node)
///
/// "Each node has an associated node type"
#[derive(Debug, Clone)]
pub enum NodeType {
    /// [§ 4.5 Interface Document](https://dom.spec.whatwg.org/#interface-document)
    /// The document itself, always the arena root.
    Document,
    /// [§ 4.9 Interface Element](https://dom.spec.whatwg.org/#interface-element)
    /// "Element nodes are simply known as elements."
    Element(ElementData),
    /// [§ 4.10 Interface Text](https://dom.spec.whatwg.org/#interface-text)
    /// "Text nodes are known as text."
    Text(String),
    /// [§ 4.7 Interface Comment](https://dom.spec.whatwg.org/#interface-comment)
    /// "Comment nodes are known as comments."
    Comment(String),
}

/// A node in the arena, storing indices for parent/child/sibling
/// relationships so that traversal in any direction is O(1).
///
/// [§ 4.4 Interface Node](https://dom.spec.whatwg.org/#interface-node)
#[derive(Debug, Clone)]
pub struct Node {
    /// "Each node has an associated node type"
    pub node_type: NodeType,
    /// [§ 4.4](https://dom.spec.whatwg.org/#concept-tree-parent)
    /// The parent, or `None` for the document root.
    pub parent: Option<NodeId>,
    /// [§ 4.4](https://dom.spec.whatwg.org/#concept-tree-child)
    /// "A node has an associated list of children"
    pub children: Vec<NodeId>,
    /// [§ 4.4](https://dom.spec.whatwg.org/#concept-tree-next-sibling)
    /// The node immediately following this one among its parent's children.
    pub next_sibling: Option<NodeId>,
    /// [§ 4.4](https://dom.spec.whatwg.org/#concept-tree-previous-sibling)
    /// The node immediately preceding this one among its parent's children.
    pub prev_sibling: Option<NodeId>,
}

/// Arena-based document tree with O(1) node access and traversal.
///
/// [§ 4 Nodes](https://dom.spec.whatwg.org/#nodes)
///
/// "The DOM represents a document as a tree."
///
/// All nodes live in a contiguous vector, indexed by [`NodeId`]. The
/// Document node is always at index 0.
#[derive(Debug, Clone)]
pub struct DomTree {
    nodes: Vec<Node>,
}

impl DomTree {
    /// Create a new tree containing just the Document node.
    #[must_use]
    pub fn new() -> DomTree {
        let document = Node {
            node_type: NodeType::Document,
            parent: None,
            children: Vec::new(),
            next_sibling: None,
            prev_sibling: None,
        };
        DomTree {
            nodes: vec![document],
        }
    }

    /// Get the root document node ID.
    #[must_use]
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Get a node by its ID.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Allocate a new node and return its ID.
    ///
    /// The node is not yet attached to the tree; use
    /// [`DomTree::append_child`] to link it in.
    pub fn alloc(&mut self, node_type: NodeType) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            node_type,
            parent: None,
            children: Vec::new(),
            next_sibling: None,
            prev_sibling: None,
        });
        id
    }

    /// [§ 4.2.2 Append](https://dom.spec.whatwg.org/#concept-node-append)
    ///
    /// Appends `child` as the last child of `parent`, updating parent,
    /// child-list and sibling links.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        let prev_last_child = self.nodes[parent.0].children.last().copied();

        self.nodes[parent.0].children.push(child);
        self.nodes[child.0].parent = Some(parent);

        if let Some(prev_id) = prev_last_child {
            self.nodes[prev_id.0].next_sibling = Some(child);
            self.nodes[child.0].prev_sibling = Some(prev_id);
        }
    }

    /// Get the parent of a node.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    /// Get all children of a node, in document order.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Get the next sibling of a node.
    #[must_use]
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.next_sibling)
    }

    /// Get the previous sibling of a node.
    #[must_use]
    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.prev_sibling)
    }

    /// Iterate over all ancestors of a node, from parent to root.
    #[must_use]
    pub fn ancestors(&self, id: NodeId) -> AncestorIterator<'_> {
        AncestorIterator {
            tree: self,
            current: self.parent(id),
        }
    }

    /// Iterate over preceding siblings, from immediately before the node
    /// back to its parent's first child.
    #[must_use]
    pub fn preceding_siblings(&self, id: NodeId) -> PrecedingSiblingIterator<'_> {
        PrecedingSiblingIterator {
            tree: self,
            current: self.prev_sibling(id),
        }
    }

    /// Get element data if this node is an element.
    #[must_use]
    pub fn as_element(&self, id: NodeId) -> Option<&ElementData> {
        self.get(id).and_then(|n| match &n.node_type {
            NodeType::Element(data) => Some(data),
            _ => None,
        })
    }

    /// Get text content if this node is a text node.
    #[must_use]
    pub fn as_text(&self, id: NodeId) -> Option<&str> {
        self.get(id).and_then(|n| match &n.node_type {
            NodeType::Text(s) => Some(s.as_str()),
            _ => None,
        })
    }

    /// The element children of a node, in document order, skipping text
    /// and comment nodes.
    #[must_use]
    pub fn element_children(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|&c| self.as_element(c).is_some())
            .collect()
    }

    /// [§ 4.4 textContent](https://dom.spec.whatwg.org/#dom-node-textcontent)
    ///
    /// The concatenation of every descendant text node, in document order.
    #[must_use]
    pub fn text(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    /// The concatenation of this node's direct text-node children only,
    /// ignoring text inside descendant elements.
    #[must_use]
    pub fn own_text(&self, id: NodeId) -> String {
        let mut out = String::new();
        for &child in self.children(id) {
            if let Some(t) = self.as_text(child) {
                out.push_str(t);
            }
        }
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        for &child in self.children(id) {
            match self.get(child).map(|n| &n.node_type) {
                Some(NodeType::Text(t)) => out.push_str(t),
                Some(NodeType::Element(_)) => self.collect_text(child, out),
                _ => {}
            }
        }
    }
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over ancestors of a node.
pub struct AncestorIterator<'a> {
    tree: &'a DomTree,
    current: Option<NodeId>,
}

impl Iterator for AncestorIterator<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        self.current = self.tree.parent(id);
        Some(id)
    }
}

/// Iterator over preceding siblings of a node.
pub struct PrecedingSiblingIterator<'a> {
    tree: &'a DomTree,
    current: Option<NodeId>,
}

impl Iterator for PrecedingSiblingIterator<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        self.current = self.tree.prev_sibling(id);
        Some(id)
    }
}
