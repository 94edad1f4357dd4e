//! Integration tests for the arena document tree.

use wallaby_dom::{DomTree, ElementData, NodeId, NodeType, Tag};

fn element(tree: &mut DomTree, parent: NodeId, tag: &str) -> NodeId {
    let id = tree.alloc(NodeType::Element(ElementData::new(Tag::from_name(tag))));
    tree.append_child(parent, id);
    id
}

fn text(tree: &mut DomTree, parent: NodeId, content: &str) -> NodeId {
    let id = tree.alloc(NodeType::Text(content.to_string()));
    tree.append_child(parent, id);
    id
}

#[test]
fn test_tag_interning() {
    assert_eq!(Tag::from_name("div"), Tag::Div);
    assert_eq!(Tag::from_name("DIV"), Tag::Div);
    assert_eq!(Tag::from_name("H2"), Tag::H2);
    assert_eq!(
        Tag::from_name("X-Custom"),
        Tag::Other("x-custom".to_string())
    );
    assert_eq!(Tag::Div.to_string(), "div");
}

#[test]
fn test_attribute_lookup_is_ordered_and_exact() {
    let mut el = ElementData::new(Tag::A);
    el.attrs.push(("href".to_string(), "/one".to_string()));
    el.attrs.push(("href".to_string(), "/two".to_string()));

    // First occurrence wins.
    assert_eq!(el.attr("href"), Some("/one"));
    assert!(el.has_attr("href"));
    assert!(!el.has_attr("HREF"));
    assert_eq!(el.attr("title"), None);
}

#[test]
fn test_append_child_maintains_sibling_links() {
    let mut tree = DomTree::new();
    let root = tree.root();
    let a = element(&mut tree, root, "div");
    let b = element(&mut tree, root, "p");
    let c = element(&mut tree, root, "span");

    assert_eq!(tree.children(root), &[a, b, c]);
    assert_eq!(tree.parent(b), Some(root));
    assert_eq!(tree.next_sibling(a), Some(b));
    assert_eq!(tree.prev_sibling(c), Some(b));
    assert_eq!(tree.prev_sibling(a), None);
    assert_eq!(tree.next_sibling(c), None);
}

#[test]
fn test_ancestors_iterate_parent_to_root() {
    let mut tree = DomTree::new();
    let root = tree.root();
    let html = element(&mut tree, root, "html");
    let body = element(&mut tree, html, "body");
    let p = element(&mut tree, body, "p");

    let ancestors: Vec<NodeId> = tree.ancestors(p).collect();
    assert_eq!(ancestors, vec![body, html, root]);
}

#[test]
fn test_preceding_siblings_iterate_backwards() {
    let mut tree = DomTree::new();
    let root = tree.root();
    let a = element(&mut tree, root, "a");
    let t = text(&mut tree, root, "between");
    let b = element(&mut tree, root, "b");
    let c = element(&mut tree, root, "c");

    let preceding: Vec<NodeId> = tree.preceding_siblings(c).collect();
    assert_eq!(preceding, vec![b, t, a]);
}

#[test]
fn test_element_children_skip_text_nodes() {
    let mut tree = DomTree::new();
    let root = tree.root();
    let div = element(&mut tree, root, "div");
    let _ = text(&mut tree, div, "hello");
    let span = element(&mut tree, div, "span");
    let _ = text(&mut tree, div, "world");
    let em = element(&mut tree, div, "em");

    assert_eq!(tree.element_children(div), vec![span, em]);
}

#[test]
fn test_text_aggregation() {
    let mut tree = DomTree::new();
    let root = tree.root();
    let div = element(&mut tree, root, "div");
    let _ = text(&mut tree, div, "alpha ");
    let span = element(&mut tree, div, "span");
    let _ = text(&mut tree, span, "beta");
    let _ = text(&mut tree, div, " gamma");

    // Descendant text concatenates in document order.
    assert_eq!(tree.text(div), "alpha beta gamma");
    // Own text skips the nested span.
    assert_eq!(tree.own_text(div), "alpha  gamma");
    assert_eq!(tree.own_text(span), "beta");
}

#[test]
fn test_as_element_and_as_text() {
    let mut tree = DomTree::new();
    let root = tree.root();
    let div = element(&mut tree, root, "div");
    let t = text(&mut tree, div, "x");

    assert_eq!(tree.as_element(div).map(|e| &e.tag), Some(&Tag::Div));
    assert!(tree.as_element(t).is_none());
    assert_eq!(tree.as_text(t), Some("x"));
    assert!(tree.as_text(div).is_none());
    assert!(tree.as_element(root).is_none());
}
