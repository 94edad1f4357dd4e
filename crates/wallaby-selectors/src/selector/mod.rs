//! Selector tree node variants and matching.
//!
//! A parsed selector is a tree of [`Selector`] nodes: leaf tests (tag,
//! attribute, text, structural position) composed by unary and binary
//! combinators. Nodes are immutable after construction and shared via
//! [`Arc`] — selector groups are DAG-like when branches reuse a prefix,
//! and a finished tree may be matched from multiple threads concurrently.
//!
//! Matching per [Selectors Level 3](https://www.w3.org/TR/selectors-3/):
//! every node implements a single operation, match-against-a-document-node,
//! returning a structured [`MatchResult`] rather than a bare boolean so
//! that sibling scans can stop early once no further candidate can match.

use std::sync::Arc;

use wallaby_dom::{DomTree, ElementData, NodeId, NodeType, Tag};

use crate::error::SelectorError;

/// The outcome of matching a selector against one document node.
///
/// Combinators that scan several candidate nodes (the general-sibling
/// combinator walks every preceding sibling) need more than a boolean:
/// a structural test like `:first-child` can tell the scan that no
/// earlier sibling can possibly match, so scanning further is pointless.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchResult {
    /// Whether the selector matched the candidate node.
    pub matched: bool,
    /// Whether trying further candidate nodes could still change the
    /// outcome. Only meaningful to callers that scan candidates in
    /// backward sibling order; everything else should ignore it.
    pub more_candidates: bool,
}

impl MatchResult {
    /// A match, with further candidates still viable.
    pub const HIT: MatchResult = MatchResult {
        matched: true,
        more_candidates: true,
    };

    /// A non-match, with further candidates still viable.
    pub const MISS: MatchResult = MatchResult {
        matched: false,
        more_candidates: true,
    };

    /// Build a result with both flags explicit.
    #[must_use]
    pub const fn new(matched: bool, more_candidates: bool) -> MatchResult {
        MatchResult {
            matched,
            more_candidates,
        }
    }
}

impl From<bool> for MatchResult {
    /// A plain hit/miss with candidate scanning left open.
    fn from(matched: bool) -> MatchResult {
        MatchResult::new(matched, true)
    }
}

/// Attribute selector operators per
/// [§ 6.3 Attribute selectors](https://www.w3.org/TR/selectors-3/#attribute-selectors).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeOp {
    /// `[attr]` — the attribute is present, any value.
    Exists,
    /// `[attr=val]` — exact, byte-wise value equality.
    Equals,
    /// `[attr~=val]` — the value, split on whitespace, contains the word.
    Includes,
    /// `[attr|=val]` — the value equals `val`, or starts with `val`
    /// immediately followed by `-`.
    DashMatch,
    /// `[attr^=val]` — the value starts with the prefix.
    PrefixMatch,
    /// `[attr$=val]` — the value ends with the suffix.
    SuffixMatch,
    /// `[attr*=val]` — the value contains the substring anywhere.
    SubstringMatch,
}

/// An attribute test against one element.
///
/// All comparisons are byte-exact and case-sensitive; no normalization.
/// Construction is fallible so that a selector can never be built without
/// a discriminating parameter: the name must be non-empty, and every
/// operator except [`AttributeOp::Exists`] requires a non-empty value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeSelector {
    op: AttributeOp,
    name: String,
    value: Option<String>,
}

impl AttributeSelector {
    /// Build an attribute selector, validating the payload.
    ///
    /// # Errors
    ///
    /// Returns [`SelectorError::Construction`] if the name is empty, or
    /// if the operator requires a value and none (or an empty one) was
    /// supplied.
    pub fn new(
        op: AttributeOp,
        name: impl Into<String>,
        value: Option<String>,
    ) -> Result<AttributeSelector, SelectorError> {
        let name = name.into();
        if name.is_empty() {
            return Err(SelectorError::Construction(
                "attribute selector requires a non-empty attribute name".to_string(),
            ));
        }
        if op != AttributeOp::Exists && value.as_deref().is_none_or(str::is_empty) {
            return Err(SelectorError::Construction(format!(
                "attribute selector on {name:?} requires a non-empty value"
            )));
        }
        Ok(AttributeSelector { op, name, value })
    }

    /// The operator.
    #[must_use]
    pub fn op(&self) -> AttributeOp {
        self.op
    }

    /// The attribute name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The comparison value, absent only for [`AttributeOp::Exists`].
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// Test this attribute selector against an element.
    #[must_use]
    pub fn matches(&self, element: &ElementData) -> bool {
        if self.op == AttributeOp::Exists {
            return element.has_attr(&self.name);
        }
        let (Some(have), Some(want)) = (element.attr(&self.name), self.value.as_deref()) else {
            return false;
        };
        match self.op {
            AttributeOp::Exists => true,
            AttributeOp::Equals => have == want,
            AttributeOp::Includes => have.split_ascii_whitespace().any(|word| word == want),
            AttributeOp::DashMatch => {
                have == want
                    || have
                        .strip_prefix(want)
                        .is_some_and(|rest| rest.starts_with('-'))
            }
            AttributeOp::PrefixMatch => have.starts_with(want),
            AttributeOp::SuffixMatch => have.ends_with(want),
            AttributeOp::SubstringMatch => have.contains(want),
        }
    }
}

/// Text selector operators.
///
/// The `Own` forms look only at the node's direct text children; the
/// plain forms look at the full concatenated descendant text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextOp {
    /// `:contains(s)` — descendant text contains the substring.
    Contains,
    /// `:containsown(s)` — direct-child text contains the substring.
    ContainsOwn,
    /// `:matches(s)` — descendant text equals the string exactly.
    Matches,
    /// `:matchesown(s)` — direct-child text equals the string exactly.
    MatchesOwn,
}

/// A test against a node's text content. Case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSelector {
    op: TextOp,
    needle: String,
}

impl TextSelector {
    /// Build a text selector.
    ///
    /// # Errors
    ///
    /// Returns [`SelectorError::Construction`] if the needle is empty.
    pub fn new(op: TextOp, needle: impl Into<String>) -> Result<TextSelector, SelectorError> {
        let needle = needle.into();
        if needle.is_empty() {
            return Err(SelectorError::Construction(
                "text selector requires a non-empty string".to_string(),
            ));
        }
        Ok(TextSelector { op, needle })
    }

    /// The operator.
    #[must_use]
    pub fn op(&self) -> TextOp {
        self.op
    }

    /// The target string.
    #[must_use]
    pub fn needle(&self) -> &str {
        &self.needle
    }

    /// Test this text selector against a node.
    #[must_use]
    pub fn matches(&self, tree: &DomTree, node: NodeId) -> bool {
        match self.op {
            TextOp::Contains => tree.text(node).contains(&self.needle),
            TextOp::ContainsOwn => tree.own_text(node).contains(&self.needle),
            TextOp::Matches => tree.text(node) == self.needle,
            TextOp::MatchesOwn => tree.own_text(node) == self.needle,
        }
    }
}

/// A structural-position test, the `An+B` notation of the `nth-*`
/// pseudo-class family per
/// [§ 6.6.5 Structural pseudo-classes](https://www.w3.org/TR/selectors-3/#structural-pseudos).
///
/// Matches when the node's 1-based position among its element siblings
/// satisfies `position = step*k + offset` for some `k >= 0`. With
/// `step == 0` this degenerates to an exact position test, which is how
/// `first-child` and friends are expressed (`step=0, offset=1`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NthSelector {
    /// The `A` coefficient of `An+B`.
    pub step: i32,
    /// The `B` offset of `An+B`.
    pub offset: i32,
    /// Count position from the last sibling instead of the first.
    pub from_last: bool,
    /// Count only siblings with the same tag (`-of-type` variants).
    pub of_type: bool,
}

impl NthSelector {
    /// Test the node's sibling position against this `An+B` pattern.
    ///
    /// A node with no parent (the document root) never matches. For the
    /// degenerate `step == 0` form the result also reports whether a
    /// backward sibling scan can still find a match: positions shrink
    /// toward the front of the sibling list, so once the scan passes the
    /// target offset nothing earlier can match.
    #[must_use]
    pub fn matches(&self, tree: &DomTree, node: NodeId) -> MatchResult {
        let Some(position) = sibling_position(tree, node, self.of_type, self.from_last) else {
            return MatchResult::MISS;
        };

        if self.step == 0 {
            let matched = position == self.offset;
            let more = if matched {
                false
            } else if self.from_last {
                position < self.offset
            } else {
                position > self.offset
            };
            return MatchResult::new(matched, more);
        }

        // Widened arithmetic: position and offset are both i32, so their
        // difference can exceed the i32 range for extreme offsets.
        let step = i64::from(self.step);
        let delta = i64::from(position) - i64::from(self.offset);
        MatchResult::from(delta % step == 0 && delta / step >= 0)
    }
}

/// Operators wrapping a single sub-selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `:not(s)` — the sub-selector does not match this node.
    Not,
    /// `:has(s)` — some strict descendant matches the sub-selector.
    HasDescendant,
    /// `:haschild(s)` — some direct child matches the sub-selector.
    HasChild,
}

/// Operators combining two sub-selectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// `a, b` — either side matches this node directly.
    Union,
    /// `ab` (compound) — both sides match this node directly.
    Intersection,
    /// `a b` — right matches here, left matches some strict ancestor.
    Descendant,
    /// `a > b` — right matches here, left matches the immediate parent.
    Child,
    /// `a + b` — right matches here, left matches the immediately
    /// preceding element sibling.
    Adjacent,
    /// `a ~ b` — right matches here, left matches any preceding element
    /// sibling.
    Sibling,
}

/// A selector tree node: a closed, self-contained predicate over document
/// nodes. Never holds a back-reference to its parent selector or to the
/// document tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// Matches every node. Used as a synthetic left-hand operand when a
    /// pseudo-class has no preceding type or attribute qualifier, so that
    /// candidate pre-filtering still has something to index on.
    Dummy,
    /// Matches a node with no element children and no non-whitespace
    /// text children.
    Empty,
    /// Matches an element whose tag equals the stored tag.
    Tag(Tag),
    /// Structural-position test (`nth-child` family and degenerates).
    Nth(NthSelector),
    /// `only-child` / `only-of-type`: the sole (same-tag) element sibling.
    Only {
        /// Restrict the sibling count to same-tag siblings.
        of_type: bool,
    },
    /// Attribute test (also carries `#id` and `.class` selectors).
    Attribute(AttributeSelector),
    /// Text-content test.
    Text(TextSelector),
    /// Logical wrapper around one sub-selector.
    Unary {
        /// How the sub-selector applies.
        op: UnaryOp,
        /// The wrapped sub-selector.
        inner: Arc<Selector>,
    },
    /// Combination of two sub-selectors.
    Binary {
        /// The structural relationship between the two sides.
        op: BinaryOp,
        /// The left-hand sub-selector.
        left: Arc<Selector>,
        /// The right-hand sub-selector.
        right: Arc<Selector>,
    },
}

impl Selector {
    /// Wrap a sub-selector in a unary operator.
    #[must_use]
    pub fn unary(op: UnaryOp, inner: Arc<Selector>) -> Selector {
        Selector::Unary { op, inner }
    }

    /// Combine two sub-selectors with a binary operator.
    #[must_use]
    pub fn binary(op: BinaryOp, left: Arc<Selector>, right: Arc<Selector>) -> Selector {
        Selector::Binary { op, left, right }
    }

    /// Match this selector against one document node.
    ///
    /// Evaluation is top-down per call, pure, and never errors; matching
    /// cost is bounded by the tree region the combinators traverse.
    #[must_use]
    pub fn matches(&self, tree: &DomTree, node: NodeId) -> MatchResult {
        match self {
            Selector::Dummy => MatchResult::HIT,
            Selector::Empty => MatchResult::from(is_empty_node(tree, node)),
            Selector::Tag(tag) => MatchResult::from(
                tree.as_element(node).is_some_and(|el| el.tag == *tag),
            ),
            Selector::Nth(nth) => nth.matches(tree, node),
            Selector::Only { of_type } => MatchResult::from(is_only_sibling(tree, node, *of_type)),
            Selector::Attribute(attr) => MatchResult::from(
                tree.as_element(node).is_some_and(|el| attr.matches(el)),
            ),
            Selector::Text(text) => MatchResult::from(text.matches(tree, node)),
            Selector::Unary { op, inner } => MatchResult::from(match op {
                UnaryOp::Not => !inner.matches(tree, node).matched,
                UnaryOp::HasDescendant => any_descendant_matches(tree, node, inner),
                UnaryOp::HasChild => tree
                    .children(node)
                    .iter()
                    .any(|&child| inner.matches(tree, child).matched),
            }),
            Selector::Binary { op, left, right } => match op {
                // Union and intersection forward the exhaustion flag so
                // that a structural test buried in a compound sequence
                // still terminates an enclosing sibling scan. A union can
                // still match while either side can; an intersection only
                // while both sides can.
                BinaryOp::Union => {
                    let l = left.matches(tree, node);
                    let r = right.matches(tree, node);
                    MatchResult::new(
                        l.matched || r.matched,
                        l.more_candidates || r.more_candidates,
                    )
                }
                BinaryOp::Intersection => {
                    let l = left.matches(tree, node);
                    let r = right.matches(tree, node);
                    MatchResult::new(
                        l.matched && r.matched,
                        l.more_candidates && r.more_candidates,
                    )
                }
                BinaryOp::Descendant => {
                    if !right.matches(tree, node).matched {
                        return MatchResult::MISS;
                    }
                    MatchResult::from(
                        tree.ancestors(node)
                            .filter(|&a| tree.as_element(a).is_some())
                            .any(|a| left.matches(tree, a).matched),
                    )
                }
                BinaryOp::Child => {
                    if !right.matches(tree, node).matched {
                        return MatchResult::MISS;
                    }
                    MatchResult::from(tree.parent(node).is_some_and(|p| {
                        tree.as_element(p).is_some() && left.matches(tree, p).matched
                    }))
                }
                BinaryOp::Adjacent => {
                    if !right.matches(tree, node).matched {
                        return MatchResult::MISS;
                    }
                    let prev = tree
                        .preceding_siblings(node)
                        .find(|&s| tree.as_element(s).is_some());
                    MatchResult::from(
                        prev.is_some_and(|p| left.matches(tree, p).matched),
                    )
                }
                BinaryOp::Sibling => {
                    if !right.matches(tree, node).matched {
                        return MatchResult::MISS;
                    }
                    for sibling in tree.preceding_siblings(node) {
                        if tree.as_element(sibling).is_none() {
                            continue;
                        }
                        let result = left.matches(tree, sibling);
                        if result.matched {
                            return MatchResult::HIT;
                        }
                        if !result.more_candidates {
                            break;
                        }
                    }
                    MatchResult::MISS
                }
            },
        }
    }
}

/// A parsed selector ready for matching: the shared root of the node
/// tree, plus (optionally) the original source text for diagnostics.
#[derive(Debug, Clone)]
pub struct SelectorTree {
    root: Arc<Selector>,
    source: Option<String>,
}

impl SelectorTree {
    /// Wrap a selector root, optionally retaining the source string.
    #[must_use]
    pub fn new(root: Arc<Selector>, source: Option<String>) -> SelectorTree {
        SelectorTree { root, source }
    }

    /// The root selector node.
    #[must_use]
    pub fn root(&self) -> &Arc<Selector> {
        &self.root
    }

    /// The original selector string, if retention was requested at parse
    /// time.
    #[must_use]
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Match this selector against one document node.
    #[must_use]
    pub fn matches(&self, tree: &DomTree, node: NodeId) -> bool {
        self.root.matches(tree, node).matched
    }

    /// Match with the full structured result.
    #[must_use]
    pub fn match_node(&self, tree: &DomTree, node: NodeId) -> MatchResult {
        self.root.matches(tree, node)
    }

    /// Collect every element in the document that this selector matches,
    /// in document order.
    #[must_use]
    pub fn select(&self, tree: &DomTree) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![tree.root()];
        while let Some(id) = stack.pop() {
            if tree.as_element(id).is_some() && self.matches(tree, id) {
                out.push(id);
            }
            for &child in tree.children(id).iter().rev() {
                stack.push(child);
            }
        }
        out
    }
}

/// `:empty` — no element children, and any text children are
/// whitespace-only. Comment children are ignored.
fn is_empty_node(tree: &DomTree, node: NodeId) -> bool {
    tree.children(node)
        .iter()
        .all(|&child| match tree.get(child).map(|n| &n.node_type) {
            Some(NodeType::Text(t)) => t.trim().is_empty(),
            Some(NodeType::Comment(_)) => true,
            Some(NodeType::Element(_) | NodeType::Document) => false,
            None => true,
        })
}

/// `only-child` / `only-of-type` — the node is the sole element child of
/// its parent, optionally counting same-tag siblings only.
fn is_only_sibling(tree: &DomTree, node: NodeId, of_type: bool) -> bool {
    let Some(element) = tree.as_element(node) else {
        return false;
    };
    let Some(parent) = tree.parent(node) else {
        return false;
    };
    tree.element_children(parent)
        .into_iter()
        .filter(|&sibling| {
            !of_type || tree.as_element(sibling).is_some_and(|el| el.tag == element.tag)
        })
        .count()
        == 1
}

/// The node's 1-based position among its element siblings, filtered to
/// same-tag siblings when `of_type`, counted from the end when
/// `from_last`. `None` when the node is not an element or has no parent.
fn sibling_position(tree: &DomTree, node: NodeId, of_type: bool, from_last: bool) -> Option<i32> {
    let element = tree.as_element(node)?;
    let parent = tree.parent(node)?;
    let siblings: Vec<NodeId> = tree
        .element_children(parent)
        .into_iter()
        .filter(|&sibling| {
            !of_type || tree.as_element(sibling).is_some_and(|el| el.tag == element.tag)
        })
        .collect();
    let index = siblings.iter().position(|&s| s == node)?;
    let position = if from_last {
        siblings.len() - index
    } else {
        index + 1
    };
    i32::try_from(position).ok()
}

/// Whether any strict descendant of `node` matches `selector`.
fn any_descendant_matches(tree: &DomTree, node: NodeId, selector: &Selector) -> bool {
    let mut stack: Vec<NodeId> = tree.children(node).to_vec();
    while let Some(id) = stack.pop() {
        if selector.matches(tree, id).matched {
            return true;
        }
        stack.extend_from_slice(tree.children(id));
    }
    false
}
