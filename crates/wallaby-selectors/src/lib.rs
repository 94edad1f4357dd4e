//! CSS3 selector parsing and matching for the Wallaby engine.
//!
//! # Scope
//!
//! This crate implements:
//! - **Selector tree** ([Selectors Level 3](https://www.w3.org/TR/selectors-3/))
//!   - Type, universal, class, ID, and attribute selectors
//!   - Structural pseudo-classes with full `An+B` arithmetic
//!   - Text selectors (`:contains`, `:matches` and their own-text forms)
//!   - Unary combinators (`:not`, `:has`, `:haschild`)
//!   - Binary combinators (descendant, child, sibling, adjacent,
//!     intersection, union)
//! - **Selector parser** ([§ 4 Selector syntax](https://www.w3.org/TR/selectors-3/#w3cselgrammar))
//!   - Recursive descent with a single forward-moving cursor
//!   - Quoted strings, character references, backslash escapes
//!   - Descriptive errors carrying the unconsumed input remainder
//!
//! # Design
//!
//! [`parse_selector`] turns a selector string into an immutable, shareable
//! [`SelectorTree`](selector::SelectorTree). The tree is a closed sum type
//! with [`Arc`](std::sync::Arc)-shared children; selector groups are
//! DAG-like, never deep-copied. Matching evaluates top-down against an
//! externally owned [`wallaby_dom::DomTree`] snapshot, with no caching
//! across calls, and never mutates or errors.
//!
//! # Not implemented
//!
//! - Selector serialization (beyond optionally retaining the source text)
//! - CSS property parsing and cascade
//! - Prefix attribute-name matching (`[^attr]`) — rejected at parse time

/// Selector engine errors.
pub mod error;
/// Recursive-descent selector parser.
pub mod parser;
/// Selector tree node variants and matching.
pub mod selector;

pub use error::SelectorError;
pub use parser::parse_selector;
pub use selector::{MatchResult, Selector, SelectorTree};
