//! Selector engine errors.
//!
//! Two kinds cover everything: every grammar violation during parsing is a
//! [`SelectorError::Syntax`] carrying the unconsumed remainder of the
//! input at the point of failure, and every attempt to build a selector
//! node with a structurally invalid payload is a
//! [`SelectorError::Construction`]. Matching never errors.

use thiserror::Error;

/// An error produced while parsing or constructing a selector.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
    /// The selector string violates the grammar. `remaining` is the
    /// unconsumed suffix of the input at the point of failure, attached
    /// for diagnostics.
    #[error("selector syntax error: {message} (remaining input: {remaining:?})")]
    Syntax {
        /// What went wrong, in human-readable form.
        message: String,
        /// The unconsumed suffix of the input at the point of failure.
        remaining: String,
    },

    /// A selector node was built with a structurally invalid payload,
    /// e.g. an attribute selector with an empty attribute name.
    #[error("selector construction error: {0}")]
    Construction(String),
}
