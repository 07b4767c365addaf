//! HTML markup parsing.

use snafu::Snafu;

use crate::error::CompilerError;

mod parser;
pub use self::parser::{DocumentHandler, HtmlParser};

mod tree;
pub use self::tree::{parse_template, Element, Node, Template};

/// Elements that never have content, and so never have a closing tag.
pub const VOID_ELEMENTS: [&str; 14] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source", "track", "wbr",
];

/// Returns `true` if `name` is a void element, ignoring case.
pub fn is_void_element(name: &str) -> bool {
    VOID_ELEMENTS.iter().any(|void| void.eq_ignore_ascii_case(name))
}

/// An attribute of a start tag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attribute {
    /// Attribute name.
    pub name: String,

    /// Raw attribute value, or `None` for a bare attribute.
    pub value: Option<String>,

    /// Quote character the value was written with, if any.
    pub quote: Option<char>,
}

impl Attribute {
    /// Creates a new `Attribute`.
    pub fn new<N: Into<String>>(name: N, value: Option<String>, quote: Option<char>) -> Self {
        Self {
            name: name.into(),
            value,
            quote,
        }
    }
}

/// Markup parsing error.
#[derive(Debug, Snafu, Clone, PartialEq, Eq)]
#[snafu(context(suffix(false)), visibility(pub(crate)))]
pub enum MarkupError {
    /// The template ended inside a comment, tag or declaration.
    #[snafu(display("Unterminated {} at end of template.", construct))]
    Unterminated {
        /// What was left open.
        construct: &'static str,

        /// The markup read since the construct started.
        fragment: String,
    },
}

impl From<MarkupError> for CompilerError {
    fn from(e: MarkupError) -> Self {
        let MarkupError::Unterminated { fragment, .. } = &e;
        let fragment = fragment.clone();
        CompilerError::compile(e.to_string()).with_offending_input(fragment)
    }
}
