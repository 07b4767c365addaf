use serde::Serialize;

use crate::error::{ExpressionError, Syntax};
use crate::node::Expression;
use crate::parser::parse_expression;

/// A piece of interpolated text.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum Fragment {
    /// Literal text.
    Text(String),

    /// An embedded expression.
    Expression(Expression),
}

/// Text with embedded `${...}` expressions, split into its fragments.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Interpolation {
    fragments: Vec<Fragment>,
}

impl Interpolation {
    /// Returns the fragments in source order.
    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    /// Consumes the interpolation, returning its fragments.
    pub fn into_fragments(self) -> Vec<Fragment> {
        self.fragments
    }

    /// Returns the number of fragments.
    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    /// Returns `true` if there are no fragments.
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Returns `true` if the interpolation contains no expressions.
    pub fn is_plain_text(&self) -> bool {
        self.fragments.iter().all(|f| matches!(f, Fragment::Text(_)))
    }

    /// Returns the literal text, if the interpolation contains no expressions.
    pub fn plain_text(&self) -> Option<String> {
        if !self.is_plain_text() {
            return None;
        }
        Some(
            self.fragments
                .iter()
                .filter_map(|f| match f {
                    Fragment::Text(text) => Some(text.as_str()),
                    Fragment::Expression(_) => None,
                })
                .collect(),
        )
    }

    fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(Fragment::Text(last)) = self.fragments.last_mut() {
            last.push_str(text);
        } else {
            self.fragments.push(Fragment::Text(text.to_string()));
        }
    }
}

impl FromIterator<Fragment> for Interpolation {
    /// Collects fragments, merging adjacent text fragments and dropping empty ones.
    fn from_iter<I: IntoIterator<Item = Fragment>>(iter: I) -> Self {
        let mut interpolation = Interpolation::default();
        for fragment in iter {
            match fragment {
                Fragment::Text(text) => interpolation.push_text(&text),
                expression => interpolation.fragments.push(expression),
            }
        }
        interpolation
    }
}

/// Splits text into literal fragments and parsed `${...}` expressions.
///
/// `\${` stands for a literal `${`. The end of an expression is found by matching braces, skipping over quoted
/// strings.
///
/// # Errors
///
/// If an expression is unterminated or cannot be parsed, an error is returned. Its offending input is the raw text of
/// the expression.
pub fn parse_interpolation(text: &str) -> Result<Interpolation, ExpressionError> {
    let mut interpolation = Interpolation::default();
    let bytes = text.as_bytes();
    let mut text_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'\\' && text[i + 1..].starts_with("${") {
            interpolation.push_text(&text[text_start..i]);
            interpolation.push_text("${");
            i += 3;
            text_start = i;
            continue;
        }

        if bytes[i] == b'$' && bytes.get(i + 1) == Some(&b'{') {
            let end = match find_expression_end(bytes, i + 2) {
                Some(end) => end,
                None => {
                    return Syntax {
                        message: "Unterminated expression",
                        offending_input: &text[i..],
                    }
                    .fail()
                }
            };

            interpolation.push_text(&text[text_start..i]);
            let raw_text = &text[i..=end];
            let expression = parse_expression(&text[i + 2..end], raw_text)?;
            interpolation.fragments.push(Fragment::Expression(expression));
            i = end + 1;
            text_start = i;
            continue;
        }

        i += 1;
    }

    interpolation.push_text(&text[text_start..]);
    Ok(interpolation)
}

/// Returns the index of the `}` closing an expression whose body starts at `start`.
fn find_expression_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote = None;
    let mut i = start;
    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(q) => {
                if b == b'\\' {
                    i += 1;
                } else if b == q {
                    quote = None;
                }
            }
            None => match b {
                b'\'' | b'"' => quote = Some(b),
                b'{' => depth += 1,
                b'}' if depth == 0 => return Some(i),
                b'}' => depth -= 1,
                _ => {}
            },
        }
        i += 1;
    }
    None
}
