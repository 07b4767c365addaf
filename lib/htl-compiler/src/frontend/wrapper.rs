use htl_expression::{BinaryOperator, Expression, ExpressionNode, Fragment, Interpolation};
use indexmap::{IndexMap, IndexSet};

use crate::context::{ExpressionContext, MarkupContext};
use crate::filter::{FilterChain, CONTEXT_OPTION};
use crate::stream::StreamMessage;

/// Turns interpolations into expressions, and runs expressions through the filter chain.
pub struct ExpressionWrapper<'a> {
    filters: &'a FilterChain,
    known_options: &'a IndexSet<String>,
}

impl<'a> ExpressionWrapper<'a> {
    /// Creates a new `ExpressionWrapper`.
    pub fn new(filters: &'a FilterChain, known_options: &'a IndexSet<String>) -> Self {
        Self { filters, known_options }
    }

    /// Builds a single expression out of an interpolation.
    ///
    /// Every expression fragment is adjusted to the given contexts on its own. The fragments are then concatenated,
    /// and their remaining options merged. When there is more than one fragment, the `context` option is dropped.
    ///
    /// Unknown options found on expression fragments are reported to `warnings`, unless the expression context takes
    /// free-form parameters.
    pub fn transform(
        &self, interpolation: Interpolation, raw_text: &str, markup_context: Option<MarkupContext>,
        expression_context: ExpressionContext, warnings: &mut Vec<StreamMessage>,
    ) -> Expression {
        let fragment_count = interpolation.len();
        let mut roots = Vec::with_capacity(fragment_count);
        let mut options = IndexMap::new();

        for fragment in interpolation.into_fragments() {
            match fragment {
                Fragment::Text(text) => roots.push(ExpressionNode::StringConstant(text)),
                Fragment::Expression(expression) => {
                    if !expression_context.is_parametrizable() {
                        self.check_options(&expression, warnings);
                    }
                    let (root, fragment_options) = self
                        .adjust_to_context(expression, markup_context, expression_context)
                        .into_parts();
                    options.extend(fragment_options);
                    roots.push(root);
                }
            }
        }

        if fragment_count > 1 {
            options.shift_remove(CONTEXT_OPTION);
        }

        let root = roots
            .into_iter()
            .reduce(|left, right| ExpressionNode::binary(BinaryOperator::Concatenate, left, right))
            .unwrap_or_else(|| ExpressionNode::string(""));
        Expression::new(root, options, raw_text)
    }

    /// Adjusts an expression to the given contexts.
    ///
    /// If a markup context is given and the expression has no `context` option, the markup context becomes its
    /// `context` option. The expression is then run through the filter chain.
    pub fn adjust_to_context(
        &self, mut expression: Expression, markup_context: Option<MarkupContext>, expression_context: ExpressionContext,
    ) -> Expression {
        if let Some(markup_context) = markup_context {
            if !expression.contains_option(CONTEXT_OPTION) {
                expression.set_option(CONTEXT_OPTION, ExpressionNode::string(markup_context.name()));
            }
        }
        self.filters.apply(expression, expression_context)
    }

    fn check_options(&self, expression: &Expression, warnings: &mut Vec<StreamMessage>) {
        for option in expression.options().keys() {
            if !self.known_options.contains(option) {
                warnings.push(StreamMessage::new(
                    format!("Unknown option '{}'.", option),
                    expression.raw_text(),
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use htl_expression::parse_interpolation;
    use similar_asserts::assert_eq;

    use super::*;

    fn known_options() -> IndexSet<String> {
        ["context", "i18n", "join"].iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn fragments_are_escaped_then_concatenated() {
        let filters = FilterChain::builtin();
        let known = known_options();
        let wrapper = ExpressionWrapper::new(&filters, &known);
        let mut warnings = Vec::new();

        let text = "Hello ${name}!";
        let expression = wrapper.transform(
            parse_interpolation(text).unwrap(),
            text,
            Some(MarkupContext::Text),
            ExpressionContext::Text,
            &mut warnings,
        );
        assert_eq!(
            expression.root().to_string(),
            "concat(concat('Hello ', xss(name, 'text')), '!')"
        );
        assert_eq!(expression.raw_text(), text);
        assert!(expression.options().is_empty());
        assert!(warnings.is_empty());
    }

    #[test]
    fn unknown_options_warn_outside_parametrizable_contexts() {
        let filters = FilterChain::builtin();
        let known = known_options();
        let wrapper = ExpressionWrapper::new(&filters, &known);

        let text = "${a @ unknownOption1, unknownOption2}";
        let mut warnings = Vec::new();
        wrapper.transform(
            parse_interpolation(text).unwrap(),
            text,
            None,
            ExpressionContext::PluginTest,
            &mut warnings,
        );
        assert_eq!(
            warnings,
            vec![
                StreamMessage::new("Unknown option 'unknownOption1'.", text),
                StreamMessage::new("Unknown option 'unknownOption2'.", text),
            ]
        );

        let mut warnings = Vec::new();
        wrapper.transform(
            parse_interpolation(text).unwrap(),
            text,
            None,
            ExpressionContext::PluginCall,
            &mut warnings,
        );
        assert!(warnings.is_empty());
    }

    #[test]
    fn empty_interpolation_is_empty_string() {
        let filters = FilterChain::builtin();
        let known = known_options();
        let wrapper = ExpressionWrapper::new(&filters, &known);
        let expression = wrapper.transform(
            Interpolation::default(),
            "",
            None,
            ExpressionContext::PluginUnwrap,
            &mut Vec::new(),
        );
        assert_eq!(expression.root(), &ExpressionNode::string(""));
    }
}
