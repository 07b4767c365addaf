use htl_expression::{Expression, ExpressionNode, RuntimeFunction};

use super::{ConsumedOptions, Filter};
use crate::context::ExpressionContext;

/// Rewrites parts of a URI.
///
/// Not applied to `include` and `resource` expressions, where the same option names are handled by the plugins
/// themselves.
pub struct UriManipulationFilter;

impl Filter for UriManipulationFilter {
    fn name(&self) -> &'static str {
        "uriManipulation"
    }

    fn options(&self) -> &'static [&'static str] {
        &[
            "scheme",
            "domain",
            "path",
            "appendPath",
            "prependPath",
            "selectors",
            "addSelectors",
            "removeSelectors",
            "extension",
            "suffix",
            "prependSuffix",
            "appendSuffix",
            "fragment",
            "query",
            "addQuery",
            "removeQuery",
        ]
    }

    fn applies_to(&self, context: ExpressionContext) -> bool {
        !context.is_parametrizable()
            && context != ExpressionContext::PluginInclude
            && context != ExpressionContext::PluginResource
    }

    fn rewrite(&self, expression: Expression, consumed: ConsumedOptions) -> Expression {
        if consumed.is_empty() {
            return expression;
        }
        let manipulated = ExpressionNode::call(
            RuntimeFunction::UriManipulation,
            vec![expression.root().clone(), ExpressionNode::MapLiteral(consumed)],
        );
        expression.with_node(manipulated)
    }
}

#[cfg(test)]
mod tests {
    use similar_asserts::assert_eq;

    use super::*;
    use crate::filter::tests::expression;

    #[test]
    fn fires_only_with_uri_options() {
        let untouched = UriManipulationFilter.apply(expression("link @ context='uri'"), ExpressionContext::Attribute);
        assert_eq!(untouched.root(), &ExpressionNode::identifier("link"));

        let filtered = UriManipulationFilter.apply(
            expression("link @ extension='html', selectors='mobile'"),
            ExpressionContext::Attribute,
        );
        assert_eq!(
            filtered.root().to_string(),
            "uriManipulation(link, {'extension': 'html', 'selectors': 'mobile'})"
        );
    }

    #[test]
    fn include_and_resource_keep_their_options() {
        for context in [ExpressionContext::PluginInclude, ExpressionContext::PluginResource] {
            let filtered = UriManipulationFilter.apply(expression("'path' @ appendPath='x'"), context);
            assert!(filtered.contains_option("appendPath"));
        }
    }
}
