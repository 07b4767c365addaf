use htl_expression::{Expression, ExpressionNode, RuntimeFunction};

use super::{ConsumedOptions, Filter};

const JOIN_OPTION: &str = "join";

/// Joins the items of a collection with a separator.
pub struct JoinFilter;

impl Filter for JoinFilter {
    fn name(&self) -> &'static str {
        "join"
    }

    fn options(&self) -> &'static [&'static str] {
        &[JOIN_OPTION]
    }

    fn required_options(&self) -> &'static [&'static str] {
        &[JOIN_OPTION]
    }

    fn rewrite(&self, expression: Expression, mut consumed: ConsumedOptions) -> Expression {
        let separator = consumed.shift_remove(JOIN_OPTION).unwrap_or(ExpressionNode::NullLiteral);
        let joined = ExpressionNode::call(RuntimeFunction::Join, vec![expression.root().clone(), separator]);
        expression.with_node(joined)
    }
}

#[cfg(test)]
mod tests {
    use similar_asserts::assert_eq;

    use super::*;
    use crate::context::ExpressionContext;
    use crate::filter::tests::expression;

    #[test]
    fn separator_is_second_argument() {
        let filtered = JoinFilter.apply(expression("tags @ join=', '"), ExpressionContext::Text);
        assert_eq!(filtered.root().to_string(), "join(tags, ', ')");
        assert!(filtered.options().is_empty());
    }

    #[test]
    fn not_applied_in_use_context() {
        let filtered = JoinFilter.apply(expression("tags @ join=', '"), ExpressionContext::PluginUse);
        assert_eq!(filtered.root(), &ExpressionNode::identifier("tags"));
    }
}
