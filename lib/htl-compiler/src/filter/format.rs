use htl_expression::{Expression, ExpressionNode, RuntimeFunction};

use super::{ConsumedOptions, Filter};

/// Formats the value of an expression with a pattern.
pub struct FormatFilter;

impl Filter for FormatFilter {
    fn name(&self) -> &'static str {
        "format"
    }

    fn options(&self) -> &'static [&'static str] {
        &["format", "type", "locale", "formatLocale", "timezone"]
    }

    fn required_options(&self) -> &'static [&'static str] {
        &["format"]
    }

    fn rewrite(&self, expression: Expression, consumed: ConsumedOptions) -> Expression {
        let formatted = ExpressionNode::call(
            RuntimeFunction::Format,
            vec![expression.root().clone(), ExpressionNode::MapLiteral(consumed)],
        );
        expression.with_node(formatted)
    }
}
