use htl_expression::{Expression, ExpressionNode, RuntimeFunction};

use super::{ConsumedOptions, Filter, CONTEXT_OPTION};

/// Escapes the value of an expression for its markup context.
///
/// Runs last, so that it escapes the final value of the expression.
pub struct XssFilter;

impl Filter for XssFilter {
    fn name(&self) -> &'static str {
        "xss"
    }

    fn priority(&self) -> i32 {
        110
    }

    fn options(&self) -> &'static [&'static str] {
        &[]
    }

    fn rewrite(&self, mut expression: Expression, _consumed: ConsumedOptions) -> Expression {
        match expression.remove_option(CONTEXT_OPTION) {
            Some(context) => {
                let escaped = ExpressionNode::call(RuntimeFunction::Xss, vec![expression.root().clone(), context]);
                expression.with_node(escaped)
            }
            None => expression,
        }
    }
}
