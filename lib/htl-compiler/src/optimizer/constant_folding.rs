use htl_expression::{ops, BinaryOperator, ExpressionNode, OperatorError, UnaryOperator, Value};

use super::tracker::ConstantScopes;
use super::StreamTransform;
use crate::commands::Command;
use crate::error::CompilerError;
use crate::stream::PushStream;

/// Evaluates the operations whose operands are known at compile time.
///
/// Identifiers bound to a scalar constant by an enclosing binding are replaced by the constant first.
#[derive(Debug, Default)]
pub(super) struct ConstantFolding {
    scopes: ConstantScopes,
}

impl ConstantFolding {
    fn fold(&self, expression: &ExpressionNode) -> Result<ExpressionNode, CompilerError> {
        expression.clone().transform(&mut |node| self.fold_node(node))
    }

    fn fold_node(&self, node: ExpressionNode) -> Result<ExpressionNode, CompilerError> {
        match node {
            ExpressionNode::Identifier(name) => Ok(match self.scopes.constant(&name) {
                Some(constant) => constant.clone(),
                None => ExpressionNode::Identifier(name),
            }),
            ExpressionNode::UnaryOperation { operator, operand } => match Value::from_literal(&operand) {
                Some(value) => {
                    let result = ops::unary(operator, &value);
                    evaluated(ExpressionNode::UnaryOperation { operator, operand }, result)
                }
                None => Ok(ExpressionNode::UnaryOperation { operator, operand }),
            },
            ExpressionNode::BinaryOperation { operator, left, right } => {
                match (Value::from_literal(&left), Value::from_literal(&right)) {
                    (Some(left_value), Some(right_value)) => {
                        let result = ops::binary(operator, &left_value, &right_value);
                        evaluated(ExpressionNode::BinaryOperation { operator, left, right }, result)
                    }
                    // `&&` and `||` return one of their operands, and only the left one decides which.
                    (Some(left_value), None) if matches!(operator, BinaryOperator::And | BinaryOperator::Or) => {
                        let pick_left = left_value.is_truthy() == (operator == BinaryOperator::Or);
                        Ok(if pick_left { *left } else { *right })
                    }
                    // With a boolean left operand, `b && true` and `b || false` are `b`.
                    (None, Some(right_value))
                        if matches!(operator, BinaryOperator::And | BinaryOperator::Or)
                            && right_value.is_truthy() == (operator == BinaryOperator::And)
                            && is_boolean_valued(&left) =>
                    {
                        Ok(*left)
                    }
                    _ => Ok(ExpressionNode::BinaryOperation { operator, left, right }),
                }
            }
            ExpressionNode::TernaryOperation {
                condition,
                then_branch,
                else_branch,
            } => match Value::from_literal(&condition) {
                Some(value) if value.is_truthy() => Ok(*then_branch),
                Some(_) => Ok(*else_branch),
                None => Ok(ExpressionNode::TernaryOperation {
                    condition,
                    then_branch,
                    else_branch,
                }),
            },
            other => Ok(other),
        }
    }
}

/// Returns `true` if `node` always evaluates to a boolean.
fn is_boolean_valued(node: &ExpressionNode) -> bool {
    match node {
        ExpressionNode::BooleanConstant(_) => true,
        ExpressionNode::UnaryOperation { operator, .. } => *operator == UnaryOperator::Not,
        ExpressionNode::BinaryOperation { operator, left, right } => match operator {
            BinaryOperator::And | BinaryOperator::Or => is_boolean_valued(left) && is_boolean_valued(right),
            BinaryOperator::Lt
            | BinaryOperator::Leq
            | BinaryOperator::Gt
            | BinaryOperator::Geq
            | BinaryOperator::Eq
            | BinaryOperator::Neq
            | BinaryOperator::StrictEq
            | BinaryOperator::StrictNeq
            | BinaryOperator::In => true,
            _ => false,
        },
        _ => false,
    }
}

/// Replaces `node` with the literal form of the result of evaluating it.
fn evaluated(node: ExpressionNode, result: Result<Value, OperatorError>) -> Result<ExpressionNode, CompilerError> {
    match result {
        Ok(value) => Ok(value.to_literal().unwrap_or(node)),
        Err(e) => Err(CompilerError::from(e)),
    }
}

impl StreamTransform for ConstantFolding {
    fn name(&self) -> &'static str {
        "constant_folding"
    }

    fn on_command(&mut self, command: &Command, output: &mut PushStream) -> Result<(), CompilerError> {
        let command = match command {
            Command::VariableBindingStart { variable, expression } => Command::bind(variable, self.fold(expression)?),
            Command::VariableBindingGlobal { variable, expression } => {
                Command::global(variable, self.fold(expression)?)
            }
            other => other.clone(),
        };
        self.scopes.observe(&command);
        output.write(command)
    }
}
