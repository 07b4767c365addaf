use htl_expression::{BinaryOperator, Expression, ExpressionNode, UnaryOperator};
use indexmap::IndexMap;

use super::{CompilerContext, Plugin, PluginCallInfo, PluginInvoke};
use crate::commands::Command;
use crate::error::CompilerError;
use crate::stream::PushStream;

const DEFAULT_ITEM_NAME: &str = "item";
const STATUS_SUFFIX: &str = "List";

fn identifier(name: &str) -> ExpressionNode {
    ExpressionNode::identifier(name)
}

fn binary(operator: BinaryOperator, left: ExpressionNode, right: ExpressionNode) -> ExpressionNode {
    ExpressionNode::binary(operator, left, right)
}

/// The variables and bounds of one iteration over a collection.
///
/// The collection is iterated from `begin` to `end`, both inclusive, every `step` items.
struct Iteration {
    collection: ExpressionNode,
    begin_value: Option<ExpressionNode>,
    step_value: Option<ExpressionNode>,
    end_value: Option<ExpressionNode>,

    list: String,
    size: String,
    not_empty: String,
    begin: String,
    step: String,
    end: String,
    valid: String,
    item: String,
    index: String,
    status: String,
    step_condition: String,
    traversal: String,
}

impl Iteration {
    fn new(expression: Expression, call_info: &PluginCallInfo, context: &mut CompilerContext<'_>) -> Self {
        let item = call_info.first_argument().unwrap_or(DEFAULT_ITEM_NAME).to_string();
        let status = format!("{}{}", item, STATUS_SUFFIX);
        let (collection, mut options) = expression.into_parts();
        Self {
            collection,
            begin_value: options.shift_remove("begin"),
            step_value: options.shift_remove("step"),
            end_value: options.shift_remove("end"),
            list: context.generate_variable("collectionVar"),
            size: context.generate_variable("size"),
            not_empty: context.generate_variable("notEmpty"),
            begin: context.generate_variable("begin"),
            step: context.generate_variable("step"),
            end: context.generate_variable("end"),
            valid: context.generate_variable("validStartStepEnd"),
            index: context.generate_variable("index"),
            step_condition: context.generate_variable("stepCondition"),
            traversal: context.generate_variable("traversal"),
            item,
            status,
        }
    }

    /// Opens the scopes that skip empty collections and invalid bounds.
    fn write_guard(&self, stream: &mut PushStream) -> Result<(), CompilerError> {
        stream.write(Command::bind(&self.list, self.collection.clone()))?;
        stream.write(Command::bind(
            &self.size,
            ExpressionNode::unary(UnaryOperator::Length, identifier(&self.list)),
        ))?;
        stream.write(Command::bind(
            &self.not_empty,
            binary(BinaryOperator::Gt, identifier(&self.size), ExpressionNode::int(0)),
        ))?;
        stream.write(Command::when(&self.not_empty, true))?;

        stream.write(Command::bind(
            &self.begin,
            self.begin_value.clone().unwrap_or_else(|| ExpressionNode::int(0)),
        ))?;
        stream.write(Command::bind(
            &self.step,
            self.step_value.clone().unwrap_or_else(|| ExpressionNode::int(1)),
        ))?;
        stream.write(Command::bind(
            &self.end,
            self.end_value.clone().unwrap_or_else(|| identifier(&self.size)),
        ))?;

        let begin_in_range = binary(
            BinaryOperator::And,
            binary(BinaryOperator::Geq, identifier(&self.begin), ExpressionNode::int(0)),
            binary(BinaryOperator::Gt, identifier(&self.step), ExpressionNode::int(0)),
        );
        let valid = binary(
            BinaryOperator::And,
            binary(
                BinaryOperator::And,
                binary(BinaryOperator::Lt, identifier(&self.begin), identifier(&self.size)),
                begin_in_range,
            ),
            binary(BinaryOperator::Gt, identifier(&self.end), ExpressionNode::int(0)),
        );
        stream.write(Command::bind(&self.valid, valid))?;
        stream.write(Command::when(&self.valid, true))
    }

    fn write_guard_end(&self, stream: &mut PushStream) -> Result<(), CompilerError> {
        stream.write(Command::ConditionalEnd)?;
        for _ in 0..4 {
            stream.write(Command::VariableBindingEnd)?;
        }
        stream.write(Command::ConditionalEnd)?;
        for _ in 0..3 {
            stream.write(Command::VariableBindingEnd)?;
        }
        Ok(())
    }

    /// Opens the loop, and the scope that skips the items outside of the bounds.
    fn write_loop(&self, stream: &mut PushStream) -> Result<(), CompilerError> {
        stream.write(Command::loop_over(&self.list, &self.item, &self.index))?;
        stream.write(Command::bind(&self.status, self.status_map()))?;

        let step_condition = if self.begin_value.is_none() && self.step_value.is_none() {
            ExpressionNode::int(0)
        } else {
            binary(
                BinaryOperator::Rem,
                binary(BinaryOperator::Sub, identifier(&self.index), identifier(&self.begin)),
                identifier(&self.step),
            )
        };
        stream.write(Command::bind(&self.step_condition, step_condition))?;

        let traversal = binary(
            BinaryOperator::And,
            binary(
                BinaryOperator::And,
                binary(BinaryOperator::Geq, identifier(&self.index), identifier(&self.begin)),
                binary(BinaryOperator::Leq, identifier(&self.index), identifier(&self.end)),
            ),
            binary(
                BinaryOperator::Eq,
                identifier(&self.step_condition),
                ExpressionNode::int(0),
            ),
        );
        stream.write(Command::bind(&self.traversal, traversal))?;
        stream.write(Command::when(&self.traversal, true))
    }

    fn write_loop_end(&self, stream: &mut PushStream) -> Result<(), CompilerError> {
        stream.write(Command::ConditionalEnd)?;
        for _ in 0..3 {
            stream.write(Command::VariableBindingEnd)?;
        }
        stream.write(Command::LoopEnd)
    }

    /// Builds the value of the `<item>List` status variable.
    fn status_map(&self) -> ExpressionNode {
        let index = identifier(&self.index);
        let is_first = binary(BinaryOperator::Eq, index.clone(), ExpressionNode::int(0));
        let is_last = binary(
            BinaryOperator::Eq,
            index.clone(),
            binary(BinaryOperator::Sub, identifier(&self.size), ExpressionNode::int(1)),
        );
        let parity = binary(BinaryOperator::Rem, index.clone(), ExpressionNode::int(2));

        let mut status = IndexMap::new();
        status.insert("index".to_string(), index.clone());
        status.insert(
            "count".to_string(),
            binary(BinaryOperator::Add, index, ExpressionNode::int(1)),
        );
        status.insert("first".to_string(), is_first.clone());
        status.insert(
            "middle".to_string(),
            ExpressionNode::unary(
                UnaryOperator::Not,
                binary(BinaryOperator::Or, is_first, is_last.clone()),
            ),
        );
        status.insert("last".to_string(), is_last);
        status.insert(
            "odd".to_string(),
            binary(BinaryOperator::Eq, parity.clone(), ExpressionNode::int(0)),
        );
        status.insert(
            "even".to_string(),
            binary(BinaryOperator::Eq, parity, ExpressionNode::int(1)),
        );
        ExpressionNode::MapLiteral(status)
    }
}

/// `data-sly-repeat[.item]`: repeats the whole element once per item of a collection.
pub struct RepeatPlugin;

impl Plugin for RepeatPlugin {
    fn name(&self) -> &'static str {
        "repeat"
    }

    fn priority(&self) -> i32 {
        130
    }

    fn invoke(
        &self, expression: Expression, call_info: &PluginCallInfo, context: &mut CompilerContext<'_>,
    ) -> Result<Box<dyn PluginInvoke>, CompilerError> {
        Ok(Box::new(RepeatInvoke(Iteration::new(expression, call_info, context))))
    }
}

struct RepeatInvoke(Iteration);

impl PluginInvoke for RepeatInvoke {
    fn before_element(&mut self, stream: &mut PushStream, _tag_name: &str) -> Result<(), CompilerError> {
        self.0.write_guard(stream)?;
        self.0.write_loop(stream)
    }

    fn after_tag_close(&mut self, stream: &mut PushStream, _self_closing: bool) -> Result<(), CompilerError> {
        stream.write(Command::out_text("\n"))
    }

    fn after_element(&mut self, stream: &mut PushStream) -> Result<(), CompilerError> {
        self.0.write_loop_end(stream)?;
        self.0.write_guard_end(stream)
    }
}

/// `data-sly-list[.item]`: repeats the content of the element once per item of a collection.
///
/// The element itself is left out when the collection is empty.
pub struct ListPlugin;

impl Plugin for ListPlugin {
    fn name(&self) -> &'static str {
        "list"
    }

    fn priority(&self) -> i32 {
        130
    }

    fn invoke(
        &self, expression: Expression, call_info: &PluginCallInfo, context: &mut CompilerContext<'_>,
    ) -> Result<Box<dyn PluginInvoke>, CompilerError> {
        Ok(Box::new(ListInvoke(Iteration::new(expression, call_info, context))))
    }
}

struct ListInvoke(Iteration);

impl PluginInvoke for ListInvoke {
    fn before_element(&mut self, stream: &mut PushStream, _tag_name: &str) -> Result<(), CompilerError> {
        self.0.write_guard(stream)
    }

    fn before_children(&mut self, stream: &mut PushStream) -> Result<(), CompilerError> {
        self.0.write_loop(stream)
    }

    fn after_children(&mut self, stream: &mut PushStream) -> Result<(), CompilerError> {
        self.0.write_loop_end(stream)
    }

    fn after_element(&mut self, stream: &mut PushStream) -> Result<(), CompilerError> {
        self.0.write_guard_end(stream)
    }
}
