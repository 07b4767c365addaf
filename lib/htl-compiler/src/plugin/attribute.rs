use htl_expression::{Expression, ExpressionNode, RuntimeFunction};

use super::{AttributeName, AttributeVariables, CompilerContext, Plugin, PluginCallInfo, PluginInvoke};
use crate::commands::Command;
use crate::context::{ExpressionContext, MarkupContext};
use crate::error::CompilerError;
use crate::stream::PushStream;

/// `data-sly-attribute[.name]`: sets one attribute, or every attribute of a map.
///
/// A named attribute replaces the static attribute of the same name. Attributes with falsy values are left out.
pub struct AttributePlugin;

impl Plugin for AttributePlugin {
    fn name(&self) -> &'static str {
        "attribute"
    }

    fn priority(&self) -> i32 {
        150
    }

    fn invoke(
        &self, expression: Expression, call_info: &PluginCallInfo, context: &mut CompilerContext<'_>,
    ) -> Result<Box<dyn PluginInvoke>, CompilerError> {
        let variables = AttributeVariables::generate(|hint| context.generate_variable(hint));
        let invoke: Box<dyn PluginInvoke> = match call_info.first_argument() {
            Some(name) => {
                let value = context
                    .adjust_to_context(
                        expression,
                        Some(MarkupContext::for_attribute(name)),
                        ExpressionContext::PluginAttribute,
                    )
                    .into_root();
                Box::new(NamedAttributeInvoke {
                    name: name.to_string(),
                    value,
                    variables,
                })
            }
            None => Box::new(AttributeMapInvoke {
                attributes: expression.into_root(),
                map: context.generate_variable("attrMap"),
                name: context.generate_variable("attrName"),
                index: context.generate_variable("attrIndex"),
                escaped_name: context.generate_variable("attrNameEscaped"),
                variables,
            }),
        };
        Ok(invoke)
    }
}

struct NamedAttributeInvoke {
    name: String,
    value: ExpressionNode,
    variables: AttributeVariables,
}

impl PluginInvoke for NamedAttributeInvoke {
    fn before_attribute(&mut self, stream: &mut PushStream, attribute_name: &str) -> Result<(), CompilerError> {
        if attribute_name.eq_ignore_ascii_case(&self.name) {
            stream.begin_ignore();
        }
        Ok(())
    }

    fn after_attribute(&mut self, stream: &mut PushStream, attribute_name: &str) -> Result<(), CompilerError> {
        if attribute_name.eq_ignore_ascii_case(&self.name) {
            stream.end_ignore();
        }
        Ok(())
    }

    fn after_attributes(&mut self, stream: &mut PushStream) -> Result<(), CompilerError> {
        self.variables
            .write(stream, AttributeName::Static(&self.name), self.value.clone(), '"')
    }
}

struct AttributeMapInvoke {
    attributes: ExpressionNode,
    map: String,
    name: String,
    index: String,
    escaped_name: String,
    variables: AttributeVariables,
}

impl PluginInvoke for AttributeMapInvoke {
    fn after_attributes(&mut self, stream: &mut PushStream) -> Result<(), CompilerError> {
        stream.write(Command::bind(&self.map, self.attributes.clone()))?;
        stream.write(Command::loop_over(&self.map, &self.name, &self.index))?;
        stream.write(Command::bind(
            &self.escaped_name,
            ExpressionNode::call(
                RuntimeFunction::Xss,
                vec![
                    ExpressionNode::identifier(&self.name),
                    ExpressionNode::string(MarkupContext::AttributeName.name()),
                ],
            ),
        ))?;
        stream.write(Command::when(&self.escaped_name, true))?;

        let value = ExpressionNode::call(
            RuntimeFunction::Xss,
            vec![
                ExpressionNode::PropertyAccess {
                    target: Box::new(ExpressionNode::identifier(&self.map)),
                    property: Box::new(ExpressionNode::identifier(&self.name)),
                },
                ExpressionNode::string(MarkupContext::Attribute.name()),
            ],
        );
        self.variables
            .write(stream, AttributeName::Variable(&self.escaped_name), value, '"')?;

        stream.write(Command::ConditionalEnd)?;
        stream.write(Command::VariableBindingEnd)?;
        stream.write(Command::LoopEnd)?;
        stream.write(Command::VariableBindingEnd)
    }
}
