use htl_expression::{BinaryOperator, Expression, ExpressionNode, RuntimeFunction, UnaryOperator};

use super::{CompilerContext, Plugin, PluginCallInfo, PluginInvoke};
use crate::commands::Command;
use crate::context::{ExpressionContext, MarkupContext};
use crate::error::CompilerError;
use crate::html::VOID_ELEMENTS;
use crate::stream::PushStream;

/// `data-sly-element`: replaces the tag name of the element.
///
/// When the new name is falsy, the original tag is kept. When it is a void element, no end tag is written.
pub struct ElementPlugin;

impl Plugin for ElementPlugin {
    fn name(&self) -> &'static str {
        "element"
    }

    fn invoke(
        &self, expression: Expression, _call_info: &PluginCallInfo, context: &mut CompilerContext<'_>,
    ) -> Result<Box<dyn PluginInvoke>, CompilerError> {
        let tag_name = if expression.root().is_call_to(RuntimeFunction::Xss) {
            expression.into_root()
        } else {
            context
                .adjust_to_context(
                    expression,
                    Some(MarkupContext::ElementName),
                    ExpressionContext::PluginElement,
                )
                .into_root()
        };

        Ok(Box::new(ElementInvoke {
            tag_name,
            tag_variable: context.generate_variable("tagVar"),
            tag_allowed: context.generate_variable("tagAllowed"),
            self_closing: context.generate_variable("selfClosingTag"),
            void_elements: context.global_variable("elementPluginVoidElements"),
        }))
    }
}

struct ElementInvoke {
    tag_name: ExpressionNode,
    tag_variable: String,
    tag_allowed: String,
    self_closing: String,
    void_elements: String,
}

impl ElementInvoke {
    /// Closes the "original tag" branch, and opens the "replaced tag" branch.
    fn write_replacement<F>(&self, stream: &mut PushStream, write: F) -> Result<(), CompilerError>
    where
        F: FnOnce(&mut PushStream) -> Result<(), CompilerError>,
    {
        stream.write(Command::when(&self.tag_allowed, true))?;
        write(stream)?;
        stream.write(Command::ConditionalEnd)?;
        stream.write(Command::when(&self.tag_allowed, false))
    }
}

impl PluginInvoke for ElementInvoke {
    fn before_element(&mut self, stream: &mut PushStream, _tag_name: &str) -> Result<(), CompilerError> {
        let void_elements = VOID_ELEMENTS.iter().map(|name| ExpressionNode::string(*name)).collect();
        stream.write(Command::global(
            &self.void_elements,
            ExpressionNode::ArrayLiteral(void_elements),
        ))?;
        stream.write(Command::bind(&self.tag_variable, self.tag_name.clone()))?;
        stream.write(Command::bind(
            &self.tag_allowed,
            ExpressionNode::unary(
                UnaryOperator::Not,
                ExpressionNode::unary(UnaryOperator::Not, ExpressionNode::identifier(&self.tag_variable)),
            ),
        ))
    }

    fn before_tag_open(&mut self, stream: &mut PushStream) -> Result<(), CompilerError> {
        let tag_variable = self.tag_variable.clone();
        self.write_replacement(stream, |stream| {
            stream.write(Command::out_text("<"))?;
            stream.write(Command::output(tag_variable))
        })
    }

    fn before_attributes(&mut self, stream: &mut PushStream) -> Result<(), CompilerError> {
        stream.write(Command::ConditionalEnd)
    }

    fn after_attributes(&mut self, stream: &mut PushStream) -> Result<(), CompilerError> {
        self.write_replacement(stream, |stream| stream.write(Command::out_text(">")))
    }

    fn after_tag_open(&mut self, stream: &mut PushStream) -> Result<(), CompilerError> {
        stream.write(Command::ConditionalEnd)
    }

    fn before_tag_close(&mut self, stream: &mut PushStream, _self_closing: bool) -> Result<(), CompilerError> {
        let tag_variable = self.tag_variable.clone();
        let self_closing = self.self_closing.clone();
        let is_void = ExpressionNode::binary(
            BinaryOperator::In,
            ExpressionNode::identifier(&self.tag_variable),
            ExpressionNode::identifier(&self.void_elements),
        );
        self.write_replacement(stream, |stream| {
            stream.write(Command::bind(&self_closing, is_void))?;
            stream.write(Command::when(&self_closing, false))?;
            stream.write(Command::out_text("</"))?;
            stream.write(Command::output(tag_variable))?;
            stream.write(Command::out_text(">"))?;
            stream.write(Command::ConditionalEnd)?;
            stream.write(Command::VariableBindingEnd)
        })
    }

    fn after_tag_close(&mut self, stream: &mut PushStream, _self_closing: bool) -> Result<(), CompilerError> {
        stream.write(Command::ConditionalEnd)
    }

    fn after_element(&mut self, stream: &mut PushStream) -> Result<(), CompilerError> {
        stream.write(Command::VariableBindingEnd)?;
        stream.write(Command::VariableBindingEnd)
    }
}
