use htl_expression::{Expression, ExpressionNode};

use super::{CompilerContext, Plugin, PluginCallInfo, PluginInvoke};
use crate::commands::Command;
use crate::context::{ExpressionContext, MarkupContext};
use crate::error::CompilerError;
use crate::stream::PushStream;

/// `data-sly-text`: replaces the content of the element with the escaped value of the expression.
pub struct TextPlugin;

impl Plugin for TextPlugin {
    fn name(&self) -> &'static str {
        "text"
    }

    fn invoke(
        &self, expression: Expression, _call_info: &PluginCallInfo, context: &mut CompilerContext<'_>,
    ) -> Result<Box<dyn PluginInvoke>, CompilerError> {
        let content = context
            .adjust_to_context(expression, Some(MarkupContext::Text), ExpressionContext::PluginText)
            .into_root();
        Ok(Box::new(TextInvoke {
            variable: context.generate_variable("textContent"),
            content,
        }))
    }
}

struct TextInvoke {
    variable: String,
    content: ExpressionNode,
}

impl PluginInvoke for TextInvoke {
    fn before_children(&mut self, stream: &mut PushStream) -> Result<(), CompilerError> {
        stream.write(Command::bind(&self.variable, self.content.clone()))?;
        stream.write(Command::output(&self.variable))?;
        stream.write(Command::VariableBindingEnd)?;
        stream.begin_ignore();
        Ok(())
    }

    fn after_children(&mut self, stream: &mut PushStream) -> Result<(), CompilerError> {
        stream.end_ignore();
        Ok(())
    }
}
