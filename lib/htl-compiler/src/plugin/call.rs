use htl_expression::{Expression, ExpressionNode};
use indexmap::IndexMap;

use super::{CompilerContext, Plugin, PluginCallInfo, PluginInvoke};
use crate::commands::Command;
use crate::error::CompilerError;
use crate::stream::PushStream;

/// `data-sly-call`: replaces the content of the element with the output of a template.
///
/// Expression options are the template arguments.
pub struct CallPlugin;

impl Plugin for CallPlugin {
    fn name(&self) -> &'static str {
        "call"
    }

    fn invoke(
        &self, expression: Expression, _call_info: &PluginCallInfo, context: &mut CompilerContext<'_>,
    ) -> Result<Box<dyn PluginInvoke>, CompilerError> {
        let (template, arguments) = expression.into_parts();
        Ok(Box::new(CallInvoke {
            template_variable: context.generate_variable("templateVar"),
            arguments_variable: context.generate_variable("templateOptions"),
            template,
            arguments,
        }))
    }
}

struct CallInvoke {
    template_variable: String,
    arguments_variable: String,
    template: ExpressionNode,
    arguments: IndexMap<String, ExpressionNode>,
}

impl PluginInvoke for CallInvoke {
    fn before_children(&mut self, stream: &mut PushStream) -> Result<(), CompilerError> {
        stream.write(Command::bind(&self.template_variable, self.template.clone()))?;
        stream.write(Command::bind(
            &self.arguments_variable,
            ExpressionNode::MapLiteral(self.arguments.clone()),
        ))?;
        stream.write(Command::ProcedureCall {
            template_variable: self.template_variable.clone(),
            arguments_variable: self.arguments_variable.clone(),
        })?;
        stream.write(Command::VariableBindingEnd)?;
        stream.write(Command::VariableBindingEnd)?;
        stream.begin_ignore();
        Ok(())
    }

    fn after_children(&mut self, stream: &mut PushStream) -> Result<(), CompilerError> {
        stream.end_ignore();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::tests::Harness;
    use crate::stream::verify_scopes;

    #[test]
    fn calls_with_arguments() {
        let (commands, warnings) = Harness::new()
            .run(&CallPlugin, "data-sly-call", "${lib.card @ title=page.title, compact}", "div")
            .unwrap();
        assert!(warnings.is_empty());
        assert!(commands
            .iter()
            .any(|command| matches!(command, Command::ProcedureCall { .. })));
        assert!(!commands.contains(&Command::out_text("child")));
        assert_eq!(verify_scopes(&commands), Ok(()));
    }
}
