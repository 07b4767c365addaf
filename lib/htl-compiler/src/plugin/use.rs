use htl_expression::{Expression, ExpressionNode, RuntimeFunction};
use indexmap::IndexMap;

use super::{CompilerContext, Plugin, PluginCallInfo, PluginInvoke};
use crate::commands::Command;
use crate::error::CompilerError;
use crate::stream::PushStream;

const DEFAULT_VARIABLE: &str = "useBean";

/// `data-sly-use.name`: binds the result of a use-object lookup for the rest of the template.
///
/// Expression options are passed to the lookup as its parameters.
pub struct UsePlugin;

impl Plugin for UsePlugin {
    fn name(&self) -> &'static str {
        "use"
    }

    fn priority(&self) -> i32 {
        1
    }

    fn invoke(
        &self, expression: Expression, call_info: &PluginCallInfo, context: &mut CompilerContext<'_>,
    ) -> Result<Box<dyn PluginInvoke>, CompilerError> {
        let variable = call_info.first_argument().unwrap_or(DEFAULT_VARIABLE).to_string();
        let options_variable = context.generate_variable("useOptions");
        let (identifier, options) = expression.into_parts();
        Ok(Box::new(UseInvoke {
            variable,
            options_variable,
            identifier,
            options,
        }))
    }
}

struct UseInvoke {
    variable: String,
    options_variable: String,
    identifier: ExpressionNode,
    options: IndexMap<String, ExpressionNode>,
}

impl PluginInvoke for UseInvoke {
    fn before_element(&mut self, stream: &mut PushStream, _tag_name: &str) -> Result<(), CompilerError> {
        stream.write(Command::bind(
            &self.options_variable,
            ExpressionNode::MapLiteral(std::mem::take(&mut self.options)),
        ))?;
        stream.write(Command::global(
            &self.variable,
            ExpressionNode::call(
                RuntimeFunction::Use,
                vec![
                    self.identifier.clone(),
                    ExpressionNode::identifier(&self.options_variable),
                ],
            ),
        ))
    }

    fn after_element(&mut self, stream: &mut PushStream) -> Result<(), CompilerError> {
        stream.write(Command::VariableBindingEnd)
    }
}

#[cfg(test)]
mod tests {
    use similar_asserts::assert_eq;

    use super::*;
    use crate::plugin::tests::Harness;

    #[test]
    fn options_are_bound_separately() {
        let (commands, warnings) = Harness::new()
            .run(
                &UsePlugin,
                "data-sly-use.object",
                "${'org.example.Pojo' @ path='/a/b/c'}",
                "span",
            )
            .unwrap();
        assert!(warnings.is_empty());

        let Command::VariableBindingStart { variable, expression } = &commands[0] else {
            panic!("expected a binding, got {:?}", commands[0]);
        };
        assert_eq!(expression.to_string(), "{'path': '/a/b/c'}");
        assert_eq!(
            commands[1],
            Command::global(
                "object",
                ExpressionNode::call(
                    RuntimeFunction::Use,
                    vec![
                        ExpressionNode::string("org.example.Pojo"),
                        ExpressionNode::identifier(variable.as_str())
                    ]
                )
            )
        );
        assert_eq!(commands.last(), Some(&Command::VariableBindingEnd));
    }

    #[test]
    fn default_name() {
        let (commands, _) = Harness::new()
            .run(&UsePlugin, "data-sly-use", "${'logic.js'}", "div")
            .unwrap();
        assert!(matches!(&commands[1], Command::VariableBindingGlobal { variable, .. } if variable == "useBean"));
    }
}
