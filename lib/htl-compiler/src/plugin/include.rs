use htl_expression::{Expression, ExpressionNode, RuntimeFunction};
use indexmap::IndexMap;

use super::{CompilerContext, Plugin, PluginCallInfo, PluginInvoke};
use crate::commands::Command;
use crate::error::CompilerError;
use crate::stream::PushStream;

/// `data-sly-include`: replaces the content of the element with the output of another script.
pub struct IncludePlugin;

impl Plugin for IncludePlugin {
    fn name(&self) -> &'static str {
        "include"
    }

    fn invoke(
        &self, expression: Expression, _call_info: &PluginCallInfo, context: &mut CompilerContext<'_>,
    ) -> Result<Box<dyn PluginInvoke>, CompilerError> {
        Ok(Box::new(IncludeInvoke::new(
            RuntimeFunction::Include,
            expression,
            context.generate_variable("includedResult"),
        )))
    }
}

/// `data-sly-resource`: replaces the content of the element with a rendered resource.
pub struct ResourcePlugin;

impl Plugin for ResourcePlugin {
    fn name(&self) -> &'static str {
        "resource"
    }

    fn invoke(
        &self, expression: Expression, _call_info: &PluginCallInfo, context: &mut CompilerContext<'_>,
    ) -> Result<Box<dyn PluginInvoke>, CompilerError> {
        Ok(Box::new(IncludeInvoke::new(
            RuntimeFunction::IncludeResource,
            expression,
            context.generate_variable("resourceContent"),
        )))
    }
}

struct IncludeInvoke {
    function: RuntimeFunction,
    variable: String,
    target: ExpressionNode,
    options: IndexMap<String, ExpressionNode>,
}

impl IncludeInvoke {
    fn new(function: RuntimeFunction, expression: Expression, variable: String) -> Self {
        let (target, options) = expression.into_parts();
        Self {
            function,
            variable,
            target,
            options,
        }
    }
}

impl PluginInvoke for IncludeInvoke {
    fn before_children(&mut self, stream: &mut PushStream) -> Result<(), CompilerError> {
        let output = ExpressionNode::call(
            self.function,
            vec![
                self.target.clone(),
                ExpressionNode::MapLiteral(self.options.clone()),
            ],
        );
        stream.write(Command::bind(&self.variable, output))?;
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

#[cfg(test)]
mod tests {
    use similar_asserts::assert_eq;

    use super::*;
    use crate::plugin::tests::Harness;

    #[test]
    fn include_keeps_path_options() {
        let (commands, _) = Harness::new()
            .run(
                &IncludePlugin,
                "data-sly-include",
                "${'header.html' @ appendPath='x'}",
                "div",
            )
            .unwrap();
        let Command::VariableBindingStart { expression, .. } = &commands[2] else {
            panic!("expected a binding, got {:?}", commands[2]);
        };
        assert_eq!(expression.to_string(), "include('header.html', {'appendPath': 'x'})");
        assert!(!commands.contains(&Command::out_text("child")));
    }

    #[test]
    fn resource_uses_include_resource() {
        let (commands, _) = Harness::new()
            .run(
                &ResourcePlugin,
                "data-sly-resource",
                "${'par' @ resourceType='foundation/components/parsys'}",
                "div",
            )
            .unwrap();
        let Command::VariableBindingStart { expression, .. } = &commands[2] else {
            panic!("expected a binding, got {:?}", commands[2]);
        };
        assert!(expression.is_call_to(RuntimeFunction::IncludeResource));
    }
}
