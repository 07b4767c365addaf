use htl_expression::{Expression, ExpressionNode};

use super::{CompilerContext, Plugin, PluginCallInfo, PluginInvoke};
use crate::commands::Command;
use crate::error::CompilerError;
use crate::stream::PushStream;

/// `data-sly-unwrap`: leaves out the start and end tags of the element, keeping its content.
///
/// Without a value, the element is always unwrapped.
pub struct UnwrapPlugin;

impl Plugin for UnwrapPlugin {
    fn name(&self) -> &'static str {
        "unwrap"
    }

    fn priority(&self) -> i32 {
        125
    }

    fn invoke(
        &self, expression: Expression, call_info: &PluginCallInfo, context: &mut CompilerContext<'_>,
    ) -> Result<Box<dyn PluginInvoke>, CompilerError> {
        let condition = match expression.into_root() {
            ExpressionNode::StringConstant(s) if s.is_empty() => ExpressionNode::BooleanConstant(true),
            root => root,
        };
        let (variable, global) = match call_info.first_argument() {
            Some(name) => (name.to_string(), true),
            None => (context.generate_variable("unwrapCondition"), false),
        };
        Ok(Box::new(UnwrapInvoke {
            condition,
            variable,
            global,
            sly: false,
        }))
    }
}

struct UnwrapInvoke {
    condition: ExpressionNode,
    variable: String,
    global: bool,
    sly: bool,
}

impl UnwrapInvoke {
    /// Opens the scope that writes tag markup only when the element is not unwrapped.
    ///
    /// The markup of `sly` elements is otherwise ignored, so ignoring is suspended for the scope.
    fn open_markup(&self, stream: &mut PushStream) -> Result<(), CompilerError> {
        if self.sly {
            stream.end_ignore();
        }
        stream.write(Command::when(&self.variable, false))
    }

    fn close_markup(&self, stream: &mut PushStream) -> Result<(), CompilerError> {
        stream.write(Command::ConditionalEnd)?;
        if self.sly {
            stream.begin_ignore();
        }
        Ok(())
    }
}

impl PluginInvoke for UnwrapInvoke {
    fn before_element(&mut self, stream: &mut PushStream, tag_name: &str) -> Result<(), CompilerError> {
        self.sly = tag_name.eq_ignore_ascii_case("sly");
        if self.global {
            stream.write(Command::global(&self.variable, self.condition.clone()))
        } else {
            stream.write(Command::bind(&self.variable, self.condition.clone()))
        }
    }

    fn before_tag_open(&mut self, stream: &mut PushStream) -> Result<(), CompilerError> {
        self.open_markup(stream)
    }

    fn after_tag_open(&mut self, stream: &mut PushStream) -> Result<(), CompilerError> {
        self.close_markup(stream)
    }

    fn before_tag_close(&mut self, stream: &mut PushStream, _self_closing: bool) -> Result<(), CompilerError> {
        self.open_markup(stream)
    }

    fn after_tag_close(&mut self, stream: &mut PushStream, _self_closing: bool) -> Result<(), CompilerError> {
        self.close_markup(stream)
    }

    fn after_element(&mut self, stream: &mut PushStream) -> Result<(), CompilerError> {
        if !self.global {
            stream.write(Command::VariableBindingEnd)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use similar_asserts::assert_eq;

    use super::*;
    use crate::plugin::tests::Harness;
    use crate::stream::verify_scopes;

    #[test]
    fn bare_unwrap_always_unwraps() {
        let (commands, _) = Harness::new().run(&UnwrapPlugin, "data-sly-unwrap", "", "div").unwrap();
        assert_eq!(verify_scopes(&commands), Ok(()));
        let Command::VariableBindingStart { variable, expression } = &commands[0] else {
            panic!("expected a binding, got {:?}", commands[0]);
        };
        assert_eq!(expression, &ExpressionNode::BooleanConstant(true));
        assert_eq!(commands[1], Command::when(variable.as_str(), false));
        assert_eq!(commands[2], Command::out_text("<div"));
    }

    #[test]
    fn conditional_unwrap() {
        let (commands, _) = Harness::new()
            .run(&UnwrapPlugin, "data-sly-unwrap", "${!wcmmode.edit}", "div")
            .unwrap();
        assert!(matches!(
            &commands[0],
            Command::VariableBindingStart { expression: ExpressionNode::UnaryOperation { .. }, .. }
        ));
        assert!(commands.contains(&Command::out_text("child")));
    }
}
