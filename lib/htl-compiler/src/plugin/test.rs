use htl_expression::{BinaryOperator, Expression, ExpressionNode};

use super::{CompilerContext, Plugin, PluginCallInfo, PluginInvoke};
use crate::commands::Command;
use crate::error::CompilerError;
use crate::stream::{PushStream, StreamMessage};

const REDUNDANT_TEST: &str = "data-sly-test: redundant constant value comparison";

/// `data-sly-test[.name]`: keeps the element only if the expression is truthy.
///
/// When a name is given, the result of the test is bound to it for the rest of the template.
pub struct TestPlugin;

impl Plugin for TestPlugin {
    fn name(&self) -> &'static str {
        "test"
    }

    fn priority(&self) -> i32 {
        1
    }

    fn invoke(
        &self, expression: Expression, call_info: &PluginCallInfo, context: &mut CompilerContext<'_>,
    ) -> Result<Box<dyn PluginInvoke>, CompilerError> {
        let (variable, global) = match call_info.first_argument() {
            Some(name) => (name.to_string(), true),
            None => (context.generate_variable("testVariable"), false),
        };
        Ok(Box::new(TestInvoke {
            expression,
            variable,
            global,
        }))
    }
}

/// Returns `true` if the truth value of `node` is known before rendering.
fn is_constant_test(node: &ExpressionNode) -> bool {
    node.is_scalar_constant()
        || matches!(
            node,
            ExpressionNode::ArrayLiteral(_)
                | ExpressionNode::BinaryOperation {
                    operator: BinaryOperator::Concatenate,
                    ..
                }
        )
}

struct TestInvoke {
    expression: Expression,
    variable: String,
    global: bool,
}

impl PluginInvoke for TestInvoke {
    fn before_element(&mut self, stream: &mut PushStream, _tag_name: &str) -> Result<(), CompilerError> {
        let root = self.expression.root().clone();
        if is_constant_test(&root) {
            stream.warn(StreamMessage::new(REDUNDANT_TEST, self.expression.raw_text()));
        }

        if self.global {
            stream.write(Command::global(&self.variable, root))?;
        } else {
            stream.write(Command::bind(&self.variable, root))?;
        }
        stream.write(Command::when(&self.variable, true))
    }

    fn after_element(&mut self, stream: &mut PushStream) -> Result<(), CompilerError> {
        stream.write(Command::ConditionalEnd)?;
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
    fn constant_tests_warn_once() {
        for value in ["${true}", "${0}", "${'a'}", "${}", "${[1, 2, 3]}", "${properties}}"] {
            let (commands, warnings) = Harness::new().run(&TestPlugin, "data-sly-test", value, "div").unwrap();
            assert_eq!(warnings, vec![StreamMessage::new(REDUNDANT_TEST, value)], "value: {}", value);
            assert_eq!(verify_scopes(&commands), Ok(()));
        }
    }

    #[test]
    fn variable_tests_do_not_warn() {
        let (commands, warnings) = Harness::new()
            .run(&TestPlugin, "data-sly-test.visible", "${page.visible}", "div")
            .unwrap();
        assert!(warnings.is_empty());
        assert_eq!(commands[1], Command::when("visible", true));
        assert_eq!(commands.last(), Some(&Command::ConditionalEnd));
    }
}
