use htl_expression::{Expression, ExpressionNode};

use super::{CompilerContext, Plugin, PluginCallInfo, PluginInvoke};
use crate::commands::Command;
use crate::error::CompilerError;
use crate::stream::PushStream;

/// `data-sly-set.name`: binds a variable for the rest of the template.
pub struct SetPlugin;

impl Plugin for SetPlugin {
    fn name(&self) -> &'static str {
        "set"
    }

    fn priority(&self) -> i32 {
        1
    }

    fn invoke(
        &self, expression: Expression, call_info: &PluginCallInfo, _context: &mut CompilerContext<'_>,
    ) -> Result<Box<dyn PluginInvoke>, CompilerError> {
        let Some(variable) = call_info.first_argument() else {
            return Err(
                CompilerError::compile("data-sly-set must specify a variable name, as in data-sly-set.name.")
                    .with_offending_input(expression.raw_text()),
            );
        };
        Ok(Box::new(SetInvoke {
            variable: variable.to_string(),
            value: expression.into_root(),
        }))
    }
}

struct SetInvoke {
    variable: String,
    value: ExpressionNode,
}

impl PluginInvoke for SetInvoke {
    fn before_element(&mut self, stream: &mut PushStream, _tag_name: &str) -> Result<(), CompilerError> {
        stream.write(Command::global(&self.variable, self.value.clone()))
    }
}
