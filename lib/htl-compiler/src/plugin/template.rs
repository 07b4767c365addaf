use htl_expression::Expression;

use super::{CompilerContext, Plugin, PluginCallInfo, PluginInvoke};
use crate::commands::Command;
use crate::error::CompilerError;
use crate::stream::PushStream;

/// `data-sly-template.name`: defines a template out of the content of the element.
///
/// The option names of the expression are the template parameters. The element's own markup is never written.
pub struct TemplatePlugin;

impl Plugin for TemplatePlugin {
    fn name(&self) -> &'static str {
        "template"
    }

    fn priority(&self) -> i32 {
        i32::MIN
    }

    fn invoke(
        &self, expression: Expression, call_info: &PluginCallInfo, _context: &mut CompilerContext<'_>,
    ) -> Result<Box<dyn PluginInvoke>, CompilerError> {
        let Some(name) = call_info.first_argument() else {
            return Err(CompilerError::compile(
                "data-sly-template must specify a template name, as in data-sly-template.name.",
            )
            .with_offending_input(expression.raw_text()));
        };
        Ok(Box::new(TemplateInvoke {
            name: name.to_string(),
            parameters: expression.options().keys().cloned().collect(),
        }))
    }
}

struct TemplateInvoke {
    name: String,
    parameters: Vec<String>,
}

impl PluginInvoke for TemplateInvoke {
    fn before_element(&mut self, stream: &mut PushStream, _tag_name: &str) -> Result<(), CompilerError> {
        stream.write(Command::ProcedureStart {
            name: self.name.clone(),
            parameters: self.parameters.clone(),
        })
    }

    fn before_tag_open(&mut self, stream: &mut PushStream) -> Result<(), CompilerError> {
        stream.begin_ignore();
        Ok(())
    }

    fn after_tag_open(&mut self, stream: &mut PushStream) -> Result<(), CompilerError> {
        stream.end_ignore();
        Ok(())
    }

    fn before_tag_close(&mut self, stream: &mut PushStream, _self_closing: bool) -> Result<(), CompilerError> {
        stream.begin_ignore();
        Ok(())
    }

    fn after_tag_close(&mut self, stream: &mut PushStream, _self_closing: bool) -> Result<(), CompilerError> {
        stream.end_ignore();
        Ok(())
    }

    fn after_element(&mut self, stream: &mut PushStream) -> Result<(), CompilerError> {
        stream.write(Command::ProcedureEnd)
    }
}
