//! Directive plugins.
//!
//! Every `data-sly-*` attribute of an element is handled by the plugin of the same name. Invoking a plugin yields a
//! [`PluginInvoke`], whose hooks the front end calls at fixed points while it writes the element out.

use htl_expression::Expression;

use crate::context::{ExpressionContext, MarkupContext};
use crate::error::CompilerError;
use crate::frontend::ExpressionWrapper;
use crate::stream::PushStream;
use crate::symbols::SymbolGenerator;

mod attribute;
mod call;
mod element;
mod include;
mod patterns;
mod repeat;
mod set;
mod template;
mod test;
mod text;
mod unwrap;
mod r#use;

pub(crate) use self::patterns::{AttributeName, AttributeVariables};

/// Prefix of directive attributes.
pub const PLUGIN_ATTRIBUTE_PREFIX: &str = "data-sly-";

/// The parts of a directive attribute name: the plugin name, then the dot-separated arguments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PluginCallInfo {
    name: String,
    arguments: Vec<String>,
}

impl PluginCallInfo {
    /// Parses a directive attribute name.
    ///
    /// Returns `None` if `attribute_name` is not a directive attribute.
    pub fn parse(attribute_name: &str) -> Option<Self> {
        let directive = attribute_name.strip_prefix(PLUGIN_ATTRIBUTE_PREFIX)?;
        let mut parts = directive.split('.');
        let name = parts.next().filter(|name| !name.is_empty())?;
        Some(Self {
            name: name.to_string(),
            arguments: parts.map(str::to_string).collect(),
        })
    }

    /// Returns the plugin name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the arguments.
    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    /// Returns the first argument, if any.
    pub fn first_argument(&self) -> Option<&str> {
        self.arguments.first().map(String::as_str)
    }
}

/// Per-compile services available to plugins.
pub struct CompilerContext<'a> {
    symbols: &'a mut SymbolGenerator,
    wrapper: &'a ExpressionWrapper<'a>,
}

impl<'a> CompilerContext<'a> {
    /// Creates a new `CompilerContext`.
    pub fn new(symbols: &'a mut SymbolGenerator, wrapper: &'a ExpressionWrapper<'a>) -> Self {
        Self { symbols, wrapper }
    }

    /// Returns a new, unique variable name.
    pub fn generate_variable(&mut self, hint: &str) -> String {
        self.symbols.next(hint)
    }

    /// Returns the name of the global variable for `hint`.
    pub fn global_variable(&self, hint: &str) -> String {
        self.symbols.global(hint)
    }

    /// Adjusts an expression to the given contexts. See [`ExpressionWrapper::adjust_to_context`].
    pub fn adjust_to_context(
        &self, expression: Expression, markup_context: Option<MarkupContext>, expression_context: ExpressionContext,
    ) -> Expression {
        self.wrapper
            .adjust_to_context(expression, markup_context, expression_context)
    }
}

/// A directive.
pub trait Plugin: Send + Sync {
    /// Returns the directive name, as written after `data-sly-`.
    fn name(&self) -> &'static str;

    /// Returns the priority of the directive. On one element, directives with lower priorities wrap those with
    /// higher priorities.
    fn priority(&self) -> i32 {
        100
    }

    /// Invokes the directive for one element.
    ///
    /// # Errors
    ///
    /// If the directive is used incorrectly, an error is returned.
    fn invoke(
        &self, expression: Expression, call_info: &PluginCallInfo, context: &mut CompilerContext<'_>,
    ) -> Result<Box<dyn PluginInvoke>, CompilerError>;
}

/// The hooks of one directive on one element.
///
/// Hooks are called in the order they are declared here. When an element carries several directives, `before` hooks
/// run in priority order and `after` hooks in reverse priority order.
#[allow(unused_variables)]
pub trait PluginInvoke {
    fn before_element(&mut self, stream: &mut PushStream, tag_name: &str) -> Result<(), CompilerError> {
        Ok(())
    }

    fn before_tag_open(&mut self, stream: &mut PushStream) -> Result<(), CompilerError> {
        Ok(())
    }

    fn before_attributes(&mut self, stream: &mut PushStream) -> Result<(), CompilerError> {
        Ok(())
    }

    fn before_attribute(&mut self, stream: &mut PushStream, attribute_name: &str) -> Result<(), CompilerError> {
        Ok(())
    }

    fn after_attribute(&mut self, stream: &mut PushStream, attribute_name: &str) -> Result<(), CompilerError> {
        Ok(())
    }

    fn after_attributes(&mut self, stream: &mut PushStream) -> Result<(), CompilerError> {
        Ok(())
    }

    fn after_tag_open(&mut self, stream: &mut PushStream) -> Result<(), CompilerError> {
        Ok(())
    }

    fn before_children(&mut self, stream: &mut PushStream) -> Result<(), CompilerError> {
        Ok(())
    }

    fn after_children(&mut self, stream: &mut PushStream) -> Result<(), CompilerError> {
        Ok(())
    }

    fn before_tag_close(&mut self, stream: &mut PushStream, self_closing: bool) -> Result<(), CompilerError> {
        Ok(())
    }

    fn after_tag_close(&mut self, stream: &mut PushStream, self_closing: bool) -> Result<(), CompilerError> {
        Ok(())
    }

    fn after_element(&mut self, stream: &mut PushStream) -> Result<(), CompilerError> {
        Ok(())
    }
}

/// The directives known to a compiler.
pub struct PluginRegistry {
    plugins: Vec<Box<dyn Plugin>>,
}

impl PluginRegistry {
    /// Creates a new `PluginRegistry` from the given plugins.
    pub fn new(mut plugins: Vec<Box<dyn Plugin>>) -> Self {
        plugins.sort_by_key(|plugin| plugin.priority());
        Self { plugins }
    }

    /// Creates the registry of built-in directives.
    pub fn builtin() -> Self {
        Self::new(vec![
            Box::new(attribute::AttributePlugin),
            Box::new(call::CallPlugin),
            Box::new(element::ElementPlugin),
            Box::new(include::IncludePlugin),
            Box::new(include::ResourcePlugin),
            Box::new(repeat::ListPlugin),
            Box::new(repeat::RepeatPlugin),
            Box::new(set::SetPlugin),
            Box::new(template::TemplatePlugin),
            Box::new(test::TestPlugin),
            Box::new(text::TextPlugin),
            Box::new(unwrap::UnwrapPlugin),
            Box::new(r#use::UsePlugin),
        ])
    }

    /// Returns the plugin with the given name.
    pub fn get(&self, name: &str) -> Option<&dyn Plugin> {
        self.plugins
            .iter()
            .find(|plugin| plugin.name() == name)
            .map(|plugin| plugin.as_ref())
    }

    /// Returns the names of the plugins, in priority order.
    pub fn names(&self) -> Vec<&'static str> {
        self.plugins.iter().map(|plugin| plugin.name()).collect()
    }
}
