use htl_expression::{parse_interpolation, Fragment, Interpolation};
use tracing::trace;

use crate::commands::Command;
use crate::context::{ExpressionContext, MarkupContext};
use crate::error::CompilerError;
use crate::filter::CONTEXT_OPTION;
use crate::frontend::ExpressionWrapper;
use crate::html::Attribute;
use crate::plugin::{
    AttributeName, AttributeVariables, CompilerContext, PluginCallInfo, PluginInvoke, PluginRegistry,
    PLUGIN_ATTRIBUTE_PREFIX,
};
use crate::stream::{PushStream, StreamMessage};
use crate::symbols::SymbolGenerator;

const SLY_TAG: &str = "sly";

/// Returns `true` for elements whose content is raw text, where every expression needs an explicit context.
fn requires_explicit_context(tag_name: &str) -> bool {
    tag_name.eq_ignore_ascii_case("script") || tag_name.eq_ignore_ascii_case("style")
}

/// Returns `true` for attributes whose value is script or style code, where every expression needs an explicit
/// context.
fn is_sensitive_attribute(name: &str) -> bool {
    let name = name.to_ascii_lowercase();
    name == "style" || name.starts_with("on")
}

/// Returns `true` for `<!--/* ... */-->` comments, which are left out of the output.
fn is_htl_comment(markup: &str) -> bool {
    markup.starts_with("<!--/*") && markup.ends_with("*/-->")
}

/// Returns the template source of the expressions of an interpolation, for locating errors raised while compiling
/// them.
fn expression_source(interpolation: &Interpolation, raw_text: &str) -> String {
    let mut expressions = interpolation.fragments().iter().filter_map(|fragment| match fragment {
        Fragment::Expression(expression) => Some(expression.raw_text()),
        Fragment::Text(_) => None,
    });
    match (expressions.next(), expressions.next()) {
        (Some(expression), None) => expression.to_string(),
        _ => raw_text.trim().to_string(),
    }
}

fn static_attribute(name: &str, value: &str, quote: Option<char>) -> String {
    match quote {
        Some(quote) => format!(" {}={}{}{}", name, quote, value, quote),
        None => format!(" {}={}", name, value),
    }
}

/// A directive invoked on an element.
struct Invocation {
    priority: i32,

    /// Template source of the directive's expression.
    source: String,
    invoke: Box<dyn PluginInvoke>,
}

/// The state of an element whose start tag has been seen.
struct ElementContext {
    tag_name: String,
    open_tag_start: String,
    attributes: Vec<Attribute>,
    invocations: Vec<Invocation>,
    self_closing: bool,
}

impl ElementContext {
    fn new(tag_name: &str, open_tag_start: &str) -> Self {
        Self {
            tag_name: tag_name.to_string(),
            open_tag_start: open_tag_start.to_string(),
            attributes: Vec::new(),
            invocations: Vec::new(),
            self_closing: false,
        }
    }

    fn is_sly(&self) -> bool {
        self.tag_name.eq_ignore_ascii_case(SLY_TAG)
    }

    /// Runs a hook of every invocation, in priority order.
    fn before<F>(&mut self, stream: &mut PushStream, mut hook: F) -> Result<(), CompilerError>
    where
        F: FnMut(&mut dyn PluginInvoke, &mut PushStream) -> Result<(), CompilerError>,
    {
        for invocation in self.invocations.iter_mut() {
            hook(invocation.invoke.as_mut(), stream).map_err(|e| e.or_offending_input(invocation.source.as_str()))?;
        }
        Ok(())
    }

    /// Runs a hook of every invocation, in reverse priority order.
    fn after<F>(&mut self, stream: &mut PushStream, mut hook: F) -> Result<(), CompilerError>
    where
        F: FnMut(&mut dyn PluginInvoke, &mut PushStream) -> Result<(), CompilerError>,
    {
        for invocation in self.invocations.iter_mut().rev() {
            hook(invocation.invoke.as_mut(), stream).map_err(|e| e.or_offending_input(invocation.source.as_str()))?;
        }
        Ok(())
    }
}

/// Turns markup events into commands.
pub(crate) struct MarkupHandler<'a> {
    stream: &'a mut PushStream,
    plugins: &'a PluginRegistry,
    wrapper: &'a ExpressionWrapper<'a>,
    symbols: SymbolGenerator,
    elements: Vec<ElementContext>,
}

impl<'a> MarkupHandler<'a> {
    pub(crate) fn new(
        stream: &'a mut PushStream, plugins: &'a PluginRegistry, wrapper: &'a ExpressionWrapper<'a>,
    ) -> Self {
        Self {
            stream,
            plugins,
            wrapper,
            symbols: SymbolGenerator::new(),
            elements: Vec::new(),
        }
    }

    pub(crate) fn on_open_tag_start(&mut self, markup: &str, tag_name: &str) {
        self.elements.push(ElementContext::new(tag_name, markup));
    }

    pub(crate) fn on_attribute(
        &mut self, name: &str, value: Option<&str>, quote: Option<char>,
    ) -> Result<(), CompilerError> {
        match PluginCallInfo::parse(name) {
            Some(call_info) => self.invoke_plugin(&call_info, value),
            None if name.starts_with(PLUGIN_ATTRIBUTE_PREFIX) => Err(unknown_plugin(name)),
            None => {
                let element = self.current_element()?;
                element
                    .attributes
                    .push(Attribute::new(name, value.map(str::to_string), quote));
                Ok(())
            }
        }
    }

    pub(crate) fn on_open_tag_end(&mut self, markup: &str) -> Result<(), CompilerError> {
        let mut element = self.take_element()?;
        element.self_closing = markup == "/>";
        element.invocations.sort_by_key(|invocation| invocation.priority);
        let tag_name = element.tag_name.clone();
        let sly = element.is_sly();

        element.before(self.stream, |invoke, stream| invoke.before_element(stream, &tag_name))?;
        if sly {
            self.stream.begin_ignore();
        }
        element.before(self.stream, |invoke, stream| invoke.before_tag_open(stream))?;
        self.out(&element.open_tag_start)?;
        element.before(self.stream, |invoke, stream| invoke.before_attributes(stream))?;
        for attribute in std::mem::take(&mut element.attributes) {
            element.before(self.stream, |invoke, stream| invoke.before_attribute(stream, &attribute.name))?;
            self.write_attribute(&attribute)?;
            element.after(self.stream, |invoke, stream| invoke.after_attribute(stream, &attribute.name))?;
        }
        element.after(self.stream, |invoke, stream| invoke.after_attributes(stream))?;
        self.out(markup)?;
        element.after(self.stream, |invoke, stream| invoke.after_tag_open(stream))?;
        if sly {
            self.stream.end_ignore();
        }
        element.before(self.stream, |invoke, stream| invoke.before_children(stream))?;

        self.elements.push(element);
        Ok(())
    }

    pub(crate) fn on_close_tag(&mut self, markup: &str) -> Result<(), CompilerError> {
        let mut element = self.take_element()?;
        let self_closing = element.self_closing;
        let sly = element.is_sly();

        element.after(self.stream, |invoke, stream| invoke.after_children(stream))?;
        if sly {
            self.stream.begin_ignore();
        }
        element.before(self.stream, |invoke, stream| invoke.before_tag_close(stream, self_closing))?;
        self.out(markup)?;
        element.after(self.stream, |invoke, stream| invoke.after_tag_close(stream, self_closing))?;
        if sly {
            self.stream.end_ignore();
        }
        element.after(self.stream, |invoke, stream| invoke.after_element(stream))
    }

    pub(crate) fn on_text(&mut self, text: &str) -> Result<(), CompilerError> {
        let raw_text_element = self
            .elements
            .last()
            .map(|element| element.tag_name.as_str())
            .filter(|tag_name| requires_explicit_context(tag_name))
            .map(str::to_string);

        let interpolation = parse_interpolation(text)?;
        match raw_text_element {
            Some(tag_name) => {
                let message = format!(
                    "Element {} requires that all expressions have an explicit context specified. The expression will \
                     be replaced with an empty string.",
                    tag_name
                );
                let interpolation = self.require_context(interpolation, &message);
                self.write_text(interpolation, text, None)
            }
            None => self.write_text(interpolation, text, Some(MarkupContext::Text)),
        }
    }

    pub(crate) fn on_comment(&mut self, markup: &str) -> Result<(), CompilerError> {
        if is_htl_comment(markup) {
            trace!(comment = markup, "Dropping template comment.");
            return Ok(());
        }
        let interpolation = parse_interpolation(markup)?;
        self.write_text(interpolation, markup, Some(MarkupContext::Comment))
    }

    pub(crate) fn on_document_finished(&mut self) -> Result<(), CompilerError> {
        if self.elements.is_empty() {
            Ok(())
        } else {
            Err(CompilerError::compile(format!(
                "Document ended with {} unclosed element(s).",
                self.elements.len()
            )))
        }
    }

    fn current_element(&mut self) -> Result<&mut ElementContext, CompilerError> {
        self.elements
            .last_mut()
            .ok_or_else(|| CompilerError::compile("Attribute outside of an element."))
    }

    fn take_element(&mut self) -> Result<ElementContext, CompilerError> {
        self.elements
            .pop()
            .ok_or_else(|| CompilerError::compile("Tag event outside of an element."))
    }

    fn invoke_plugin(&mut self, call_info: &PluginCallInfo, value: Option<&str>) -> Result<(), CompilerError> {
        let plugins = self.plugins;
        let plugin = plugins
            .get(call_info.name())
            .ok_or_else(|| unknown_plugin(call_info.name()))?;
        let expression_context = ExpressionContext::for_plugin(plugin.name()).unwrap_or(ExpressionContext::Attribute);

        let raw_text = value.unwrap_or_default();
        let interpolation = match value {
            Some(value) => parse_interpolation(value)?,
            None => Interpolation::default(),
        };
        let source = expression_source(&interpolation, raw_text);
        let mut warnings = Vec::new();
        let expression = self
            .wrapper
            .transform(interpolation, raw_text, None, expression_context, &mut warnings);
        self.flush(warnings);

        let mut context = CompilerContext::new(&mut self.symbols, self.wrapper);
        let invoke = plugin.invoke(expression, call_info, &mut context)?;
        let priority = plugin.priority();
        self.current_element()?.invocations.push(Invocation {
            priority,
            source,
            invoke,
        });
        Ok(())
    }

    fn write_attribute(&mut self, attribute: &Attribute) -> Result<(), CompilerError> {
        let Some(value) = attribute.value.as_deref() else {
            return self.out(&format!(" {}", attribute.name));
        };

        let mut interpolation = parse_interpolation(value)?;
        if is_sensitive_attribute(&attribute.name) {
            let message = format!(
                "Expressions within the value of attribute {} need to have an explicit context option. The \
                 expression will be replaced with an empty string.",
                attribute.name
            );
            interpolation = self.require_context(interpolation, &message);
        }
        if let Some(text) = interpolation.plain_text() {
            return self.out(&static_attribute(&attribute.name, &text, attribute.quote));
        }

        let source = expression_source(&interpolation, value);
        let mut warnings = Vec::new();
        let expression = self.wrapper.transform(
            interpolation,
            value,
            Some(MarkupContext::for_attribute(&attribute.name)),
            ExpressionContext::Attribute,
            &mut warnings,
        );
        self.flush(warnings);

        let symbols = &mut self.symbols;
        let variables = AttributeVariables::generate(|hint| symbols.next(hint));
        variables
            .write(
                self.stream,
                AttributeName::Static(&attribute.name),
                expression.into_root(),
                attribute.quote.unwrap_or('"'),
            )
            .map_err(|e| e.or_offending_input(source))
    }

    fn write_text(
        &mut self, interpolation: Interpolation, raw_text: &str, markup_context: Option<MarkupContext>,
    ) -> Result<(), CompilerError> {
        if let Some(text) = interpolation.plain_text() {
            return self.out(&text);
        }

        let source = expression_source(&interpolation, raw_text);
        let mut warnings = Vec::new();
        let expression = self.wrapper.transform(
            interpolation,
            raw_text,
            markup_context,
            ExpressionContext::Text,
            &mut warnings,
        );
        self.flush(warnings);

        let variable = self.symbols.next("textContent");
        let commands = [
            Command::bind(&variable, expression.into_root()),
            Command::output(variable),
            Command::VariableBindingEnd,
        ];
        self.write_all(commands).map_err(|e| e.or_offending_input(source))
    }

    fn write_all<I>(&mut self, commands: I) -> Result<(), CompilerError>
    where
        I: IntoIterator<Item = Command>,
    {
        for command in commands {
            self.stream.write(command)?;
        }
        Ok(())
    }

    /// Replaces every expression without an explicit `context` option with empty text, warning once per
    /// replaced expression.
    fn require_context(&mut self, interpolation: Interpolation, message: &str) -> Interpolation {
        let mut replaced = Vec::new();
        let interpolation = interpolation
            .into_fragments()
            .into_iter()
            .map(|fragment| match fragment {
                Fragment::Expression(expression) if !expression.contains_option(CONTEXT_OPTION) => {
                    replaced.push(StreamMessage::new(message, expression.raw_text()));
                    Fragment::Text(String::new())
                }
                other => other,
            })
            .collect();
        self.flush(replaced);
        interpolation
    }

    fn flush(&mut self, warnings: Vec<StreamMessage>) {
        for warning in warnings {
            self.stream.warn(warning);
        }
    }

    fn out(&mut self, text: &str) -> Result<(), CompilerError> {
        if text.is_empty() {
            return Ok(());
        }
        self.stream.write(Command::out_text(text))
    }
}

fn unknown_plugin(name: &str) -> CompilerError {
    let name = name.strip_prefix(PLUGIN_ATTRIBUTE_PREFIX).unwrap_or(name);
    CompilerError::compile(format!(
        "None of the registered plugins can handle the data-sly-{} block element.",
        name
    ))
}
