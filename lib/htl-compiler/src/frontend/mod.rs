//! Template front end: turns template source into a command stream.

use tracing::debug;

use crate::error::CompilerError;
use crate::html::parse_template;
use crate::plugin::PluginRegistry;
use crate::stream::PushStream;

mod markup;
use self::markup::MarkupHandler;

mod traverser;

mod wrapper;
pub use self::wrapper::ExpressionWrapper;

/// Parses templates and expands their directives.
pub(crate) struct Frontend<'a> {
    plugins: &'a PluginRegistry,
    wrapper: ExpressionWrapper<'a>,
    read_buffer_size: usize,
}

impl<'a> Frontend<'a> {
    pub(crate) fn new(plugins: &'a PluginRegistry, wrapper: ExpressionWrapper<'a>, read_buffer_size: usize) -> Self {
        Self {
            plugins,
            wrapper,
            read_buffer_size,
        }
    }

    /// Compiles `source`, writing commands and warnings to `stream`.
    ///
    /// The stream is not closed.
    ///
    /// # Errors
    ///
    /// If the markup cannot be parsed, or an expression or directive is invalid, an error is returned.
    pub(crate) fn compile(&self, stream: &mut PushStream, source: &str) -> Result<(), CompilerError> {
        let template = parse_template(source, self.read_buffer_size)?;
        debug!(nodes = template.children.len(), "Parsed template.");

        let mut handler = MarkupHandler::new(stream, self.plugins, &self.wrapper);
        traverser::traverse(&template, &mut handler)
    }
}

#[cfg(test)]
mod tests {
    use indexmap::IndexSet;
    use similar_asserts::assert_eq;

    use super::*;
    use crate::commands::Command;
    use crate::filter::FilterChain;
    use crate::stream::{verify_scopes, CommandCollector, StreamMessage};

    fn compile(source: &str) -> Result<(Vec<Command>, Vec<StreamMessage>), CompilerError> {
        let filters = FilterChain::builtin();
        let known_options: IndexSet<String> = ["context", "i18n", "locale", "join", "format"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let plugins = PluginRegistry::builtin();
        let frontend = Frontend::new(&plugins, ExpressionWrapper::new(&filters, &known_options), 8);

        let collector = CommandCollector::new();
        let mut stream = PushStream::new();
        stream.add_handler(collector.clone());
        frontend.compile(&mut stream, source)?;
        stream.close()?;
        Ok((collector.take(), stream.warnings().to_vec()))
    }

    fn text(commands: &[Command]) -> String {
        commands
            .iter()
            .filter_map(|c| match c {
                Command::OutText(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn static_markup_is_written_as_is() {
        let source = "<div class=\"a\" hidden><br><p id=x>text</p></div><!-- note -->";
        let (commands, warnings) = compile(source).unwrap();
        assert!(warnings.is_empty());
        assert!(commands.iter().all(|c| matches!(c, Command::OutText(_))));
        assert_eq!(
            text(&commands),
            "<div class=\"a\" hidden><br/><p id=x>text</p></div><!-- note -->"
        );
    }

    #[test]
    fn htl_comments_are_dropped() {
        let (commands, _) = compile("a<!--/* hidden ${x} */-->b").unwrap();
        assert_eq!(commands, vec![Command::out_text("a"), Command::out_text("b")]);
    }

    #[test]
    fn text_expressions_are_escaped() {
        let (commands, _) = compile("<p>${title}</p>").unwrap();
        assert_eq!(verify_scopes(&commands), Ok(()));
        let Command::VariableBindingStart { variable, expression } = &commands[2] else {
            panic!("expected a binding, got {:?}", commands[2]);
        };
        assert_eq!(expression.to_string(), "xss(title, 'text')");
        assert_eq!(commands[3], Command::output(variable.as_str()));
    }

    #[test]
    fn dynamic_attributes_use_their_markup_context() {
        let (commands, _) = compile("<a href=\"${link}\" title=\"${name}\"></a>").unwrap();
        assert_eq!(verify_scopes(&commands), Ok(()));
        let bound: Vec<String> = commands
            .iter()
            .filter_map(|c| c.expression().map(ToString::to_string))
            .filter(|e| e.starts_with("xss("))
            .collect();
        assert_eq!(bound, vec!["xss(link, 'uri')", "xss(name, 'attribute')"]);
    }

    #[test]
    fn sly_tags_are_not_written() {
        let (commands, _) = compile("<sly data-sly-test=\"${a}\">inside</sly>").unwrap();
        assert_eq!(verify_scopes(&commands), Ok(()));
        assert_eq!(text(&commands), "inside");
    }

    #[test]
    fn sly_tags_are_written_when_not_unwrapped() {
        let (commands, _) = compile("<sly data-sly-unwrap=\"${false}\">inside</sly>").unwrap();
        assert_eq!(verify_scopes(&commands), Ok(()));
        assert_eq!(text(&commands), "<sly>inside</sly>");
    }

    #[test]
    fn script_expressions_need_a_context() {
        let (commands, warnings) = compile("<script>var a = ${a}; var b = '${b @ context=\"scriptString\"}';</script>")
            .unwrap();
        assert_eq!(
            warnings,
            vec![StreamMessage::new(
                "Element script requires that all expressions have an explicit context specified. The expression \
                 will be replaced with an empty string.",
                "${a}"
            )]
        );
        assert!(commands
            .iter()
            .any(|c| c.expression().map(ToString::to_string).as_deref()
                == Some("concat(concat('var a = ; var b = \\'', xss(b, 'scriptString')), '\\';')")));
    }

    #[test]
    fn event_handler_attributes_need_a_context() {
        let (commands, warnings) = compile("<a onclick=\"${action}\"></a>").unwrap();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].code, "${action}");
        assert_eq!(text(&commands), "<a onclick=\"\"></a>");
    }

    #[test]
    fn unknown_directive_reports_the_start_tag() {
        let err = compile("<div class=\"a\" data-sly-unknown=\"${x}\">").unwrap_err();
        assert_eq!(
            err.to_string(),
            "None of the registered plugins can handle the data-sly-unknown block element."
        );
        assert_eq!(
            err.offending_input(),
            Some("<div class=\"a\" data-sly-unknown=\"${x}\">")
        );
    }

    #[test]
    fn directives_nest_by_priority() {
        let source = "<ul data-sly-list=\"${items}\" data-sly-test=\"${items}\"><li>${item}</li></ul>";
        let (commands, _) = compile(source).unwrap();
        assert_eq!(verify_scopes(&commands), Ok(()));
        // The test opens before the list's guard, even though it is declared after it.
        assert!(matches!(&commands[0], Command::VariableBindingStart { variable, .. } if variable.starts_with("testVariable$")));
        assert_eq!(commands.last(), Some(&Command::VariableBindingEnd));
    }
}
