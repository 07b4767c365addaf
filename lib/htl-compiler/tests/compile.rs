use htl_compiler::config::CompilerConfiguration;
use htl_compiler::optimizer::optimize;
use htl_compiler::{verify_scopes, Command, CompilationResult, CompilationUnit, Compiler};
use htl_expression::{ExpressionNode, RuntimeFunction};
use proptest::prelude::*;
use similar_asserts::assert_eq;

const REDUNDANT_TEST: &str = "data-sly-test: redundant constant value comparison";

fn compile(source: &str) -> CompilationResult {
    compile_with(&Compiler::new(), source)
}

fn compile_with(compiler: &Compiler, source: &str) -> CompilationResult {
    compiler
        .compile(CompilationUnit::from_str("test.html", source))
        .expect("in-memory sources are always readable")
}

fn text(result: &CompilationResult) -> String {
    result
        .commands()
        .iter()
        .filter_map(|command| match command {
            Command::OutText(text) => Some(text.as_str()),
            _ => None,
        })
        .collect()
}

#[test]
fn use_directive_compiles_to_two_commands() {
    let result = compile("<div data-sly-use.x=\"${'id' @ a=1}\"></div>");
    assert!(!result.has_errors(), "{:?}", result.errors());
    assert_eq!(result.commands().len(), 2, "{:?}", result.commands());

    match &result.commands()[0] {
        Command::VariableBindingGlobal { variable, expression } => {
            assert_eq!(variable, "x");
            assert!(expression.is_call_to(RuntimeFunction::Use));
            let ExpressionNode::RuntimeCall(call) = expression else {
                panic!("expected a runtime call, got {:?}", expression);
            };
            assert_eq!(call.arguments()[0], ExpressionNode::string("id"));
            assert!(matches!(call.arguments()[1], ExpressionNode::MapLiteral(_)));
        }
        other => panic!("expected a global binding, got {:?}", other),
    }
    assert_eq!(result.commands()[1], Command::out_text("<div></div>"));
}

#[test]
fn unknown_options_warn_once_each() {
    assert_eq!(compile("<p>${x @ unknownOption}</p>").warnings().len(), 1);
    assert_eq!(
        compile("<p>${x @ unknownOption1, unknownOption2}</p>").warnings().len(),
        2
    );
    assert_eq!(
        compile("<a href=\"${link @ unknownOption}\">a</a>").warnings().len(),
        1
    );
}

#[test]
fn known_options_do_not_warn() {
    let result = compile("<p>${'a' @ join=', ', context='html'}</p><p>${x @ customOption}</p>");
    assert_eq!(result.warnings().len(), 1);

    let compiler = Compiler::with_known_options(["customOption"]);
    let result = compile_with(&compiler, "<p>${x @ customOption}</p>");
    assert!(result.warnings().is_empty(), "{:?}", result.warnings());
}

#[test]
fn parametrizable_directives_never_warn() {
    for source in [
        "<div data-sly-use.bean=\"${'com.example.Bean' @ unknownOption='x'}\"></div>",
        "<div data-sly-call=\"${lib.card @ unknownOption='x'}\"></div>",
        "<template data-sly-template.card=\"${@ unknownOption}\">${unknownOption}</template>",
    ] {
        let result = compile(source);
        assert!(!result.has_errors(), "{}: {:?}", source, result.errors());
        assert!(result.warnings().is_empty(), "{}: {:?}", source, result.warnings());
    }
}

#[test]
fn redundant_tests_warn_once() {
    for value in ["${true}", "${0}", "${'a'}", "", "${[1, 2, 3]}", "a${'b'}"] {
        let source = format!("<div data-sly-test=\"{}\">content</div>", value);
        let result = compile(&source);
        assert!(!result.has_errors(), "{}: {:?}", value, result.errors());
        assert_eq!(result.warnings().len(), 1, "{}: {:?}", value, result.warnings());
        assert!(result.warnings()[0].message.ends_with(REDUNDANT_TEST));
    }
}

#[test]
fn constant_tests_are_resolved() {
    let result = compile("<div data-sly-test=\"${true}\">yes</div><div data-sly-test=\"${0}\">no</div>");
    assert_eq!(result.commands(), &[Command::out_text("<div>yes</div>")]);
}

#[test]
fn i18n_runs_inside_xss() {
    let result = compile("<p>${'hello' @ i18n, locale='de'}</p>");
    assert!(!result.has_errors());
    let expression = result
        .commands()
        .iter()
        .find_map(|command| command.expression())
        .expect("text expressions are bound to a variable");
    assert!(
        expression.to_string().starts_with("xss(i18n('hello'"),
        "{}",
        expression
    );
}

#[test]
fn raw_text_elements_require_a_context() {
    let result = compile("<script>var a = ${x};</script>\n<style>p { color: ${color @ context='styleToken'}; }</style>");
    assert!(!result.has_errors());
    assert_eq!(result.warnings().len(), 1);
    let warning = &result.warnings()[0];
    assert_eq!(warning.line, 1);
    assert_eq!(
        warning.message,
        "${x}: Element script requires that all expressions have an explicit context specified. The expression will \
         be replaced with an empty string."
    );
    assert!(text(&result).starts_with("<script>var a = ;</script>"));
}

#[test]
fn event_handler_attributes_require_a_context() {
    let result = compile("<div>\n<button onclick=\"${handler}\">b</button></div>");
    assert_eq!(result.warnings().len(), 1);
    assert_eq!(result.warnings()[0].line, 2);
    assert!(result.warnings()[0]
        .message
        .contains("Expressions within the value of attribute onclick need to have an explicit context option."));
}

#[test]
fn void_elements_are_never_closed() {
    let result = compile("<div><img src=\"${src}\"><br><input type=\"text\"></div>");
    assert!(!result.has_errors());
    let markup = text(&result);
    for tag in ["</img>", "</br>", "</input>"] {
        assert!(!markup.contains(tag), "{} in {}", tag, markup);
    }
    assert!(markup.ends_with("</div>"));
}

#[test]
fn errors_are_located_for_every_newline_convention() {
    let mut locations = Vec::new();
    for newline in ["\n", "\r\n", "\r"] {
        let source = format!("<div>{}  <span>${{a +}}</span>{}</div>", newline, newline);
        let result = compile(&source);
        assert!(result.commands().is_empty());
        assert_eq!(result.errors().len(), 1);
        let error = &result.errors()[0];
        assert_eq!(error.line, 2, "newline {:?}", newline);
        locations.push((error.line, error.column));
    }
    assert!(locations.windows(2).all(|pair| pair[0] == pair[1]), "{:?}", locations);
}

#[test]
fn folding_errors_are_located_at_their_expression() {
    let cases = [
        ("<div>\n  <p>${'a' + 1}</p>\n</div>", "${'a' + 1}"),
        ("<div>\n  <p>${1 == 'a'}</p>\n</div>", "${1 == 'a'}"),
        ("<div>\n  <p>${false && ('a' < 1)}</p>\n</div>", "${false && ('a' < 1)}"),
        ("<div>\n  <a title=\"${'a' + 1}\">a</a>\n</div>", "${'a' + 1}"),
        ("<div>\n<p data-sly-test=\"${'a' + 1}\">x</p></div>", "${'a' + 1}"),
    ];
    for (source, fragment) in cases {
        let result = compile(source);
        assert!(result.commands().is_empty(), "{:?}", source);
        assert_eq!(result.errors().len(), 1, "{:?}", source);
        let error = &result.errors()[0];
        assert_eq!(error.line, 2, "{:?}", source);
        assert!(
            error.message.starts_with(&format!("{}: ", fragment)),
            "{:?}: {}",
            source,
            error.message
        );
    }
}

#[test]
fn unknown_directives_are_errors() {
    let result = compile("<div>\n<p data-sly-foo=\"${x}\">a</p></div>");
    assert_eq!(result.errors().len(), 1);
    assert_eq!(result.errors()[0].line, 2);
    assert!(result.errors()[0]
        .message
        .contains("None of the registered plugins can handle the data-sly-foo block element."));
}

#[test]
fn results_do_not_depend_on_read_buffer_size() {
    let source = "<!--/* hidden */--><div class=\"a\" data-sly-test.shown=\"${page.visible}\">\n<!-- ${note} -->\
                  <ul data-sly-list=\"${items}\"><li>${item.name @ context='html'}</li></ul></div>";
    let expected = compile(source);
    assert!(!expected.has_errors(), "{:?}", expected.errors());
    for read_buffer_size in [1, 2, 3, 7, 64] {
        let config = CompilerConfiguration {
            read_buffer_size,
            ..Default::default()
        };
        let compiler = Compiler::from_configuration(&config);
        assert_eq!(compile_with(&compiler, source), expected, "read buffer size {}", read_buffer_size);
    }
}

const FRAGMENTS: &[&str] = &[
    "<p>plain</p>",
    "<p>${page.title}</p>\n",
    "<div data-sly-test=\"${true}\">yes</div>",
    "<sly data-sly-test=\"${0}\">never</sly>",
    "<div data-sly-test.shown=\"${page.visible}\">${shown}</div>",
    "<ul data-sly-list=\"${items}\"><li>${item.name}</li></ul>",
    "<li data-sly-repeat.entry=\"${items @ begin=1}\">${entryList.index}</li>",
    "<div data-sly-unwrap=\"${wrap}\">x</div>",
    "<a href=\"${link}\" title=\"${1 + 2}\">a</a>",
    "<div data-sly-element=\"${tag}\" data-sly-attribute.id=\"${id}\"></div>",
    "<div data-sly-use.bean=\"${'com.example.Bean' @ path='/a'}\">${bean.value}</div>",
    "<div data-sly-set.x=\"${'a'}\" data-sly-text=\"${x}\"></div>",
    "<!--/* hidden */--><!-- ${comment} -->",
    "<div data-sly-attribute=\"${attributes}\"></div>",
    "<input type=\"checkbox\" checked>",
];

proptest! {
    #[test]
    fn compiled_streams_are_balanced_and_stable(fragments in proptest::collection::vec(proptest::sample::select(FRAGMENTS), 0..6)) {
        let source = fragments.concat();
        let result = compile(&source);
        prop_assert!(!result.has_errors(), "{:?}", result.errors());
        prop_assert_eq!(verify_scopes(result.commands()), Ok(()));

        let again = optimize(result.commands().to_vec()).unwrap();
        prop_assert_eq!(again.as_slice(), result.commands());
    }
}
