use super::markup::MarkupHandler;
use crate::error::CompilerError;
use crate::html::{Element, Node, Template};

/// Walks a template tree depth-first, reporting every node to a [`MarkupHandler`].
pub(crate) fn traverse(template: &Template, handler: &mut MarkupHandler<'_>) -> Result<(), CompilerError> {
    for node in &template.children {
        traverse_node(node, handler)?;
    }
    handler.on_document_finished()
}

fn traverse_node(node: &Node, handler: &mut MarkupHandler<'_>) -> Result<(), CompilerError> {
    match node {
        Node::Element(element) => traverse_element(element, handler),
        Node::Text(text) => handler.on_text(text),
        Node::Comment(markup) => handler.on_comment(markup),
    }
}

fn traverse_element(element: &Element, handler: &mut MarkupHandler<'_>) -> Result<(), CompilerError> {
    if element.has_start_element {
        handler.on_open_tag_start(&format!("<{}", element.name), &element.name);
        let end_markup = if element.end_slash { "/>" } else { ">" };
        for attribute in &element.attributes {
            if let Err(e) = handler.on_attribute(&attribute.name, attribute.value.as_deref(), attribute.quote) {
                if e.offending_input().is_some() {
                    return Err(e);
                }
                return Err(e.with_offending_input(format!("{}{}", start_tag_markup(element), end_markup)));
            }
        }
        handler.on_open_tag_end(end_markup)?;
    } else {
        handler.on_open_tag_start("", &element.name);
        handler.on_open_tag_end("")?;
    }

    for child in &element.children {
        traverse_node(child, handler)?;
    }

    if element.has_end_element {
        handler.on_close_tag(&format!("</{}>", element.name))
    } else {
        handler.on_close_tag("")
    }
}

/// Rebuilds the start tag of an element, without its closing `>`.
fn start_tag_markup(element: &Element) -> String {
    let mut markup = format!("<{}", element.name);
    for attribute in &element.attributes {
        markup.push(' ');
        markup.push_str(&attribute.name);
        if let Some(value) = attribute.value.as_deref().filter(|value| !value.is_empty()) {
            let quote = attribute.quote.map(String::from).unwrap_or_default();
            markup.push('=');
            markup.push_str(&quote);
            markup.push_str(value);
            markup.push_str(&quote);
        }
    }
    markup
}

#[cfg(test)]
mod tests {
    use similar_asserts::assert_eq;

    use super::*;
    use crate::html::parse_template;

    #[test]
    fn start_tag_is_rebuilt_with_original_quotes() {
        let template = parse_template("<div id='main' hidden data-x=\"1\">", 16).unwrap();
        let Node::Element(element) = &template.children[0] else {
            panic!("expected an element");
        };
        assert_eq!(start_tag_markup(element), "<div id='main' hidden data-x=\"1\"");
    }
}
