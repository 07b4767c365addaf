use super::parser::{DocumentHandler, HtmlParser};
use super::{Attribute, MarkupError};

/// A node of a template tree.
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
    Comment(String),
}

/// An element of a template tree.
#[derive(Clone, Debug, PartialEq)]
pub struct Element {
    /// Tag name, as written.
    pub name: String,

    /// Attributes, in source order.
    pub attributes: Vec<Attribute>,

    /// Whether the element has a start tag. Only end tags without a matching start tag lack one.
    pub has_start_element: bool,

    /// Whether the element has an end tag.
    pub has_end_element: bool,

    /// Whether the start tag closes the element immediately.
    pub end_slash: bool,

    /// Child nodes, in source order.
    pub children: Vec<Node>,
}

impl Element {
    fn open(name: &str, attributes: &[Attribute], end_slash: bool) -> Self {
        Self {
            name: name.to_string(),
            attributes: attributes.to_vec(),
            has_start_element: true,
            has_end_element: false,
            end_slash,
            children: Vec::new(),
        }
    }

    fn stray_end(name: &str) -> Self {
        Self {
            name: name.to_string(),
            attributes: Vec::new(),
            has_start_element: false,
            has_end_element: true,
            end_slash: false,
            children: Vec::new(),
        }
    }
}

/// The root of a template tree.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Template {
    /// Top-level nodes, in source order.
    pub children: Vec<Node>,
}

#[derive(Default)]
struct TreeBuilder {
    root: Template,
    open: Vec<Element>,
}

impl TreeBuilder {
    fn append(&mut self, node: Node) {
        match self.open.last_mut() {
            Some(parent) => parent.children.push(node),
            None => self.root.children.push(node),
        }
    }

    fn close_innermost(&mut self) {
        if let Some(element) = self.open.pop() {
            self.append(Node::Element(element));
        }
    }
}

impl DocumentHandler for TreeBuilder {
    fn on_characters(&mut self, text: &str) {
        self.append(Node::Text(text.to_string()));
    }

    fn on_comment(&mut self, markup: &str) {
        self.append(Node::Comment(markup.to_string()));
    }

    fn on_start_element(&mut self, name: &str, attributes: &[Attribute], end_slash: bool) {
        let element = Element::open(name, attributes, end_slash);
        if end_slash {
            self.append(Node::Element(element));
        } else {
            self.open.push(element);
        }
    }

    fn on_end_element(&mut self, name: &str) {
        let Some(position) = self
            .open
            .iter()
            .rposition(|element| element.name.eq_ignore_ascii_case(name))
        else {
            self.append(Node::Element(Element::stray_end(name)));
            return;
        };

        // Elements opened after the one being closed are closed implicitly, without an end tag.
        while self.open.len() > position + 1 {
            self.close_innermost();
        }
        if let Some(element) = self.open.last_mut() {
            element.has_end_element = true;
        }
        self.close_innermost();
    }

    fn on_end_document(&mut self) {
        while !self.open.is_empty() {
            self.close_innermost();
        }
    }
}

/// Parses a template into a tree, reading `buffer_size` characters at a time.
///
/// # Errors
///
/// If the template ends inside a comment, a tag or a declaration, an error is returned.
pub fn parse_template(source: &str, buffer_size: usize) -> Result<Template, MarkupError> {
    let mut builder = TreeBuilder::default();
    HtmlParser::new(buffer_size).parse(source, &mut builder)?;
    Ok(builder.root)
}
