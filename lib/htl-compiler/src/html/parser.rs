use super::{is_void_element, Attribute, MarkupError, Unterminated};

/// Receives the events of an [`HtmlParser`].
pub trait DocumentHandler {
    /// Handles a run of text.
    fn on_characters(&mut self, text: &str);

    /// Handles a comment, including its delimiters.
    fn on_comment(&mut self, markup: &str);

    /// Handles a start tag.
    ///
    /// `end_slash` is `true` when the tag closes immediately, either because it was written as `<tag/>` or because it
    /// is a void element.
    fn on_start_element(&mut self, name: &str, attributes: &[Attribute], end_slash: bool);

    /// Handles an end tag.
    fn on_end_element(&mut self, name: &str);

    /// Handles the end of the document.
    fn on_end_document(&mut self) {}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Text,
    TagOpen,
    MarkupDeclaration,
    Comment,
    Declaration,
    StartTagName,
    EndTag,
    BeforeAttributeName,
    AttributeName,
    AfterAttributeName,
    BeforeAttributeValue,
    QuotedAttributeValue(char),
    UnquotedAttributeValue,
    SelfClosing,
    RawText,
}

const COMMENT_START: &str = "<!--";
const COMMENT_END: &str = "-->";

/// Character-level tokenizer state. Survives chunk boundaries, so the events produced do not depend on how the input
/// is split.
struct Tokenizer {
    state: State,
    text: String,
    markup: String,
    tag_name: String,
    attribute_name: String,
    attribute_value: String,
    attributes: Vec<Attribute>,
    raw_text_tag: String,
}

impl Tokenizer {
    fn new() -> Self {
        Self {
            state: State::Text,
            text: String::new(),
            markup: String::new(),
            tag_name: String::new(),
            attribute_name: String::new(),
            attribute_value: String::new(),
            attributes: Vec::new(),
            raw_text_tag: String::new(),
        }
    }

    fn feed<H: DocumentHandler>(&mut self, chunk: &str, handler: &mut H) {
        for c in chunk.chars() {
            self.process(c, handler);
        }
    }

    fn process<H: DocumentHandler>(&mut self, c: char, handler: &mut H) {
        match self.state {
            State::Text => {
                if c == '<' {
                    self.markup.push(c);
                    self.state = State::TagOpen;
                } else {
                    self.text.push(c);
                }
            }
            State::TagOpen => match c {
                '!' => {
                    self.markup.push(c);
                    self.state = State::MarkupDeclaration;
                }
                '/' => {
                    self.markup.push(c);
                    self.state = State::EndTag;
                }
                c if c.is_ascii_alphabetic() => {
                    self.markup.push(c);
                    self.tag_name.push(c);
                    self.state = State::StartTagName;
                }
                c => {
                    // Not a tag after all.
                    self.text.push_str(&self.markup);
                    self.markup.clear();
                    self.state = State::Text;
                    self.process(c, handler);
                }
            },
            State::MarkupDeclaration => {
                self.markup.push(c);
                if self.markup == COMMENT_START {
                    self.state = State::Comment;
                } else if !COMMENT_START.starts_with(self.markup.as_str()) {
                    self.state = State::Declaration;
                    if c == '>' {
                        self.end_declaration();
                    }
                }
            }
            State::Comment => {
                self.markup.push(c);
                if self.markup.len() >= COMMENT_START.len() + COMMENT_END.len() && self.markup.ends_with(COMMENT_END) {
                    self.flush_text(handler);
                    handler.on_comment(&self.markup);
                    self.markup.clear();
                    self.state = State::Text;
                }
            }
            State::Declaration => {
                self.markup.push(c);
                if c == '>' {
                    self.end_declaration();
                }
            }
            State::StartTagName => {
                self.markup.push(c);
                match c {
                    c if c.is_whitespace() => self.state = State::BeforeAttributeName,
                    '/' => self.state = State::SelfClosing,
                    '>' => self.emit_start_element(false, handler),
                    c => self.tag_name.push(c),
                }
            }
            State::EndTag => {
                self.markup.push(c);
                if c == '>' {
                    self.emit_end_element(handler);
                } else {
                    self.tag_name.push(c);
                }
            }
            State::BeforeAttributeName => {
                self.markup.push(c);
                match c {
                    c if c.is_whitespace() => {}
                    '/' => self.state = State::SelfClosing,
                    '>' => self.emit_start_element(false, handler),
                    c => self.start_attribute_name(c),
                }
            }
            State::AttributeName => {
                self.markup.push(c);
                match c {
                    c if c.is_whitespace() => self.state = State::AfterAttributeName,
                    '=' => self.state = State::BeforeAttributeValue,
                    '/' => {
                        self.push_attribute(None, None);
                        self.state = State::SelfClosing;
                    }
                    '>' => {
                        self.push_attribute(None, None);
                        self.emit_start_element(false, handler);
                    }
                    c => self.attribute_name.push(c),
                }
            }
            State::AfterAttributeName => {
                self.markup.push(c);
                match c {
                    c if c.is_whitespace() => {}
                    '=' => self.state = State::BeforeAttributeValue,
                    '/' => {
                        self.push_attribute(None, None);
                        self.state = State::SelfClosing;
                    }
                    '>' => {
                        self.push_attribute(None, None);
                        self.emit_start_element(false, handler);
                    }
                    c => {
                        self.push_attribute(None, None);
                        self.start_attribute_name(c);
                    }
                }
            }
            State::BeforeAttributeValue => {
                self.markup.push(c);
                match c {
                    c if c.is_whitespace() => {}
                    '"' | '\'' => self.state = State::QuotedAttributeValue(c),
                    '>' => {
                        self.push_attribute(Some(String::new()), None);
                        self.emit_start_element(false, handler);
                    }
                    c => {
                        self.attribute_value.push(c);
                        self.state = State::UnquotedAttributeValue;
                    }
                }
            }
            State::QuotedAttributeValue(quote) => {
                self.markup.push(c);
                if c == quote {
                    let value = std::mem::take(&mut self.attribute_value);
                    self.push_attribute(Some(value), Some(quote));
                    self.state = State::BeforeAttributeName;
                } else {
                    self.attribute_value.push(c);
                }
            }
            State::UnquotedAttributeValue => {
                self.markup.push(c);
                match c {
                    c if c.is_whitespace() => {
                        let value = std::mem::take(&mut self.attribute_value);
                        self.push_attribute(Some(value), None);
                        self.state = State::BeforeAttributeName;
                    }
                    '>' => {
                        let value = std::mem::take(&mut self.attribute_value);
                        self.push_attribute(Some(value), None);
                        self.emit_start_element(false, handler);
                    }
                    c => self.attribute_value.push(c),
                }
            }
            State::SelfClosing => {
                self.markup.push(c);
                match c {
                    '>' => self.emit_start_element(true, handler),
                    c if c.is_whitespace() => self.state = State::BeforeAttributeName,
                    c => self.start_attribute_name(c),
                }
            }
            State::RawText => {
                self.text.push(c);
                if c == '>' {
                    self.end_raw_text(handler);
                }
            }
        }
    }

    fn finish<H: DocumentHandler>(&mut self, handler: &mut H) -> Result<(), MarkupError> {
        let construct = match self.state {
            State::Text | State::RawText => None,
            State::TagOpen => {
                self.text.push_str(&self.markup);
                self.markup.clear();
                None
            }
            State::MarkupDeclaration | State::Comment => Some("comment"),
            State::Declaration => Some("declaration"),
            _ => Some("tag"),
        };
        if let Some(construct) = construct {
            return Unterminated {
                construct,
                fragment: std::mem::take(&mut self.markup),
            }
            .fail();
        }

        self.flush_text(handler);
        handler.on_end_document();
        Ok(())
    }

    fn flush_text<H: DocumentHandler>(&mut self, handler: &mut H) {
        if !self.text.is_empty() {
            handler.on_characters(&self.text);
            self.text.clear();
        }
    }

    fn end_declaration(&mut self) {
        self.text.push_str(&self.markup);
        self.markup.clear();
        self.state = State::Text;
    }

    fn start_attribute_name(&mut self, c: char) {
        self.attribute_name.push(c);
        self.state = State::AttributeName;
    }

    fn push_attribute(&mut self, value: Option<String>, quote: Option<char>) {
        let name = std::mem::take(&mut self.attribute_name);
        self.attributes.push(Attribute::new(name, value, quote));
    }

    fn emit_start_element<H: DocumentHandler>(&mut self, end_slash: bool, handler: &mut H) {
        self.flush_text(handler);
        let name = std::mem::take(&mut self.tag_name);
        let void = is_void_element(&name);
        handler.on_start_element(&name, &self.attributes, end_slash || void);
        self.attributes.clear();
        self.markup.clear();

        let raw_text = name.eq_ignore_ascii_case("script") || name.eq_ignore_ascii_case("style");
        if raw_text && !end_slash && !void {
            self.raw_text_tag = name;
            self.state = State::RawText;
        } else {
            self.state = State::Text;
        }
    }

    fn emit_end_element<H: DocumentHandler>(&mut self, handler: &mut H) {
        let name = std::mem::take(&mut self.tag_name);
        let name = name.trim();
        if name.is_empty() {
            self.text.push_str(&self.markup);
        } else {
            self.flush_text(handler);
            if !is_void_element(name) {
                handler.on_end_element(name);
            }
        }
        self.markup.clear();
        self.state = State::Text;
    }

    fn end_raw_text<H: DocumentHandler>(&mut self, handler: &mut H) {
        let closing = format!("</{}>", self.raw_text_tag);
        let Some(start) = self.text.len().checked_sub(closing.len()) else {
            return;
        };
        if !self.text.is_char_boundary(start) || !self.text[start..].eq_ignore_ascii_case(&closing) {
            return;
        }

        self.text.truncate(start);
        self.flush_text(handler);
        handler.on_end_element(&std::mem::take(&mut self.raw_text_tag));
        self.state = State::Text;
    }
}

/// A streaming HTML parser.
///
/// The template is handed to the tokenizer in chunks of a fixed number of characters. The events produced are the
/// same for every chunk size.
#[derive(Clone, Copy, Debug)]
pub struct HtmlParser {
    buffer_size: usize,
}

impl HtmlParser {
    /// Creates a new `HtmlParser` reading `buffer_size` characters at a time.
    ///
    /// A buffer size of zero is treated as one.
    pub fn new(buffer_size: usize) -> Self {
        Self {
            buffer_size: buffer_size.max(1),
        }
    }

    /// Parses `source`, sending events to `handler`.
    ///
    /// # Errors
    ///
    /// If the template ends inside a comment, a tag or a declaration, an error is returned.
    pub fn parse<H: DocumentHandler>(&self, source: &str, handler: &mut H) -> Result<(), MarkupError> {
        let mut tokenizer = Tokenizer::new();
        let mut chunk_start = 0;
        let mut chars = 0;
        for (index, _) in source.char_indices() {
            if chars == self.buffer_size {
                tokenizer.feed(&source[chunk_start..index], handler);
                chunk_start = index;
                chars = 0;
            }
            chars += 1;
        }
        tokenizer.feed(&source[chunk_start..], handler);
        tokenizer.finish(handler)
    }
}

impl Default for HtmlParser {
    fn default() -> Self {
        Self::new(8192)
    }
}
