use std::ops::Range;

use logos::Logos;

/// Expression language tokens
#[derive(Logos, Debug, PartialEq, Eq, Clone, Copy, Hash)]
#[logos(skip r"[ \t\r\n\f]+")]
pub enum Token<'a> {
    // ===== Keywords =====
    #[token("true")]
    True,

    #[token("false")]
    False,

    #[token("in")]
    In,

    // ===== Logical operators =====
    #[token("||")]
    Or,

    #[token("&&")]
    And,

    #[token("!")]
    Not,

    // ===== Comparison operators =====
    #[token("==")]
    StrictEq,

    #[token("!=")]
    StrictNeq,

    #[token("<=")]
    LessEq,

    #[token(">=")]
    GreaterEq,

    #[token("<")]
    Less,

    #[token(">")]
    Greater,

    // ===== Arithmetic operators =====
    #[token("+")]
    Plus,

    #[token("-")]
    Minus,

    #[token("*")]
    Multiply,

    #[token("/")]
    Divide,

    #[token("%")]
    Remainder,

    // ===== Delimiters =====
    #[token("?")]
    Question,

    #[token(":")]
    Colon,

    #[token(",")]
    Comma,

    #[token(".")]
    Dot,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token("@")]
    At,

    #[token("=")]
    Assign,

    // ===== Literals =====
    /// String literal, single or double quoted, still escaped: 'a', "b\"c"
    #[regex(r#""([^"\\]|\\.)*""#, |lex| lex.slice())]
    #[regex(r#"'([^'\\]|\\.)*'"#, |lex| lex.slice())]
    StringLiteral(&'a str),

    /// Unsigned numeric literal. Leading zero rules are checked by the parser: 0, 12, 0.5, 1e-2
    #[regex(r"[0-9]+(\.[0-9]+)?([eE][+-]?[0-9]+)?", |lex| lex.slice())]
    NumberLiteral(&'a str),

    // ===== Identifiers =====
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_:]*", |lex| lex.slice())]
    Identifier(&'a str),
}

impl Token<'_> {
    /// Returns a short description of the token for error messages.
    pub fn describe(&self) -> String {
        match self {
            Self::StringLiteral(s) | Self::NumberLiteral(s) | Self::Identifier(s) => format!("'{}'", s),
            other => format!("'{}'", other.symbol()),
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            Self::True => "true",
            Self::False => "false",
            Self::In => "in",
            Self::Or => "||",
            Self::And => "&&",
            Self::Not => "!",
            Self::StrictEq => "==",
            Self::StrictNeq => "!=",
            Self::LessEq => "<=",
            Self::GreaterEq => ">=",
            Self::Less => "<",
            Self::Greater => ">",
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::Remainder => "%",
            Self::Question => "?",
            Self::Colon => ":",
            Self::Comma => ",",
            Self::Dot => ".",
            Self::LParen => "(",
            Self::RParen => ")",
            Self::LBracket => "[",
            Self::RBracket => "]",
            Self::LBrace => "{",
            Self::RBrace => "}",
            Self::At => "@",
            Self::Assign => "=",
            Self::StringLiteral(_) | Self::NumberLiteral(_) | Self::Identifier(_) => "",
        }
    }
}

/// Lexer error with position information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexerError {
    /// Position in the input where the error occurred
    pub position: usize,
    /// The invalid character or slice that caused the error
    pub invalid_slice: String,
}

impl std::fmt::Display for LexerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invalid token '{}' at position {}", self.invalid_slice, self.position)
    }
}

/// Collects tokens with their positions (spans).
///
/// Returns an error if any invalid token is encountered.
pub fn collect_with_spans(input: &str) -> Result<Vec<(Token<'_>, Range<usize>)>, LexerError> {
    let mut lexer = Token::lexer(input);
    let mut tokens = Vec::new();
    while let Some(result) = lexer.next() {
        match result {
            Ok(token) => tokens.push((token, lexer.span())),
            Err(()) => {
                let span = lexer.span();
                return Err(LexerError {
                    position: span.start,
                    invalid_slice: input[span].to_string(),
                });
            }
        }
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use similar_asserts::assert_eq;

    use super::*;

    fn tokens(input: &str) -> Vec<Token<'_>> {
        collect_with_spans(input).unwrap().into_iter().map(|(t, _)| t).collect()
    }

    #[test]
    fn keywords_win_over_identifiers() {
        assert_eq!(
            tokens("true in inner false_"),
            vec![
                Token::True,
                Token::In,
                Token::Identifier("inner"),
                Token::Identifier("false_")
            ]
        );
    }

    #[test]
    fn operators_and_literals() {
        assert_eq!(
            tokens("a.b != 'x' && \"y\" <= 1.5e3 @ context='html'"),
            vec![
                Token::Identifier("a"),
                Token::Dot,
                Token::Identifier("b"),
                Token::StrictNeq,
                Token::StringLiteral("'x'"),
                Token::And,
                Token::StringLiteral("\"y\""),
                Token::LessEq,
                Token::NumberLiteral("1.5e3"),
                Token::At,
                Token::Identifier("context"),
                Token::Assign,
                Token::StringLiteral("'html'"),
            ]
        );
    }

    #[test]
    fn escaped_quotes_stay_in_string() {
        assert_eq!(tokens(r"'it\'s'"), vec![Token::StringLiteral(r"'it\'s'")]);
    }

    #[test]
    fn invalid_character() {
        let err = collect_with_spans("a # b").unwrap_err();
        assert_eq!(err.position, 2);
        assert_eq!(err.invalid_slice, "#");
    }
}
