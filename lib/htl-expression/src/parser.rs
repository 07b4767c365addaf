//! Recursive descent parser for the expression language.
//!
//! Precedence, from lowest to highest: ternary `?:`, `||`, `&&`, `in`, comparisons, additive, multiplicative, unary
//! `!`, then property access by `.name` or `[expr]`.

use std::ops::Range;

use indexmap::IndexMap;
use tracing::trace;

use crate::error::{ExpressionError, Syntax};
use crate::lexer::{collect_with_spans, Token};
use crate::node::{BinaryOperator, Expression, ExpressionNode, Number, UnaryOperator};

type Result<T> = std::result::Result<T, ExpressionError>;

/// Parses the body of an expression, the text between `${` and `}`.
///
/// `raw_text` is the complete source of the expression, including its delimiters. It is kept on the returned
/// [`Expression`] and reported as the offending input of any error.
pub fn parse_expression(body: &str, raw_text: &str) -> Result<Expression> {
    let tokens = collect_with_spans(body).map_err(|e| {
        Syntax {
            message: format!("{} in expression", e),
            offending_input: raw_text,
        }
        .build()
    })?;

    let mut parser = Parser {
        tokens,
        position: 0,
        raw_text,
    };
    let expression = parser.expression()?;
    trace!(expression = %raw_text, "Parsed expression.");
    Ok(expression)
}

struct Parser<'a> {
    tokens: Vec<(Token<'a>, Range<usize>)>,
    position: usize,
    raw_text: &'a str,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<Token<'a>> {
        self.tokens.get(self.position).map(|(t, _)| *t)
    }

    fn peek_span(&self) -> Option<Range<usize>> {
        self.tokens.get(self.position).map(|(_, s)| s.clone())
    }

    fn advance(&mut self) -> Option<Token<'a>> {
        let token = self.peek();
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    fn eat(&mut self, expected: Token<'a>) -> bool {
        if self.peek() == Some(expected) {
            self.position += 1;
            true
        } else {
            false
        }
    }

    /// Consumes a name: an identifier, or a keyword used as one.
    fn name(&mut self) -> Option<&'a str> {
        let name = match self.peek()? {
            Token::Identifier(name) => name,
            Token::True => "true",
            Token::False => "false",
            Token::In => "in",
            _ => return None,
        };
        self.position += 1;
        Some(name)
    }

    fn expect(&mut self, expected: Token<'a>) -> Result<()> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("expected {}", expected.describe())))
        }
    }

    fn error(&self, message: String) -> ExpressionError {
        Syntax {
            message,
            offending_input: self.raw_text,
        }
        .build()
    }

    fn unexpected(&self, detail: &str) -> ExpressionError {
        match self.peek() {
            Some(token) => self.error(format!("Unexpected token {}, {}", token.describe(), detail)),
            None => self.error(format!("Unexpected end of expression, {}", detail)),
        }
    }

    fn expression(&mut self) -> Result<Expression> {
        let root = match self.peek() {
            None | Some(Token::At) => ExpressionNode::NullLiteral,
            Some(_) => self.ternary()?,
        };

        let mut options = IndexMap::new();
        if self.eat(Token::At) {
            loop {
                let name = match self.name() {
                    Some(name) => name.to_string(),
                    None => return Err(self.unexpected("expected an option name")),
                };
                let value = if self.eat(Token::Assign) {
                    self.ternary()?
                } else {
                    ExpressionNode::NullLiteral
                };
                options.insert(name, value);

                if !self.eat(Token::Comma) {
                    break;
                }
            }
        }

        if self.peek().is_some() {
            return Err(self.unexpected("expected end of expression"));
        }

        Ok(Expression::new(root, options, self.raw_text))
    }

    fn ternary(&mut self) -> Result<ExpressionNode> {
        let condition = self.or()?;
        if self.eat(Token::Question) {
            let then_branch = self.ternary()?;
            self.expect(Token::Colon)?;
            let else_branch = self.ternary()?;
            return Ok(ExpressionNode::ternary(condition, then_branch, else_branch));
        }
        Ok(condition)
    }

    fn or(&mut self) -> Result<ExpressionNode> {
        let mut left = self.and()?;
        while self.eat(Token::Or) {
            let right = self.and()?;
            left = ExpressionNode::binary(BinaryOperator::Or, left, right);
        }
        Ok(left)
    }

    fn and(&mut self) -> Result<ExpressionNode> {
        let mut left = self.membership()?;
        while self.eat(Token::And) {
            let right = self.membership()?;
            left = ExpressionNode::binary(BinaryOperator::And, left, right);
        }
        Ok(left)
    }

    fn membership(&mut self) -> Result<ExpressionNode> {
        let left = self.comparison()?;
        if self.eat(Token::In) {
            let right = self.comparison()?;
            return Ok(ExpressionNode::binary(BinaryOperator::In, left, right));
        }
        Ok(left)
    }

    fn comparison(&mut self) -> Result<ExpressionNode> {
        let left = self.additive()?;
        let operator = match self.peek() {
            Some(Token::StrictEq) => BinaryOperator::StrictEq,
            Some(Token::StrictNeq) => BinaryOperator::StrictNeq,
            Some(Token::Less) => BinaryOperator::Lt,
            Some(Token::LessEq) => BinaryOperator::Leq,
            Some(Token::Greater) => BinaryOperator::Gt,
            Some(Token::GreaterEq) => BinaryOperator::Geq,
            _ => return Ok(left),
        };
        self.position += 1;
        let right = self.additive()?;
        Ok(ExpressionNode::binary(operator, left, right))
    }

    fn additive(&mut self) -> Result<ExpressionNode> {
        let mut left = self.multiplicative()?;
        loop {
            let operator = match self.peek() {
                Some(Token::Plus) => BinaryOperator::Add,
                Some(Token::Minus) => BinaryOperator::Sub,
                _ => return Ok(left),
            };
            self.position += 1;
            let right = self.multiplicative()?;
            left = ExpressionNode::binary(operator, left, right);
        }
    }

    fn multiplicative(&mut self) -> Result<ExpressionNode> {
        let mut left = self.unary()?;
        loop {
            let operator = match self.peek() {
                Some(Token::Multiply) => BinaryOperator::Mul,
                Some(Token::Divide) => BinaryOperator::Div,
                Some(Token::Remainder) => BinaryOperator::Rem,
                _ => return Ok(left),
            };
            self.position += 1;
            let right = self.unary()?;
            left = ExpressionNode::binary(operator, left, right);
        }
    }

    fn unary(&mut self) -> Result<ExpressionNode> {
        match self.peek() {
            Some(Token::Not) => {
                self.position += 1;
                let operand = self.unary()?;
                Ok(ExpressionNode::unary(UnaryOperator::Not, operand))
            }
            Some(Token::Plus) | Some(Token::Minus) => self.signed_number(),
            _ => self.postfix(),
        }
    }

    /// A sign directly followed by a number forms a signed numeric literal.
    fn signed_number(&mut self) -> Result<ExpressionNode> {
        let negative = self.peek() == Some(Token::Minus);
        let sign_end = self.peek_span().map(|s| s.end);
        self.position += 1;

        match (self.peek(), self.peek_span()) {
            (Some(Token::NumberLiteral(literal)), Some(span)) if Some(span.start) == sign_end => {
                self.position += 1;
                match self.number(literal, negative)? {
                    Number::Int(0) if negative => Err(self.error(format!("Invalid numeric literal '-{}'", literal))),
                    number => Ok(ExpressionNode::NumericConstant(number)),
                }
            }
            _ => Err(self.unexpected("expected a number after the sign")),
        }
    }

    fn postfix(&mut self) -> Result<ExpressionNode> {
        let mut node = self.primary()?;
        loop {
            if self.eat(Token::Dot) {
                let property = match self.name() {
                    Some(name) => name,
                    None => return Err(self.unexpected("expected a property name")),
                };
                node = ExpressionNode::property(node, property);
            } else if self.eat(Token::LBracket) {
                let property = self.ternary()?;
                self.expect(Token::RBracket)?;
                node = ExpressionNode::PropertyAccess {
                    target: Box::new(node),
                    property: Box::new(property),
                };
            } else {
                return Ok(node);
            }
        }
    }

    fn primary(&mut self) -> Result<ExpressionNode> {
        let token = match self.advance() {
            Some(token) => token,
            None => return Err(self.unexpected("expected a value")),
        };

        match token {
            Token::True => Ok(ExpressionNode::BooleanConstant(true)),
            Token::False => Ok(ExpressionNode::BooleanConstant(false)),
            Token::StringLiteral(literal) => Ok(ExpressionNode::StringConstant(unescape(literal))),
            Token::NumberLiteral(literal) => self.number(literal, false).map(ExpressionNode::NumericConstant),
            Token::Identifier(name) => Ok(ExpressionNode::identifier(name)),
            Token::LParen => {
                let inner = self.ternary()?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            Token::LBracket => {
                let mut items = Vec::new();
                if !self.eat(Token::RBracket) {
                    loop {
                        items.push(self.ternary()?);
                        if self.eat(Token::RBracket) {
                            break;
                        }
                        self.expect(Token::Comma)?;
                    }
                }
                Ok(ExpressionNode::ArrayLiteral(items))
            }
            Token::LBrace => {
                let mut entries = IndexMap::new();
                if !self.eat(Token::RBrace) {
                    loop {
                        let key = match self.peek() {
                            Some(Token::StringLiteral(literal)) => {
                                self.position += 1;
                                unescape(literal)
                            }
                            _ => match self.name() {
                                Some(name) => name.to_string(),
                                None => return Err(self.unexpected("expected a map key")),
                            },
                        };
                        self.expect(Token::Colon)?;
                        let value = self.ternary()?;
                        entries.insert(key, value);
                        if self.eat(Token::RBrace) {
                            break;
                        }
                        self.expect(Token::Comma)?;
                    }
                }
                Ok(ExpressionNode::MapLiteral(entries))
            }
            _ => {
                self.position -= 1;
                Err(self.unexpected("expected a value"))
            }
        }
    }

    /// Validates and converts an unsigned numeric literal.
    ///
    /// The integer part has no leading zeros unless it is exactly `0`, and a literal with an exponent but no fraction
    /// must not start with `0`.
    /// Parses the digits of a numeric literal, with the sign that precedes them.
    fn number(&self, literal: &str, negative: bool) -> Result<Number> {
        let mantissa_end = literal.find(['e', 'E']).unwrap_or(literal.len());
        let (mantissa, exponent) = literal.split_at(mantissa_end);
        let (integer, fraction) = match mantissa.split_once('.') {
            Some((integer, fraction)) => (integer, Some(fraction)),
            None => (mantissa, None),
        };

        let leading_zero = integer.len() > 1 && integer.starts_with('0');
        let zero_with_exponent = integer == "0" && fraction.is_none() && !exponent.is_empty();
        if leading_zero || zero_with_exponent {
            return Err(self.error(format!("Invalid numeric literal '{}'", literal)));
        }

        let signed = if negative {
            format!("-{}", literal)
        } else {
            literal.to_string()
        };
        if fraction.is_none() && exponent.is_empty() {
            if let Ok(value) = signed.parse::<i64>() {
                return Ok(Number::Int(value));
            }
        }
        signed
            .parse::<f64>()
            .map(Number::Double)
            .map_err(|_| self.error(format!("Invalid numeric literal '{}'", literal)))
    }
}

/// Strips the quotes from a string literal and resolves its escape sequences.
fn unescape(literal: &str) -> String {
    let inner = &literal[1..literal.len() - 1];
    let mut result = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('t') => result.push('\t'),
            Some('r') => result.push('\r'),
            Some('b') => result.push('\u{8}'),
            Some('f') => result.push('\u{c}'),
            Some('u') => {
                let code = chars.by_ref().take(4).collect::<String>();
                match u32::from_str_radix(&code, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => result.push(decoded),
                    None => {
                        result.push_str("\\u");
                        result.push_str(&code);
                    }
                }
            }
            Some(other) => result.push(other),
            None => result.push('\\'),
        }
    }
    result
}
