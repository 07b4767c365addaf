//! The HTL expression language.
//!
//! Covers the expression tree, the parser for `${...}` expressions embedded in text, and the semantics of the
//! language's operators over known values.

mod error;
pub use self::error::{ExpressionError, OperatorError};

mod interpolation;
pub use self::interpolation::{parse_interpolation, Fragment, Interpolation};

pub mod lexer;

mod node;
pub use self::node::{
    BinaryOperator, Expression, ExpressionNode, Number, RuntimeCall, RuntimeFunction, UnaryOperator,
};

pub mod ops;

mod parser;
pub use self::parser::parse_expression;

mod value;
pub use self::value::Value;
