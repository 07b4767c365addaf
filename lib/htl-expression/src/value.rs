use std::fmt;

use indexmap::IndexMap;

use crate::node::{ExpressionNode, Number};

/// A value that operators can be applied to.
///
/// Constant folding works on the subset of values that can be written as literals. Enum and object values only come
/// from the host environment, and exist so that operator behaviour can be stated for them.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Array(Vec<Value>),
    Map(IndexMap<String, Value>),

    /// An enum constant of a host type.
    Enum {
        /// Name of the enum type.
        type_name: String,

        /// Name of the constant.
        name: String,
    },

    /// An opaque host object.
    Object(String),
}

impl Value {
    /// Creates a string value.
    pub fn string<S: Into<String>>(s: S) -> Self {
        Self::String(s.into())
    }

    /// Creates an enum value.
    pub fn enum_constant<T: Into<String>, N: Into<String>>(type_name: T, name: N) -> Self {
        Self::Enum {
            type_name: type_name.into(),
            name: name.into(),
        }
    }

    /// Converts a literal node into a value.
    ///
    /// Returns `None` if the node, or any node nested inside an array or map literal, is not a literal.
    pub fn from_literal(node: &ExpressionNode) -> Option<Self> {
        match node {
            ExpressionNode::StringConstant(s) => Some(Self::String(s.clone())),
            ExpressionNode::NumericConstant(Number::Int(i)) => Some(Self::Int(*i)),
            ExpressionNode::NumericConstant(Number::Double(d)) => Some(Self::Float(*d)),
            ExpressionNode::BooleanConstant(b) => Some(Self::Bool(*b)),
            ExpressionNode::NullLiteral => Some(Self::Null),
            ExpressionNode::ArrayLiteral(items) => items
                .iter()
                .map(Self::from_literal)
                .collect::<Option<_>>()
                .map(Self::Array),
            ExpressionNode::MapLiteral(entries) => entries
                .iter()
                .map(|(k, v)| Self::from_literal(v).map(|v| (k.clone(), v)))
                .collect::<Option<_>>()
                .map(Self::Map),
            _ => None,
        }
    }

    /// Converts this value back into a literal node.
    ///
    /// Returns `None` for enum and object values, which have no literal form.
    pub fn to_literal(&self) -> Option<ExpressionNode> {
        match self {
            Self::Null => Some(ExpressionNode::NullLiteral),
            Self::Bool(b) => Some(ExpressionNode::BooleanConstant(*b)),
            Self::Int(i) => Some(ExpressionNode::NumericConstant(Number::Int(*i))),
            Self::Float(d) => Some(ExpressionNode::NumericConstant(Number::Double(*d))),
            Self::String(s) => Some(ExpressionNode::StringConstant(s.clone())),
            Self::Array(items) => items
                .iter()
                .map(Self::to_literal)
                .collect::<Option<_>>()
                .map(ExpressionNode::ArrayLiteral),
            Self::Map(entries) => entries
                .iter()
                .map(|(k, v)| v.to_literal().map(|v| (k.clone(), v)))
                .collect::<Option<_>>()
                .map(ExpressionNode::MapLiteral),
            Self::Enum { .. } | Self::Object(_) => None,
        }
    }

    /// Returns the truthiness of this value.
    ///
    /// Strings that are blank are false. Strings spelling `true` or `false`, ignoring case, take that value. Every
    /// other string is true.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(b) => *b,
            Self::Int(i) => *i != 0,
            Self::Float(d) => *d != 0.0 && !d.is_nan(),
            Self::String(s) => {
                let trimmed = s.trim();
                !(trimmed.is_empty() || trimmed.eq_ignore_ascii_case("false"))
            }
            Self::Array(items) => !items.is_empty(),
            Self::Map(entries) => !entries.is_empty(),
            Self::Enum { .. } | Self::Object(_) => true,
        }
    }

    /// Returns the numeric interpretation of this value, if it has one.
    ///
    /// Strings are parsed; every other non-numeric value has no numeric interpretation.
    pub fn to_number(&self) -> Option<Number> {
        match self {
            Self::Int(i) => Some(Number::Int(*i)),
            Self::Float(d) => Some(Number::Double(*d)),
            Self::String(s) => {
                let trimmed = s.trim();
                if let Ok(i) = trimmed.parse::<i64>() {
                    Some(Number::Int(i))
                } else {
                    trimmed
                        .parse::<f64>()
                        .ok()
                        .filter(|d| d.is_finite())
                        .map(Number::Double)
                }
            }
            _ => None,
        }
    }

    /// Returns `true` if this value is a number.
    pub fn is_number(&self) -> bool {
        matches!(self, Self::Int(_) | Self::Float(_))
    }

    /// Returns the name of this value's kind, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Int(_) | Self::Float(_) => "number",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Map(_) => "map",
            Self::Enum { .. } => "enum",
            Self::Object(_) => "object",
        }
    }
}

impl From<Number> for Value {
    fn from(number: Number) -> Self {
        match number {
            Number::Int(i) => Self::Int(i),
            Number::Double(d) => Self::Float(d),
        }
    }
}

/// Renders the value the way it is written into output text.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Int(i) => write!(f, "{}", i),
            Self::Float(d) => write!(f, "{}", Number::Double(*d)),
            Self::String(s) => f.write_str(s),
            Self::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", item)?;
                }
                Ok(())
            }
            Self::Map(entries) => {
                for (i, key) in entries.keys().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    f.write_str(key)?;
                }
                Ok(())
            }
            Self::Enum { name, .. } => f.write_str(name),
            Self::Object(description) => f.write_str(description),
        }
    }
}
