//! Expression tree types.

use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::{ExpressionError, InvalidRuntimeFunction};

/// A numeric literal.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub enum Number {
    /// Integral value.
    Int(i64),

    /// Floating-point value.
    Double(f64),
}

impl Number {
    /// Returns the value as a double.
    pub fn as_f64(&self) -> f64 {
        match self {
            Self::Int(i) => *i as f64,
            Self::Double(d) => *d,
        }
    }

    /// Returns `true` if the value is zero.
    pub fn is_zero(&self) -> bool {
        match self {
            Self::Int(i) => *i == 0,
            Self::Double(d) => *d == 0.0,
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{}", i),
            Self::Double(d) if d.is_finite() && d.fract() == 0.0 && d.abs() < 1e15 => write!(f, "{:.1}", d),
            Self::Double(d) => write!(f, "{}", d),
        }
    }
}

/// Unary operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum UnaryOperator {
    /// Logical negation.
    Not,

    /// Whitespace-only test, used by generated code.
    IsWhitespace,

    /// Collection length, used by generated code.
    Length,
}

/// Binary operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum BinaryOperator {
    And,
    Or,
    Concatenate,
    Lt,
    Leq,
    Gt,
    Geq,
    /// Loose equality. Never fails.
    Eq,
    /// Loose inequality. Never fails.
    Neq,
    /// Strict equality (`==` in source).
    StrictEq,
    /// Strict inequality (`!=` in source).
    StrictNeq,
    Add,
    Sub,
    Mul,
    Div,
    /// Integer division.
    IDiv,
    Rem,
    In,
}

impl BinaryOperator {
    /// Returns the source symbol of the operator, or its name if it has no surface syntax.
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::And => "&&",
            Self::Or => "||",
            Self::Concatenate => "concat",
            Self::Lt => "<",
            Self::Leq => "<=",
            Self::Gt => ">",
            Self::Geq => ">=",
            Self::Eq => "eq",
            Self::Neq => "neq",
            Self::StrictEq => "==",
            Self::StrictNeq => "!=",
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::IDiv => "idiv",
            Self::Rem => "%",
            Self::In => "in",
        }
    }

    fn is_infix(&self) -> bool {
        !matches!(self, Self::Concatenate | Self::Eq | Self::Neq | Self::IDiv)
    }
}

/// The closed set of functions a [`RuntimeCall`] may invoke.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum RuntimeFunction {
    Use,
    IncludeResource,
    Include,
    I18n,
    Xss,
    UriManipulation,
    Join,
    Format,
}

impl RuntimeFunction {
    /// All supported functions.
    pub const ALL: [RuntimeFunction; 8] = [
        Self::Use,
        Self::IncludeResource,
        Self::Include,
        Self::I18n,
        Self::Xss,
        Self::UriManipulation,
        Self::Join,
        Self::Format,
    ];

    /// Returns the function's name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Use => "use",
            Self::IncludeResource => "includeResource",
            Self::Include => "include",
            Self::I18n => "i18n",
            Self::Xss => "xss",
            Self::UriManipulation => "uriManipulation",
            Self::Join => "join",
            Self::Format => "format",
        }
    }

    /// Looks up a function by name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.name() == name)
    }
}

/// A call to one of the runtime's built-in functions.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RuntimeCall {
    function: RuntimeFunction,
    arguments: Vec<ExpressionNode>,
}

impl RuntimeCall {
    /// Creates a new `RuntimeCall`.
    pub fn new(function: RuntimeFunction, arguments: Vec<ExpressionNode>) -> Self {
        Self { function, arguments }
    }

    /// Creates a new `RuntimeCall` from a function name.
    ///
    /// # Errors
    ///
    /// If `name` is not one of the supported runtime functions, an error is returned.
    pub fn from_name(name: &str, arguments: Vec<ExpressionNode>) -> Result<Self, ExpressionError> {
        match RuntimeFunction::from_name(name) {
            Some(function) => Ok(Self::new(function, arguments)),
            None => InvalidRuntimeFunction { name }.fail(),
        }
    }

    /// Returns the called function.
    pub fn function(&self) -> RuntimeFunction {
        self.function
    }

    /// Returns the call arguments.
    pub fn arguments(&self) -> &[ExpressionNode] {
        &self.arguments
    }

    pub(crate) fn arguments_mut(&mut self) -> &mut Vec<ExpressionNode> {
        &mut self.arguments
    }
}

/// A node of an expression tree.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum ExpressionNode {
    StringConstant(String),
    NumericConstant(Number),
    BooleanConstant(bool),
    NullLiteral,
    Identifier(String),
    PropertyAccess {
        target: Box<ExpressionNode>,
        property: Box<ExpressionNode>,
    },
    ArrayLiteral(Vec<ExpressionNode>),
    MapLiteral(IndexMap<String, ExpressionNode>),
    UnaryOperation {
        operator: UnaryOperator,
        operand: Box<ExpressionNode>,
    },
    BinaryOperation {
        operator: BinaryOperator,
        left: Box<ExpressionNode>,
        right: Box<ExpressionNode>,
    },
    TernaryOperation {
        condition: Box<ExpressionNode>,
        then_branch: Box<ExpressionNode>,
        else_branch: Box<ExpressionNode>,
    },
    RuntimeCall(RuntimeCall),
}

impl ExpressionNode {
    /// Creates a string constant.
    pub fn string<S: Into<String>>(value: S) -> Self {
        Self::StringConstant(value.into())
    }

    /// Creates an identifier.
    pub fn identifier<S: Into<String>>(name: S) -> Self {
        Self::Identifier(name.into())
    }

    /// Creates an integer constant.
    pub fn int(value: i64) -> Self {
        Self::NumericConstant(Number::Int(value))
    }

    /// Creates a property access of a named property.
    pub fn property<S: Into<String>>(target: ExpressionNode, property: S) -> Self {
        Self::PropertyAccess {
            target: Box::new(target),
            property: Box::new(Self::StringConstant(property.into())),
        }
    }

    /// Creates a unary operation.
    pub fn unary(operator: UnaryOperator, operand: ExpressionNode) -> Self {
        Self::UnaryOperation {
            operator,
            operand: Box::new(operand),
        }
    }

    /// Creates a binary operation.
    pub fn binary(operator: BinaryOperator, left: ExpressionNode, right: ExpressionNode) -> Self {
        Self::BinaryOperation {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Creates a ternary operation.
    pub fn ternary(condition: ExpressionNode, then_branch: ExpressionNode, else_branch: ExpressionNode) -> Self {
        Self::TernaryOperation {
            condition: Box::new(condition),
            then_branch: Box::new(then_branch),
            else_branch: Box::new(else_branch),
        }
    }

    /// Creates a runtime call.
    pub fn call(function: RuntimeFunction, arguments: Vec<ExpressionNode>) -> Self {
        Self::RuntimeCall(RuntimeCall::new(function, arguments))
    }

    /// Returns `true` if this node is a string, number, boolean or null literal.
    pub fn is_scalar_constant(&self) -> bool {
        matches!(
            self,
            Self::StringConstant(_) | Self::NumericConstant(_) | Self::BooleanConstant(_) | Self::NullLiteral
        )
    }

    /// Returns `true` if this node is a runtime call to the given function.
    pub fn is_call_to(&self, function: RuntimeFunction) -> bool {
        matches!(self, Self::RuntimeCall(call) if call.function() == function)
    }

    /// Visits this node and every node below it, depth first, parents before children.
    pub fn walk<'a, F: FnMut(&'a ExpressionNode)>(&'a self, visitor: &mut F) {
        visitor(self);
        match self {
            Self::PropertyAccess { target, property } => {
                target.walk(visitor);
                property.walk(visitor);
            }
            Self::ArrayLiteral(items) => items.iter().for_each(|item| item.walk(visitor)),
            Self::MapLiteral(entries) => entries.values().for_each(|value| value.walk(visitor)),
            Self::UnaryOperation { operand, .. } => operand.walk(visitor),
            Self::BinaryOperation { left, right, .. } => {
                left.walk(visitor);
                right.walk(visitor);
            }
            Self::TernaryOperation {
                condition,
                then_branch,
                else_branch,
            } => {
                condition.walk(visitor);
                then_branch.walk(visitor);
                else_branch.walk(visitor);
            }
            Self::RuntimeCall(call) => call.arguments().iter().for_each(|arg| arg.walk(visitor)),
            _ => {}
        }
    }

    /// Rebuilds this node bottom-up, replacing every node with the result of `transform`.
    ///
    /// Children are transformed before their parent is handed to `transform`.
    pub fn transform<E, F>(self, transform: &mut F) -> Result<ExpressionNode, E>
    where
        F: FnMut(ExpressionNode) -> Result<ExpressionNode, E>,
    {
        let rebuilt = match self {
            Self::PropertyAccess { target, property } => Self::PropertyAccess {
                target: Box::new(target.transform(transform)?),
                property: Box::new(property.transform(transform)?),
            },
            Self::ArrayLiteral(items) => Self::ArrayLiteral(
                items
                    .into_iter()
                    .map(|item| item.transform(transform))
                    .collect::<Result<_, _>>()?,
            ),
            Self::MapLiteral(entries) => Self::MapLiteral(
                entries
                    .into_iter()
                    .map(|(key, value)| value.transform(transform).map(|value| (key, value)))
                    .collect::<Result<_, _>>()?,
            ),
            Self::UnaryOperation { operator, operand } => Self::UnaryOperation {
                operator,
                operand: Box::new(operand.transform(transform)?),
            },
            Self::BinaryOperation { operator, left, right } => Self::BinaryOperation {
                operator,
                left: Box::new(left.transform(transform)?),
                right: Box::new(right.transform(transform)?),
            },
            Self::TernaryOperation {
                condition,
                then_branch,
                else_branch,
            } => Self::TernaryOperation {
                condition: Box::new(condition.transform(transform)?),
                then_branch: Box::new(then_branch.transform(transform)?),
                else_branch: Box::new(else_branch.transform(transform)?),
            },
            Self::RuntimeCall(mut call) => {
                let arguments = std::mem::take(call.arguments_mut());
                *call.arguments_mut() = arguments
                    .into_iter()
                    .map(|arg| arg.transform(transform))
                    .collect::<Result<_, _>>()?;
                Self::RuntimeCall(call)
            }
            leaf => leaf,
        };
        transform(rebuilt)
    }
}

fn write_string_literal(f: &mut fmt::Formatter<'_>, value: &str) -> fmt::Result {
    f.write_str("'")?;
    for c in value.chars() {
        match c {
            '\'' => f.write_str("\\'")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            c => write!(f, "{}", c)?,
        }
    }
    f.write_str("'")
}

fn is_plain_identifier(value: &str) -> bool {
    let mut chars = value.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
}

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: impl Iterator<Item = T>) -> fmt::Result {
    for (i, item) in items.enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for ExpressionNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StringConstant(s) => write_string_literal(f, s),
            Self::NumericConstant(n) => write!(f, "{}", n),
            Self::BooleanConstant(b) => write!(f, "{}", b),
            Self::NullLiteral => f.write_str("null"),
            Self::Identifier(name) => f.write_str(name),
            Self::PropertyAccess { target, property } => match property.as_ref() {
                Self::StringConstant(name) if is_plain_identifier(name) => write!(f, "{}.{}", target, name),
                other => write!(f, "{}[{}]", target, other),
            },
            Self::ArrayLiteral(items) => {
                f.write_str("[")?;
                write_list(f, items.iter())?;
                f.write_str("]")
            }
            Self::MapLiteral(entries) => {
                f.write_str("{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write_string_literal(f, key)?;
                    write!(f, ": {}", value)?;
                }
                f.write_str("}")
            }
            Self::UnaryOperation { operator, operand } => match operator {
                UnaryOperator::Not => write!(f, "!{}", operand),
                UnaryOperator::IsWhitespace => write!(f, "isWhitespace({})", operand),
                UnaryOperator::Length => write!(f, "length({})", operand),
            },
            Self::BinaryOperation { operator, left, right } => {
                if operator.is_infix() {
                    write!(f, "({} {} {})", left, operator.symbol(), right)
                } else {
                    write!(f, "{}({}, {})", operator.symbol(), left, right)
                }
            }
            Self::TernaryOperation {
                condition,
                then_branch,
                else_branch,
            } => write!(f, "({} ? {} : {})", condition, then_branch, else_branch),
            Self::RuntimeCall(call) => {
                write!(f, "{}(", call.function().name())?;
                write_list(f, call.arguments().iter())?;
                f.write_str(")")
            }
        }
    }
}

/// A parsed expression: a root node, its options and the text it was parsed from.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Expression {
    root: ExpressionNode,
    options: IndexMap<String, ExpressionNode>,
    raw_text: String,
}

impl Expression {
    /// Creates a new `Expression`.
    pub fn new<S: Into<String>>(root: ExpressionNode, options: IndexMap<String, ExpressionNode>, raw_text: S) -> Self {
        Self {
            root,
            options,
            raw_text: raw_text.into(),
        }
    }

    /// Creates a new `Expression` with no options, using the rendered root as its raw text.
    pub fn from_node(root: ExpressionNode) -> Self {
        let raw_text = format!("${{{}}}", root);
        Self::new(root, IndexMap::new(), raw_text)
    }

    /// Returns the root node.
    pub fn root(&self) -> &ExpressionNode {
        &self.root
    }

    /// Returns the options.
    pub fn options(&self) -> &IndexMap<String, ExpressionNode> {
        &self.options
    }

    /// Returns the text the expression was parsed from.
    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    /// Returns the value of the given option, if present.
    pub fn option(&self, name: &str) -> Option<&ExpressionNode> {
        self.options.get(name)
    }

    /// Returns `true` if the given option is present.
    pub fn contains_option(&self, name: &str) -> bool {
        self.options.contains_key(name)
    }

    /// Removes the given option, returning its value.
    ///
    /// The relative order of the remaining options is preserved.
    pub fn remove_option(&mut self, name: &str) -> Option<ExpressionNode> {
        self.options.shift_remove(name)
    }

    /// Sets an option, replacing any previous value.
    pub fn set_option<S: Into<String>>(&mut self, name: S, value: ExpressionNode) {
        self.options.insert(name.into(), value);
    }

    /// Returns a copy of this expression with a different root node.
    pub fn with_node(&self, root: ExpressionNode) -> Self {
        Self {
            root,
            options: self.options.clone(),
            raw_text: self.raw_text.clone(),
        }
    }

    /// Consumes the expression, returning its root node.
    pub fn into_root(self) -> ExpressionNode {
        self.root
    }

    /// Consumes the expression, returning its root node and options.
    pub fn into_parts(self) -> (ExpressionNode, IndexMap<String, ExpressionNode>) {
        (self.root, self.options)
    }
}

#[cfg(test)]
mod tests {
    use similar_asserts::assert_eq;

    use super::*;

    #[test]
    fn runtime_call_by_name() {
        let call = RuntimeCall::from_name("xss", vec![ExpressionNode::identifier("a")]).unwrap();
        assert_eq!(call.function(), RuntimeFunction::Xss);

        for function in RuntimeFunction::ALL {
            assert_eq!(RuntimeFunction::from_name(function.name()), Some(function));
        }
    }

    #[test]
    fn runtime_call_rejects_unknown_name() {
        let err = RuntimeCall::from_name("eval", vec![]).unwrap_err();
        assert_eq!(
            err,
            ExpressionError::InvalidRuntimeFunction {
                name: "eval".to_string()
            }
        );
    }

    #[test]
    fn display_renders_source_syntax() {
        let node = ExpressionNode::binary(
            BinaryOperator::And,
            ExpressionNode::property(ExpressionNode::identifier("page"), "title"),
            ExpressionNode::unary(UnaryOperator::Not, ExpressionNode::string("it's")),
        );
        assert_eq!(node.to_string(), "(page.title && !'it\\'s')");

        let node = ExpressionNode::PropertyAccess {
            target: Box::new(ExpressionNode::identifier("items")),
            property: Box::new(ExpressionNode::int(0)),
        };
        assert_eq!(node.to_string(), "items[0]");
        assert_eq!(ExpressionNode::NumericConstant(Number::Double(2.0)).to_string(), "2.0");
    }

    #[test]
    fn remove_option_preserves_order() {
        let mut options = IndexMap::new();
        options.insert("a".to_string(), ExpressionNode::NullLiteral);
        options.insert("b".to_string(), ExpressionNode::NullLiteral);
        options.insert("c".to_string(), ExpressionNode::NullLiteral);
        let mut expression = Expression::new(ExpressionNode::NullLiteral, options, "${@ a, b, c}");

        assert_eq!(expression.remove_option("a"), Some(ExpressionNode::NullLiteral));
        assert!(!expression.contains_option("a"));
        let names = expression.options().keys().cloned().collect::<Vec<_>>();
        assert_eq!(names, vec!["b".to_string(), "c".to_string()]);
    }

    #[test]
    fn transform_is_bottom_up() {
        let node = ExpressionNode::binary(
            BinaryOperator::Add,
            ExpressionNode::identifier("a"),
            ExpressionNode::identifier("b"),
        );
        let mut seen = Vec::new();
        let rebuilt = node
            .transform::<(), _>(&mut |n| {
                seen.push(n.to_string());
                Ok(match n {
                    ExpressionNode::Identifier(name) => ExpressionNode::identifier(name.to_uppercase()),
                    other => other,
                })
            })
            .unwrap();
        assert_eq!(seen, vec!["a", "b", "(A + B)"]);
        assert_eq!(rebuilt.to_string(), "(A + B)");
    }
}
