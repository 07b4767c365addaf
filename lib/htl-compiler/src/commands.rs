//! Commands of the intermediate representation.

use htl_expression::ExpressionNode;
use serde::Serialize;

/// A command of the intermediate representation produced by the compiler.
///
/// Every `*Start` command is closed by the matching `*End` command, and scopes nest properly over the whole stream.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum Command {
    /// Writes literal text.
    OutText(String),

    /// Writes the value of a variable.
    OutputVariable(String),

    /// Binds a variable for the scope that follows, up to the matching [`Command::VariableBindingEnd`].
    VariableBindingStart { variable: String, expression: ExpressionNode },

    /// Binds a variable for the rest of the template.
    VariableBindingGlobal { variable: String, expression: ExpressionNode },

    VariableBindingEnd,

    /// Runs the scope that follows if the truthiness of `variable` equals `expected_truth_value`.
    ConditionalStart {
        variable: String,
        expected_truth_value: bool,
    },

    ConditionalEnd,

    /// Runs the scope that follows once per item of the collection in `list_variable`.
    LoopStart {
        list_variable: String,
        item_variable: String,
        index_variable: String,
    },

    LoopEnd,

    /// Defines a named procedure, with the given parameters, out of the scope that follows.
    ProcedureStart { name: String, parameters: Vec<String> },

    ProcedureEnd,

    /// Calls the procedure held in `template_variable` with the arguments map held in `arguments_variable`.
    ProcedureCall {
        template_variable: String,
        arguments_variable: String,
    },
}

/// The kinds of scope a command can open or close.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scope {
    VariableBinding,
    Conditional,
    Loop,
    Procedure,
}

impl Command {
    /// Creates an [`Command::OutText`].
    pub fn out_text<S: Into<String>>(text: S) -> Self {
        Self::OutText(text.into())
    }

    /// Creates an [`Command::OutputVariable`].
    pub fn output<S: Into<String>>(variable: S) -> Self {
        Self::OutputVariable(variable.into())
    }

    /// Creates a [`Command::VariableBindingStart`].
    pub fn bind<S: Into<String>>(variable: S, expression: ExpressionNode) -> Self {
        Self::VariableBindingStart {
            variable: variable.into(),
            expression,
        }
    }

    /// Creates a [`Command::VariableBindingGlobal`].
    pub fn global<S: Into<String>>(variable: S, expression: ExpressionNode) -> Self {
        Self::VariableBindingGlobal {
            variable: variable.into(),
            expression,
        }
    }

    /// Creates a [`Command::ConditionalStart`].
    pub fn when<S: Into<String>>(variable: S, expected_truth_value: bool) -> Self {
        Self::ConditionalStart {
            variable: variable.into(),
            expected_truth_value,
        }
    }

    /// Creates a [`Command::LoopStart`].
    pub fn loop_over<L, I, X>(list_variable: L, item_variable: I, index_variable: X) -> Self
    where
        L: Into<String>,
        I: Into<String>,
        X: Into<String>,
    {
        Self::LoopStart {
            list_variable: list_variable.into(),
            item_variable: item_variable.into(),
            index_variable: index_variable.into(),
        }
    }

    /// Returns the scope this command opens, if any.
    pub fn opens(&self) -> Option<Scope> {
        match self {
            Self::VariableBindingStart { .. } => Some(Scope::VariableBinding),
            Self::ConditionalStart { .. } => Some(Scope::Conditional),
            Self::LoopStart { .. } => Some(Scope::Loop),
            Self::ProcedureStart { .. } => Some(Scope::Procedure),
            _ => None,
        }
    }

    /// Returns the scope this command closes, if any.
    pub fn closes(&self) -> Option<Scope> {
        match self {
            Self::VariableBindingEnd => Some(Scope::VariableBinding),
            Self::ConditionalEnd => Some(Scope::Conditional),
            Self::LoopEnd => Some(Scope::Loop),
            Self::ProcedureEnd => Some(Scope::Procedure),
            _ => None,
        }
    }

    /// Returns the expression evaluated by this command, if any.
    pub fn expression(&self) -> Option<&ExpressionNode> {
        match self {
            Self::VariableBindingStart { expression, .. } | Self::VariableBindingGlobal { expression, .. } => {
                Some(expression)
            }
            _ => None,
        }
    }

    /// Returns the variable names this command reads directly, outside of any expression.
    pub fn variables_read(&self) -> Vec<&str> {
        match self {
            Self::OutputVariable(variable) | Self::ConditionalStart { variable, .. } => vec![variable.as_str()],
            Self::LoopStart { list_variable, .. } => vec![list_variable.as_str()],
            Self::ProcedureCall {
                template_variable,
                arguments_variable,
            } => vec![template_variable.as_str(), arguments_variable.as_str()],
            _ => Vec::new(),
        }
    }
}
