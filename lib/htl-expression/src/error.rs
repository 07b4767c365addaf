use snafu::Snafu;

/// Expression parsing error.
#[derive(Debug, Snafu, Clone, PartialEq)]
#[snafu(context(suffix(false)), visibility(pub(crate)))]
pub enum ExpressionError {
    /// The expression text is not well-formed.
    #[snafu(display("{}", message))]
    Syntax {
        /// Description of the problem.
        message: String,

        /// The fragment of source text that could not be parsed.
        offending_input: String,
    },

    /// A runtime call was constructed with a function name outside of the supported set.
    #[snafu(display("unknown runtime function '{}'", name))]
    InvalidRuntimeFunction {
        /// The rejected function name.
        name: String,
    },
}

impl ExpressionError {
    /// Returns the offending fragment of source text, if one is known.
    pub fn offending_input(&self) -> Option<&str> {
        match self {
            Self::Syntax { offending_input, .. } => Some(offending_input.as_str()),
            Self::InvalidRuntimeFunction { .. } => None,
        }
    }
}

/// Operator evaluation error.
#[derive(Debug, Snafu, Clone, PartialEq)]
#[snafu(context(suffix(false)), visibility(pub(crate)))]
pub enum OperatorError {
    /// The operands cannot be compared with each other.
    #[snafu(display("{}", reason))]
    InvalidComparison {
        /// Description of the mismatch.
        reason: String,
    },

    /// An operand cannot be used with the given operator.
    #[snafu(display("invalid operand for '{}': {}", operator, reason))]
    InvalidOperand {
        /// The operator that was being applied.
        operator: &'static str,

        /// Description of the problem.
        reason: String,
    },
}
