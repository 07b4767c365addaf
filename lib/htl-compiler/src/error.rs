use htl_expression::{ExpressionError, OperatorError};
use snafu::Snafu;

/// A compiler error.
#[derive(Debug, Snafu)]
#[snafu(context(suffix(false)), visibility(pub(crate)))]
pub enum CompilerError {
    /// The template could not be compiled.
    ///
    /// `line` and `column` are offsets used when locating `offending_input` in the template source. When the
    /// offending input cannot be found, they are reported as-is.
    #[snafu(display("{}", message))]
    Compile {
        /// Description of the problem.
        message: String,

        /// The fragment of template source that caused the error, if known.
        offending_input: Option<String>,

        /// Line offset.
        line: usize,

        /// Column offset.
        column: usize,
    },

    /// The template source could not be read.
    #[snafu(display("Unable to read source code from compilation unit identifying script {}.", script_name))]
    Io {
        /// Name of the script being compiled.
        script_name: String,

        /// Error source.
        source: std::io::Error,
    },
}

impl CompilerError {
    /// Creates a compile error with no offending input.
    pub fn compile<S: Into<String>>(message: S) -> Self {
        Self::Compile {
            message: message.into(),
            offending_input: None,
            line: 1,
            column: 0,
        }
    }

    /// Sets the offending input of a compile error.
    pub fn with_offending_input<S: Into<String>>(self, input: S) -> Self {
        match self {
            Self::Compile {
                message, line, column, ..
            } => Self::Compile {
                message,
                offending_input: Some(input.into()),
                line,
                column,
            },
            other => other,
        }
    }

    /// Sets the offending input of a compile error that has none yet.
    pub fn or_offending_input<S: Into<String>>(self, input: S) -> Self {
        let input = input.into();
        if input.is_empty() || self.offending_input().is_some() {
            self
        } else {
            self.with_offending_input(input)
        }
    }

    /// Returns the offending input, if this is a compile error with a non-empty offending input.
    pub fn offending_input(&self) -> Option<&str> {
        match self {
            Self::Compile {
                offending_input: Some(input),
                ..
            } if !input.is_empty() => Some(input.as_str()),
            _ => None,
        }
    }
}

impl From<ExpressionError> for CompilerError {
    fn from(e: ExpressionError) -> Self {
        let error = Self::compile(e.to_string());
        match e.offending_input() {
            Some(input) => error.with_offending_input(input),
            None => error,
        }
    }
}

impl From<OperatorError> for CompilerError {
    fn from(e: OperatorError) -> Self {
        Self::compile(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use htl_expression::parse_interpolation;

    use super::*;

    #[test]
    fn expression_errors_keep_offending_input() {
        let err: CompilerError = parse_interpolation("${a +}").unwrap_err().into();
        assert_eq!(err.offending_input(), Some("${a +}"));
    }

    #[test]
    fn offending_input_is_only_filled_in() {
        let err = CompilerError::compile("boom").or_offending_input("${a}");
        assert_eq!(err.offending_input(), Some("${a}"));
        let err = err.or_offending_input("<p>${a}</p>");
        assert_eq!(err.offending_input(), Some("${a}"));
        assert_eq!(CompilerError::compile("boom").or_offending_input("").offending_input(), None);
    }

    #[test]
    fn empty_offending_input_is_none() {
        let err = CompilerError::compile("boom").with_offending_input("");
        assert_eq!(err.offending_input(), None);
        assert_eq!(err.to_string(), "boom");
    }
}
