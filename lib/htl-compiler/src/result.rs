use serde::Serialize;

use crate::commands::Command;

/// A diagnostic attached to a compilation result.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CompilerMessage {
    /// Name of the compiled script.
    pub script_name: String,

    /// The message, prefixed with the offending fragment when it could be located.
    pub message: String,

    /// Line of the diagnostic, starting at 1.
    pub line: usize,

    /// Column of the diagnostic.
    pub column: usize,
}

/// The outcome of compiling a template.
///
/// When compilation fails, the result holds the error and nothing else.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CompilationResult {
    commands: Vec<Command>,
    warnings: Vec<CompilerMessage>,
    errors: Vec<CompilerMessage>,
}

impl CompilationResult {
    pub(crate) fn success(commands: Vec<Command>, warnings: Vec<CompilerMessage>) -> Self {
        Self {
            commands,
            warnings,
            errors: Vec::new(),
        }
    }

    pub(crate) fn failure(error: CompilerMessage) -> Self {
        Self {
            commands: Vec::new(),
            warnings: Vec::new(),
            errors: vec![error],
        }
    }

    /// Returns the optimized command stream.
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Returns the warnings, in the order they were raised.
    pub fn warnings(&self) -> &[CompilerMessage] {
        &self.warnings
    }

    /// Returns the errors.
    pub fn errors(&self) -> &[CompilerMessage] {
        &self.errors
    }

    /// Returns `true` if compilation failed.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Consumes the result, returning the command stream.
    pub fn into_commands(self) -> Vec<Command> {
        self.commands
    }
}
