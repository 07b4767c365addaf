use std::io::Read;

use snafu::ResultExt as _;

use crate::error::{CompilerError, Io};

/// A template to compile: a script name, used in diagnostics, and a readable source.
///
/// The source is drained once, when the unit is compiled.
pub struct CompilationUnit<'a> {
    script_name: String,
    source: Box<dyn Read + 'a>,
}

impl<'a> CompilationUnit<'a> {
    /// Creates a new `CompilationUnit` from a reader.
    pub fn new<S, R>(script_name: S, source: R) -> Self
    where
        S: Into<String>,
        R: Read + 'a,
    {
        Self {
            script_name: script_name.into(),
            source: Box::new(source),
        }
    }

    /// Creates a new `CompilationUnit` over a template held in memory.
    pub fn from_str<S: Into<String>>(script_name: S, source: &'a str) -> Self {
        Self::new(script_name, source.as_bytes())
    }

    /// Returns the script name.
    pub fn script_name(&self) -> &str {
        &self.script_name
    }

    /// Drains the source.
    ///
    /// # Errors
    ///
    /// If the source cannot be read, or is not valid UTF-8, an error is returned.
    pub(crate) fn read_source(&mut self) -> Result<String, CompilerError> {
        let mut source = String::new();
        self.source.read_to_string(&mut source).context(Io {
            script_name: self.script_name.clone(),
        })?;
        Ok(source)
    }
}
