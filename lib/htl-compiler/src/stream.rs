//! Push-based command stream.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde::Serialize;
use snafu::Snafu;
use tracing::error;

use crate::commands::{Command, Scope};
use crate::error::CompilerError;

/// A non-fatal message raised while producing a stream.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StreamMessage {
    /// The message text.
    pub message: String,

    /// The fragment of template source the message refers to.
    pub code: String,
}

impl StreamMessage {
    /// Creates a new `StreamMessage`.
    pub fn new<M: Into<String>, C: Into<String>>(message: M, code: C) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
        }
    }
}

/// A consumer of the items pushed into a [`PushStream`].
pub trait StreamHandler {
    /// Handles a command.
    ///
    /// # Errors
    ///
    /// If the command cannot be handled, an error is returned, and it propagates back to the producer.
    fn on_command(&mut self, command: &Command) -> Result<(), CompilerError>;

    /// Handles a warning.
    fn on_warning(&mut self, _warning: &StreamMessage) {}

    /// Handles the end of the stream.
    ///
    /// # Errors
    ///
    /// If the stream ends in a state the handler cannot accept, an error is returned.
    fn on_close(&mut self) -> Result<(), CompilerError> {
        Ok(())
    }
}

/// A single-producer stream of commands and warnings.
///
/// Every registered handler observes every pushed item exactly once, in push order. Handlers must be registered before
/// the producer starts pushing.
///
/// Between [`begin_ignore`][Self::begin_ignore] and the matching [`end_ignore`][Self::end_ignore], written commands are
/// dropped. Warnings are never dropped.
#[derive(Default)]
pub struct PushStream {
    handlers: Vec<Box<dyn StreamHandler>>,
    warnings: Vec<StreamMessage>,
    ignore_depth: usize,
    closed: bool,
}

impl PushStream {
    /// Creates a new, empty `PushStream`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler.
    pub fn add_handler<H>(&mut self, handler: H)
    where
        H: StreamHandler + 'static,
    {
        self.handlers.push(Box::new(handler));
    }

    /// Pushes a command to every handler.
    ///
    /// # Errors
    ///
    /// If the stream is closed, or a handler fails, an error is returned.
    pub fn write(&mut self, command: Command) -> Result<(), CompilerError> {
        if self.closed {
            return Err(CompilerError::compile("Stream is already closed."));
        }
        if self.ignore_depth > 0 {
            return Ok(());
        }
        for handler in &mut self.handlers {
            handler.on_command(&command)?;
        }
        Ok(())
    }

    /// Records a warning and pushes it to every handler.
    pub fn warn(&mut self, warning: StreamMessage) {
        for handler in &mut self.handlers {
            handler.on_warning(&warning);
        }
        self.warnings.push(warning);
    }

    /// Starts dropping written commands.
    ///
    /// Calls nest: commands are dropped until every call has been matched by a call to
    /// [`end_ignore`][Self::end_ignore].
    pub fn begin_ignore(&mut self) {
        self.ignore_depth += 1;
    }

    /// Undoes one call to [`begin_ignore`][Self::begin_ignore].
    pub fn end_ignore(&mut self) {
        self.ignore_depth = self.ignore_depth.saturating_sub(1);
    }

    /// Returns `true` if written commands are currently dropped.
    pub fn is_ignoring(&self) -> bool {
        self.ignore_depth > 0
    }

    /// Returns the warnings recorded so far.
    pub fn warnings(&self) -> &[StreamMessage] {
        &self.warnings
    }

    /// Closes the stream, notifying every handler.
    ///
    /// Closing a closed stream does nothing.
    ///
    /// # Errors
    ///
    /// If a handler fails while processing the end of the stream, an error is returned.
    pub fn close(&mut self) -> Result<(), CompilerError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        for handler in &mut self.handlers {
            handler.on_close()?;
        }
        Ok(())
    }

    /// Returns `true` if the stream has been closed.
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl fmt::Debug for PushStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PushStream")
            .field("handlers", &self.handlers.len())
            .field("warnings", &self.warnings)
            .field("ignore_depth", &self.ignore_depth)
            .field("closed", &self.closed)
            .finish()
    }
}

/// A handler that records every command it sees.
///
/// Clones share the same storage, so a clone kept by the caller can read what the registered handler collected.
#[derive(Clone, Debug, Default)]
pub struct CommandCollector {
    commands: Rc<RefCell<Vec<Command>>>,
}

impl CommandCollector {
    /// Creates a new, empty `CommandCollector`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes the commands collected so far.
    pub fn take(&self) -> Vec<Command> {
        std::mem::take(&mut *self.commands.borrow_mut())
    }

    /// Returns the number of commands collected so far.
    pub fn len(&self) -> usize {
        self.commands.borrow().len()
    }

    /// Returns `true` if no commands have been collected.
    pub fn is_empty(&self) -> bool {
        self.commands.borrow().is_empty()
    }
}

impl StreamHandler for CommandCollector {
    fn on_command(&mut self, command: &Command) -> Result<(), CompilerError> {
        self.commands.borrow_mut().push(command.clone());
        Ok(())
    }
}

/// A scope nesting error.
#[derive(Debug, Snafu, Clone, PartialEq, Eq)]
#[snafu(context(suffix(false)))]
pub enum ScopeError {
    /// A command closed a scope other than the innermost open one.
    #[snafu(display(
        "Command {} closes a {:?} scope, but the innermost open scope is {:?}.",
        position,
        found,
        expected
    ))]
    Mismatched {
        /// Index of the offending command.
        position: usize,

        /// The innermost open scope, if any.
        expected: Option<Scope>,

        /// The scope the command closes.
        found: Scope,
    },

    /// The stream ended with open scopes.
    #[snafu(display("Stream ended with {} open scope(s).", open))]
    Unclosed {
        /// Number of scopes left open.
        open: usize,
    },
}

impl From<ScopeError> for CompilerError {
    fn from(e: ScopeError) -> Self {
        CompilerError::compile(format!("Invalid command stream: {}", e))
    }
}

#[derive(Debug, Default)]
struct ScopeStack {
    open: Vec<Scope>,
    position: usize,
}

impl ScopeStack {
    fn push(&mut self, command: &Command) -> Result<(), ScopeError> {
        let position = self.position;
        self.position += 1;
        if let Some(scope) = command.opens() {
            self.open.push(scope);
        } else if let Some(found) = command.closes() {
            let expected = self.open.pop();
            if expected != Some(found) {
                return Err(ScopeError::Mismatched {
                    position,
                    expected,
                    found,
                });
            }
        }
        Ok(())
    }

    fn finish(&self) -> Result<(), ScopeError> {
        if self.open.is_empty() {
            Ok(())
        } else {
            Err(ScopeError::Unclosed { open: self.open.len() })
        }
    }
}

/// Checks that every scope opened in `commands` is closed, in order.
///
/// # Errors
///
/// If a command closes a scope that is not the innermost open one, or scopes are left open, an error is returned.
pub fn verify_scopes(commands: &[Command]) -> Result<(), ScopeError> {
    let mut stack = ScopeStack::default();
    for command in commands {
        stack.push(command)?;
    }
    stack.finish()
}

/// A handler that checks scope nesting as commands flow through a stream.
#[derive(Debug, Default)]
pub struct SanityChecker {
    stack: ScopeStack,
}

impl SanityChecker {
    /// Creates a new `SanityChecker`.
    pub fn new() -> Self {
        Self::default()
    }
}

impl StreamHandler for SanityChecker {
    fn on_command(&mut self, command: &Command) -> Result<(), CompilerError> {
        self.stack.push(command).map_err(|e| {
            error!(error = %e, "Command stream failed sanity check.");
            e.into()
        })
    }

    fn on_close(&mut self) -> Result<(), CompilerError> {
        self.stack.finish().map_err(|e| {
            error!(error = %e, "Command stream failed sanity check.");
            e.into()
        })
    }
}
