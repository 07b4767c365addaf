//! Compiler front end for HTL templates.
//!
//! A template is parsed into a markup tree, its `data-sly-*` directives are expanded by plugins, and its expressions
//! are run through a chain of filters. The result is a flat stream of [`Command`]s, which the optimizer then rewrites
//! before handing it to a backend.

mod commands;
pub use self::commands::{Command, Scope};

mod compiler;
pub use self::compiler::{BackendCompiler, Compiler};

pub mod config;

mod context;
pub use self::context::{ExpressionContext, MarkupContext};

pub mod diagnostics;

mod error;
pub use self::error::CompilerError;

pub mod filter;

mod frontend;
pub use self::frontend::ExpressionWrapper;

pub mod html;

pub mod optimizer;

pub mod plugin;

mod result;
pub use self::result::{CompilationResult, CompilerMessage};

mod stream;
pub use self::stream::{
    verify_scopes, CommandCollector, PushStream, SanityChecker, ScopeError, StreamHandler, StreamMessage,
};

mod symbols;
pub use self::symbols::{is_generated, SymbolGenerator};

mod unit;
pub use self::unit::CompilationUnit;
