use indexmap::IndexSet;
use tracing::{debug, warn};

use crate::config::CompilerConfiguration;
use crate::context::ExpressionContext;
use crate::diagnostics;
use crate::error::CompilerError;
use crate::filter::{FilterChain, CONTEXT_OPTION};
use crate::frontend::{ExpressionWrapper, Frontend};
use crate::optimizer;
use crate::plugin::PluginRegistry;
use crate::result::{CompilationResult, CompilerMessage};
use crate::stream::{CommandCollector, PushStream, SanityChecker};
use crate::unit::CompilationUnit;

/// A consumer of the optimized command stream.
///
/// Backends are handed the stream before the front end starts writing to it, and typically register handlers on it.
pub trait BackendCompiler {
    /// Prepares to consume `stream`.
    fn handle(&mut self, stream: &mut PushStream);
}

struct NoBackend;

impl BackendCompiler for NoBackend {
    fn handle(&mut self, _stream: &mut PushStream) {}
}

/// The template compiler.
///
/// A compiler is immutable once built, and can be shared between threads. Every call to [`compile`][Self::compile]
/// works on its own state.
pub struct Compiler {
    filters: FilterChain,
    plugins: PluginRegistry,
    known_options: IndexSet<String>,
    read_buffer_size: usize,
    check_scopes: bool,
}

impl Compiler {
    /// Creates a new `Compiler` with the built-in filters and plugins and the default configuration.
    pub fn new() -> Self {
        Self::from_configuration(&CompilerConfiguration::default())
    }

    /// Creates a new `Compiler` that accepts the given expression options in addition to the ones it knows about.
    pub fn with_known_options<I, S>(options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let config = CompilerConfiguration {
            known_expression_options: options.into_iter().map(Into::into).collect(),
            ..Default::default()
        };
        Self::from_configuration(&config)
    }

    /// Creates a new `Compiler` from the given configuration.
    pub fn from_configuration(config: &CompilerConfiguration) -> Self {
        let filters = FilterChain::builtin();
        let plugins = PluginRegistry::builtin();

        let mut known_options: IndexSet<String> = filters.options().map(str::to_string).collect();
        known_options.insert(CONTEXT_OPTION.to_string());
        for context in ExpressionContext::ALL {
            known_options.extend(context.options().iter().map(|option| option.to_string()));
        }
        known_options.extend(config.known_expression_options.iter().cloned());

        debug!(
            filters = ?filters.names(),
            plugins = ?plugins.names(),
            known_options = known_options.len(),
            "Built compiler."
        );

        Self {
            filters,
            plugins,
            known_options,
            read_buffer_size: config.read_buffer_size.max(1),
            check_scopes: config.check_scopes,
        }
    }

    /// Returns the expression options the compiler accepts without warning.
    pub fn known_options(&self) -> &IndexSet<String> {
        &self.known_options
    }

    /// Compiles a template.
    ///
    /// # Errors
    ///
    /// If the template source cannot be read, an error is returned. Compile errors are reported in the result.
    pub fn compile(&self, unit: CompilationUnit<'_>) -> Result<CompilationResult, CompilerError> {
        self.compile_with_backend(unit, &mut NoBackend)
    }

    /// Compiles a template, handing the optimized command stream to `backend` before compilation starts.
    ///
    /// # Errors
    ///
    /// If the template source cannot be read, an error is returned. Compile errors are reported in the result.
    pub fn compile_with_backend<B>(
        &self, mut unit: CompilationUnit<'_>, backend: &mut B,
    ) -> Result<CompilationResult, CompilerError>
    where
        B: BackendCompiler + ?Sized,
    {
        let source = unit.read_source()?;
        let script_name = unit.script_name().to_string();
        debug!(%script_name, bytes = source.len(), "Compiling template.");

        let collector = CommandCollector::new();
        let mut output = PushStream::new();
        output.add_handler(collector.clone());
        backend.handle(&mut output);

        let mut head = PushStream::new();
        if self.check_scopes {
            head.add_handler(SanityChecker::new());
        }
        optimizer::attach(&mut head, output);

        let frontend = Frontend::new(
            &self.plugins,
            ExpressionWrapper::new(&self.filters, &self.known_options),
            self.read_buffer_size,
        );
        let outcome = frontend.compile(&mut head, &source).and_then(|()| head.close());

        match outcome {
            Ok(()) => {
                let warnings = head
                    .warnings()
                    .iter()
                    .map(|warning| {
                        let location = diagnostics::locate(&source, &warning.code, 1, 0, &warning.message);
                        warn!(%script_name, line = location.line, column = location.column, "{}", location.message);
                        CompilerMessage {
                            script_name: script_name.clone(),
                            message: location.message,
                            line: location.line,
                            column: location.column,
                        }
                    })
                    .collect::<Vec<_>>();
                let commands = collector.take();
                debug!(
                    %script_name,
                    commands = commands.len(),
                    warnings = warnings.len(),
                    "Compiled template."
                );
                Ok(CompilationResult::success(commands, warnings))
            }
            Err(CompilerError::Compile {
                message,
                offending_input,
                line,
                column,
            }) => {
                let location =
                    diagnostics::locate(&source, offending_input.as_deref().unwrap_or(""), line, column, &message);
                debug!(
                    %script_name,
                    line = location.line,
                    column = location.column,
                    error = %location.message,
                    "Template failed to compile."
                );
                Ok(CompilationResult::failure(CompilerMessage {
                    script_name,
                    message: location.message,
                    line: location.line,
                    column: location.column,
                }))
            }
            Err(e) => Err(e),
        }
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}
