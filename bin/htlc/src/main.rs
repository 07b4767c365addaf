//! Compiles an HTL template and prints the resulting command stream.

#![deny(warnings)]
#![deny(missing_docs)]

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::{Context as _, Error};
use clap::{Parser, ValueEnum};
use htl_compiler::config::ConfigurationLoader;
use htl_compiler::{CompilationResult, CompilationUnit, Compiler, CompilerMessage};
use tracing::{debug, error, info};
use tracing_subscriber::{filter::LevelFilter, EnvFilter};

/// Prefix of the environment variables the compiler configuration is read from.
const ENV_PREFIX: &str = "HTL";

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    /// One command per line, in Rust debug notation.
    Debug,

    /// The whole compilation result, as JSON.
    Json,
}

#[derive(Parser)]
#[command(about)]
struct Cli {
    /// Path to the template to compile.
    template: PathBuf,

    /// Path to a YAML compiler configuration file.
    ///
    /// Environment variables prefixed with `HTL_` take precedence over the file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Expression option to accept without warning, on top of the configured ones.
    #[arg(long = "known-option")]
    known_options: Vec<String>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Debug)]
    format: OutputFormat,
}

fn main() {
    tracing_subscriber::fmt()
        .compact()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(true)
        .init();

    match run(Cli::parse()) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            error!("{:?}", e);
            std::process::exit(2);
        }
    }
}

/// Compiles the template, returning `false` if it has errors.
fn run(cli: Cli) -> Result<bool, Error> {
    let mut loader = ConfigurationLoader::default();
    if let Some(path) = &cli.config {
        loader = loader.from_yaml(path)?;
    }
    let mut config = loader.from_environment(ENV_PREFIX)?.into_configuration()?;
    config.known_expression_options.extend(cli.known_options);
    debug!(?config, "Loaded compiler configuration.");

    let compiler = Compiler::from_configuration(&config);

    let file = File::open(&cli.template)
        .with_context(|| format!("failed to open template '{}'", cli.template.display()))?;
    let unit = CompilationUnit::new(cli.template.display().to_string(), BufReader::new(file));
    let result = compiler.compile(unit)?;

    print_result(&result, cli.format)?;
    for warning in result.warnings() {
        eprintln!("warning: {}", describe(warning));
    }
    for error in result.errors() {
        eprintln!("error: {}", describe(error));
    }

    info!(
        commands = result.commands().len(),
        warnings = result.warnings().len(),
        errors = result.errors().len(),
        "Compilation finished."
    );
    Ok(!result.has_errors())
}

fn print_result(result: &CompilationResult, format: OutputFormat) -> Result<(), Error> {
    match format {
        OutputFormat::Debug => {
            for command in result.commands() {
                println!("{:?}", command);
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(result)?),
    }
    Ok(())
}

fn describe(message: &CompilerMessage) -> String {
    format!(
        "{}:{}:{}: {}",
        message.script_name, message.line, message.column, message.message
    )
}
