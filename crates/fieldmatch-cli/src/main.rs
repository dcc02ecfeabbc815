//! Fieldmatch CLI - find the values of a JSON structure in free text
//!
//! This is the main entry point for the fieldmatch CLI application,
//! providing commands for validating JSON, analyzing text against a JSON
//! structure, applying the matches and enhancing the result.

mod cli;
mod config;
mod error;
mod handlers;
mod logging;
mod output;

use cli::{Cli, Commands};
use colored::control;
use config::{Config, ProviderOverrides};
use error::Result;
use logging::{timing::Timer, LogSettings};
use output::OutputWriter;
use std::process;
use tracing::instrument;
use tracing_appender::non_blocking::WorkerGuard;

#[tokio::main]
async fn main() {
    // Parse command-line arguments
    let cli = Cli::parse_args();

    // Set up colored output
    control::set_override(cli.use_color());

    let code = match run(cli).await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!(
                "{}",
                error::format_error(&e, control::SHOULD_COLORIZE.should_colorize())
            );

            if e.should_show_help() {
                eprintln!("\nFor more information, try '--help'");
            }

            e.exit_code()
        }
    };

    process::exit(code);
}

/// Load configuration, start logging, then run the command
///
/// The log guard lives until this returns so file output is flushed.
async fn run(cli: Cli) -> Result<()> {
    let config = Config::load_with_file(cli.config.as_deref())?;
    if !config.output.color {
        control::set_override(false);
    }

    let _guard = match init_logging(&cli, &config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            None
        }
    };

    execute(cli, config).await
}

/// Dispatch the subcommand
#[instrument(skip_all, fields(command = ?cli.command))]
async fn execute(cli: Cli, config: Config) -> Result<()> {
    let _timer = Timer::new("cli_execution");

    let overrides = ProviderOverrides {
        provider: cli.provider.clone(),
        model: cli.model.clone(),
        api_key: cli.api_key.clone(),
        base_url: cli.base_url.clone(),
    };

    // Create output writer
    let use_color = cli.use_color() && config.output.color;
    let mut output = OutputWriter::new(cli.output, use_color, cli.quiet);
    if !config.output.progress {
        output.disable_progress();
    }

    tracing::info!(verbosity = cli.verbosity_level(), "Executing command");

    // Handle the subcommand
    match cli.command {
        Commands::Validate(args) => handlers::handle_validate(args, &mut output).await,
        Commands::Analyze(args) => {
            handlers::handle_analyze(args, &config, &overrides, &mut output).await
        }
        Commands::Apply(args) => {
            handlers::handle_apply(args, &config, &overrides, &mut output).await
        }
        Commands::Enhance(args) => {
            handlers::handle_enhance(args, &config, &overrides, &mut output).await
        }
        Commands::Models => handlers::handle_models(&config, &overrides, &mut output).await,
        Commands::Config(args) => handlers::handle_config(args, &config, &mut output).await,
        Commands::Completions(args) => handlers::handle_completions(args),
    }
}

/// Initialize the logging system
fn init_logging(cli: &Cli, config: &Config) -> Result<Option<WorkerGuard>> {
    let verbosity = cli.verbosity_level();
    let mut settings = LogSettings::from_verbosity(verbosity);
    settings.merge_with_file(&config.logging, verbosity);

    // Apply environment overrides
    settings.merge_with_env();

    // If quiet mode, only log errors
    if cli.quiet {
        settings.level = "error".to_string();
        settings.console = false;
    }

    logging::init_logging(settings)
}
