//! Command-line interface argument parsing and definitions
//!
//! This module defines the CLI structure using clap's derive API,
//! providing a type-safe and well-documented command interface.

use clap::{Parser, Subcommand, ValueEnum};
use fieldmatch_core::ReconcileStrategy;
use is_terminal::IsTerminal;
use std::path::PathBuf;

/// Fieldmatch CLI - find the values of a JSON structure in free text
///
/// Validates JSON documents, asks an LLM provider where each property of a
/// JSON structure is mentioned in a text, applies confident matches to the
/// document and optionally enriches the result.
#[derive(Parser, Debug)]
#[command(
    name = "fieldmatch",
    version,
    author,
    about,
    long_about = None,
    propagate_version = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Enable verbose output (can be used multiple times for increased verbosity)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "FIELDMATCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format for results
    #[arg(short, long, value_enum, global = true, default_value = "human")]
    pub output: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Provider to use (openai, anthropic)
    #[arg(short, long, global = true, env = "FIELDMATCH_PROVIDER")]
    pub provider: Option<String>,

    /// Model to use
    #[arg(short, long, global = true, env = "FIELDMATCH_MODEL")]
    pub model: Option<String>,

    /// API key for the provider
    #[arg(long, global = true, env = "FIELDMATCH_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Base URL override for the provider API
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// The subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate and pretty-print a JSON document
    Validate(ValidateArgs),

    /// Find where the properties of a JSON structure appear in a text
    Analyze(AnalyzeArgs),

    /// Analyze a text and write the confident matches into the JSON
    Apply(ApplyArgs),

    /// Fill empty fields of a JSON document with contextual details
    Enhance(EnhanceArgs),

    /// List the models known for each provider
    Models,

    /// Manage configuration files and settings
    Config(ConfigArgs),

    /// Generate shell completions for the specified shell
    Completions(CompletionsArgs),
}

/// Arguments for the validate command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// JSON file to validate ("-" reads stdin)
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Also require FILE to keep the structure of this document
    #[arg(long, value_name = "ORIGINAL")]
    pub against: Option<PathBuf>,

    /// Print the compact form instead of the pretty form
    #[arg(long)]
    pub compact: bool,
}

/// Arguments for the analyze command
#[derive(Parser, Debug)]
pub struct AnalyzeArgs {
    /// JSON structure whose properties are searched for
    #[arg(short, long, value_name = "JSON_FILE")]
    pub schema: PathBuf,

    /// Text to analyze ("-" reads stdin)
    #[arg(short, long, value_name = "TEXT_FILE")]
    pub text: PathBuf,

    /// Show matches below the confidence threshold too
    #[arg(long)]
    pub all: bool,
}

/// Arguments for the apply command
#[derive(Parser, Debug)]
pub struct ApplyArgs {
    /// JSON document to fill
    #[arg(short, long, value_name = "JSON_FILE")]
    pub schema: PathBuf,

    /// Text to analyze ("-" reads stdin)
    #[arg(short, long, value_name = "TEXT_FILE")]
    pub text: PathBuf,

    /// How matches are written into the document
    #[arg(long, value_enum, default_value = "deterministic")]
    pub strategy: Strategy,

    /// Run the enhancement pass on the result
    #[arg(long)]
    pub enhance: bool,

    /// Save the resulting JSON to a file
    #[arg(long = "save-to", value_name = "OUTPUT_FILE")]
    pub save_to: Option<PathBuf>,
}

/// Arguments for the enhance command
#[derive(Parser, Debug)]
pub struct EnhanceArgs {
    /// JSON document to enhance
    #[arg(short, long, value_name = "JSON_FILE")]
    pub json: PathBuf,

    /// Matches used as context, as written by `analyze -o json`
    #[arg(long, value_name = "MATCHES_FILE")]
    pub matches: Option<PathBuf>,

    /// Save the resulting JSON to a file
    #[arg(long = "save-to", value_name = "OUTPUT_FILE")]
    pub save_to: Option<PathBuf>,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration management actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write a configuration file with default values
    Init(ConfigInitArgs),

    /// Show the effective configuration (API keys redacted)
    Show(ConfigShowArgs),

    /// List the locations searched for a configuration file
    Path,
}

/// Arguments for config init
#[derive(Parser, Debug)]
pub struct ConfigInitArgs {
    /// Write to the user config directory instead of ./.fieldmatch.yaml
    #[arg(long)]
    pub user: bool,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

/// Arguments for config show
#[derive(Parser, Debug)]
pub struct ConfigShowArgs {
    /// Show configuration in specified format
    #[arg(short, long, value_enum, default_value = "yaml")]
    pub format: ConfigFormat,
}

/// Configuration file formats
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ConfigFormat {
    /// JSON format
    Json,
    /// YAML format
    Yaml,
}

/// Arguments for generating shell completions
#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Output format options
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable formatted output
    Human,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
    /// Pretty-printed JSON output
    JsonPretty,
}

/// How matches are applied to the document
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Strategy {
    /// Write matched values locally, no extra provider call
    Deterministic,
    /// Let the provider rewrite the document, then verify its structure
    Delegated,
}

/// Supported shells for completion generation
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    /// Bash shell
    Bash,
    /// Zsh shell
    Zsh,
    /// Fish shell
    Fish,
    /// PowerShell
    PowerShell,
    /// Elvish shell
    Elvish,
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the effective verbosity level (considering quiet flag)
    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }

    /// Check if colored output should be used
    pub fn use_color(&self) -> bool {
        !self.no_color && std::io::stdout().is_terminal()
    }
}

impl From<Strategy> for ReconcileStrategy {
    fn from(strategy: Strategy) -> Self {
        match strategy {
            Strategy::Deterministic => ReconcileStrategy::Deterministic,
            Strategy::Delegated => ReconcileStrategy::Delegated,
        }
    }
}

impl Shell {
    /// Convert to clap_complete shell type
    pub fn to_clap_shell(self) -> clap_complete::Shell {
        match self {
            Shell::Bash => clap_complete::Shell::Bash,
            Shell::Zsh => clap_complete::Shell::Zsh,
            Shell::Fish => clap_complete::Shell::Fish,
            Shell::PowerShell => clap_complete::Shell::PowerShell,
            Shell::Elvish => clap_complete::Shell::Elvish,
        }
    }
}
