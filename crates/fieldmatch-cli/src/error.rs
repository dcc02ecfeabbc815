//! Error types and handling for the CLI
//!
//! This module provides error types and utilities for handling
//! various failure modes in the CLI application.

use fieldmatch_core::ErrorClassification;
use std::io;
use std::path::PathBuf;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for CLI operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error (file operations, etc.)
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Error from fieldmatch-core library
    #[error("{0}")]
    Core(#[from] fieldmatch_core::Error),

    /// File not found
    #[error("File not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// Input that is not a JSON document
    #[error("Invalid JSON in {}: {}", path.display(), message)]
    InvalidJson { path: PathBuf, message: String },

    /// Output that does not keep the structure of the original
    #[error("Structure mismatch: {0}")]
    StructureMismatch(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid argument combination
    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),

    /// Provider not found
    #[error("Provider '{}' not found", name)]
    ProviderNotFound { name: String },

    /// API key missing
    #[error(
        "API key required for provider '{}'. Set via --api-key, FIELDMATCH_API_KEY or {}",
        provider,
        env_var
    )]
    ApiKeyMissing { provider: String, env_var: String },

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Error with context attached through `anyhow::Context`
    #[error("{0:#}")]
    Context(#[from] anyhow::Error),
}

impl Error {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an invalid arguments error
    pub fn invalid_args(message: impl Into<String>) -> Self {
        Self::InvalidArgs(message.into())
    }

    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Io(_) => 1,
            Self::Core(_) => 2,
            Self::FileNotFound { .. } => 3,
            Self::InvalidJson { .. } => 4,
            Self::Config(_) => 5,
            Self::InvalidArgs(_) => 6,
            Self::ProviderNotFound { .. } => 7,
            Self::StructureMismatch(_) => 8,
            Self::ApiKeyMissing { .. } => 9,
            Self::Json(_) => 12,
            Self::Yaml(_) => 13,
            Self::Context(_) => 99,
        }
    }

    /// Check if this error should display usage help
    pub fn should_show_help(&self) -> bool {
        matches!(self, Self::InvalidArgs(_))
    }

    /// A short suggestion printed under the error, when one applies
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::ApiKeyMissing { .. } => {
                Some("run `fieldmatch config init` to create a config file with a providers section")
            }
            Self::ProviderNotFound { .. } => Some("run `fieldmatch models` to list the providers"),
            Self::Core(fieldmatch_core::Error::Provider { classification, .. }) => {
                match classification {
                    ErrorClassification::AuthenticationError => {
                        Some("check the API key for this provider")
                    }
                    ErrorClassification::RateLimitError => {
                        Some("the provider is rate limiting requests, try again later")
                    }
                    ErrorClassification::NetworkError => {
                        Some("check your network connection or --base-url")
                    }
                    _ => None,
                }
            }
            Self::Core(fieldmatch_core::Error::UnsupportedProvider { .. })
            | Self::Core(fieldmatch_core::Error::Configuration { .. }) => {
                Some("run `fieldmatch models` to list the supported models")
            }
            _ => None,
        }
    }
}

/// Format an error for display to the user
pub fn format_error(error: &Error, use_color: bool) -> String {
    let mut formatted = if use_color {
        use colored::Colorize;
        format!("{} {}", "Error:".red().bold(), error)
    } else {
        format!("Error: {}", error)
    };

    if let Some(hint) = error.hint() {
        if use_color {
            use colored::Colorize;
            formatted.push_str(&format!("\n  {} {}", "hint:".yellow(), hint));
        } else {
            formatted.push_str(&format!("\n  hint: {}", hint));
        }
    }

    formatted
}
