//! Configuration management for the CLI
//!
//! This module handles loading and merging configuration from:
//! - Default values
//! - Configuration files (YAML/JSON)
//! - Environment variables
//! - Command-line arguments

use crate::error::{Error, Result};
use fieldmatch_core::{ProviderKind, Secret};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Provider used when neither flags nor config name one
pub const DEFAULT_PROVIDER: ProviderKind = ProviderKind::OpenAi;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default provider to use if not specified
    pub default_provider: Option<String>,

    /// Default model to use if not specified
    pub default_model: Option<String>,

    /// Provider configurations, keyed by provider name
    pub providers: BTreeMap<String, ProviderConfig>,

    /// Output settings
    pub output: OutputConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

/// Provider-specific configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// API key for this provider
    pub api_key: Option<String>,

    /// Base URL override
    pub base_url: Option<String>,

    /// Default model for this provider
    pub default_model: Option<String>,

    /// Timeout in seconds
    pub timeout: Option<u64>,
}

/// Output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Use colored output by default
    pub color: bool,

    /// Show progress indicators
    pub progress: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error), used when no -v flag is given
    pub level: Option<String>,

    /// Log format (compact, full, json)
    pub format: Option<String>,

    /// Log file path
    pub file: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            color: true,
            progress: true,
        }
    }
}

/// Provider settings given on the command line
#[derive(Debug, Clone, Default)]
pub struct ProviderOverrides {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;

        let config = if is_yaml(path) {
            serde_yaml::from_str(&content)?
        } else {
            serde_json::from_str(&content)?
        };

        Ok(config)
    }

    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        for path in Self::default_config_paths() {
            if path.exists() {
                match Self::from_file(&path) {
                    Ok(config) => {
                        tracing::debug!(path = %path.display(), "Loaded configuration");
                        return Ok(config);
                    }
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "Failed to load config");
                    }
                }
            }
        }

        // Return default config if no config file found
        Ok(Self::default())
    }

    /// Load configuration from a specific file or default locations
    pub fn load_with_file(file: Option<&Path>) -> Result<Self> {
        match file {
            Some(path) => Self::from_file(path),
            None => Self::load(),
        }
    }

    /// Get default configuration file paths to check, in order
    pub fn default_config_paths() -> Vec<PathBuf> {
        let mut paths = vec![
            // Current directory
            PathBuf::from(".fieldmatch.yaml"),
            PathBuf::from(".fieldmatch.yml"),
            PathBuf::from(".fieldmatch.json"),
        ];

        // User config directory
        if let Some(config_dir) = dirs::config_dir() {
            let fieldmatch_dir = config_dir.join("fieldmatch");
            paths.push(fieldmatch_dir.join("config.yaml"));
            paths.push(fieldmatch_dir.join("config.json"));
        }

        // Home directory
        if let Some(home_dir) = dirs::home_dir() {
            paths.push(home_dir.join(".fieldmatch.yaml"));
            paths.push(home_dir.join(".fieldmatch.json"));
        }

        paths
    }

    /// Path `config init --user` writes to
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("fieldmatch").join("config.yaml"))
    }

    /// Get provider configuration
    pub fn get_provider(&self, name: &str) -> Option<&ProviderConfig> {
        self.providers.get(name)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = if is_yaml(path) {
            serde_yaml::to_string(self)?
        } else {
            serde_json::to_string_pretty(self)?
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }

    /// A starting configuration with both providers listed
    pub fn template() -> Self {
        let providers = ProviderKind::all()
            .iter()
            .map(|kind| {
                (
                    kind.as_str().to_string(),
                    ProviderConfig {
                        default_model: Some(kind.default_model().to_string()),
                        ..ProviderConfig::default()
                    },
                )
            })
            .collect();

        Self {
            default_provider: Some(DEFAULT_PROVIDER.as_str().to_string()),
            providers,
            ..Self::default()
        }
    }

    /// Provider the CLI will talk to
    pub fn provider_kind(&self, overrides: &ProviderOverrides) -> Result<ProviderKind> {
        match overrides
            .provider
            .as_deref()
            .or(self.default_provider.as_deref())
        {
            Some(name) => name.parse::<ProviderKind>().map_err(|_| Error::ProviderNotFound {
                name: name.to_string(),
            }),
            None => Ok(DEFAULT_PROVIDER),
        }
    }

    /// Build the provider configuration from flags, environment and file
    pub fn resolve_provider(
        &self,
        overrides: &ProviderOverrides,
    ) -> Result<fieldmatch_core::ProviderConfig> {
        self.resolve_provider_with(overrides, |name| std::env::var(name).ok())
    }

    /// [`resolve_provider`](Self::resolve_provider) with an injectable environment
    ///
    /// Precedence, highest first: command-line flags (which already include
    /// `FIELDMATCH_API_KEY`), the provider's own key variable, the file.
    pub fn resolve_provider_with<F>(
        &self,
        overrides: &ProviderOverrides,
        env: F,
    ) -> Result<fieldmatch_core::ProviderConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let kind = self.provider_kind(overrides)?;
        let section = self.get_provider(kind.as_str());

        let model = overrides
            .model
            .clone()
            .or_else(|| section.and_then(|s| s.default_model.clone()))
            .or_else(|| self.default_model.clone())
            .unwrap_or_else(|| kind.default_model().to_string());

        let api_key = overrides
            .api_key
            .clone()
            .or_else(|| env(kind.api_key_env()))
            .or_else(|| section.and_then(|s| s.api_key.clone()))
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| Error::ApiKeyMissing {
                provider: kind.as_str().to_string(),
                env_var: kind.api_key_env().to_string(),
            })?;

        let mut config = fieldmatch_core::ProviderConfig::new(kind, model, Secret::new(api_key));
        if let Some(base_url) = overrides
            .base_url
            .clone()
            .or_else(|| section.and_then(|s| s.base_url.clone()))
        {
            config = config.with_base_url(base_url);
        }
        if let Some(timeout) = section.and_then(|s| s.timeout) {
            config = config.with_timeout(timeout);
        }
        Ok(config)
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|s| s.to_str()),
        Some("yaml") | Some("yml")
    )
}
