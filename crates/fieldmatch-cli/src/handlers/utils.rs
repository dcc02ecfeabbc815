//! Shared utilities for command handlers

use crate::config::{Config, ProviderOverrides};
use crate::error::{Error, Result};
use crate::output::OutputWriter;
use anyhow::Context;
use fieldmatch_core::{AiService, JsonDocument};
use std::future::Future;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Path that stands for standard input
const STDIN: &str = "-";

fn is_stdin(path: &Path) -> bool {
    path.as_os_str() == STDIN
}

/// Read a text input, `-` meaning stdin
pub fn read_input(path: &Path) -> Result<String> {
    if is_stdin(path) {
        let mut content = String::new();
        io::stdin()
            .read_to_string(&mut content)
            .context("Failed to read standard input")?;
        return Ok(content);
    }

    if !path.exists() {
        return Err(Error::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(content)
}

/// Read and parse a JSON input
pub fn read_json_input(path: &Path) -> Result<JsonDocument> {
    let content = read_input(path)?;
    JsonDocument::parse(&content).map_err(|e| Error::InvalidJson {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Only one input of a command can come from stdin
pub fn ensure_single_stdin(paths: &[&PathBuf]) -> Result<()> {
    if paths.iter().filter(|p| is_stdin(p)).count() > 1 {
        return Err(Error::invalid_args(
            "only one input can be read from standard input",
        ));
    }
    Ok(())
}

/// Build a configured provider service from config, environment and flags
pub fn build_service(config: &Config, overrides: &ProviderOverrides) -> Result<Arc<AiService>> {
    let provider_config = config.resolve_provider(overrides)?;
    info!(
        provider = %provider_config.provider,
        model = %provider_config.model,
        "Using provider"
    );
    let service = AiService::with_config(provider_config)?;
    Ok(Arc::new(service))
}

/// Await `future` behind a spinner when progress is shown
pub async fn with_spinner<F, T>(output: &OutputWriter, message: &str, future: F) -> T
where
    F: Future<Output = T>,
{
    let spinner = output.spinner(message);
    let result = future.await;
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    result
}

/// Write a resulting document to a file, pretty-printed
pub fn save_document(path: &Path, document: &JsonDocument) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(path, format!("{}\n", document.display()))
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Parse a document returned by the pipeline for output
pub fn parse_result(content: &str) -> Result<JsonDocument> {
    JsonDocument::parse(content).map_err(|e| Error::InvalidJson {
        path: PathBuf::from("<result>"),
        message: e.to_string(),
    })
}
