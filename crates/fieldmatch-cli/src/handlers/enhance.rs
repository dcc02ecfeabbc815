//! Enhance command handler

use super::utils::{
    build_service, ensure_single_stdin, parse_result, read_input, read_json_input, save_document,
    with_spinner,
};
use crate::cli::EnhanceArgs;
use crate::config::{Config, ProviderOverrides};
use crate::error::{Error, Result};
use crate::logging::timing::Timer;
use crate::output::OutputWriter;
use fieldmatch_core::{EnhancementEngine, MatchResult};
use serde_json::Value;
use std::path::Path;
use tracing::instrument;

/// Handle the enhance command
#[instrument(skip_all, fields(json = %args.json.display()))]
pub async fn handle_enhance(
    args: EnhanceArgs,
    config: &Config,
    overrides: &ProviderOverrides,
    output: &mut OutputWriter,
) -> Result<()> {
    let timer = Timer::with_details("enhance", &args.json.display().to_string());
    if let Some(matches_path) = &args.matches {
        ensure_single_stdin(&[&args.json, matches_path])?;
    }

    let input = read_json_input(&args.json)?;
    let matches = match &args.matches {
        Some(path) => load_matches(path)?,
        None => Vec::new(),
    };
    let service = build_service(config, overrides)?;

    output.info(&format!(
        "Enhancing {} with {} match(es) as context",
        args.json.display(),
        matches.len()
    ))?;

    let enhanced = with_spinner(
        output,
        "Enhancing JSON...",
        EnhancementEngine::new(service).enhance(input.raw(), &matches),
    )
    .await?;
    let document = parse_result(&enhanced)?;

    if document.value() == input.value() {
        output.warning("Document unchanged")?;
    }
    output.document(document.value())?;

    if let Some(path) = &args.save_to {
        save_document(path, &document)?;
        output.success(&format!("✓ Output saved to {}", path.display()))?;
    }

    timer.finish();
    Ok(())
}

/// Read matches written by `analyze -o json` or `apply -o json`
fn load_matches(path: &Path) -> Result<Vec<MatchResult>> {
    let invalid = |message: String| Error::InvalidJson {
        path: path.to_path_buf(),
        message,
    };

    let content = read_input(path)?;
    let value: Value = serde_json::from_str(&content).map_err(|e| invalid(e.to_string()))?;
    let list = match value {
        Value::Object(mut map) => map
            .remove("matches")
            .ok_or_else(|| invalid("expected a list of matches".to_string()))?,
        other => other,
    };
    serde_json::from_value(list).map_err(|e| invalid(e.to_string()))
}
