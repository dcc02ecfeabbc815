//! Apply command handler: analyze, update and optionally enhance

use super::utils::{
    build_service, ensure_single_stdin, parse_result, read_input, read_json_input, save_document,
    with_spinner,
};
use crate::cli::{ApplyArgs, OutputFormat};
use crate::config::{Config, ProviderOverrides};
use crate::error::Result;
use crate::logging::timing::Timer;
use crate::output::OutputWriter;
use fieldmatch_core::{
    select_matches, EnhancementEngine, MatchEngine, ReconcileStrategy, ReconciliationEngine,
};
use serde_json::json;
use tracing::{debug, instrument};

/// Handle the apply command
#[instrument(skip_all, fields(schema = %args.schema.display(), strategy = ?args.strategy))]
pub async fn handle_apply(
    args: ApplyArgs,
    config: &Config,
    overrides: &ProviderOverrides,
    output: &mut OutputWriter,
) -> Result<()> {
    let timer = Timer::with_details("apply", &args.schema.display().to_string());
    ensure_single_stdin(&[&args.schema, &args.text])?;

    let schema = read_json_input(&args.schema)?;
    let text = read_input(&args.text)?;
    let service = build_service(config, overrides)?;

    let matches = with_spinner(
        output,
        "Analyzing text...",
        MatchEngine::new(service.clone()).analyze(&text, schema.raw()),
    )
    .await?;
    let applied = select_matches(&matches);
    debug!(received = matches.len(), applied = applied.len(), "Analysis done");

    let strategy = ReconcileStrategy::from(args.strategy);
    let engine = ReconciliationEngine::new(service.clone(), strategy);
    let mut updated = with_spinner(
        output,
        "Updating JSON...",
        engine.update(schema.raw(), &matches),
    )
    .await?;

    if args.enhance {
        updated = with_spinner(
            output,
            "Enhancing JSON...",
            EnhancementEngine::new(service).enhance(&updated, &matches),
        )
        .await?;
    }

    let document = parse_result(&updated)?;

    match output.format() {
        OutputFormat::Human => {
            output.section("Applied matches")?;
            output.matches(&applied)?;
            output.section("Result")?;
            output.document(document.value())?;
        }
        _ => {
            output.data(&json!({
                "strategy": strategy.as_str(),
                "enhanced": args.enhance,
                "matches": applied,
                "document": document.value(),
            }))?;
        }
    }

    if let Some(path) = &args.save_to {
        save_document(path, &document)?;
        output.success(&format!("✓ Output saved to {}", path.display()))?;
    }

    timer.finish();
    Ok(())
}
