//! Analyze command handler

use super::utils::{build_service, ensure_single_stdin, read_input, read_json_input, with_spinner};
use crate::cli::AnalyzeArgs;
use crate::config::{Config, ProviderOverrides};
use crate::error::Result;
use crate::logging::timing::Timer;
use crate::output::OutputWriter;
use fieldmatch_core::{sort_by_confidence, MatchEngine, MatchResult, MIN_CONFIDENCE};
use tracing::{info, instrument};

/// Handle the analyze command
#[instrument(skip_all, fields(schema = %args.schema.display(), text = %args.text.display()))]
pub async fn handle_analyze(
    args: AnalyzeArgs,
    config: &Config,
    overrides: &ProviderOverrides,
    output: &mut OutputWriter,
) -> Result<()> {
    let timer = Timer::with_details("analyze", &args.schema.display().to_string());
    ensure_single_stdin(&[&args.schema, &args.text])?;

    let schema = read_json_input(&args.schema)?;
    let text = read_input(&args.text)?;
    let service = build_service(config, overrides)?;

    output.info(&format!(
        "Analyzing {} ({} characters)",
        args.text.display(),
        text.chars().count()
    ))?;

    let engine = MatchEngine::new(service);
    let mut matches = with_spinner(
        output,
        "Analyzing text...",
        engine.analyze(&text, schema.raw()),
    )
    .await?;
    sort_by_confidence(&mut matches);

    let total = matches.len();
    let shown: Vec<MatchResult> = if args.all {
        matches
    } else {
        matches.into_iter().filter(MatchResult::is_actionable).collect()
    };
    info!(total, shown = shown.len(), "Matches ready");

    output.section("Matches")?;
    output.matches(&shown)?;

    let hidden = total - shown.len();
    if hidden > 0 {
        output.info(&format!(
            "{} match(es) below {}% confidence hidden, use --all to show them",
            hidden, MIN_CONFIDENCE
        ))?;
    }

    timer.finish();
    Ok(())
}
