//! Validate command handler

use super::utils::read_input;
use crate::cli::{OutputFormat, ValidateArgs};
use crate::error::{Error, Result};
use crate::output::OutputWriter;
use fieldmatch_core::{check_structure_str, validate_and_format};
use tracing::{debug, instrument};

/// Handle the validate command
#[instrument(skip(args, output), fields(file = %args.file.display()))]
pub async fn handle_validate(args: ValidateArgs, output: &mut OutputWriter) -> Result<()> {
    output.info(&format!("Validating {}", args.file.display()))?;

    let content = read_input(&args.file)?;
    let result = validate_and_format(&content);

    let (raw, formatted) = match (&result.raw, &result.formatted) {
        (Some(raw), Some(formatted)) if result.is_valid => (raw.clone(), formatted.clone()),
        _ => {
            let message = result
                .error
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_else(|| "invalid JSON".to_string());
            output.error("✗ Invalid JSON")?;
            if output.format() != OutputFormat::Human {
                output.data(&result)?;
            }
            return Err(Error::InvalidJson {
                path: args.file.clone(),
                message,
            });
        }
    };
    debug!(bytes = raw.len(), "Document parsed");

    if let Some(original_path) = &args.against {
        let original = read_input(original_path)?;
        let check = check_structure_str(&original, &raw);
        if !check.is_valid {
            output.error(&format!(
                "✗ Structure differs from {}",
                original_path.display()
            ))?;
            return Err(Error::StructureMismatch(
                check.error.unwrap_or_else(|| "incompatible structure".to_string()),
            ));
        }
        output.success(&format!(
            "✓ Structure matches {}",
            original_path.display()
        ))?;
    }

    output.success("✓ Valid JSON")?;

    match output.format() {
        OutputFormat::Human => output.writeln(if args.compact { &raw } else { &formatted }),
        _ => output.data(&result),
    }
}
