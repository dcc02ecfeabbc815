//! Models command handler

use crate::cli::OutputFormat;
use crate::config::{Config, ProviderOverrides};
use crate::error::Result;
use crate::output::OutputWriter;
use fieldmatch_core::ProviderKind;
use serde::Serialize;

/// Catalog entry for one provider
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProviderModels {
    provider: &'static str,
    api_key_env: &'static str,
    default_model: &'static str,
    models: &'static [&'static str],
}

impl From<ProviderKind> for ProviderModels {
    fn from(kind: ProviderKind) -> Self {
        Self {
            provider: kind.as_str(),
            api_key_env: kind.api_key_env(),
            default_model: kind.default_model(),
            models: kind.known_models(),
        }
    }
}

/// Handle the models command
///
/// With `--provider` only that provider is listed.
pub async fn handle_models(
    config: &Config,
    overrides: &ProviderOverrides,
    output: &mut OutputWriter,
) -> Result<()> {
    let kinds: Vec<ProviderKind> = match &overrides.provider {
        Some(_) => vec![config.provider_kind(overrides)?],
        None => ProviderKind::all().to_vec(),
    };
    let catalog: Vec<ProviderModels> = kinds.into_iter().map(ProviderModels::from).collect();

    if output.format() != OutputFormat::Human {
        return output.data(&catalog);
    }

    let rows = catalog
        .iter()
        .flat_map(|entry| {
            entry.models.iter().map(move |model| {
                vec![
                    entry.provider.to_string(),
                    model.to_string(),
                    if *model == entry.default_model {
                        "✓".to_string()
                    } else {
                        String::new()
                    },
                ]
            })
        })
        .collect();
    output.table(&["Provider", "Model", "Default"], rows)?;

    for entry in &catalog {
        output.info(&format!(
            "{} reads its API key from {}",
            entry.provider, entry.api_key_env
        ))?;
    }
    Ok(())
}
