//! Configuration command handlers

use crate::cli::{ConfigAction, ConfigArgs, ConfigFormat, ConfigInitArgs, ConfigShowArgs, OutputFormat};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::logging::redaction;
use crate::output::OutputWriter;
use serde::Serialize;
use std::path::PathBuf;

/// Handle the config command
pub async fn handle_config(
    args: ConfigArgs,
    config: &Config,
    output: &mut OutputWriter,
) -> Result<()> {
    match args.action {
        ConfigAction::Init(init_args) => handle_config_init(init_args, output),
        ConfigAction::Show(show_args) => handle_config_show(show_args, config, output),
        ConfigAction::Path => handle_config_path(output),
    }
}

/// Handle config init subcommand
fn handle_config_init(args: ConfigInitArgs, output: &mut OutputWriter) -> Result<()> {
    let path = if args.user {
        Config::user_config_path()
            .ok_or_else(|| Error::config("Unable to determine user config directory"))?
    } else {
        PathBuf::from(".fieldmatch.yaml")
    };

    if path.exists() && !args.force {
        return Err(Error::config(format!(
            "{} already exists, use --force to overwrite it",
            path.display()
        )));
    }

    Config::template().save(&path)?;
    output.success(&format!("✓ Created config at {}", path.display()))?;
    output.info("Add an api_key under providers or set the provider's API key variable")?;
    Ok(())
}

/// Handle config show subcommand
fn handle_config_show(
    args: ConfigShowArgs,
    config: &Config,
    output: &mut OutputWriter,
) -> Result<()> {
    let mut value = serde_json::to_value(config)?;
    redaction::redact_json_value(&mut value);

    let rendered = match args.format {
        ConfigFormat::Yaml => serde_yaml::to_string(&value)?,
        ConfigFormat::Json => format!("{}\n", serde_json::to_string_pretty(&value)?),
    };
    output.write(&rendered)
}

#[derive(Debug, Serialize)]
struct SearchedPath {
    path: PathBuf,
    exists: bool,
}

/// Handle config path subcommand
fn handle_config_path(output: &mut OutputWriter) -> Result<()> {
    let paths: Vec<SearchedPath> = Config::default_config_paths()
        .into_iter()
        .map(|path| SearchedPath {
            exists: path.exists(),
            path,
        })
        .collect();

    if output.format() != OutputFormat::Human {
        return output.data(&paths);
    }

    output.info("Configuration files are searched in this order:")?;
    for entry in &paths {
        let marker = if entry.exists { "✓" } else { " " };
        output.writeln(&format!("{} {}", marker, entry.path.display()))?;
    }
    Ok(())
}
