//! Output formatting and writing utilities
//!
//! This module provides utilities for formatting and writing output
//! in various formats (JSON, YAML, human-readable), with specialized
//! rendering for match lists and JSON documents and progress indicators.

use crate::cli::OutputFormat;
use crate::error::Result;
use crate::logging::redaction;
use colored::Colorize;
use fieldmatch_core::{ConfidenceBand, MatchResult, MIN_CONFIDENCE};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use serde_json::Value;
use std::io::{self, IsTerminal, Write};
use std::time::Duration;
use tracing::{debug, trace};

/// Trait for formatting output with specialized support for common types
pub trait OutputFormatter {
    /// Format a serializable value
    fn format<T: Serialize>(&self, value: &T) -> Result<String>;

    /// Format a list of matches
    fn format_matches(&self, matches: &[MatchResult]) -> Result<String>;

    /// Format a JSON document produced by a command
    fn format_document(&self, document: &Value) -> Result<String>;
}

impl OutputFormatter for OutputFormat {
    fn format<T: Serialize>(&self, value: &T) -> Result<String> {
        match self {
            OutputFormat::Json => Ok(serde_json::to_string(value)?),
            OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(value)?),
            OutputFormat::Yaml => Ok(serde_yaml::to_string(value)?),
            OutputFormat::Human => {
                // For human format, use pretty JSON as fallback
                Ok(serde_json::to_string_pretty(value)?)
            }
        }
    }

    fn format_matches(&self, matches: &[MatchResult]) -> Result<String> {
        match self {
            OutputFormat::Human => Ok(format_matches_human(matches)),
            _ => self.format(&matches),
        }
    }

    fn format_document(&self, document: &Value) -> Result<String> {
        match self {
            OutputFormat::Json => Ok(serde_json::to_string(document)?),
            OutputFormat::Yaml => Ok(serde_yaml::to_string(document)?),
            OutputFormat::Human | OutputFormat::JsonPretty => {
                Ok(serde_json::to_string_pretty(document)?)
            }
        }
    }
}

/// Output writer that handles different output formats and colors
pub struct OutputWriter {
    format: OutputFormat,
    use_color: bool,
    show_progress: bool,
    quiet: bool,
    writer: Box<dyn Write>,
}

impl OutputWriter {
    /// Create a new output writer
    pub fn new(format: OutputFormat, use_color: bool, quiet: bool) -> Self {
        Self {
            format,
            use_color,
            show_progress: !quiet && io::stderr().is_terminal(),
            quiet,
            writer: Box::new(io::stdout()),
        }
    }

    /// Create an output writer with a custom writer
    pub fn with_writer(
        format: OutputFormat,
        use_color: bool,
        quiet: bool,
        writer: Box<dyn Write>,
    ) -> Self {
        Self {
            format,
            use_color,
            show_progress: false, // No progress bars with custom writers
            quiet,
            writer,
        }
    }

    /// Get the output format
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Turn off spinners
    pub fn disable_progress(&mut self) {
        self.show_progress = false;
    }

    /// Write raw output
    pub fn write(&mut self, content: &str) -> Result<()> {
        write!(self.writer, "{}", content)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Write a line of output
    pub fn writeln(&mut self, content: &str) -> Result<()> {
        writeln!(self.writer, "{}", content)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Write an info message
    pub fn info(&mut self, message: &str) -> Result<()> {
        debug!("Output info: {}", message);

        if self.quiet || self.format != OutputFormat::Human {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&format!("{} {}", "ℹ".blue(), message))
        } else {
            self.writeln(&format!("INFO: {}", message))
        }
    }

    /// Write a success message
    pub fn success(&mut self, message: &str) -> Result<()> {
        if self.quiet || self.format != OutputFormat::Human {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&message.green().to_string())
        } else {
            self.writeln(message)
        }
    }

    /// Write a warning message
    pub fn warning(&mut self, message: &str) -> Result<()> {
        if self.format != OutputFormat::Human {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&message.yellow().to_string())
        } else {
            self.writeln(&format!("WARNING: {}", message))
        }
    }

    /// Write an error message
    pub fn error(&mut self, message: &str) -> Result<()> {
        if self.format != OutputFormat::Human {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&message.red().to_string())
        } else {
            self.writeln(&format!("ERROR: {}", message))
        }
    }

    /// Write a section header
    pub fn section(&mut self, title: &str) -> Result<()> {
        if self.quiet || self.format != OutputFormat::Human {
            return Ok(());
        }

        self.writeln("")?;
        if self.use_color {
            self.writeln(&format!("═══ {} ═══", title).bright_blue().to_string())
        } else {
            self.writeln(&format!("=== {} ===", title))
        }
    }

    /// Write data in the configured format
    pub fn data<T: Serialize>(&mut self, value: &T) -> Result<()> {
        // Create a redacted copy of the value for logging
        let mut value_json = serde_json::to_value(value)?;
        redaction::redact_json_value(&mut value_json);

        trace!(
            "Outputting data: {}",
            serde_json::to_string(&value_json)
                .unwrap_or_else(|_| "[failed to serialize]".to_string())
        );

        let formatted = self.format.format(value)?;
        self.emit(&formatted)
    }

    /// Write a list of matches with specialized formatting
    pub fn matches(&mut self, matches: &[MatchResult]) -> Result<()> {
        let formatted = self.format.format_matches(matches)?;
        self.emit(&formatted)
    }

    /// Write a resulting JSON document
    pub fn document(&mut self, document: &Value) -> Result<()> {
        let formatted = self.format.format_document(document)?;
        self.emit(&formatted)
    }

    fn emit(&mut self, formatted: &str) -> Result<()> {
        if formatted.ends_with('\n') {
            self.write(formatted)
        } else {
            self.writeln(formatted)
        }
    }

    /// Create a spinner for indeterminate progress
    pub fn spinner(&self, message: &str) -> Option<ProgressBar> {
        if !self.show_progress {
            return None;
        }

        let pb = ProgressBar::new_spinner();
        pb.set_style(default_spinner_style());
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    }

    /// Write a table (for human format)
    pub fn table(&mut self, headers: &[&str], rows: Vec<Vec<String>>) -> Result<()> {
        if self.quiet || self.format != OutputFormat::Human {
            return Ok(());
        }

        let table = render_table(headers, &rows);
        let mut lines = table.lines();
        if let Some(header_row) = lines.next() {
            if self.use_color {
                self.writeln(&header_row.bold().to_string())?;
            } else {
                self.writeln(header_row)?;
            }
        }
        for line in lines {
            self.writeln(line)?;
        }

        Ok(())
    }
}

/// Helper function to create a spinner style
pub fn default_spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("{spinner:.green} {msg}")
        .expect("valid spinner template")
}

/// Lay out rows under headers, one line per row, widths in characters
fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths = headers
        .iter()
        .map(|h| h.chars().count())
        .collect::<Vec<_>>();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }
    }

    let pad = |cell: &str, width: usize| {
        let fill = width.saturating_sub(cell.chars().count());
        format!("{}{}", cell, " ".repeat(fill))
    };

    let mut output = String::new();
    let header_row = headers
        .iter()
        .enumerate()
        .map(|(i, h)| pad(h, widths[i]))
        .collect::<Vec<_>>()
        .join(" │ ");
    output.push_str(header_row.trim_end());
    output.push('\n');

    let separator = widths
        .iter()
        .map(|w| "─".repeat(*w))
        .collect::<Vec<_>>()
        .join("─┼─");
    output.push_str(&separator);
    output.push('\n');

    for row in rows {
        let row_str = row
            .iter()
            .enumerate()
            .map(|(i, cell)| match widths.get(i) {
                Some(width) => pad(cell, *width),
                None => cell.clone(),
            })
            .collect::<Vec<_>>()
            .join(" │ ");
        output.push_str(row_str.trim_end());
        output.push('\n');
    }

    output
}

/// Format matches for human reading
fn format_matches_human(matches: &[MatchResult]) -> String {
    if matches.is_empty() {
        return "No matches found\n".to_string();
    }

    let rows = matches
        .iter()
        .map(|m| {
            let icon = match m.band() {
                ConfidenceBand::Exact => "✅",
                ConfidenceBand::Semantic => "🔹",
                ConfidenceBand::Partial => "🔸",
                ConfidenceBand::Low => "·",
            };
            vec![
                m.property.clone(),
                format!("\"{}\"", truncate(&m.matched_text, 40)),
                format!("{}..{}", m.position.start, m.position.end),
                format!("{} {}%", icon, m.confidence),
                m.match_type.to_string(),
            ]
        })
        .collect::<Vec<_>>();

    let mut output = render_table(
        &["Property", "Matched text", "Span", "Confidence", "Type"],
        &rows,
    );

    let applicable = matches
        .iter()
        .filter(|m| m.confidence >= MIN_CONFIDENCE)
        .count();
    output.push_str(&format!(
        "\n{} match(es), {} at or above {}% confidence\n",
        matches.len(),
        applicable,
        MIN_CONFIDENCE
    ));

    for m in matches {
        if let Some(suggestions) = m.suggestions.as_ref().filter(|s| !s.is_empty()) {
            output.push_str(&format!(
                "  💡 {}: {}\n",
                m.property,
                suggestions.join(", ")
            ));
        }
        if let Some(validation) = m.format_validation.as_ref().filter(|v| !v.is_valid) {
            output.push_str(&format!(
                "  ⚠️ {}: {}\n",
                m.property,
                validation.message.as_deref().unwrap_or("invalid format")
            ));
        }
    }

    output
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let head: String = text.chars().take(max_chars.saturating_sub(1)).collect();
        format!("{}…", head)
    }
}
