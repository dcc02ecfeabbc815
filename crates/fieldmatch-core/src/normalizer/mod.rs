//! JSON normalization
//!
//! Every JSON string entering the pipeline passes through here. Two
//! projections are produced: *raw*, the compact serialization in the key
//! order it was parsed with, and *display*, the same value pretty-printed
//! with two-space indentation. Only raw text is ever sent to a provider.
//!
//! Parse failures are ordinary user-input conditions and are reported as a
//! [`ValidationResult`], never as an error.

pub mod markup;
pub mod structure;

pub use markup::{HtmlTextExtractor, TextExtractor};
pub use structure::{check_structure, check_structure_str, StructureCheck};

use crate::types::{JsonError, ValidationResult};
use serde_json::Value;

/// A parsed JSON value with its raw and display projections
#[derive(Debug, Clone, PartialEq)]
pub struct JsonDocument {
    value: Value,
    raw: String,
    display: String,
}

impl JsonDocument {
    /// Parse text, tolerating a surrounding fenced code block
    pub fn parse(input: &str) -> std::result::Result<Self, JsonError> {
        let value = serde_json::from_str::<Value>(strip_code_fence(input))
            .map_err(|e| JsonError::from_serde(&e))?;
        Ok(Self::from_value(value))
    }

    pub fn from_value(value: Value) -> Self {
        // Serializing a Value only fails for non-string map keys, which Value cannot hold.
        let raw = serde_json::to_string(&value).unwrap_or_default();
        let display = serde_json::to_string_pretty(&value).unwrap_or_default();
        Self {
            value,
            raw,
            display,
        }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }

    /// Compact canonical form
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Pretty form, two-space indent
    pub fn display(&self) -> &str {
        &self.display
    }
}

/// Strictly parse `input` and report both projections or a readable error
pub fn validate_and_format(input: &str) -> ValidationResult {
    match JsonDocument::parse(input) {
        Ok(doc) => ValidationResult::valid(doc.raw, doc.display),
        Err(error) => ValidationResult::invalid(error),
    }
}

/// Canonical compact JSON for `input`, or `input` unchanged when it is not JSON
///
/// Markup-wrapped input (rich clipboard content) is reduced to its text
/// content first. Idempotent.
pub fn strip_formatting(input: &str) -> String {
    strip_formatting_with(input, &HtmlTextExtractor)
}

/// [`strip_formatting`] with a caller-supplied text extractor
pub fn strip_formatting_with(input: &str, extractor: &dyn TextExtractor) -> String {
    if let Ok(doc) = JsonDocument::parse(input) {
        return doc.raw;
    }
    if input.contains('<') {
        let text = extractor.extract_plain_text(input);
        if let Ok(doc) = JsonDocument::parse(&text) {
            return doc.raw;
        }
    }
    input.to_string()
}

/// Pretty form of a JSON string, or the input unchanged when it does not parse
pub fn format_for_display(input: &str) -> String {
    match JsonDocument::parse(&strip_formatting(input)) {
        Ok(doc) => doc.display,
        Err(_) => input.to_string(),
    }
}

/// Remove a surrounding Markdown code fence such as ```` ```json ... ``` ````
pub fn strip_code_fence(input: &str) -> &str {
    let trimmed = input.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // Drop the language tag: everything up to the first newline, or the
    // leading run of tag characters when the fence is written on one line.
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric() || c == '-' || c == '_'),
    };

    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}

/// Parse the JSON object a model was asked to return
///
/// Models sometimes wrap the object in a code fence or surround it with a
/// sentence of prose; both are tolerated.
pub fn parse_model_json(content: &str) -> std::result::Result<Value, JsonError> {
    let unfenced = strip_code_fence(content);
    match serde_json::from_str::<Value>(unfenced) {
        Ok(value) => Ok(value),
        Err(first_error) => {
            let start = unfenced.find('{');
            let end = unfenced.rfind('}');
            match (start, end) {
                (Some(start), Some(end)) if start < end => {
                    serde_json::from_str::<Value>(&unfenced[start..=end])
                        .map_err(|_| JsonError::from_serde(&first_error))
                }
                _ => Err(JsonError::from_serde(&first_error)),
            }
        }
    }
}
