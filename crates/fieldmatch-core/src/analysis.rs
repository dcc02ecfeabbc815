//! Match engine: free text + JSON structure -> scored matches
//!
//! The provider is asked for a `{"matches": [...]}` object. Its answer is
//! checked for that shape and each candidate is normalized: confidence
//! clamped to 0-100, a missing or unknown match type inferred from the
//! confidence band, and spans that fall outside the analyzed text repaired.
//! Spans count characters (Unicode scalar values), end exclusive.

use crate::error::{Error, Result};
use crate::normalizer::{parse_model_json, strip_formatting};
use crate::prompts;
use crate::provider::CompletionProvider;
use crate::types::{
    CompletionOptions, FormatValidation, MatchPosition, MatchResult, MatchType, Message,
};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

pub struct MatchEngine {
    provider: Arc<dyn CompletionProvider>,
}

impl MatchEngine {
    pub fn new(provider: Arc<dyn CompletionProvider>) -> Self {
        Self { provider }
    }

    /// Find the spans of `text` that correspond to properties of `json_schema`
    ///
    /// The result order is whatever the provider returned; use
    /// [`crate::types::sort_by_confidence`] for display.
    pub async fn analyze(&self, text: &str, json_schema: &str) -> Result<Vec<MatchResult>> {
        let start = Instant::now();
        let raw_schema = strip_formatting(json_schema);
        let messages = build_messages(&raw_schema, text);
        let options = CompletionOptions::new()
            .temperature(prompts::ANALYSIS_TEMPERATURE)
            .json_object();

        debug!(
            schema_bytes = raw_schema.len(),
            text_chars = text.chars().count(),
            "Requesting match analysis"
        );

        let completion = self.provider.create_completion(&messages, &options).await?;
        let content = completion
            .non_empty()
            .ok_or_else(|| Error::invalid_response("provider returned an empty response"))?;

        let matches = parse_matches(content, text)?;
        info!(
            matches = matches.len(),
            actionable = matches.iter().filter(|m| m.is_actionable()).count(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Analysis complete"
        );
        Ok(matches)
    }
}

pub fn build_messages(raw_schema: &str, text: &str) -> Vec<Message> {
    vec![
        Message::system(prompts::ANALYSIS_SYSTEM_PROMPT),
        Message::user(prompts::analysis_user_prompt(raw_schema, text)),
    ]
}

/// Parse a provider answer into validated matches against `text`
pub fn parse_matches(content: &str, text: &str) -> Result<Vec<MatchResult>> {
    let parsed = parse_model_json(content)
        .map_err(|e| Error::invalid_response(format!("response is not valid JSON: {}", e)))?;

    let entries = parsed
        .as_object()
        .and_then(|object| object.get("matches"))
        .and_then(Value::as_array)
        .ok_or_else(|| Error::invalid_response("response has no \"matches\" array"))?;

    let text_len = text.chars().count();
    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| candidate_from_value(index, entry, text, text_len))
        .collect()
}

fn candidate_from_value(index: usize, entry: &Value, text: &str, text_len: usize) -> Result<MatchResult> {
    let object = entry
        .as_object()
        .ok_or_else(|| Error::invalid_response(format!("match {} is not an object", index)))?;

    let property = object
        .get("property")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .ok_or_else(|| Error::invalid_response(format!("match {} has no property", index)))?;

    let matched_text = match object.get("matchedText") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => {
            return Err(Error::invalid_response(format!(
                "match {} ({}) has no matchedText",
                index, property
            )))
        }
    };

    let confidence = object
        .get("confidence")
        .and_then(confidence_from_value)
        .ok_or_else(|| {
            Error::invalid_response(format!("match {} ({}) has no numeric confidence", index, property))
        })?;

    let match_type = object
        .get("matchType")
        .and_then(|v| serde_json::from_value::<MatchType>(v.clone()).ok())
        .unwrap_or_else(|| MatchType::from_confidence(confidence));

    let position = object
        .get("position")
        .and_then(position_from_value)
        .filter(|p| p.is_within(text_len))
        .unwrap_or_else(|| {
            let repaired = repair_position(object.get("position"), &matched_text, text, text_len);
            warn!(
                property,
                start = repaired.start,
                end = repaired.end,
                "Match span outside analyzed text, repaired"
            );
            repaired
        });

    let mut result = MatchResult::new(property, matched_text, position, confidence, match_type);
    result.suggestions = object
        .get("suggestions")
        .and_then(|v| serde_json::from_value::<Vec<String>>(v.clone()).ok());
    result.data_type = object
        .get("dataType")
        .and_then(Value::as_str)
        .map(str::to_string);
    result.format_validation = object
        .get("formatValidation")
        .and_then(|v| serde_json::from_value::<FormatValidation>(v.clone()).ok());
    Ok(result)
}

fn confidence_from_value(value: &Value) -> Option<u8> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !number.is_finite() {
        return None;
    }
    Some(number.round().clamp(0.0, 100.0) as u8)
}

fn offset_from_value(value: Option<&Value>) -> Option<usize> {
    let number = value?.as_f64()?;
    if number.is_finite() && number >= 0.0 {
        Some(number as usize)
    } else {
        None
    }
}

fn position_from_value(value: &Value) -> Option<MatchPosition> {
    let start = offset_from_value(value.get("start"))?;
    let end = offset_from_value(value.get("end"))?;
    Some(MatchPosition::new(start, end))
}

/// Locate `matched_text` in `text`, or clamp the reported span into range
fn repair_position(
    reported: Option<&Value>,
    matched_text: &str,
    text: &str,
    text_len: usize,
) -> MatchPosition {
    let needle = matched_text.trim();
    if !needle.is_empty() {
        if let Some(byte_start) = text.find(needle) {
            let start = text[..byte_start].chars().count();
            return MatchPosition::new(start, start + needle.chars().count());
        }
    }

    let start = reported
        .and_then(|p| offset_from_value(p.get("start")))
        .unwrap_or(0)
        .min(text_len);
    let end = reported
        .and_then(|p| offset_from_value(p.get("end")))
        .unwrap_or(start)
        .clamp(start, text_len);
    MatchPosition::new(start, end)
}
