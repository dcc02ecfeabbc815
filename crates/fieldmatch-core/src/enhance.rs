//! Enhancement pass: let the provider fill empty fields of a document
//!
//! The provider sees the document together with the confident matches as
//! context. Its answer must keep the document's shape, and every leaf that
//! was already populated is restored from the input afterwards, so the pass
//! can only add information. Any rejected answer leaves the input as it was.

use crate::error::{Error, Result};
use crate::normalizer::{check_structure, parse_model_json, strip_formatting, JsonDocument};
use crate::prompts;
use crate::provider::CompletionProvider;
use crate::reconcile::select_matches;
use crate::types::{CompletionOptions, MatchResult, Message};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};

pub struct EnhancementEngine {
    provider: Arc<dyn CompletionProvider>,
}

impl EnhancementEngine {
    pub fn new(provider: Arc<dyn CompletionProvider>) -> Self {
        Self { provider }
    }

    /// Enhanced document, pretty-printed
    ///
    /// Input that is not JSON is returned unchanged, as is the display form
    /// of the input when the provider's answer is rejected. Provider and
    /// configuration errors are returned.
    pub async fn enhance(&self, json: &str, matches: &[MatchResult]) -> Result<String> {
        let doc = match JsonDocument::parse(&strip_formatting(json)) {
            Ok(doc) => doc,
            Err(e) => {
                warn!(error = %e, "JSON to enhance does not parse, returning it unchanged");
                return Ok(json.to_string());
            }
        };

        match self.try_enhance(&doc, matches).await {
            Ok(enhanced) => Ok(JsonDocument::from_value(enhanced).display().to_string()),
            Err(Error::InvalidResponseFormat { message }) => {
                warn!(reason = %message, "Discarding enhancement, returning input");
                Ok(doc.display().to_string())
            }
            Err(e) => Err(e),
        }
    }

    /// Ask for an enhancement and verify it
    ///
    /// A rejected answer is an [`Error::InvalidResponseFormat`] here.
    pub async fn try_enhance(&self, doc: &JsonDocument, matches: &[MatchResult]) -> Result<Value> {
        let context: Vec<Value> = select_matches(matches)
            .iter()
            .map(|m| {
                json!({
                    "property": m.property,
                    "value": m.matched_text.trim(),
                    "confidence": m.confidence,
                })
            })
            .collect();
        let context = serde_json::to_string_pretty(&context)?;

        let messages = vec![
            Message::system(prompts::ENHANCE_SYSTEM_PROMPT),
            Message::user(prompts::enhance_user_prompt(doc.raw(), &context)),
        ];
        let options = CompletionOptions::new()
            .temperature(prompts::ENHANCE_TEMPERATURE)
            .json_object();

        let completion = self.provider.create_completion(&messages, &options).await?;
        let content = completion
            .non_empty()
            .ok_or_else(|| Error::invalid_response("provider returned an empty enhancement"))?;
        let mut enhanced = parse_model_json(content)
            .map_err(|e| Error::invalid_response(format!("enhancement is not valid JSON: {}", e)))?;

        let check = check_structure(doc.value(), &enhanced);
        if !check.is_valid {
            return Err(Error::invalid_response(format!(
                "enhancement changed the document structure: {}",
                check.error.unwrap_or_default()
            )));
        }

        let restored = restore_populated(doc.value(), &mut enhanced);
        if restored > 0 {
            warn!(restored, "Enhancement overwrote populated fields, restored them");
        }
        info!("Enhancement accepted");
        Ok(enhanced)
    }
}

/// Whether a leaf carries information worth protecting
///
/// `null` and `""` are empty; containers are never leaves.
pub fn is_populated(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        Value::Bool(_) | Value::Number(_) => true,
        Value::Array(_) | Value::Object(_) => false,
    }
}

/// Copy every populated leaf of `original` back into `enhanced`
///
/// Returns how many leaves differed and were restored.
pub fn restore_populated(original: &Value, enhanced: &mut Value) -> usize {
    match (original, enhanced) {
        (Value::Object(orig), Value::Object(enh)) => orig
            .iter()
            .map(|(key, orig_value)| match enh.get_mut(key) {
                Some(enh_value) => restore_populated(orig_value, enh_value),
                None => {
                    enh.insert(key.clone(), orig_value.clone());
                    1
                }
            })
            .sum(),
        (Value::Array(orig), Value::Array(enh)) => orig
            .iter()
            .zip(enh.iter_mut())
            .map(|(orig_value, enh_value)| restore_populated(orig_value, enh_value))
            .sum(),
        (orig, enh) if is_populated(orig) && *orig != *enh => {
            *enh = orig.clone();
            1
        }
        _ => 0,
    }
}
