//! Reconciliation engine: apply confident matches to the original document
//!
//! Only matches at or above [`MIN_CONFIDENCE`] are applied, highest
//! confidence first. Two strategies are available:
//!
//! - [`ReconcileStrategy::Deterministic`] writes matched text into the
//!   document locally (see [`path`]). No provider call is made.
//! - [`ReconcileStrategy::Delegated`] asks the provider to rewrite the
//!   document and accepts the rewrite only if it keeps the original shape.
//!   A rewrite that is unreadable or reshapes the document is discarded and
//!   the original comes back unchanged; transport and configuration errors
//!   are returned to the caller.

pub mod path;

pub use path::{apply_matches, coerce, set_path, ApplySummary, SkipReason};

use crate::error::{Error, Result};
use crate::normalizer::{check_structure, parse_model_json, strip_formatting, JsonDocument};
use crate::prompts;
use crate::provider::CompletionProvider;
use crate::types::{sort_by_confidence, CompletionOptions, MatchResult, Message, MIN_CONFIDENCE};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReconcileStrategy {
    #[default]
    Deterministic,
    Delegated,
}

impl ReconcileStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReconcileStrategy::Deterministic => "deterministic",
            ReconcileStrategy::Delegated => "delegated",
        }
    }
}

impl fmt::Display for ReconcileStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReconcileStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "deterministic" | "local" => Ok(ReconcileStrategy::Deterministic),
            "delegated" | "model" => Ok(ReconcileStrategy::Delegated),
            other => Err(Error::configuration(format!(
                "unknown reconcile strategy '{}' (expected deterministic or delegated)",
                other
            ))),
        }
    }
}

/// Matches that will be applied: actionable only, highest confidence first
pub fn select_matches(matches: &[MatchResult]) -> Vec<MatchResult> {
    let mut selected: Vec<MatchResult> = matches
        .iter()
        .filter(|m| m.confidence >= MIN_CONFIDENCE)
        .cloned()
        .collect();
    sort_by_confidence(&mut selected);
    selected
}

pub struct ReconciliationEngine {
    provider: Option<Arc<dyn CompletionProvider>>,
    strategy: ReconcileStrategy,
}

impl ReconciliationEngine {
    /// Local application only; never calls a provider
    pub fn deterministic() -> Self {
        Self {
            provider: None,
            strategy: ReconcileStrategy::Deterministic,
        }
    }

    pub fn delegated(provider: Arc<dyn CompletionProvider>) -> Self {
        Self::new(provider, ReconcileStrategy::Delegated)
    }

    pub fn new(provider: Arc<dyn CompletionProvider>, strategy: ReconcileStrategy) -> Self {
        Self {
            provider: Some(provider),
            strategy,
        }
    }

    pub fn strategy(&self) -> ReconcileStrategy {
        self.strategy
    }

    /// The original document with `matches` applied, pretty-printed
    ///
    /// An original that is not JSON is returned exactly as given. With no
    /// actionable matches the result is the display form of the original.
    pub async fn update(&self, original: &str, matches: &[MatchResult]) -> Result<String> {
        let doc = match JsonDocument::parse(&strip_formatting(original)) {
            Ok(doc) => doc,
            Err(e) => {
                warn!(error = %e, "Original JSON does not parse, returning it unchanged");
                return Ok(original.to_string());
            }
        };

        let selected = select_matches(matches);
        if selected.is_empty() {
            debug!(
                received = matches.len(),
                "No matches at or above the confidence threshold"
            );
            return Ok(doc.display().to_string());
        }

        match self.strategy {
            ReconcileStrategy::Deterministic => Ok(apply_locally(doc, &selected)),
            ReconcileStrategy::Delegated => match self.try_delegated(&doc, &selected).await {
                Ok(updated) => Ok(updated),
                Err(Error::InvalidResponseFormat { message }) => {
                    warn!(
                        reason = %message,
                        "Discarding provider rewrite, returning original"
                    );
                    Ok(doc.display().to_string())
                }
                Err(e) => Err(e),
            },
        }
    }

    /// Ask the provider for a rewrite and verify it
    ///
    /// Unlike [`update`](Self::update), a rejected rewrite is an
    /// [`Error::InvalidResponseFormat`] here.
    pub async fn try_delegated(&self, doc: &JsonDocument, selected: &[MatchResult]) -> Result<String> {
        let provider = self.provider.as_ref().ok_or(Error::NotConfigured)?;

        let match_data: Vec<Value> = selected
            .iter()
            .map(|m| {
                json!({
                    "property": m.property,
                    "value": m.matched_text.trim(),
                    "confidence": m.confidence,
                    "matchType": m.match_type,
                })
            })
            .collect();
        let match_data = serde_json::to_string_pretty(&match_data)?;

        let messages = vec![
            Message::system(prompts::UPDATE_SYSTEM_PROMPT),
            Message::user(prompts::update_user_prompt(doc.raw(), &match_data)),
        ];
        let options = CompletionOptions::new()
            .temperature(prompts::UPDATE_TEMPERATURE)
            .json_object();

        let completion = provider.create_completion(&messages, &options).await?;
        let content = completion
            .non_empty()
            .ok_or_else(|| Error::invalid_response("provider returned an empty rewrite"))?;
        let rewrite = parse_model_json(content)
            .map_err(|e| Error::invalid_response(format!("rewrite is not valid JSON: {}", e)))?;

        let check = check_structure(doc.value(), &rewrite);
        if !check.is_valid {
            return Err(Error::invalid_response(format!(
                "rewrite changed the document structure: {}",
                check.error.unwrap_or_default()
            )));
        }

        info!(matches = selected.len(), "Applied matches through provider");
        Ok(JsonDocument::from_value(rewrite).display().to_string())
    }
}

fn apply_locally(doc: JsonDocument, selected: &[MatchResult]) -> String {
    let mut value = doc.into_value();
    let summary = apply_matches(&mut value, selected);
    for (property, reason) in &summary.skipped {
        debug!(property = %property, reason = %reason, "Match not applied");
    }
    info!(
        applied = summary.applied.len(),
        skipped = summary.skipped.len(),
        "Applied matches locally"
    );
    JsonDocument::from_value(value).display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::ErrorClassification;
    use crate::provider::ScriptedProvider;
    use crate::types::{MatchPosition, MatchType};

    fn m(property: &str, text: &str, confidence: u8) -> MatchResult {
        MatchResult::new(
            property,
            text,
            MatchPosition::new(0, text.chars().count()),
            confidence,
            MatchType::from_confidence(confidence),
        )
    }

    fn compact(pretty: &str) -> String {
        JsonDocument::parse(pretty).unwrap().raw().to_string()
    }

    #[test]
    fn test_select_matches_filters_and_sorts() {
        let selected = select_matches(&[m("a", "x", 29), m("b", "y", 30), m("c", "z", 95)]);
        let properties: Vec<&str> = selected.iter().map(|m| m.property.as_str()).collect();
        assert_eq!(properties, vec!["c", "b"]);
    }

    #[test]
    fn test_strategy_from_str() {
        assert_eq!("Delegated".parse::<ReconcileStrategy>().unwrap(), ReconcileStrategy::Delegated);
        assert_eq!(ReconcileStrategy::default(), ReconcileStrategy::Deterministic);
        assert!("fuzzy".parse::<ReconcileStrategy>().is_err());
    }

    #[tokio::test]
    async fn test_update_deterministic_name_and_age() {
        let engine = ReconciliationEngine::deterministic();
        let updated = engine
            .update(
                r#"{"name":"","age":0}"#,
                &[m("name", "John Smith", 95), m("age", "30", 90)],
            )
            .await
            .unwrap();
        assert_eq!(compact(&updated), r#"{"name":"John Smith","age":30}"#);
        assert!(updated.contains("\n  \"name\""));
    }

    #[tokio::test]
    async fn test_update_without_matches_returns_display_form() {
        let engine = ReconciliationEngine::deterministic();
        let updated = engine.update(r#"{"a":1}"#, &[]).await.unwrap();
        assert_eq!(updated, "{\n  \"a\": 1\n}");
    }

    #[tokio::test]
    async fn test_update_ignores_low_confidence_without_calling_provider() {
        let provider = Arc::new(ScriptedProvider::new().with_text(r#"{"a":2}"#));
        let engine = ReconciliationEngine::delegated(provider.clone());
        let updated = engine
            .update(r#"{"a":1}"#, &[m("a", "2", 10), m("a", "3", 29)])
            .await
            .unwrap();
        assert_eq!(compact(&updated), r#"{"a":1}"#);
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_update_creates_missing_path_and_keeps_siblings() {
        let engine = ReconciliationEngine::deterministic();
        let updated = engine
            .update(
                r#"{"address":{"street":"Main St"},"name":"Ann"}"#,
                &[m("address.city", "Paris", 85)],
            )
            .await
            .unwrap();
        assert_eq!(
            compact(&updated),
            r#"{"address":{"street":"Main St","city":"Paris"},"name":"Ann"}"#
        );
    }

    #[tokio::test]
    async fn test_update_never_replaces_an_object_with_text() {
        let engine = ReconciliationEngine::deterministic();
        let original = r#"{"address":{"city":"","zip":""},"name":""}"#;
        let updated = engine
            .update(
                original,
                &[
                    m("address", "12 Main St, Oslo 0150", 80),
                    m("address.city", "Oslo", 70),
                ],
            )
            .await
            .unwrap();
        assert_eq!(
            compact(&updated),
            r#"{"address":{"city":"Oslo","zip":""},"name":""}"#
        );
        assert!(crate::normalizer::check_structure_str(original, &updated).is_valid);
    }

    #[tokio::test]
    async fn test_update_unparseable_original_is_returned_as_is() {
        let engine = ReconciliationEngine::deterministic();
        let updated = engine.update("{not json", &[m("a", "b", 90)]).await.unwrap();
        assert_eq!(updated, "{not json");
    }

    #[tokio::test]
    async fn test_delegated_accepts_compatible_rewrite() {
        let provider = Arc::new(
            ScriptedProvider::new().with_text("```json\n{\"name\":\"John Smith\",\"age\":30}\n```"),
        );
        let engine = ReconciliationEngine::delegated(provider.clone());
        let updated = engine
            .update(r#"{"name":"","age":0}"#, &[m("name", "John Smith", 95), m("age", "30", 90)])
            .await
            .unwrap();
        assert_eq!(compact(&updated), r#"{"name":"John Smith","age":30}"#);

        let requests = provider.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].options.temperature, Some(prompts::UPDATE_TEMPERATURE));
        assert!(requests[0].messages[1].content.contains(r#"{"name":"","age":0}"#));
        assert!(requests[0].messages[1].content.contains("John Smith"));
    }

    #[tokio::test]
    async fn test_delegated_falls_back_on_reshaped_rewrite() {
        let provider = Arc::new(ScriptedProvider::new().with_text(r#"{"name":"John Smith"}"#));
        let engine = ReconciliationEngine::delegated(provider);
        let updated = engine
            .update(r#"{"name":"","age":0}"#, &[m("name", "John Smith", 95)])
            .await
            .unwrap();
        assert_eq!(compact(&updated), r#"{"name":"","age":0}"#);
    }

    #[tokio::test]
    async fn test_delegated_falls_back_on_garbage() {
        let provider = Arc::new(ScriptedProvider::new().with_text("I could not do that."));
        let engine = ReconciliationEngine::delegated(provider);
        let updated = engine
            .update(r#"{"age":0}"#, &[m("age", "30", 90)])
            .await
            .unwrap();
        assert_eq!(compact(&updated), r#"{"age":0}"#);
    }

    #[tokio::test]
    async fn test_try_delegated_reports_rejection() {
        let provider = Arc::new(ScriptedProvider::new().with_text(r#"{"age":"thirty"}"#));
        let engine = ReconciliationEngine::delegated(provider);
        let doc = JsonDocument::parse(r#"{"age":0}"#).unwrap();
        let err = engine
            .try_delegated(&doc, &[m("age", "30", 90)])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidResponseFormat { .. }));
        assert!(err.to_string().contains("Type mismatch at age"));
    }

    #[tokio::test]
    async fn test_delegated_propagates_provider_errors() {
        let provider = Arc::new(ScriptedProvider::new().with_error(Error::Provider {
            provider: "openai".to_string(),
            message: "connection refused".to_string(),
            status_code: None,
            classification: ErrorClassification::NetworkError,
        }));
        let engine = ReconciliationEngine::delegated(provider);
        let err = engine
            .update(r#"{"age":0}"#, &[m("age", "30", 90)])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Provider { .. }));
        assert!(err.is_retryable());
    }
}
