//! Core types and data structures for fieldmatch
//!
//! This module defines the data passed between the normalizer, the provider
//! adapter and the match/reconcile/enhance engines.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Matches below this confidence are never applied to a document
pub const MIN_CONFIDENCE: u8 = 30;

// ---------------------------------------------------------------------------
// Provider configuration
// ---------------------------------------------------------------------------

/// LLM backends the adapter knows how to talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[serde(rename = "openai")]
    OpenAi,
    Anthropic,
}

const OPENAI_MODELS: &[&str] = &[
    "gpt-4",
    "gpt-4o",
    "gpt-4o-mini",
    "gpt-4-turbo-preview",
    "gpt-3.5-turbo",
    "gpt-3.5-turbo-preview",
    "o1-preview",
    "o1-mini",
];

const ANTHROPIC_MODELS: &[&str] = &[
    "claude-3-opus-20240229",
    "claude-3-sonnet-20240229",
    "claude-3-5-sonnet-latest",
    "claude-3-5-haiku-latest",
    "claude-2.1",
];

impl ProviderKind {
    pub fn all() -> &'static [ProviderKind] {
        &[ProviderKind::OpenAi, ProviderKind::Anthropic]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Anthropic => "anthropic",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "https://api.openai.com",
            ProviderKind::Anthropic => "https://api.anthropic.com",
        }
    }

    /// Environment variable conventionally holding this provider's key
    pub fn api_key_env(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "OPENAI_API_KEY",
            ProviderKind::Anthropic => "ANTHROPIC_API_KEY",
        }
    }

    /// Models offered for selection
    pub fn known_models(&self) -> &'static [&'static str] {
        match self {
            ProviderKind::OpenAi => OPENAI_MODELS,
            ProviderKind::Anthropic => ANTHROPIC_MODELS,
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "gpt-4o-mini",
            ProviderKind::Anthropic => "claude-3-5-sonnet-latest",
        }
    }

    /// Whether `model` belongs to this provider, either listed or by family prefix
    pub fn supports_model(&self, model: &str) -> bool {
        if model.trim().is_empty() {
            return false;
        }
        if self.known_models().contains(&model) {
            return true;
        }
        let prefixes: &[&str] = match self {
            ProviderKind::OpenAi => &["gpt-", "o1", "o3", "o4", "chatgpt-"],
            ProviderKind::Anthropic => &["claude-"],
        };
        prefixes.iter().any(|p| model.starts_with(p))
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAi),
            "anthropic" => Ok(ProviderKind::Anthropic),
            _ => Err(Error::UnsupportedProvider {
                provider: s.to_string(),
            }),
        }
    }
}

/// A credential that never shows up in Debug output
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("Secret(<empty>)")
        } else {
            f.write_str("Secret(***)")
        }
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// The single live provider configuration of an [`crate::AiService`]
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub provider: ProviderKind,
    pub model: String,
    pub credential: Secret,
    /// Override for the provider's API root (proxies, tests)
    pub base_url: Option<String>,
    pub timeout_secs: u64,
}

impl ProviderConfig {
    pub fn new(provider: ProviderKind, model: impl Into<String>, credential: impl Into<Secret>) -> Self {
        Self {
            provider,
            model: model.into(),
            credential: credential.into(),
            base_url: None,
            timeout_secs: crate::http::DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn effective_base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.provider.default_base_url())
    }

    /// Reject configurations that could never produce a working client
    pub fn validate(&self) -> Result<()> {
        if self.credential.is_empty() {
            return Err(Error::configuration("API key is required"));
        }
        if !self.provider.supports_model(&self.model) {
            return Err(Error::configuration(format!(
                "Model '{}' is not available for provider '{}'",
                self.model, self.provider
            )));
        }
        if let Some(base_url) = &self.base_url {
            url::Url::parse(base_url).map_err(|e| {
                Error::configuration(format!("Invalid base URL '{}': {}", base_url, e))
            })?;
        }
        if self.timeout_secs == 0 {
            return Err(Error::configuration("Timeout must be at least one second"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Completion request / result
// ---------------------------------------------------------------------------

/// Message role in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// A single message in a completion request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Requested response format, for providers that support one natively
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseFormat {
    Text,
    JsonObject,
}

/// Sampling options and provider-specific extras for one completion
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompletionOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,

    /// Passed through to the provider body as-is
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CompletionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn json_object(mut self) -> Self {
        self.response_format = Some(ResponseFormat::JsonObject);
        self
    }

    pub fn extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

/// Provider-independent completion payload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionResult {
    pub content: Option<String>,
}

impl CompletionResult {
    pub fn new(content: Option<String>) -> Self {
        Self { content }
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
        }
    }

    /// Content when present and not just whitespace
    pub fn non_empty(&self) -> Option<&str> {
        self.content.as_deref().filter(|c| !c.trim().is_empty())
    }
}

// ---------------------------------------------------------------------------
// Matches
// ---------------------------------------------------------------------------

/// How a text span relates to a property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    Exact,
    Semantic,
    Partial,
}

impl MatchType {
    /// Match type implied by a confidence score
    pub fn from_confidence(confidence: u8) -> Self {
        match ConfidenceBand::of(confidence) {
            ConfidenceBand::Exact => MatchType::Exact,
            ConfidenceBand::Semantic => MatchType::Semantic,
            ConfidenceBand::Partial | ConfidenceBand::Low => MatchType::Partial,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchType::Exact => "exact",
            MatchType::Semantic => "semantic",
            MatchType::Partial => "partial",
        }
    }
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Confidence ranges the analysis prompt asks the model to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfidenceBand {
    Low,
    Partial,
    Semantic,
    Exact,
}

impl ConfidenceBand {
    pub fn of(confidence: u8) -> Self {
        match confidence {
            90..=u8::MAX => ConfidenceBand::Exact,
            60..=89 => ConfidenceBand::Semantic,
            30..=59 => ConfidenceBand::Partial,
            _ => ConfidenceBand::Low,
        }
    }
}

/// Character span in the analyzed text, end exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchPosition {
    pub start: usize,
    pub end: usize,
}

impl MatchPosition {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `0 <= start <= end <= text_len`
    pub fn is_within(&self, text_len: usize) -> bool {
        self.start <= self.end && self.end <= text_len
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatValidation {
    pub is_valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// A claimed correspondence between a text span and a schema property
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    /// Dotted path into the JSON structure, e.g. `address.city`
    pub property: String,
    pub matched_text: String,
    pub position: MatchPosition,
    /// 0-100
    pub confidence: u8,
    pub match_type: MatchType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format_validation: Option<FormatValidation>,
}

impl MatchResult {
    pub fn new(
        property: impl Into<String>,
        matched_text: impl Into<String>,
        position: MatchPosition,
        confidence: u8,
        match_type: MatchType,
    ) -> Self {
        Self {
            property: property.into(),
            matched_text: matched_text.into(),
            position,
            confidence,
            match_type,
            suggestions: None,
            data_type: None,
            format_validation: None,
        }
    }

    /// Whether this match is confident enough to be applied
    pub fn is_actionable(&self) -> bool {
        self.confidence >= MIN_CONFIDENCE
    }

    pub fn band(&self) -> ConfidenceBand {
        ConfidenceBand::of(self.confidence)
    }
}

/// Stable sort, highest confidence first
pub fn sort_by_confidence(matches: &mut [MatchResult]) {
    matches.sort_by(|a, b| b.confidence.cmp(&a.confidence));
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Parse failure details for user-supplied JSON
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
}

impl JsonError {
    pub fn from_serde(err: &serde_json::Error) -> Self {
        let (line, column) = if err.line() > 0 {
            (Some(err.line()), Some(err.column()))
        } else {
            (None, None)
        };
        Self {
            message: err.to_string(),
            line,
            column,
        }
    }
}

impl fmt::Display for JsonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Outcome of any JSON parse/validate step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonError>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatted: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
}

impl ValidationResult {
    pub fn valid(raw: String, formatted: String) -> Self {
        Self {
            is_valid: true,
            error: None,
            formatted: Some(formatted),
            raw: Some(raw),
        }
    }

    pub fn invalid(error: JsonError) -> Self {
        Self {
            is_valid: false,
            error: Some(error),
            formatted: None,
            raw: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_provider_kind_parsing() {
        assert_eq!("openai".parse::<ProviderKind>().unwrap(), ProviderKind::OpenAi);
        assert_eq!(" Anthropic ".parse::<ProviderKind>().unwrap(), ProviderKind::Anthropic);
        let err = "mistral".parse::<ProviderKind>().unwrap_err();
        assert!(matches!(err, Error::UnsupportedProvider { ref provider } if provider == "mistral"));
    }

    #[test]
    fn test_supported_models() {
        assert!(ProviderKind::OpenAi.supports_model("gpt-4o-mini"));
        assert!(ProviderKind::OpenAi.supports_model("o1-mini"));
        assert!(ProviderKind::OpenAi.supports_model("gpt-4.1"));
        assert!(!ProviderKind::OpenAi.supports_model("claude-2.1"));
        assert!(ProviderKind::Anthropic.supports_model("claude-3-opus-20240229"));
        assert!(!ProviderKind::Anthropic.supports_model("gpt-4"));
        assert!(!ProviderKind::Anthropic.supports_model(""));
    }

    #[test]
    fn test_secret_debug_is_redacted() {
        let config = ProviderConfig::new(ProviderKind::OpenAi, "gpt-4", "sk-very-secret");
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("sk-very-secret"));
        assert!(rendered.contains("Secret(***)"));
    }

    #[test]
    fn test_provider_config_validation() {
        assert!(ProviderConfig::new(ProviderKind::OpenAi, "gpt-4", "sk").validate().is_ok());
        assert!(ProviderConfig::new(ProviderKind::OpenAi, "gpt-4", "  ").validate().is_err());
        assert!(ProviderConfig::new(ProviderKind::Anthropic, "gpt-4", "key").validate().is_err());
        assert!(ProviderConfig::new(ProviderKind::OpenAi, "gpt-4", "sk")
            .with_base_url("not a url")
            .validate()
            .is_err());
        assert!(ProviderConfig::new(ProviderKind::OpenAi, "gpt-4", "sk")
            .with_timeout(0)
            .validate()
            .is_err());
    }

    #[test]
    fn test_completion_options_serialization() {
        let options = CompletionOptions::new()
            .temperature(0.2)
            .json_object()
            .extra("seed", json!(7));
        let value = serde_json::to_value(&options).unwrap();
        assert_eq!(value["response_format"], json!({"type": "json_object"}));
        assert_eq!(value["seed"], json!(7));
        assert!(value.get("max_tokens").is_none());
    }

    #[test]
    fn test_match_result_wire_format() {
        let value = json!({
            "property": "name",
            "matchedText": "John Smith",
            "position": {"start": 0, "end": 10},
            "confidence": 95,
            "matchType": "exact"
        });
        let parsed: MatchResult = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(parsed.matched_text, "John Smith");
        assert_eq!(parsed.match_type, MatchType::Exact);
        assert!(parsed.is_actionable());
        assert_eq!(serde_json::to_value(&parsed).unwrap(), value);
    }

    #[test]
    fn test_confidence_bands() {
        assert_eq!(ConfidenceBand::of(100), ConfidenceBand::Exact);
        assert_eq!(ConfidenceBand::of(90), ConfidenceBand::Exact);
        assert_eq!(ConfidenceBand::of(89), ConfidenceBand::Semantic);
        assert_eq!(ConfidenceBand::of(30), ConfidenceBand::Partial);
        assert_eq!(ConfidenceBand::of(29), ConfidenceBand::Low);
        assert_eq!(MatchType::from_confidence(12), MatchType::Partial);
    }

    #[test]
    fn test_sort_by_confidence_is_stable() {
        let pos = MatchPosition::new(0, 1);
        let mut matches = vec![
            MatchResult::new("a", "first", pos, 50, MatchType::Partial),
            MatchResult::new("b", "x", pos, 90, MatchType::Exact),
            MatchResult::new("a", "second", pos, 50, MatchType::Partial),
        ];
        sort_by_confidence(&mut matches);
        assert_eq!(matches[0].property, "b");
        assert_eq!(matches[1].matched_text, "first");
        assert_eq!(matches[2].matched_text, "second");
    }

    #[test]
    fn test_position_bounds() {
        assert!(MatchPosition::new(0, 10).is_within(10));
        assert!(!MatchPosition::new(5, 4).is_within(10));
        assert!(!MatchPosition::new(0, 11).is_within(10));
        assert_eq!(MatchPosition::new(3, 7).len(), 4);
    }
}
