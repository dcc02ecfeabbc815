//! Anthropic messages API
//!
//! System text has no message slot here, so it is folded into the first
//! user message. `max_tokens` is mandatory for this API and defaults to
//! [`DEFAULT_MAX_TOKENS`].

use super::{CompletionProvider, ParseError};
use crate::error::Result;
use crate::http::{HttpClient, HttpClientConfig};
use crate::types::{
    CompletionOptions, CompletionResult, Message, MessageRole, ProviderConfig, ProviderKind,
};
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tracing::debug;

pub const MESSAGES_PATH: &str = "/v1/messages";

pub const DEFAULT_MAX_TOKENS: u32 = 4096;

const PROVIDER: &str = "anthropic";

#[derive(Debug, Clone)]
pub struct AnthropicClient {
    http: HttpClient,
    model: String,
}

impl AnthropicClient {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let http = HttpClient::new(
            ProviderKind::Anthropic,
            config.credential.clone(),
            HttpClientConfig::new(config.effective_base_url()).with_timeout(config.timeout_secs),
        )?;
        Ok(Self {
            http,
            model: config.model.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

/// Fold system messages into the first user message
///
/// System contents are joined with blank lines and prepended to the first
/// user message, separated from it by a blank line. Without any user
/// message the system text becomes the opening user message.
pub fn flatten_messages(messages: &[Message]) -> Vec<Message> {
    let system = messages
        .iter()
        .filter(|m| m.role == MessageRole::System)
        .map(|m| m.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    let mut flattened: Vec<Message> = messages
        .iter()
        .filter(|m| m.role != MessageRole::System)
        .cloned()
        .collect();

    if system.is_empty() {
        return flattened;
    }

    match flattened.iter_mut().find(|m| m.role == MessageRole::User) {
        Some(first_user) => {
            first_user.content = format!("{}\n\n{}", system, first_user.content);
        }
        None => flattened.insert(0, Message::user(system)),
    }
    flattened
}

pub fn build_request(model: &str, messages: &[Message], options: &CompletionOptions) -> Value {
    let mut body = match serde_json::to_value(options) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    };
    if body.remove("response_format").is_some() {
        debug!("response_format is not supported by anthropic, dropping it");
    }

    let max_tokens = options
        .max_tokens
        .filter(|&n| n > 0)
        .unwrap_or(DEFAULT_MAX_TOKENS);

    body.insert("messages".to_string(), json!(flatten_messages(messages)));
    body.insert("model".to_string(), Value::String(model.to_string()));
    body.insert("max_tokens".to_string(), json!(max_tokens));
    Value::Object(body)
}

/// Text of the first content block, `None` when that block is not text
pub fn parse_response(response: &Value) -> std::result::Result<CompletionResult, ParseError> {
    let object = response
        .as_object()
        .ok_or(ParseError::NotAnObject { provider: PROVIDER })?;
    let blocks = object
        .get("content")
        .and_then(Value::as_array)
        .ok_or(ParseError::MissingArray {
            provider: PROVIDER,
            field: "content",
        })?;

    let content = blocks
        .first()
        .filter(|block| block.get("type").and_then(Value::as_str) == Some("text"))
        .and_then(|block| block.get("text"))
        .and_then(Value::as_str)
        .map(str::to_string);

    Ok(CompletionResult::new(content))
}

#[async_trait]
impl CompletionProvider for AnthropicClient {
    async fn create_completion(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<CompletionResult> {
        let body = build_request(&self.model, messages, options);
        let response = self.http.post_json(MESSAGES_PATH, &body).await?;
        Ok(parse_response(&response)?)
    }
}
