//! OpenAI chat completions
//!
//! Messages, model and options go to the API as they are; the answer is the
//! first choice's message content.

use super::{CompletionProvider, ParseError};
use crate::error::Result;
use crate::http::{HttpClient, HttpClientConfig};
use crate::types::{CompletionOptions, CompletionResult, Message, ProviderConfig, ProviderKind};
use async_trait::async_trait;
use serde_json::{json, Map, Value};

pub const CHAT_COMPLETIONS_PATH: &str = "/v1/chat/completions";

const PROVIDER: &str = "openai";

#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: HttpClient,
    model: String,
}

impl OpenAiClient {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let http = HttpClient::new(
            ProviderKind::OpenAi,
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

/// Request body: caller options first, then messages and model on top
pub fn build_request(model: &str, messages: &[Message], options: &CompletionOptions) -> Value {
    let mut body = match serde_json::to_value(options) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    };
    body.insert("messages".to_string(), json!(messages));
    body.insert("model".to_string(), Value::String(model.to_string()));
    Value::Object(body)
}

/// `choices[0].message.content`, `None` when any nested level is absent
pub fn parse_response(response: &Value) -> std::result::Result<CompletionResult, ParseError> {
    let object = response
        .as_object()
        .ok_or(ParseError::NotAnObject { provider: PROVIDER })?;
    let choices = object
        .get("choices")
        .and_then(Value::as_array)
        .ok_or(ParseError::MissingArray {
            provider: PROVIDER,
            field: "choices",
        })?;

    let content = choices
        .first()
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(Value::as_str)
        .map(str::to_string);

    Ok(CompletionResult::new(content))
}

#[async_trait]
impl CompletionProvider for OpenAiClient {
    async fn create_completion(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<CompletionResult> {
        let body = build_request(&self.model, messages, options);
        let response = self.http.post_json(CHAT_COMPLETIONS_PATH, &body).await?;
        Ok(parse_response(&response)?)
    }
}
