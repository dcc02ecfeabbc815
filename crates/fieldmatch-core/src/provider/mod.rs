//! Provider adapter
//!
//! One request/response contract over interchangeable LLM backends. Callers
//! hand over a list of [`Message`]s plus [`CompletionOptions`] and get back a
//! [`CompletionResult`]; how each backend shapes its messages, limits tokens
//! and wraps its answer stays inside the variant modules.
//!
//! Adding a backend means adding a variant module with a request builder and
//! a response parser, and a [`ProviderClient`] arm. Code outside this module
//! only sees the [`CompletionProvider`] trait.

pub mod anthropic;
pub mod openai;
pub mod scripted;
pub mod service;

pub use anthropic::AnthropicClient;
pub use openai::OpenAiClient;
pub use scripted::{RecordedRequest, ScriptedProvider};
pub use service::AiService;

use crate::error::{Error, Result};
use crate::types::{CompletionOptions, CompletionResult, Message, ProviderConfig, ProviderKind};
use async_trait::async_trait;

/// Anything that can turn a conversation into a completion
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn create_completion(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<CompletionResult>;
}

/// A provider answered with an envelope we cannot read
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("{provider} response is not a JSON object")]
    NotAnObject { provider: &'static str },

    #[error("{provider} response has no '{field}' array")]
    MissingArray {
        provider: &'static str,
        field: &'static str,
    },
}

impl From<ParseError> for Error {
    fn from(err: ParseError) -> Self {
        Error::invalid_response(err.to_string())
    }
}

/// Built-in provider variants, selected by [`ProviderKind`]
#[derive(Debug, Clone)]
pub enum ProviderClient {
    OpenAi(OpenAiClient),
    Anthropic(AnthropicClient),
}

impl ProviderClient {
    /// Validate the configuration and build the matching client
    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        config.validate()?;
        match config.provider {
            ProviderKind::OpenAi => Ok(ProviderClient::OpenAi(OpenAiClient::new(config)?)),
            ProviderKind::Anthropic => Ok(ProviderClient::Anthropic(AnthropicClient::new(config)?)),
        }
    }

    pub fn kind(&self) -> ProviderKind {
        match self {
            ProviderClient::OpenAi(_) => ProviderKind::OpenAi,
            ProviderClient::Anthropic(_) => ProviderKind::Anthropic,
        }
    }

    pub fn model(&self) -> &str {
        match self {
            ProviderClient::OpenAi(client) => client.model(),
            ProviderClient::Anthropic(client) => client.model(),
        }
    }
}

#[async_trait]
impl CompletionProvider for ProviderClient {
    async fn create_completion(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<CompletionResult> {
        match self {
            ProviderClient::OpenAi(client) => client.create_completion(messages, options).await,
            ProviderClient::Anthropic(client) => client.create_completion(messages, options).await,
        }
    }
}
