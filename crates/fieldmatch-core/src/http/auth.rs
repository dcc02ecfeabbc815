//! Authentication handling for provider APIs
//!
//! Supports the two schemes the built-in providers use:
//! - Bearer tokens (OpenAI)
//! - API keys in headers (Anthropic)

use crate::types::{ProviderKind, Secret};
use crate::{Error, Result};
use std::collections::HashMap;

/// Version header Anthropic requires on every request
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Trait for handling provider-specific authentication
pub trait AuthHandler: Send + Sync {
    /// Apply authentication to request headers
    fn apply_auth(&self, headers: &mut HashMap<String, String>) -> Result<()>;

    /// Validate that required credentials are available
    fn validate_credentials(&self) -> Result<()>;
}

/// OpenAI authentication handler (Bearer token)
#[derive(Debug, Clone)]
pub struct OpenAIAuth {
    api_key: Secret,
}

impl OpenAIAuth {
    pub fn new(api_key: Secret) -> Self {
        Self { api_key }
    }
}

impl AuthHandler for OpenAIAuth {
    fn apply_auth(&self, headers: &mut HashMap<String, String>) -> Result<()> {
        self.validate_credentials()?;
        headers.insert(
            "Authorization".to_string(),
            format!("Bearer {}", self.api_key.expose()),
        );
        Ok(())
    }

    fn validate_credentials(&self) -> Result<()> {
        if self.api_key.is_empty() {
            return Err(Error::configuration("OpenAI API key not configured"));
        }
        Ok(())
    }
}

/// Anthropic authentication handler (x-api-key header)
#[derive(Debug, Clone)]
pub struct AnthropicAuth {
    api_key: Secret,
}

impl AnthropicAuth {
    pub fn new(api_key: Secret) -> Self {
        Self { api_key }
    }
}

impl AuthHandler for AnthropicAuth {
    fn apply_auth(&self, headers: &mut HashMap<String, String>) -> Result<()> {
        self.validate_credentials()?;
        headers.insert("x-api-key".to_string(), self.api_key.expose().to_string());
        headers.insert(
            "anthropic-version".to_string(),
            ANTHROPIC_VERSION.to_string(),
        );
        Ok(())
    }

    fn validate_credentials(&self) -> Result<()> {
        if self.api_key.is_empty() {
            return Err(Error::configuration("Anthropic API key not configured"));
        }
        Ok(())
    }
}

/// Factory for creating the auth handler a provider expects
pub fn create_auth_handler(provider: ProviderKind, api_key: Secret) -> Box<dyn AuthHandler> {
    match provider {
        ProviderKind::OpenAi => Box::new(OpenAIAuth::new(api_key)),
        ProviderKind::Anthropic => Box::new(AnthropicAuth::new(api_key)),
    }
}
