//! Authenticated JSON-over-HTTP client shared by the provider adapters
//!
//! No retries happen here: a failed call surfaces immediately and the caller
//! decides whether to try again.

use crate::http::{create_auth_handler, AuthHandler, HttpError};
use crate::types::{ProviderKind, Secret};
use crate::{Error, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client as ReqwestClient;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Base URL the endpoint paths are appended to
    pub base_url: String,
}

impl HttpClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            base_url: base_url.into(),
        }
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

/// HTTP client bound to one provider and one credential
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
    provider: ProviderKind,
    auth_handler: Arc<dyn AuthHandler>,
    config: HttpClientConfig,
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("provider", &self.provider)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl HttpClient {
    /// Create a new HTTP client for a provider
    pub fn new(provider: ProviderKind, api_key: Secret, config: HttpClientConfig) -> Result<Self> {
        let auth_handler: Arc<dyn AuthHandler> = Arc::from(create_auth_handler(provider, api_key));
        auth_handler.validate_credentials()?;

        let client = ReqwestClient::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            provider,
            auth_handler,
            config,
        })
    }

    /// Full URL for an endpoint path such as `/v1/messages`
    pub fn endpoint_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// POST a JSON body and return the decoded JSON response
    pub async fn post_json(&self, path: &str, body: &Value) -> Result<Value> {
        let provider = self.provider.as_str();
        let url = self.endpoint_url(path);

        let mut auth_headers = HashMap::new();
        self.auth_handler.apply_auth(&mut auth_headers)?;
        let headers = to_header_map(auth_headers)?;

        debug!(provider, url = %url, "Sending provider request");

        let response = self
            .client
            .post(&url)
            .headers(headers)
            .json(body)
            .send()
            .await
            .map_err(|e| HttpError::from_request_error(provider, e))?;

        if !response.status().is_success() {
            let error = HttpError::from_response(provider, response).await;
            return Err(error.into());
        }

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| HttpError::from_request_error(provider, e))?;
        debug!(provider, status = status.as_u16(), bytes = text.len(), "Provider responded");

        serde_json::from_str(&text).map_err(|e| {
            Error::invalid_response(format!("{} response body is not JSON: {}", provider, e))
        })
    }

    pub fn provider(&self) -> ProviderKind {
        self.provider
    }

    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }
}

fn to_header_map(headers: HashMap<String, String>) -> Result<HeaderMap> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (key, value) in headers {
        let name = HeaderName::from_bytes(key.as_bytes())
            .map_err(|e| Error::configuration(format!("Invalid header name {}: {}", key, e)))?;
        let value = HeaderValue::from_str(&value)
            .map_err(|_| Error::configuration(format!("Invalid value for header {}", key)))?;
        map.insert(name, value);
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_url_joins_slashes() {
        let client = HttpClient::new(
            ProviderKind::OpenAi,
            Secret::new("sk-test"),
            HttpClientConfig::new("https://api.openai.com/"),
        )
        .unwrap();

        assert_eq!(
            client.endpoint_url("/v1/chat/completions"),
            "https://api.openai.com/v1/chat/completions"
        );
        assert_eq!(client.provider(), ProviderKind::OpenAi);
        assert_eq!(client.config().timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn test_empty_credential_rejected() {
        let result = HttpClient::new(
            ProviderKind::Anthropic,
            Secret::new(""),
            HttpClientConfig::new("https://api.anthropic.com"),
        );
        assert!(matches!(result, Err(Error::Configuration { .. })));
    }

    #[test]
    fn test_header_value_with_newline_rejected() {
        let mut headers = HashMap::new();
        headers.insert("x-api-key".to_string(), "bad\nkey".to_string());
        assert!(to_header_map(headers).is_err());
    }
}
