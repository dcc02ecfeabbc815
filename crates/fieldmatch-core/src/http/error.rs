//! Provider HTTP failures
//!
//! Both providers wrap failures in an `error` envelope; this module pulls
//! out the message and code and classifies the status so callers can tell
//! a bad key from a transient outage.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Classification of HTTP errors, used by callers deciding whether to retry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorClassification {
    /// Any other 4xx
    ClientError,
    /// 5xx
    ServerError,
    /// Connect failures and timeouts
    NetworkError,
    /// 429
    RateLimitError,
    /// 401 and 403
    AuthenticationError,
    Unknown,
}

impl ErrorClassification {
    /// Transient failures that may succeed when sent again
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorClassification::ServerError
                | ErrorClassification::NetworkError
                | ErrorClassification::RateLimitError
        )
    }
}

impl fmt::Display for ErrorClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorClassification::ClientError => "client error",
            ErrorClassification::ServerError => "server error",
            ErrorClassification::NetworkError => "network error",
            ErrorClassification::RateLimitError => "rate limited",
            ErrorClassification::AuthenticationError => "authentication error",
            ErrorClassification::Unknown => "unknown error",
        };
        write!(f, "{}", label)
    }
}

/// Normalized HTTP error representation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpError {
    /// Provider that produced the error
    pub provider: String,
    /// HTTP status code if available
    pub status_code: Option<u16>,
    /// Error classification
    pub classification: ErrorClassification,
    /// Provider-specific error code
    pub provider_code: Option<String>,
    /// Human-readable error message
    pub message: String,
}

impl HttpError {
    /// Create from a non-success reqwest Response
    pub async fn from_response(provider: &str, response: reqwest::Response) -> Self {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let details = serde_json::from_str::<Value>(&body).ok();
        let (provider_code, message) = Self::extract_provider_error(&details, &body);

        Self {
            provider: provider.to_string(),
            status_code: Some(status.as_u16()),
            classification: Self::classify_status(status),
            provider_code,
            message,
        }
    }

    /// Create from a network/request error
    pub fn from_request_error(provider: &str, error: reqwest::Error) -> Self {
        let classification = if error.is_timeout() || error.is_connect() {
            ErrorClassification::NetworkError
        } else {
            ErrorClassification::Unknown
        };

        Self {
            provider: provider.to_string(),
            status_code: error.status().map(|s| s.as_u16()),
            classification,
            provider_code: None,
            message: error.to_string(),
        }
    }

    /// Classify HTTP status code
    pub(crate) fn classify_status(status: StatusCode) -> ErrorClassification {
        match status.as_u16() {
            401 | 403 => ErrorClassification::AuthenticationError,
            429 => ErrorClassification::RateLimitError,
            400..=499 => ErrorClassification::ClientError,
            500..=599 => ErrorClassification::ServerError,
            _ => ErrorClassification::Unknown,
        }
    }

    /// Extract provider-specific error information
    pub(crate) fn extract_provider_error(
        details: &Option<Value>,
        body: &str,
    ) -> (Option<String>, String) {
        if let Some(json) = details {
            // OpenAI: {"error": {"code", "type", "message"}}
            // Anthropic: {"type": "error", "error": {"type", "message"}}
            if let Some(error) = json.get("error").filter(|e| e.is_object()) {
                let code = error
                    .get("code")
                    .and_then(|c| c.as_str())
                    .or_else(|| error.get("type").and_then(|t| t.as_str()))
                    .map(|s| s.to_string());
                let message = error
                    .get("message")
                    .and_then(|m| m.as_str())
                    .unwrap_or(body)
                    .to_string();
                return (code, message);
            }

            if let Some(error_type) = json.get("type").and_then(|t| t.as_str()) {
                let message = json
                    .get("message")
                    .and_then(|m| m.as_str())
                    .unwrap_or(body)
                    .to_string();
                return (Some(error_type.to_string()), message);
            }

            if let Some(message) = json.get("message").and_then(|m| m.as_str()) {
                return (None, message.to_string());
            }
        }

        (None, body.to_string())
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "HTTP Error [{}]: {} ({})",
            self.status_code
                .map(|c| c.to_string())
                .unwrap_or_else(|| "N/A".to_string()),
            self.message,
            self.classification
        )
    }
}

impl std::error::Error for HttpError {}

impl From<HttpError> for crate::Error {
    fn from(http_error: HttpError) -> Self {
        let message = match &http_error.provider_code {
            Some(code) => format!("{} ({})", http_error.message, code),
            None => http_error.message,
        };
        crate::Error::Provider {
            provider: http_error.provider,
            message,
            status_code: http_error.status_code,
            classification: http_error.classification,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(ErrorClassification::ServerError.is_retryable());
        assert!(ErrorClassification::NetworkError.is_retryable());
        assert!(ErrorClassification::RateLimitError.is_retryable());
        assert!(!ErrorClassification::ClientError.is_retryable());
        assert!(!ErrorClassification::AuthenticationError.is_retryable());
    }

    #[test]
    fn test_status_classification() {
        assert_eq!(
            HttpError::classify_status(StatusCode::UNAUTHORIZED),
            ErrorClassification::AuthenticationError
        );
        assert_eq!(
            HttpError::classify_status(StatusCode::TOO_MANY_REQUESTS),
            ErrorClassification::RateLimitError
        );
        assert_eq!(
            HttpError::classify_status(StatusCode::BAD_REQUEST),
            ErrorClassification::ClientError
        );
        assert_eq!(
            HttpError::classify_status(StatusCode::BAD_GATEWAY),
            ErrorClassification::ServerError
        );
    }

    #[test]
    fn test_openai_error_extraction() {
        let json = serde_json::json!({
            "error": {
                "code": "invalid_api_key",
                "type": "invalid_request_error",
                "message": "Incorrect API key provided"
            }
        });

        let (code, message) = HttpError::extract_provider_error(&Some(json), "raw body");
        assert_eq!(code.as_deref(), Some("invalid_api_key"));
        assert_eq!(message, "Incorrect API key provided");
    }

    #[test]
    fn test_anthropic_error_extraction() {
        let json = serde_json::json!({
            "type": "error",
            "error": {
                "type": "overloaded_error",
                "message": "Overloaded"
            }
        });

        let (code, message) = HttpError::extract_provider_error(&Some(json), "raw body");
        assert_eq!(code.as_deref(), Some("overloaded_error"));
        assert_eq!(message, "Overloaded");
    }

    #[test]
    fn test_plain_body_fallback() {
        let (code, message) = HttpError::extract_provider_error(&None, "Bad Gateway");
        assert_eq!(code, None);
        assert_eq!(message, "Bad Gateway");
    }

    #[test]
    fn test_conversion_into_provider_error() {
        let http_error = HttpError {
            provider: "openai".to_string(),
            status_code: Some(429),
            classification: ErrorClassification::RateLimitError,
            provider_code: Some("rate_limit_exceeded".to_string()),
            message: "Too many requests".to_string(),
        };

        let err: crate::Error = http_error.into();
        assert!(err.is_retryable());
        assert_eq!(
            err.to_string(),
            "Provider error: openai - Too many requests (rate_limit_exceeded)"
        );
    }
}
