//! Error types for the fieldmatch core library
//!
//! JSON parse failures on user input are not errors here; they are reported
//! through [`crate::types::ValidationResult`]. Everything in this module is a
//! condition the caller has to act on (configure, retry, fall back).

use crate::http::ErrorClassification;
use thiserror::Error;

/// Main error type for fieldmatch operations
#[derive(Error, Debug)]
pub enum Error {
    /// An operation needed a provider but none is configured
    #[error("AI service not properly configured. Please check your API key and settings.")]
    NotConfigured,

    /// The provider key is not one we can talk to
    #[error("Unsupported provider: {provider}")]
    UnsupportedProvider { provider: String },

    /// The provider answered, but not with the JSON shape we asked for
    #[error("Invalid response format from provider: {message}")]
    InvalidResponseFormat { message: String },

    /// Transport, authentication or HTTP-level failure from a provider
    #[error("Provider error: {provider} - {message}")]
    Provider {
        provider: String,
        message: String,
        status_code: Option<u16>,
        classification: ErrorClassification,
    },

    /// Configuration values that can never produce a working client
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// JSON serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Error::InvalidResponseFormat {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
        }
    }

    /// Whether retrying the same call later could succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Provider { classification, .. } => classification.is_retryable(),
            _ => false,
        }
    }

    /// HTTP status code when the error came from a provider response
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Provider { status_code, .. } => *status_code,
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json {
            message: err.to_string(),
            source: err,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::UnsupportedProvider {
            provider: "cohere".to_string(),
        };
        assert_eq!(err.to_string(), "Unsupported provider: cohere");

        let err = Error::invalid_response("missing matches array");
        assert_eq!(
            err.to_string(),
            "Invalid response format from provider: missing matches array"
        );
    }

    #[test]
    fn test_retryable_only_for_transient_provider_errors() {
        let rate_limited = Error::Provider {
            provider: "openai".to_string(),
            message: "slow down".to_string(),
            status_code: Some(429),
            classification: ErrorClassification::RateLimitError,
        };
        assert!(rate_limited.is_retryable());
        assert_eq!(rate_limited.status_code(), Some(429));

        let unauthorized = Error::Provider {
            provider: "anthropic".to_string(),
            message: "invalid x-api-key".to_string(),
            status_code: Some(401),
            classification: ErrorClassification::AuthenticationError,
        };
        assert!(!unauthorized.is_retryable());
        assert!(!Error::NotConfigured.is_retryable());
    }

    #[test]
    fn test_json_error_conversion() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: Error = parse_err.into();
        assert!(matches!(err, Error::Json { .. }));
        assert!(err.to_string().starts_with("JSON error:"));
    }
}
