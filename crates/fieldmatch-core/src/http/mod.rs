//! HTTP plumbing for provider API communication
//!
//! This module provides:
//! - Authentication handling for the built-in providers
//! - Error classification and normalization
//! - A JSON POST client bound to one provider and credential

pub mod auth;
pub mod client;
pub mod error;

pub use auth::{create_auth_handler, AuthHandler};
pub use client::{HttpClient, HttpClientConfig, DEFAULT_TIMEOUT_SECS};
pub use error::{ErrorClassification, HttpError};
