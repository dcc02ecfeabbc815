//! The configured provider, shared by every engine
//!
//! `AiService` holds at most one live configuration. It is passed around
//! explicitly (usually as `Arc<AiService>`), so tests and concurrent callers
//! can each own an independent instance.
//!
//! States: Unconfigured -> Configured on a successful [`AiService::configure`].
//! A failed configure always leaves the service Unconfigured; the previous
//! configuration is dropped rather than kept around with stale credentials.

use super::{CompletionProvider, ProviderClient};
use crate::error::{Error, Result};
use crate::types::{CompletionOptions, CompletionResult, Message, ProviderConfig, ProviderKind};
use async_trait::async_trait;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;
use tracing::{info, warn};

/// A validated configuration together with the client built from it
#[derive(Debug)]
pub struct ActiveProvider {
    config: ProviderConfig,
    client: ProviderClient,
}

impl ActiveProvider {
    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    pub fn client(&self) -> &ProviderClient {
        &self.client
    }
}

#[derive(Debug, Default)]
pub struct AiService {
    active: RwLock<Option<Arc<ActiveProvider>>>,
}

impl AiService {
    /// An unconfigured service
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a service and configure it in one step
    pub fn with_config(config: ProviderConfig) -> Result<Self> {
        let client = ProviderClient::from_config(&config)?;
        Ok(Self {
            active: RwLock::new(Some(Arc::new(ActiveProvider { config, client }))),
        })
    }

    /// Replace the configuration; `false` (and Unconfigured) on invalid input
    pub fn configure(&self, config: ProviderConfig) -> bool {
        let mut active = self.active.write().unwrap_or_else(PoisonError::into_inner);
        *active = None;

        match ProviderClient::from_config(&config) {
            Ok(client) => {
                info!(
                    provider = %config.provider,
                    model = %config.model,
                    "AI service configured"
                );
                *active = Some(Arc::new(ActiveProvider { config, client }));
                true
            }
            Err(e) => {
                warn!(
                    provider = %config.provider,
                    model = %config.model,
                    error = %e,
                    "Failed to configure AI service"
                );
                false
            }
        }
    }

    /// [`configure`](Self::configure) from a provider key as typed by a user
    ///
    /// An unknown key is an [`Error::UnsupportedProvider`]; the service is
    /// left Unconfigured in that case too.
    pub fn configure_named(&self, provider: &str, model: &str, credential: &str) -> Result<bool> {
        let kind = match provider.parse::<ProviderKind>() {
            Ok(kind) => kind,
            Err(e) => {
                self.reset();
                return Err(e);
            }
        };
        Ok(self.configure(ProviderConfig::new(kind, model, credential)))
    }

    /// Drop the current configuration
    pub fn reset(&self) {
        *self.active.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn is_configured(&self) -> bool {
        self.snapshot().is_some()
    }

    pub fn provider(&self) -> Option<ProviderKind> {
        self.snapshot().map(|active| active.config.provider)
    }

    pub fn model(&self) -> Option<String> {
        self.snapshot().map(|active| active.config.model.clone())
    }

    /// The live configuration, captured atomically
    pub fn snapshot(&self) -> Option<Arc<ActiveProvider>> {
        self.active
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl CompletionProvider for AiService {
    async fn create_completion(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<CompletionResult> {
        // The lock is released before the request goes out; a reconfigure
        // during the call does not affect it.
        let active = self.snapshot().ok_or(Error::NotConfigured)?;

        let start = Instant::now();
        let result = active.client.create_completion(messages, options).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        match &result {
            Ok(completion) => info!(
                provider = %active.config.provider,
                model = %active.config.model,
                messages = messages.len(),
                has_content = completion.content.is_some(),
                duration_ms,
                "Completion finished"
            ),
            Err(e) => warn!(
                provider = %active.config.provider,
                model = %active.config.model,
                duration_ms,
                error = %e,
                "Completion failed"
            ),
        }
        result
    }
}
