//! Fieldmatch Core - JSON structure + free text -> confidence-scored field matches
//!
//! This crate finds where the properties of a JSON document are mentioned in
//! a piece of free text, with help from an LLM provider, and writes the
//! confident findings back into the document.
//!
//! # Main Components
//!
//! - **Normalizer**: strict parsing, canonical raw/display projections,
//!   markup stripping and structural comparison of JSON documents
//! - **Provider Adapter**: one completion contract over OpenAI and Anthropic,
//!   held by an explicitly passed [`AiService`]
//! - **Match Engine**: [`MatchEngine::analyze`] turns text + structure into
//!   validated [`MatchResult`]s
//! - **Reconciliation Engine**: [`ReconciliationEngine::update`] applies
//!   matches at or above [`MIN_CONFIDENCE`]
//! - **Enhancement Pass**: [`EnhancementEngine::enhance`] fills empty fields
//!   without touching populated ones
//!
//! # Example
//!
//! ```no_run
//! use fieldmatch_core::{
//!     AiService, MatchEngine, ProviderConfig, ProviderKind, ReconciliationEngine, Result,
//! };
//! use std::sync::Arc;
//!
//! async fn example() -> Result<()> {
//!     let service = Arc::new(AiService::new());
//!     service.configure(ProviderConfig::new(ProviderKind::OpenAi, "gpt-4o-mini", "sk-..."));
//!
//!     let schema = r#"{"name": "", "age": 0}"#;
//!     let matches = MatchEngine::new(service.clone())
//!         .analyze("John Smith is 30 years old", schema)
//!         .await?;
//!
//!     let updated = ReconciliationEngine::deterministic()
//!         .update(schema, &matches)
//!         .await?;
//!     println!("{}", updated);
//!     Ok(())
//! }
//! ```

pub mod analysis;
pub mod enhance;
pub mod error;
pub mod http;
pub mod normalizer;
pub mod prompts;
pub mod provider;
pub mod reconcile;
pub mod types;

// Re-export main types for convenience
pub use analysis::MatchEngine;
pub use enhance::EnhancementEngine;
pub use error::{Error, Result};
pub use http::{ErrorClassification, HttpError};
pub use normalizer::{
    check_structure, check_structure_str, format_for_display, strip_formatting,
    validate_and_format, HtmlTextExtractor, JsonDocument, StructureCheck, TextExtractor,
};
pub use provider::{AiService, CompletionProvider, ProviderClient, ScriptedProvider};
pub use reconcile::{select_matches, ReconcileStrategy, ReconciliationEngine};
pub use types::{
    // Configuration
    ProviderConfig, ProviderKind, Secret,

    // Completion request / result
    CompletionOptions, CompletionResult, Message, MessageRole, ResponseFormat,

    // Matches
    sort_by_confidence, ConfidenceBand, FormatValidation, MatchPosition, MatchResult, MatchType,
    MIN_CONFIDENCE,

    // Validation
    JsonError, ValidationResult,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
