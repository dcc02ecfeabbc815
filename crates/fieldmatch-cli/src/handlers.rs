//! Command handlers for CLI subcommands
//!
//! This module contains the implementation logic for each CLI subcommand.
//! Handlers that talk to a provider receive the loaded [`Config`] and the
//! provider flags; everything they print goes through the [`OutputWriter`].
//!
//! [`Config`]: crate::config::Config
//! [`OutputWriter`]: crate::output::OutputWriter

mod analyze;
mod apply;
mod completions;
mod config;
mod enhance;
mod models;
mod utils;
mod validate;

pub use analyze::handle_analyze;
pub use apply::handle_apply;
pub use completions::handle_completions;
pub use config::handle_config;
pub use enhance::handle_enhance;
pub use models::handle_models;
pub use validate::handle_validate;
