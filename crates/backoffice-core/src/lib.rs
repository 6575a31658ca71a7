//! # backoffice-core
//!
//! Core types shared by the back-office crates. This crate has no web or
//! storage dependencies.
//!
//! ## Modules
//!
//! - [`error`] - Error types and result aliases
//! - [`settings`] - Runtime configuration
//! - [`settings_loader`] - Loading settings from TOML files and the environment
//! - [`logging`] - Tracing-based logging integration
//! - [`checks`] - Diagnostic messages produced by configuration checks

pub mod checks;
pub mod error;
pub mod logging;
pub mod settings;
pub mod settings_loader;

// Re-export the most commonly used types at the crate root.
pub use error::{AdminError, AdminResult, ValidationError, NON_FIELD_ERRORS};
pub use settings::Settings;
