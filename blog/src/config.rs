//! Settings resolution for the `blog` binary.

use std::path::Path;

use backoffice_core::settings_loader;
use backoffice_core::{AdminResult, Settings};

/// Configuration file picked up from the working directory when no
/// `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "blog.toml";

/// Resolves settings: an explicit file, else `blog.toml` if present, else
/// defaults. Environment overrides apply in every case.
pub fn load_settings(config: Option<&Path>) -> AdminResult<Settings> {
    match config {
        Some(path) => settings_loader::from_toml_file_with_env(path),
        None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
            settings_loader::from_toml_file_with_env(DEFAULT_CONFIG_FILE)
        }
        None => Ok(settings_loader::from_env()),
    }
}
