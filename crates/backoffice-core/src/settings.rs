//! Runtime configuration for the back-office.
//!
//! [`Settings`] holds everything the binary needs to start: logging level,
//! bind address, where the two admin sites are mounted, and the bootstrap
//! account. Defaults are suitable for local development; see
//! [`settings_loader`](crate::settings_loader) for file and environment
//! overrides.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Credentials for the account created at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuperuserSettings {
    /// Login name.
    pub username: String,
    /// Plain-text password, hashed before it is stored.
    pub password: String,
}

impl Default for SuperuserSettings {
    fn default() -> Self {
        Self {
            username: "admin".to_string(),
            password: "admin".to_string(),
        }
    }
}

/// Back-office settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Debug mode: pretty logs instead of JSON.
    pub debug: bool,
    /// Tracing filter directive (e.g. `"info"`, `"backoffice_admin=debug"`).
    pub log_level: String,
    /// Interface to bind the HTTP server to.
    pub host: String,
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Directory served under `static_url`.
    pub static_dir: PathBuf,
    /// URL prefix of static assets, with a trailing slash.
    pub static_url: String,
    /// Mount point of the primary (staff) admin site.
    pub admin_prefix: String,
    /// Mount point of the restricted "my page" site.
    pub mypage_prefix: String,
    /// Default page size for list views.
    pub list_per_page: usize,
    /// Whether to load demo categories, tags and posts at startup.
    pub seed_demo_data: bool,
    /// Account created at startup.
    pub superuser: SuperuserSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: true,
            log_level: "info".to_string(),
            host: "127.0.0.1".to_string(),
            port: 8000,
            static_dir: PathBuf::from("static"),
            static_url: "/static/".to_string(),
            admin_prefix: "/admin".to_string(),
            mypage_prefix: "/mypage".to_string(),
            list_per_page: 100,
            seed_demo_data: true,
            superuser: SuperuserSettings::default(),
        }
    }
}

impl Settings {
    /// Returns the `host:port` bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns the path static assets are mounted at: `static_url` without
    /// its trailing slash.
    pub fn static_mount(&self) -> &str {
        self.static_url.trim_end_matches('/')
    }
}
