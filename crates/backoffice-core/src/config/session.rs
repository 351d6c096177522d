//! Session cookie configuration.

use serde::{Deserialize, Serialize};

/// Session cookie configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Name of the session cookie.
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// Only send the cookie over HTTPS.
    #[serde(default)]
    pub secure: bool,
    /// Inactivity expiry in minutes.
    #[serde(default = "default_lifetime")]
    pub lifetime_minutes: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            secure: false,
            lifetime_minutes: default_lifetime(),
        }
    }
}

fn default_cookie_name() -> String {
    "backoffice_session".to_string()
}

fn default_lifetime() -> i64 {
    120
}
