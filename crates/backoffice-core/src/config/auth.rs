//! Authentication configuration.

use serde::{Deserialize, Serialize};

/// Authentication and credential configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Guard that roles and permissions are scoped to.
    #[serde(default = "default_guard_name")]
    pub guard_name: String,
    /// Session key holding the authenticated user id.
    #[serde(default = "default_session_key")]
    pub session_key: String,
    /// Minimum password length.
    #[serde(default = "default_password_min")]
    pub password_min_length: usize,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            guard_name: default_guard_name(),
            session_key: default_session_key(),
            password_min_length: default_password_min(),
        }
    }
}

fn default_guard_name() -> String {
    "web".to_string()
}

fn default_session_key() -> String {
    "auth.user_id".to_string()
}

fn default_password_min() -> usize {
    8
}
