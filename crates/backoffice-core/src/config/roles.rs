//! Role lifecycle rules.

use serde::{Deserialize, Serialize};

/// Rules applied before a role may be deleted or deactivated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RolesConfig {
    /// Role names that can never be deleted or deactivated.
    #[serde(default)]
    pub protected: Vec<String>,
    /// Deletion guards.
    #[serde(default)]
    pub deletion: RoleDeletionConfig,
}

/// Deletion guards for roles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleDeletionConfig {
    /// Refuse to delete roles that still grant permissions.
    #[serde(default)]
    pub block_if_has_permissions: bool,
    /// Only inactive roles may be deleted.
    #[serde(default)]
    pub require_inactive: bool,
    /// Permissions that make a role administrative. The last active role
    /// granting all of them cannot be deleted.
    #[serde(default = "default_critical_permissions")]
    pub critical_permissions: Vec<String>,
}

impl Default for RoleDeletionConfig {
    fn default() -> Self {
        Self {
            block_if_has_permissions: false,
            require_inactive: false,
            critical_permissions: default_critical_permissions(),
        }
    }
}

fn default_critical_permissions() -> Vec<String> {
    ["roles.view", "roles.update", "roles.delete", "roles.export"]
        .iter()
        .map(|p| p.to_string())
        .collect()
}
