//! Rules deciding whether a role may be deleted or deactivated.

use backoffice_core::config::{RoleDeletionConfig, RolesConfig};
use backoffice_entity::role::Role;

/// Configured role lifecycle rules.
#[derive(Debug, Clone, Default)]
pub struct DeletionGuard {
    protected: Vec<String>,
    rules: RoleDeletionConfig,
}

impl DeletionGuard {
    /// Build the guard from configuration.
    pub fn new(config: &RolesConfig) -> Self {
        Self {
            protected: config.protected.clone(),
            rules: config.deletion.clone(),
        }
    }

    /// Whether `name` is a protected role.
    pub fn is_protected(&self, name: &str) -> bool {
        self.protected.iter().any(|p| p == name)
    }

    /// Permissions that make a role administrative.
    pub fn critical_permissions(&self) -> &[String] {
        &self.rules.critical_permissions
    }

    /// Reasons that block deleting `role` and need no database lookup.
    pub fn deletion_blocker(&self, role: &Role) -> Option<String> {
        if role.is_trashed() {
            return Some(format!("El rol '{}' ya fue eliminado.", role.name));
        }
        if self.is_protected(&role.name) {
            return Some(format!(
                "El rol '{}' está protegido y no puede eliminarse.",
                role.name
            ));
        }
        if self.rules.require_inactive && role.is_active {
            return Some(format!(
                "El rol '{}' debe estar inactivo antes de eliminarse.",
                role.name
            ));
        }
        if self.rules.block_if_has_permissions && role.permissions_count > 0 {
            return Some(format!(
                "El rol '{}' tiene permisos asignados y no puede eliminarse.",
                role.name
            ));
        }
        None
    }

    /// Reasons that block deactivating `role` and need no database lookup.
    pub fn deactivation_blocker(&self, role: &Role) -> Option<String> {
        if self.is_protected(&role.name) {
            return Some(format!(
                "El rol '{}' está protegido y no puede desactivarse.",
                role.name
            ));
        }
        None
    }

    /// Whether removing `role` from the active set could leave no role
    /// granting every critical permission.
    pub fn needs_successor(&self, role: &Role) -> bool {
        let critical = self.critical_permissions();
        role.is_active && !critical.is_empty() && role.grants_all(critical)
    }
}

/// Message for the last administrative role. `action` is the reflexive
/// infinitive, e.g. `eliminarse`.
pub(crate) fn last_critical_role_message(role: &Role, action: &str) -> String {
    format!(
        "El rol '{}' es el último rol activo con permisos críticos y no puede {action}.",
        role.name
    )
}
