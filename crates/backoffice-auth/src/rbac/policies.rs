//! Permission catalog and the (resource, ability) to permission mapping.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A resource guarded by policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    /// Role management.
    Roles,
    /// User management.
    Users,
}

impl Resource {
    /// Permission name prefix, also used in routes and export filenames.
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Roles => "roles",
            Self::Users => "users",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// An action a principal attempts on a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Ability {
    /// List records.
    ViewAny,
    /// Show one record.
    View,
    /// Create records.
    Create,
    /// Edit records, including bulk operations.
    Update,
    /// Soft-delete records.
    Delete,
    /// Restore soft-deleted records.
    Restore,
    /// Permanently delete records.
    ForceDelete,
    /// Download exports.
    Export,
    /// Toggle the active flag.
    SetActive,
}

impl fmt::Display for Ability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ViewAny => "viewAny",
            Self::View => "view",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Restore => "restore",
            Self::ForceDelete => "forceDelete",
            Self::Export => "export",
            Self::SetActive => "setActive",
        };
        f.write_str(name)
    }
}

/// Every permission known to the backoffice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Permission {
    // Roles
    RolesView,
    RolesCreate,
    RolesUpdate,
    RolesDelete,
    RolesRestore,
    RolesForceDelete,
    RolesExport,

    // Users
    UsersIndex,
    UsersView,
    UsersCreate,
    UsersUpdate,
    UsersDelete,
    UsersRestore,
    UsersForceDelete,
    UsersExport,

    // Settings
    SettingsProfileView,
    SettingsProfileUpdate,
    SettingsPasswordUpdate,
    SettingsAppearanceView,
}

impl Permission {
    /// The full catalog, in seeding order.
    pub const ALL: [Permission; 19] = [
        Self::RolesView,
        Self::RolesCreate,
        Self::RolesUpdate,
        Self::RolesDelete,
        Self::RolesRestore,
        Self::RolesForceDelete,
        Self::RolesExport,
        Self::UsersIndex,
        Self::UsersView,
        Self::UsersCreate,
        Self::UsersUpdate,
        Self::UsersDelete,
        Self::UsersRestore,
        Self::UsersForceDelete,
        Self::UsersExport,
        Self::SettingsProfileView,
        Self::SettingsProfileUpdate,
        Self::SettingsPasswordUpdate,
        Self::SettingsAppearanceView,
    ];

    /// The permission checked for `ability` on `resource`.
    ///
    /// Listing and showing share the `view` permission; toggling the
    /// active flag is an update.
    pub fn for_ability(resource: Resource, ability: Ability) -> Self {
        match (resource, ability) {
            (Resource::Roles, Ability::ViewAny | Ability::View) => Self::RolesView,
            (Resource::Roles, Ability::Create) => Self::RolesCreate,
            (Resource::Roles, Ability::Update | Ability::SetActive) => Self::RolesUpdate,
            (Resource::Roles, Ability::Delete) => Self::RolesDelete,
            (Resource::Roles, Ability::Restore) => Self::RolesRestore,
            (Resource::Roles, Ability::ForceDelete) => Self::RolesForceDelete,
            (Resource::Roles, Ability::Export) => Self::RolesExport,
            (Resource::Users, Ability::ViewAny | Ability::View) => Self::UsersView,
            (Resource::Users, Ability::Create) => Self::UsersCreate,
            (Resource::Users, Ability::Update | Ability::SetActive) => Self::UsersUpdate,
            (Resource::Users, Ability::Delete) => Self::UsersDelete,
            (Resource::Users, Ability::Restore) => Self::UsersRestore,
            (Resource::Users, Ability::ForceDelete) => Self::UsersForceDelete,
            (Resource::Users, Ability::Export) => Self::UsersExport,
        }
    }

    /// Stored permission name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::RolesView => "roles.view",
            Self::RolesCreate => "roles.create",
            Self::RolesUpdate => "roles.update",
            Self::RolesDelete => "roles.delete",
            Self::RolesRestore => "roles.restore",
            Self::RolesForceDelete => "roles.forceDelete",
            Self::RolesExport => "roles.export",
            Self::UsersIndex => "users.index",
            Self::UsersView => "users.view",
            Self::UsersCreate => "users.create",
            Self::UsersUpdate => "users.update",
            Self::UsersDelete => "users.delete",
            Self::UsersRestore => "users.restore",
            Self::UsersForceDelete => "users.forceDelete",
            Self::UsersExport => "users.export",
            Self::SettingsProfileView => "settings.profile.view",
            Self::SettingsProfileUpdate => "settings.profile.update",
            Self::SettingsPasswordUpdate => "settings.password.update",
            Self::SettingsAppearanceView => "settings.appearance.view",
        }
    }

    /// Human description shown in role forms.
    pub fn description(&self) -> &'static str {
        match self {
            Self::RolesView => "Ver roles",
            Self::RolesCreate => "Crear roles",
            Self::RolesUpdate => "Actualizar roles",
            Self::RolesDelete => "Eliminar roles",
            Self::RolesRestore => "Restaurar roles",
            Self::RolesForceDelete => "Eliminar permanentemente roles",
            Self::RolesExport => "Exportar roles",
            Self::UsersIndex => "Listar usuarios",
            Self::UsersView => "Ver usuario",
            Self::UsersCreate => "Crear usuario",
            Self::UsersUpdate => "Actualizar usuario",
            Self::UsersDelete => "Eliminar usuario",
            Self::UsersRestore => "Restaurar usuario",
            Self::UsersForceDelete => "Eliminar permanentemente usuario",
            Self::UsersExport => "Exportar usuarios",
            Self::SettingsProfileView => "Ver perfil",
            Self::SettingsProfileUpdate => "Actualización de Perfil",
            Self::SettingsPasswordUpdate => "Actualización de Password",
            Self::SettingsAppearanceView => "Ver Apariencia",
        }
    }

    /// Look a permission up by its stored name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_any_maps_to_view() {
        assert_eq!(
            Permission::for_ability(Resource::Roles, Ability::ViewAny).name(),
            "roles.view"
        );
        assert_eq!(
            Permission::for_ability(Resource::Users, Ability::ViewAny).name(),
            "users.view"
        );
    }

    #[test]
    fn test_abilities_concatenate_prefix() {
        for (ability, suffix) in [
            (Ability::Create, "create"),
            (Ability::Update, "update"),
            (Ability::Delete, "delete"),
            (Ability::Restore, "restore"),
            (Ability::ForceDelete, "forceDelete"),
            (Ability::Export, "export"),
        ] {
            for resource in [Resource::Roles, Resource::Users] {
                assert_eq!(
                    Permission::for_ability(resource, ability).name(),
                    format!("{resource}.{suffix}")
                );
            }
        }
    }

    #[test]
    fn test_set_active_requires_update() {
        assert_eq!(
            Permission::for_ability(Resource::Roles, Ability::SetActive),
            Permission::RolesUpdate
        );
    }

    #[test]
    fn test_catalog_names_are_unique_and_resolvable() {
        let mut names: Vec<&str> = Permission::ALL.iter().map(|p| p.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), Permission::ALL.len());
        for permission in Permission::ALL {
            assert_eq!(Permission::from_name(permission.name()), Some(permission));
        }
        assert_eq!(Permission::from_name("roles.fly"), None);
    }
}
