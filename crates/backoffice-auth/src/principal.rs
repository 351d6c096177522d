//! The authenticated principal and how it is loaded.

use std::collections::HashSet;

use async_trait::async_trait;

use backoffice_core::result::AppResult;
use backoffice_database::repositories::PermissionRepository;

use crate::rbac::Permission;

/// The user a request acts on behalf of, with their effective permissions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// User primary key.
    pub user_id: i64,
    /// Display name.
    pub name: String,
    permissions: HashSet<String>,
}

impl Principal {
    /// Build a principal from permission names.
    pub fn new<I, S>(user_id: i64, name: impl Into<String>, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            user_id,
            name: name.into(),
            permissions: permissions.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether the principal holds `permission`.
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions.contains(permission.name())
    }

    /// Effective permission names, sorted.
    pub fn permission_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.permissions.iter().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Loads principals by user id.
#[async_trait]
pub trait PrincipalResolver: Send + Sync + 'static {
    /// `None` when the user does not exist, is disabled or soft-deleted.
    async fn resolve(&self, user_id: i64) -> AppResult<Option<Principal>>;
}

/// Resolves principals from the roles and permissions tables.
#[derive(Debug, Clone)]
pub struct PgPrincipalResolver {
    permissions: PermissionRepository,
    guard_name: String,
}

impl PgPrincipalResolver {
    /// Creates a resolver scoped to `guard_name`.
    pub fn new(permissions: PermissionRepository, guard_name: impl Into<String>) -> Self {
        Self {
            permissions,
            guard_name: guard_name.into(),
        }
    }
}

#[async_trait]
impl PrincipalResolver for PgPrincipalResolver {
    async fn resolve(&self, user_id: i64) -> AppResult<Option<Principal>> {
        let loaded = self
            .permissions
            .names_for_user(user_id, &self.guard_name)
            .await?;
        Ok(loaded.map(|(name, permissions)| Principal::new(user_id, name, permissions)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_names_are_sorted() {
        let principal = Principal::new(9, "Luis", ["users.view", "roles.view"]);
        assert_eq!(principal.permission_names(), ["roles.view", "users.view"]);
        assert!(principal.has_permission(Permission::UsersView));
        assert!(!principal.has_permission(Permission::UsersExport));
    }
}
