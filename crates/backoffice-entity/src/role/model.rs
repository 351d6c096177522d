//! Role entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A role grouping permissions, assignable to users.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Role {
    /// Primary key.
    pub id: i64,
    /// External identifier.
    pub uuid: Uuid,
    /// Unique name within the guard.
    pub name: String,
    /// Guard the role belongs to.
    pub guard_name: String,
    /// Whether the role currently grants its permissions.
    pub is_active: bool,
    /// Names of the granted permissions, sorted.
    pub permissions: Vec<String>,
    /// Number of granted permissions.
    pub permissions_count: i64,
    /// When the role was created.
    pub created_at: DateTime<Utc>,
    /// When the role was last updated.
    pub updated_at: DateTime<Utc>,
    /// Soft-delete tombstone.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Role {
    /// Whether the role is soft-deleted.
    pub fn is_trashed(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Whether the role grants every permission in `required`.
    pub fn grants_all<S: AsRef<str>>(&self, required: &[S]) -> bool {
        required
            .iter()
            .all(|p| self.permissions.iter().any(|have| have == p.as_ref()))
    }
}

/// Counters shown above the roles table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct RoleStats {
    /// Roles not soft-deleted.
    pub total: i64,
    /// Active roles not soft-deleted.
    pub active: i64,
    /// Inactive roles not soft-deleted.
    pub inactive: i64,
    /// Soft-deleted roles.
    pub trashed: i64,
}

/// Data required to create a role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRole {
    /// Role name.
    pub name: String,
    /// Guard name.
    pub guard_name: String,
    /// Initial active flag.
    pub is_active: bool,
    /// Permission names to grant. `None` leaves the role without permissions.
    pub permissions: Option<Vec<String>>,
}

/// Changes to apply to a role. `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateRole {
    /// New name.
    pub name: Option<String>,
    /// New active flag.
    pub is_active: Option<bool>,
    /// Replacement permission set.
    pub permissions: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn role(permissions: &[&str]) -> Role {
        Role {
            id: 1,
            uuid: Uuid::nil(),
            name: "admin".into(),
            guard_name: "web".into(),
            is_active: true,
            permissions: permissions.iter().map(|p| p.to_string()).collect(),
            permissions_count: permissions.len() as i64,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
        }
    }

    #[test]
    fn test_grants_all() {
        let r = role(&["roles.view", "roles.update"]);
        assert!(r.grants_all(&["roles.view"]));
        assert!(!r.grants_all(&["roles.view", "roles.delete"]));
        assert!(r.grants_all::<&str>(&[]));
    }
}
