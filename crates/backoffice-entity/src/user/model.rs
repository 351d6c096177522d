//! User entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A backoffice user.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Primary key.
    pub id: i64,
    /// External identifier.
    pub uuid: Uuid,
    /// Display name.
    pub name: String,
    /// Unique email address.
    pub email: String,
    /// Argon2 password hash.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Whether the account may sign in.
    pub is_active: bool,
    /// Names of assigned roles, sorted.
    pub roles: Vec<String>,
    /// Number of assigned roles.
    pub roles_count: i64,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
    /// Soft-delete tombstone.
    pub deleted_at: Option<DateTime<Utc>>,
}

/// `{id, name}` role reference embedded in the user show view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct RoleRef {
    /// Role primary key.
    pub id: i64,
    /// Role name.
    pub name: String,
}

/// Data required to create a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Pre-hashed password.
    pub password_hash: String,
    /// Initial active flag.
    pub is_active: bool,
    /// Role ids to assign. `None` assigns nothing.
    pub roles_ids: Option<Vec<i64>>,
}

/// Changes to apply to a user. `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUser {
    /// New display name.
    pub name: Option<String>,
    /// New email address.
    pub email: Option<String>,
    /// New pre-hashed password.
    pub password_hash: Option<String>,
    /// New active flag.
    pub is_active: Option<bool>,
    /// Replacement role ids.
    pub roles_ids: Option<Vec<i64>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_is_never_serialized() {
        let user = User {
            id: 3,
            uuid: Uuid::nil(),
            name: "Ana".into(),
            email: "ana@example.com".into(),
            password_hash: "$argon2id$secret".into(),
            is_active: true,
            roles: vec!["admin".into()],
            roles_count: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["email"], "ana@example.com");
    }
}
