//! Row shapes for users.

use serde_json::{Value, json};

use backoffice_core::types::{Columns, Row};
use backoffice_entity::user::{RoleRef, User};

use crate::profile::{ResourceProfile, item_timestamp, row_timestamp};

/// Users as listed, exported and shown.
#[derive(Debug, Clone, Copy)]
pub struct UserProfile;

impl UserProfile {
    /// Show-view shape: ISO timestamps and `{id, name}` role references.
    pub fn to_item(user: &User, roles: &[RoleRef]) -> Row {
        let mut item = Row::new();
        item.insert("id".into(), user.id.into());
        item.insert("uuid".into(), user.uuid.to_string().into());
        item.insert("name".into(), user.name.clone().into());
        item.insert("email".into(), user.email.clone().into());
        item.insert("is_active".into(), user.is_active.into());
        item.insert("created_at".into(), item_timestamp(&user.created_at));
        item.insert("updated_at".into(), item_timestamp(&user.updated_at));
        item.insert("roles_count".into(), user.roles_count.into());
        item.insert(
            "roles".into(),
            Value::Array(
                roles
                    .iter()
                    .map(|r| json!({"id": r.id, "name": r.name}))
                    .collect(),
            ),
        );
        item
    }
}

impl ResourceProfile for UserProfile {
    type Entity = User;
    const RESOURCE: &'static str = "users";

    fn to_row(user: &User) -> Row {
        let mut row = Row::new();
        row.insert("id".into(), user.id.into());
        row.insert("name".into(), user.name.clone().into());
        row.insert("email".into(), user.email.clone().into());
        row.insert("is_active".into(), user.is_active.into());
        row.insert("roles".into(), Value::from(user.roles.clone()));
        row.insert("roles_count".into(), user.roles_count.into());
        row.insert("created_at".into(), row_timestamp(&user.created_at));
        row
    }

    fn export_columns() -> Columns {
        Columns::new([
            ("id", "#"),
            ("name", "Nombre"),
            ("email", "Email"),
            ("roles_count", "Roles"),
            ("is_active", "Estado"),
            ("created_at", "Creado"),
        ])
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    use super::*;

    fn user() -> User {
        let ts = Utc.with_ymd_and_hms(2025, 2, 1, 8, 30, 0).unwrap();
        User {
            id: 12,
            uuid: Uuid::nil(),
            name: "Ana".into(),
            email: "ana@example.com".into(),
            password_hash: "$argon2id$...".into(),
            is_active: true,
            roles: vec!["admin".into(), "editor".into()],
            roles_count: 2,
            created_at: ts,
            updated_at: ts,
            deleted_at: None,
        }
    }

    #[test]
    fn test_row_shape() {
        let row = UserProfile::to_row(&user());
        let keys: Vec<&str> = row.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            ["id", "name", "email", "is_active", "roles", "roles_count", "created_at"]
        );
        assert_eq!(row["roles"], json!(["admin", "editor"]));
        assert!(!row.contains_key("password_hash"));
    }

    #[test]
    fn test_item_includes_role_refs() {
        let roles = vec![RoleRef {
            id: 1,
            name: "admin".into(),
        }];
        let item = UserProfile::to_item(&user(), &roles);
        assert_eq!(item["roles"], json!([{"id": 1, "name": "admin"}]));
        assert_eq!(item["updated_at"], "2025-02-01T08:30:00.000Z");
    }

    #[test]
    fn test_export_columns_are_a_subset_of_the_row() {
        let row = UserProfile::to_row(&user());
        for key in UserProfile::export_columns().keys() {
            assert!(row.contains_key(key), "missing {key}");
        }
    }
}
