//! Row shapes for roles.

use serde_json::{Value, json};

use backoffice_core::types::{Columns, Row};
use backoffice_entity::permission::PermissionRef;
use backoffice_entity::role::Role;

use crate::profile::{ResourceProfile, item_timestamp, row_timestamp};

/// Roles as listed, exported and shown.
#[derive(Debug, Clone, Copy)]
pub struct RoleProfile;

impl RoleProfile {
    /// Show-view shape with `{id, name}` permission references.
    pub fn to_item(role: &Role, permissions: &[PermissionRef]) -> Row {
        let mut item = Row::new();
        item.insert("id".into(), role.id.into());
        item.insert("uuid".into(), role.uuid.to_string().into());
        item.insert("name".into(), role.name.clone().into());
        item.insert("guard_name".into(), role.guard_name.clone().into());
        item.insert("is_active".into(), role.is_active.into());
        item.insert("permissions_count".into(), role.permissions_count.into());
        item.insert(
            "permissions".into(),
            Value::Array(
                permissions
                    .iter()
                    .map(|p| json!({"id": p.id, "name": p.name}))
                    .collect(),
            ),
        );
        item.insert("created_at".into(), item_timestamp(&role.created_at));
        item.insert("updated_at".into(), item_timestamp(&role.updated_at));
        item
    }
}

impl ResourceProfile for RoleProfile {
    type Entity = Role;
    const RESOURCE: &'static str = "roles";

    fn to_row(role: &Role) -> Row {
        let mut row = Row::new();
        row.insert("id".into(), role.id.into());
        row.insert("name".into(), role.name.clone().into());
        row.insert("guard_name".into(), role.guard_name.clone().into());
        row.insert("is_active".into(), role.is_active.into());
        row.insert("permissions".into(), Value::from(role.permissions.clone()));
        row.insert("permissions_count".into(), role.permissions_count.into());
        row.insert("created_at".into(), row_timestamp(&role.created_at));
        row
    }

    fn export_columns() -> Columns {
        Columns::new([
            ("id", "#"),
            ("name", "Nombre"),
            ("guard_name", "Guard"),
            ("permissions_count", "Permisos"),
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

    #[test]
    fn test_row_lists_permission_names() {
        let ts = Utc.with_ymd_and_hms(2025, 5, 6, 7, 8, 9).unwrap();
        let role = Role {
            id: 3,
            uuid: Uuid::nil(),
            name: "editor".into(),
            guard_name: "web".into(),
            is_active: false,
            permissions: vec!["roles.view".into(), "users.view".into()],
            permissions_count: 2,
            created_at: ts,
            updated_at: ts,
            deleted_at: None,
        };

        let row = RoleProfile::to_row(&role);
        assert_eq!(row["permissions"], json!(["roles.view", "users.view"]));
        assert_eq!(row["permissions_count"], 2);
        for key in RoleProfile::export_columns().keys() {
            assert!(row.contains_key(key));
        }

        let item = RoleProfile::to_item(
            &role,
            &[PermissionRef {
                id: 10,
                name: "roles.view".into(),
            }],
        );
        assert_eq!(item["permissions"], json!([{"id": 10, "name": "roles.view"}]));
        assert_eq!(item["created_at"], "2025-05-06T07:08:09.000Z");
    }
}
