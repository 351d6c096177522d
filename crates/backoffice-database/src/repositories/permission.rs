//! Permission repository implementation.

use sqlx::PgPool;

use backoffice_core::error::{AppError, ErrorKind};
use backoffice_core::result::AppResult;
use backoffice_entity::permission::Permission;

/// Repository for the permission catalog and principal lookups.
#[derive(Debug, Clone)]
pub struct PermissionRepository {
    pool: PgPool,
}

impl PermissionRepository {
    /// Create a new permission repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// All permissions of a guard, by name.
    pub async fn list(&self, guard_name: &str) -> AppResult<Vec<Permission>> {
        sqlx::query_as::<_, Permission>(
            "SELECT id, name, guard_name, description, created_at FROM permissions \
             WHERE guard_name = $1 ORDER BY name",
        )
        .bind(guard_name)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list permissions", e))
    }

    /// Which of `names` exist in the guard.
    pub async fn existing_names(&self, guard_name: &str, names: &[String]) -> AppResult<Vec<String>> {
        sqlx::query_scalar::<_, String>(
            "SELECT name FROM permissions WHERE guard_name = $1 AND name = ANY($2) ORDER BY name",
        )
        .bind(guard_name)
        .bind(names)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to check permissions", e))
    }

    /// Create the permission or refresh its description.
    pub async fn ensure(
        &self,
        name: &str,
        guard_name: &str,
        description: Option<&str>,
    ) -> AppResult<Permission> {
        sqlx::query_as::<_, Permission>(
            "INSERT INTO permissions (name, guard_name, description) VALUES ($1, $2, $3) \
             ON CONFLICT (name, guard_name) DO UPDATE SET \
                description = EXCLUDED.description, updated_at = NOW() \
             RETURNING id, name, guard_name, description, created_at",
        )
        .bind(name)
        .bind(guard_name)
        .bind(description)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to seed permission", e))
    }

    /// Permission names a live, active user holds through live, active roles
    /// of the guard. `None` when the user does not exist or is disabled.
    pub async fn names_for_user(
        &self,
        user_id: i64,
        guard_name: &str,
    ) -> AppResult<Option<(String, Vec<String>)>> {
        let name: Option<String> = sqlx::query_scalar(
            "SELECT name FROM users WHERE id = $1 AND is_active AND deleted_at IS NULL",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to load principal", e))?;

        let Some(name) = name else {
            return Ok(None);
        };

        let permissions = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT p.name FROM user_roles ur \
             JOIN roles r ON r.id = ur.role_id \
                AND r.is_active AND r.deleted_at IS NULL AND r.guard_name = $2 \
             JOIN role_permissions rp ON rp.role_id = r.id \
             JOIN permissions p ON p.id = rp.permission_id \
             WHERE ur.user_id = $1 ORDER BY p.name",
        )
        .bind(user_id)
        .bind(guard_name)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to load principal permissions", e)
        })?;

        Ok(Some((name, permissions)))
    }
}
