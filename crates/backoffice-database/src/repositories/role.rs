//! Role repository implementation.

use async_trait::async_trait;
use sqlx::{PgConnection, PgExecutor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use backoffice_core::error::{AppError, ErrorKind};
use backoffice_core::result::AppResult;
use backoffice_core::traits::ResourceReader;
use backoffice_core::types::{FilterValue, ListQuery, Page};
use backoffice_entity::permission::PermissionRef;
use backoffice_entity::role::{CreateRole, Role, RoleStats, UpdateRole};
use backoffice_entity::user::RoleRef;

use crate::query::{self, SortColumns};
use crate::writer::ResourceWriter;

const SELECT_ROLES: &str = "SELECT r.id, r.uuid, r.name, r.guard_name, r.is_active, \
     COALESCE(p.names, '{}') AS permissions, COALESCE(p.total, 0) AS permissions_count, \
     r.created_at, r.updated_at, r.deleted_at \
     FROM roles r \
     LEFT JOIN LATERAL ( \
        SELECT array_agg(pm.name ORDER BY pm.name) AS names, COUNT(*) AS total \
        FROM role_permissions rp JOIN permissions pm ON pm.id = rp.permission_id \
        WHERE rp.role_id = r.id \
     ) p ON TRUE \
     WHERE TRUE";

const SORT_COLUMNS: SortColumns = &[
    ("id", "r.id"),
    ("name", "r.name"),
    ("guard_name", "r.guard_name"),
    ("is_active", "r.is_active"),
    ("permissions_count", "COALESCE(p.total, 0)"),
    ("created_at", "r.created_at"),
];

/// Repository for roles and their permission grants.
#[derive(Debug, Clone)]
pub struct RoleRepository {
    pool: PgPool,
}

impl RoleRepository {
    /// Create a new role repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &ListQuery) {
        query::push_trashed(builder, "r", query);
        query::push_status(builder, "r", query);
        if let Some(FilterValue::Text(guard)) = query.filter("guard_name") {
            builder.push(" AND r.guard_name = ");
            builder.push_bind(guard.clone());
        }
        query::push_search(builder, &["r.name", "r.guard_name"], query);
    }

    async fn fetch_by_id<'e, E: PgExecutor<'e>>(executor: E, id: i64) -> AppResult<Option<Role>> {
        sqlx::query_as::<_, Role>(&format!("{SELECT_ROLES} AND r.id = $1"))
            .bind(id)
            .fetch_optional(executor)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find role by id", e))
    }

    /// Find a live role by name within a guard.
    pub async fn find_by_name(&self, name: &str, guard_name: &str) -> AppResult<Option<Role>> {
        sqlx::query_as::<_, Role>(&format!(
            "{SELECT_ROLES} AND r.name = $1 AND r.guard_name = $2 AND r.deleted_at IS NULL"
        ))
        .bind(name)
        .bind(guard_name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find role by name", e))
    }

    /// Whether another role (any lifecycle state) already uses `name`.
    pub async fn name_taken(
        &self,
        name: &str,
        guard_name: &str,
        except_id: Option<i64>,
    ) -> AppResult<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM roles WHERE name = $1 AND guard_name = $2 \
             AND ($3::BIGINT IS NULL OR id <> $3))",
        )
        .bind(name)
        .bind(guard_name)
        .bind(except_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to check role name", e))
    }

    /// Load the roles addressed by ids or uuids, in id order.
    pub async fn find_many(&self, ids: &[i64], uuids: &[Uuid]) -> AppResult<Vec<Role>> {
        if ids.is_empty() && uuids.is_empty() {
            return Ok(Vec::new());
        }
        sqlx::query_as::<_, Role>(&format!(
            "{SELECT_ROLES} AND (r.id = ANY($1) OR r.uuid = ANY($2)) ORDER BY r.id"
        ))
        .bind(ids)
        .bind(uuids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to load roles", e))
    }

    /// All live roles of a guard, by name. Used to fill role pickers.
    pub async fn list_options(&self, guard_name: &str) -> AppResult<Vec<RoleRef>> {
        sqlx::query_as::<_, RoleRef>(
            "SELECT id, name FROM roles WHERE guard_name = $1 AND deleted_at IS NULL ORDER BY name",
        )
        .bind(guard_name)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list roles", e))
    }

    /// Permissions granted by a role, by name.
    pub async fn permissions_of(&self, role_id: i64) -> AppResult<Vec<PermissionRef>> {
        sqlx::query_as::<_, PermissionRef>(
            "SELECT p.id, p.name FROM role_permissions rp \
             JOIN permissions p ON p.id = rp.permission_id \
             WHERE rp.role_id = $1 ORDER BY p.name",
        )
        .bind(role_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to load role permissions", e)
        })
    }

    /// Counters for the roles index header.
    pub async fn stats(&self) -> AppResult<RoleStats> {
        sqlx::query_as::<_, RoleStats>(
            "SELECT \
                COUNT(*) FILTER (WHERE deleted_at IS NULL) AS total, \
                COUNT(*) FILTER (WHERE deleted_at IS NULL AND is_active) AS active, \
                COUNT(*) FILTER (WHERE deleted_at IS NULL AND NOT is_active) AS inactive, \
                COUNT(*) FILTER (WHERE deleted_at IS NOT NULL) AS trashed \
             FROM roles",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to compute role stats", e))
    }

    /// Count live, active roles outside `excluding` that grant every
    /// permission in `required`.
    pub async fn count_granting_all(
        &self,
        required: &[String],
        excluding: &[i64],
    ) -> AppResult<i64> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM roles r \
             WHERE r.deleted_at IS NULL AND r.is_active AND NOT (r.id = ANY($2)) \
             AND ( \
                SELECT COUNT(DISTINCT p.name) FROM role_permissions rp \
                JOIN permissions p ON p.id = rp.permission_id \
                WHERE rp.role_id = r.id AND p.name = ANY($1) \
             ) = $3",
        )
        .bind(required)
        .bind(excluding)
        .bind(required.len() as i64)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to count administrative roles", e)
        })
    }

    async fn sync_permissions(
        conn: &mut PgConnection,
        role_id: i64,
        guard_name: &str,
        names: &[String],
    ) -> AppResult<()> {
        sqlx::query("DELETE FROM role_permissions WHERE role_id = $1")
            .bind(role_id)
            .execute(&mut *conn)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to clear role permissions", e)
            })?;

        sqlx::query(
            "INSERT INTO role_permissions (role_id, permission_id) \
             SELECT $1, id FROM permissions WHERE name = ANY($2) AND guard_name = $3 \
             ON CONFLICT DO NOTHING",
        )
        .bind(role_id)
        .bind(names)
        .bind(guard_name)
        .execute(&mut *conn)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to grant role permissions", e)
        })?;

        Ok(())
    }
}

#[async_trait]
impl ResourceReader for RoleRepository {
    type Entity = Role;

    async fn paginate(&self, query: &ListQuery) -> AppResult<Page<Role>> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM roles r WHERE TRUE");
        Self::push_filters(&mut count, query);
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count roles", e))?;

        let mut select = QueryBuilder::<Postgres>::new(SELECT_ROLES);
        Self::push_filters(&mut select, query);
        query::push_order(&mut select, SORT_COLUMNS, "r.id", "r.id", query);
        query::push_page(&mut select, query);
        let roles = select
            .build_query_as::<Role>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list roles", e))?;

        Ok(Page::new(roles, total as u64, query.page(), query.per_page()))
    }

    async fn paginate_by_ids_desc(
        &self,
        ids: &[i64],
        page: u32,
        per_page: u32,
    ) -> AppResult<Page<Role>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM roles WHERE id = ANY($1)")
            .bind(ids)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to count selected roles", e)
            })?;

        let window = ListQuery::new(page, per_page);
        let roles = sqlx::query_as::<_, Role>(&format!(
            "{SELECT_ROLES} AND r.id = ANY($1) ORDER BY r.id DESC LIMIT $2 OFFSET $3"
        ))
        .bind(ids)
        .bind(window.limit())
        .bind(window.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list selected roles", e)
        })?;

        Ok(Page::new(roles, total as u64, window.page(), window.per_page()))
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<Role>> {
        Self::fetch_by_id(&self.pool, id).await
    }

    async fn find_by_uuid(&self, uuid: Uuid) -> AppResult<Option<Role>> {
        sqlx::query_as::<_, Role>(&format!("{SELECT_ROLES} AND r.uuid = $1"))
            .bind(uuid)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find role by uuid", e)
            })
    }
}

#[async_trait]
impl ResourceWriter for RoleRepository {
    type Create = CreateRole;
    type Update = UpdateRole;

    const TABLE: &'static str = "roles";

    fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn create(&self, conn: &mut PgConnection, input: &CreateRole) -> AppResult<Role> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO roles (uuid, name, guard_name, is_active) VALUES ($1, $2, $3, $4) \
             RETURNING id",
        )
        .bind(Uuid::now_v7())
        .bind(&input.name)
        .bind(&input.guard_name)
        .bind(input.is_active)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create role", e))?;

        if let Some(permissions) = &input.permissions {
            Self::sync_permissions(conn, id, &input.guard_name, permissions).await?;
        }

        Self::fetch_by_id(&mut *conn, id)
            .await?
            .ok_or_else(|| AppError::internal("Role vanished after insert"))
    }

    async fn update(
        &self,
        conn: &mut PgConnection,
        id: i64,
        input: &UpdateRole,
    ) -> AppResult<Role> {
        let guard_name: Option<String> = sqlx::query_scalar(
            "UPDATE roles SET \
                name = COALESCE($2, name), \
                is_active = COALESCE($3, is_active), \
                updated_at = NOW() \
             WHERE id = $1 RETURNING guard_name",
        )
        .bind(id)
        .bind(&input.name)
        .bind(input.is_active)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update role", e))?;

        let guard_name = guard_name.ok_or_else(|| AppError::not_found("Role not found"))?;

        if let Some(permissions) = &input.permissions {
            Self::sync_permissions(conn, id, &guard_name, permissions).await?;
        }

        Self::fetch_by_id(&mut *conn, id)
            .await?
            .ok_or_else(|| AppError::not_found("Role not found"))
    }

    async fn upsert(&self, conn: &mut PgConnection, rows: &[CreateRole]) -> AppResult<u64> {
        if rows.is_empty() {
            return Ok(0);
        }
        let mut builder =
            QueryBuilder::<Postgres>::new("INSERT INTO roles (uuid, name, guard_name, is_active) ");
        builder.push_values(rows, |mut b, row| {
            b.push_bind(Uuid::now_v7())
                .push_bind(row.name.clone())
                .push_bind(row.guard_name.clone())
                .push_bind(row.is_active);
        });
        builder.push(
            " ON CONFLICT (name, guard_name) DO UPDATE SET \
             is_active = EXCLUDED.is_active, updated_at = NOW()",
        );
        let affected = builder
            .build()
            .execute(&mut *conn)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to upsert roles", e))?
            .rows_affected();

        for row in rows {
            if let Some(permissions) = &row.permissions {
                let id: i64 =
                    sqlx::query_scalar("SELECT id FROM roles WHERE name = $1 AND guard_name = $2")
                        .bind(&row.name)
                        .bind(&row.guard_name)
                        .fetch_one(&mut *conn)
                        .await
                        .map_err(|e| {
                            AppError::with_source(ErrorKind::Database, "Failed to reload role", e)
                        })?;
                Self::sync_permissions(conn, id, &row.guard_name, permissions).await?;
            }
        }

        Ok(affected)
    }
}
