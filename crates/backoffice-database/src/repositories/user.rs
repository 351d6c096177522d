//! User repository implementation.

use async_trait::async_trait;
use sqlx::{PgConnection, PgExecutor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use backoffice_core::error::{AppError, ErrorKind};
use backoffice_core::result::AppResult;
use backoffice_core::traits::ResourceReader;
use backoffice_core::types::{FilterValue, ListQuery, Page};
use backoffice_entity::user::{CreateUser, RoleRef, UpdateUser, User};

use crate::query::{self, SortColumns};
use crate::writer::ResourceWriter;

const SELECT_USERS: &str = "SELECT u.id, u.uuid, u.name, u.email, u.password_hash, u.is_active, \
     COALESCE(x.names, '{}') AS roles, COALESCE(x.total, 0) AS roles_count, \
     u.created_at, u.updated_at, u.deleted_at \
     FROM users u \
     LEFT JOIN LATERAL ( \
        SELECT array_agg(ro.name ORDER BY ro.name) AS names, COUNT(*) AS total \
        FROM user_roles ur JOIN roles ro ON ro.id = ur.role_id \
        WHERE ur.user_id = u.id AND ro.deleted_at IS NULL \
     ) x ON TRUE \
     WHERE TRUE";

const SORT_COLUMNS: SortColumns = &[
    ("id", "u.id"),
    ("name", "u.name"),
    ("email", "u.email"),
    ("is_active", "u.is_active"),
    ("roles_count", "COALESCE(x.total, 0)"),
    ("created_at", "u.created_at"),
];

/// Repository for users and their role assignments.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &ListQuery) {
        query::push_trashed(builder, "u", query);
        query::push_status(builder, "u", query);
        if let Some(FilterValue::Text(role)) = query.filter("role") {
            builder.push(
                " AND EXISTS (SELECT 1 FROM user_roles ur JOIN roles ro ON ro.id = ur.role_id \
                 WHERE ur.user_id = u.id AND ro.name = ",
            );
            builder.push_bind(role.clone());
            builder.push(")");
        }
        query::push_search(builder, &["u.name", "u.email"], query);
    }

    async fn fetch_by_id<'e, E: PgExecutor<'e>>(executor: E, id: i64) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>(&format!("{SELECT_USERS} AND u.id = $1"))
            .bind(id)
            .fetch_optional(executor)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find user by id", e))
    }

    /// Find a live user by email (case-insensitive).
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>(&format!(
            "{SELECT_USERS} AND LOWER(u.email) = LOWER($1) AND u.deleted_at IS NULL"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find user by email", e))
    }

    /// Whether another user (any lifecycle state) already uses `email`.
    pub async fn email_taken(&self, email: &str, except_id: Option<i64>) -> AppResult<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM users WHERE LOWER(email) = LOWER($1) \
             AND ($2::BIGINT IS NULL OR id <> $2))",
        )
        .bind(email)
        .bind(except_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to check email", e))
    }

    /// Roles assigned to a user, by name.
    pub async fn roles_of(&self, user_id: i64) -> AppResult<Vec<RoleRef>> {
        sqlx::query_as::<_, RoleRef>(
            "SELECT ro.id, ro.name FROM user_roles ur JOIN roles ro ON ro.id = ur.role_id \
             WHERE ur.user_id = $1 AND ro.deleted_at IS NULL ORDER BY ro.name",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to load user roles", e))
    }

    /// Which of `ids` exist as live roles.
    pub async fn existing_role_ids(&self, ids: &[i64]) -> AppResult<Vec<i64>> {
        sqlx::query_scalar::<_, i64>(
            "SELECT id FROM roles WHERE id = ANY($1) AND deleted_at IS NULL ORDER BY id",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to check role ids", e))
    }

    async fn sync_roles(conn: &mut PgConnection, user_id: i64, role_ids: &[i64]) -> AppResult<()> {
        sqlx::query("DELETE FROM user_roles WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *conn)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to clear user roles", e)
            })?;

        sqlx::query(
            "INSERT INTO user_roles (user_id, role_id) \
             SELECT $1, id FROM roles WHERE id = ANY($2) ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(role_ids)
        .execute(&mut *conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to assign user roles", e))?;

        Ok(())
    }
}

#[async_trait]
impl ResourceReader for UserRepository {
    type Entity = User;

    async fn paginate(&self, query: &ListQuery) -> AppResult<Page<User>> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users u WHERE TRUE");
        Self::push_filters(&mut count, query);
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count users", e))?;

        let mut select = QueryBuilder::<Postgres>::new(SELECT_USERS);
        Self::push_filters(&mut select, query);
        query::push_order(&mut select, SORT_COLUMNS, "u.id", "u.id", query);
        query::push_page(&mut select, query);
        let users = select
            .build_query_as::<User>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list users", e))?;

        Ok(Page::new(users, total as u64, query.page(), query.per_page()))
    }

    async fn paginate_by_ids_desc(
        &self,
        ids: &[i64],
        page: u32,
        per_page: u32,
    ) -> AppResult<Page<User>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE id = ANY($1)")
            .bind(ids)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to count selected users", e)
            })?;

        let window = ListQuery::new(page, per_page);
        let users = sqlx::query_as::<_, User>(&format!(
            "{SELECT_USERS} AND u.id = ANY($1) ORDER BY u.id DESC LIMIT $2 OFFSET $3"
        ))
        .bind(ids)
        .bind(window.limit())
        .bind(window.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list selected users", e)
        })?;

        Ok(Page::new(users, total as u64, window.page(), window.per_page()))
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<User>> {
        Self::fetch_by_id(&self.pool, id).await
    }

    async fn find_by_uuid(&self, uuid: Uuid) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>(&format!("{SELECT_USERS} AND u.uuid = $1"))
            .bind(uuid)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find user by uuid", e)
            })
    }
}

#[async_trait]
impl ResourceWriter for UserRepository {
    type Create = CreateUser;
    type Update = UpdateUser;

    const TABLE: &'static str = "users";

    fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn create(&self, conn: &mut PgConnection, input: &CreateUser) -> AppResult<User> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO users (uuid, name, email, password_hash, is_active) \
             VALUES ($1, $2, $3, $4, $5) RETURNING id",
        )
        .bind(Uuid::now_v7())
        .bind(&input.name)
        .bind(&input.email)
        .bind(&input.password_hash)
        .bind(input.is_active)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create user", e))?;

        if let Some(role_ids) = &input.roles_ids {
            Self::sync_roles(conn, id, role_ids).await?;
        }

        Self::fetch_by_id(&mut *conn, id)
            .await?
            .ok_or_else(|| AppError::internal("User vanished after insert"))
    }

    async fn update(
        &self,
        conn: &mut PgConnection,
        id: i64,
        input: &UpdateUser,
    ) -> AppResult<User> {
        let updated = sqlx::query(
            "UPDATE users SET \
                name = COALESCE($2, name), \
                email = COALESCE($3, email), \
                password_hash = COALESCE($4, password_hash), \
                is_active = COALESCE($5, is_active), \
                updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.email)
        .bind(&input.password_hash)
        .bind(input.is_active)
        .execute(&mut *conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update user", e))?
        .rows_affected();

        if updated == 0 {
            return Err(AppError::not_found("User not found"));
        }

        if let Some(role_ids) = &input.roles_ids {
            Self::sync_roles(conn, id, role_ids).await?;
        }

        Self::fetch_by_id(&mut *conn, id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))
    }

    async fn upsert(&self, conn: &mut PgConnection, rows: &[CreateUser]) -> AppResult<u64> {
        if rows.is_empty() {
            return Ok(0);
        }
        let mut builder = QueryBuilder::<Postgres>::new(
            "INSERT INTO users (uuid, name, email, password_hash, is_active) ",
        );
        builder.push_values(rows, |mut b, row| {
            b.push_bind(Uuid::now_v7())
                .push_bind(row.name.clone())
                .push_bind(row.email.clone())
                .push_bind(row.password_hash.clone())
                .push_bind(row.is_active);
        });
        builder.push(
            " ON CONFLICT ((LOWER(email))) DO UPDATE SET \
             name = EXCLUDED.name, password_hash = EXCLUDED.password_hash, \
             is_active = EXCLUDED.is_active, updated_at = NOW()",
        );
        let affected = builder
            .build()
            .execute(&mut *conn)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to upsert users", e))?
            .rows_affected();

        for row in rows {
            if let Some(role_ids) = &row.roles_ids {
                let id: i64 =
                    sqlx::query_scalar("SELECT id FROM users WHERE LOWER(email) = LOWER($1)")
                        .bind(&row.email)
                        .fetch_one(&mut *conn)
                        .await
                        .map_err(|e| {
                            AppError::with_source(ErrorKind::Database, "Failed to reload user", e)
                        })?;
                Self::sync_roles(conn, id, role_ids).await?;
            }
        }

        Ok(affected)
    }
}
