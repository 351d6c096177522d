//! Write-side repository port.
//!
//! Every write takes a `&mut PgConnection` so callers decide the
//! transaction boundary. Lifecycle operations shared by all soft-deletable
//! tables (soft delete, restore, force delete, activation, row locks) have
//! default implementations keyed on [`ResourceWriter::TABLE`].

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder, Transaction};
use uuid::Uuid;

use backoffice_core::error::{AppError, ErrorKind};
use backoffice_core::result::AppResult;
use backoffice_core::traits::ResourceReader;

/// A single record addressed by primary key or external identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKey {
    /// Primary key.
    Id(i64),
    /// External identifier.
    Uuid(Uuid),
}

/// A set of records addressed by primary keys or external identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKeys<'a> {
    /// Primary keys.
    Ids(&'a [i64]),
    /// External identifiers.
    Uuids(&'a [Uuid]),
}

impl RecordKeys<'_> {
    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Ids(ids) => ids.is_empty(),
            Self::Uuids(uuids) => uuids.is_empty(),
        }
    }

    fn push_match(&self, builder: &mut QueryBuilder<'_, Postgres>) {
        match self {
            Self::Ids(ids) => {
                builder.push(" AND id = ANY(");
                builder.push_bind(ids.to_vec());
            }
            Self::Uuids(uuids) => {
                builder.push(" AND uuid = ANY(");
                builder.push_bind(uuids.to_vec());
            }
        }
        builder.push(")");
    }
}

/// Transactional writes over a soft-deletable table.
#[async_trait]
pub trait ResourceWriter: ResourceReader {
    /// Payload for inserts.
    type Create: Send + Sync + 'static;
    /// Payload for partial updates.
    type Update: Send + Sync + 'static;

    /// Backing table name.
    const TABLE: &'static str;

    /// The pool transactions are opened on.
    fn pool(&self) -> &PgPool;

    /// Open a transaction.
    async fn begin(&self) -> AppResult<Transaction<'static, Postgres>> {
        self.pool().begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })
    }

    /// Insert a record and return it as stored.
    async fn create(&self, conn: &mut PgConnection, input: &Self::Create)
    -> AppResult<Self::Entity>;

    /// Insert several records.
    async fn create_many(
        &self,
        conn: &mut PgConnection,
        inputs: &[Self::Create],
    ) -> AppResult<Vec<Self::Entity>> {
        let mut created = Vec::with_capacity(inputs.len());
        for input in inputs {
            created.push(self.create(&mut *conn, input).await?);
        }
        Ok(created)
    }

    /// Apply a partial update and return the updated record.
    async fn update(
        &self,
        conn: &mut PgConnection,
        id: i64,
        input: &Self::Update,
    ) -> AppResult<Self::Entity>;

    /// Insert or update on the table's natural key. Returns affected rows.
    async fn upsert(&self, conn: &mut PgConnection, rows: &[Self::Create]) -> AppResult<u64>;

    /// Soft-delete live records. Returns how many were tombstoned.
    async fn soft_delete(&self, conn: &mut PgConnection, keys: RecordKeys<'_>) -> AppResult<u64> {
        if keys.is_empty() {
            return Ok(0);
        }
        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "UPDATE {} SET deleted_at = NOW(), updated_at = NOW() WHERE deleted_at IS NULL",
            Self::TABLE
        ));
        keys.push_match(&mut builder);
        execute(conn, builder, "Failed to delete records").await
    }

    /// Clear the tombstone of soft-deleted records.
    async fn restore(&self, conn: &mut PgConnection, keys: RecordKeys<'_>) -> AppResult<u64> {
        if keys.is_empty() {
            return Ok(0);
        }
        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "UPDATE {} SET deleted_at = NULL, updated_at = NOW() WHERE deleted_at IS NOT NULL",
            Self::TABLE
        ));
        keys.push_match(&mut builder);
        execute(conn, builder, "Failed to restore records").await
    }

    /// Permanently remove records, live or tombstoned.
    async fn force_delete(&self, conn: &mut PgConnection, keys: RecordKeys<'_>) -> AppResult<u64> {
        if keys.is_empty() {
            return Ok(0);
        }
        let mut builder =
            QueryBuilder::<Postgres>::new(format!("DELETE FROM {} WHERE TRUE", Self::TABLE));
        keys.push_match(&mut builder);
        execute(conn, builder, "Failed to permanently delete records").await
    }

    /// Set the active flag on live records.
    async fn set_active(
        &self,
        conn: &mut PgConnection,
        keys: RecordKeys<'_>,
        active: bool,
    ) -> AppResult<u64> {
        if keys.is_empty() {
            return Ok(0);
        }
        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "UPDATE {} SET is_active = ",
            Self::TABLE
        ));
        builder.push_bind(active);
        builder.push(", updated_at = NOW() WHERE deleted_at IS NULL");
        keys.push_match(&mut builder);
        execute(conn, builder, "Failed to update active flag").await
    }

    /// Take a `FOR UPDATE` lock on one row for the rest of the transaction.
    /// Returns the locked primary key, or `None` if the row does not exist.
    async fn lock(&self, conn: &mut PgConnection, key: RecordKey) -> AppResult<Option<i64>> {
        let mut builder =
            QueryBuilder::<Postgres>::new(format!("SELECT id FROM {} WHERE TRUE", Self::TABLE));
        match key {
            RecordKey::Id(id) => {
                builder.push(" AND id = ");
                builder.push_bind(id);
            }
            RecordKey::Uuid(uuid) => {
                builder.push(" AND uuid = ");
                builder.push_bind(uuid);
            }
        }
        builder.push(" FOR UPDATE");
        builder
            .build_query_scalar::<i64>()
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to lock record", e))
    }
}

async fn execute(
    conn: &mut PgConnection,
    mut builder: QueryBuilder<'_, Postgres>,
    context: &'static str,
) -> AppResult<u64> {
    builder
        .build()
        .execute(&mut *conn)
        .await
        .map(|r| r.rows_affected())
        .map_err(|e| AppError::with_source(ErrorKind::Database, context, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_match_sql() {
        let mut builder = QueryBuilder::<Postgres>::new("DELETE FROM users WHERE TRUE");
        RecordKeys::Uuids(&[Uuid::nil()]).push_match(&mut builder);
        assert_eq!(builder.sql(), "DELETE FROM users WHERE TRUE AND uuid = ANY($1)");
    }

    #[test]
    fn test_empty_keys() {
        assert!(RecordKeys::Ids(&[]).is_empty());
        assert!(!RecordKeys::Ids(&[4]).is_empty());
    }
}
