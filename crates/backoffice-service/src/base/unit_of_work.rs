//! Transaction guard handed to callers that compose several writes.

use sqlx::{PgConnection, Postgres, Transaction};

use backoffice_core::error::{AppError, ErrorKind};
use backoffice_core::result::AppResult;

/// An open transaction, optionally holding a `FOR UPDATE` row lock.
///
/// Every write made through [`conn`](Self::conn) becomes visible only on
/// [`commit`](Self::commit). Dropping the guard rolls everything back and
/// releases the lock.
pub struct UnitOfWork {
    tx: Transaction<'static, Postgres>,
    locked_id: Option<i64>,
}

impl UnitOfWork {
    pub(crate) fn new(tx: Transaction<'static, Postgres>) -> Self {
        Self { tx, locked_id: None }
    }

    pub(crate) fn locked(tx: Transaction<'static, Postgres>, id: i64) -> Self {
        Self {
            tx,
            locked_id: Some(id),
        }
    }

    /// Connection bound to the transaction.
    pub fn conn(&mut self) -> &mut PgConnection {
        &mut *self.tx
    }

    /// Primary key of the locked row, for guards built by a lock helper.
    pub fn locked_id(&self) -> Option<i64> {
        self.locked_id
    }

    /// Commit all writes and release any lock.
    pub async fn commit(self) -> AppResult<()> {
        self.tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit transaction", e)
        })
    }
}

impl std::fmt::Debug for UnitOfWork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnitOfWork")
            .field("locked_id", &self.locked_id)
            .finish_non_exhaustive()
    }
}
