//! Read-side repository port.

use async_trait::async_trait;
use uuid::Uuid;

use crate::result::AppResult;
use crate::types::list_query::ListQuery;
use crate::types::pagination::Page;

/// Paginated and point reads over a soft-deletable resource.
///
/// Implemented by the PostgreSQL repositories and by in-memory fakes in
/// tests. Write operations live on the database crate's writer trait since
/// they need a transaction handle.
#[async_trait]
pub trait ResourceReader: Send + Sync + 'static {
    /// The entity type this repository loads.
    type Entity: Send + Sync + 'static;

    /// Load one page matching the query's search, filters and sort.
    async fn paginate(&self, query: &ListQuery) -> AppResult<Page<Self::Entity>>;

    /// Load one page of the given ids, always ordered by id descending.
    async fn paginate_by_ids_desc(
        &self,
        ids: &[i64],
        page: u32,
        per_page: u32,
    ) -> AppResult<Page<Self::Entity>>;

    /// Find a record by primary key, including soft-deleted ones.
    async fn find_by_id(&self, id: i64) -> AppResult<Option<Self::Entity>>;

    /// Find a record by its external identifier, including soft-deleted ones.
    async fn find_by_uuid(&self, uuid: Uuid) -> AppResult<Option<Self::Entity>>;
}
