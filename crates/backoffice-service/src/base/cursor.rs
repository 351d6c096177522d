//! Page-by-page iteration over a listing.

use std::sync::Arc;

use futures::stream::{self, BoxStream};
use futures::{StreamExt, TryStreamExt};

use backoffice_core::error::AppError;
use backoffice_core::result::AppResult;
use backoffice_core::traits::ResourceReader;
use backoffice_core::types::ListQuery;

/// Walks every entity matching a query by re-issuing it one page at a time.
///
/// At most one page is held in memory. The resulting stream is single-pass;
/// to iterate again, build a new cursor.
pub struct PageCursor<R: ResourceReader> {
    reader: Arc<R>,
    query: ListQuery,
    page_size: u32,
}

impl<R: ResourceReader> PageCursor<R> {
    /// Create a cursor over `query` fetching `page_size` entities per round trip.
    /// The query's own page and page size are ignored.
    pub fn new(reader: Arc<R>, query: &ListQuery, page_size: u32) -> Self {
        Self {
            reader,
            query: query.clone(),
            page_size: page_size.max(1),
        }
    }

    /// Consume the cursor into a lazy entity stream.
    pub fn into_stream(self) -> BoxStream<'static, AppResult<R::Entity>> {
        let Self {
            reader,
            query,
            page_size,
        } = self;

        stream::try_unfold(Some(1u32), move |next| {
            let reader = Arc::clone(&reader);
            let query = query.with_page(next.unwrap_or(1), page_size);
            async move {
                let Some(page) = next else {
                    return Ok(None);
                };
                let result = reader.paginate(&query).await?;
                let last_page = result.meta().last_page;
                let following = (page < last_page && !result.items.is_empty()).then_some(page + 1);
                tracing::debug!(page, last_page, rows = result.items.len(), "Fetched export page");
                Ok::<_, AppError>(Some((result.items, following)))
            }
        })
        .map_ok(|items| stream::iter(items.into_iter().map(Ok::<_, AppError>)))
        .try_flatten()
        .boxed()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use uuid::Uuid;

    use backoffice_core::types::Page;

    use super::*;

    /// In-memory reader over `1..=total`, recording requested pages.
    pub(crate) struct NumbersReader {
        pub total: i64,
        pub calls: Mutex<Vec<(u32, u32)>>,
        pub fail_on_page: Option<u32>,
    }

    impl NumbersReader {
        pub fn new(total: i64) -> Self {
            Self {
                total,
                calls: Mutex::new(Vec::new()),
                fail_on_page: None,
            }
        }
    }

    #[async_trait]
    impl ResourceReader for NumbersReader {
        type Entity = i64;

        async fn paginate(&self, query: &ListQuery) -> AppResult<Page<i64>> {
            self.calls
                .lock()
                .unwrap()
                .push((query.page(), query.per_page()));
            if self.fail_on_page == Some(query.page()) {
                return Err(AppError::database("connection lost"));
            }
            let items = (1..=self.total)
                .skip(query.offset() as usize)
                .take(query.limit() as usize)
                .collect();
            Ok(Page::new(
                items,
                self.total as u64,
                query.page(),
                query.per_page(),
            ))
        }

        async fn paginate_by_ids_desc(
            &self,
            ids: &[i64],
            page: u32,
            per_page: u32,
        ) -> AppResult<Page<i64>> {
            let mut wanted: Vec<i64> = ids
                .iter()
                .copied()
                .filter(|id| (1..=self.total).contains(id))
                .collect();
            wanted.sort_unstable_by(|a, b| b.cmp(a));
            wanted.dedup();
            let window = ListQuery::new(page, per_page);
            let total = wanted.len() as u64;
            let items = wanted
                .into_iter()
                .skip(window.offset() as usize)
                .take(window.limit() as usize)
                .collect();
            Ok(Page::new(items, total, window.page(), window.per_page()))
        }

        async fn find_by_id(&self, id: i64) -> AppResult<Option<i64>> {
            Ok((1..=self.total).contains(&id).then_some(id))
        }

        async fn find_by_uuid(&self, _uuid: Uuid) -> AppResult<Option<i64>> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn test_cursor_reads_every_page_once() {
        let reader = Arc::new(NumbersReader::new(5));
        let query = ListQuery::new(4, 15).with_search(Some("x".into()));
        let items: Vec<i64> = PageCursor::new(Arc::clone(&reader), &query, 2)
            .into_stream()
            .try_collect()
            .await
            .unwrap();

        assert_eq!(items, vec![1, 2, 3, 4, 5]);
        assert_eq!(*reader.calls.lock().unwrap(), vec![(1, 2), (2, 2), (3, 2)]);
    }

    #[tokio::test]
    async fn test_empty_listing_issues_one_query() {
        let reader = Arc::new(NumbersReader::new(0));
        let items: Vec<i64> = PageCursor::new(Arc::clone(&reader), &ListQuery::new(1, 15), 1000)
            .into_stream()
            .try_collect()
            .await
            .unwrap();

        assert!(items.is_empty());
        assert_eq!(reader.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failure_ends_stream() {
        let mut numbers = NumbersReader::new(10);
        numbers.fail_on_page = Some(2);
        let mut stream = PageCursor::new(Arc::new(numbers), &ListQuery::new(1, 15), 4).into_stream();

        let mut seen = Vec::new();
        let mut failed = false;
        while let Some(item) = stream.next().await {
            match item {
                Ok(n) => seen.push(n),
                Err(_) => {
                    failed = true;
                    break;
                }
            }
        }
        assert_eq!(seen, vec![1, 2, 3, 4]);
        assert!(failed);
    }
}
