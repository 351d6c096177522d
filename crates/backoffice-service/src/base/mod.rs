//! Generic service shared by every listed resource.
//!
//! [`BaseService`] pairs a repository with a [`ResourceProfile`]. Reads shape
//! entities into rows; writes run inside a transaction that commits only when
//! the whole operation succeeds.

mod cursor;
mod unit_of_work;

pub use cursor::PageCursor;
pub use unit_of_work::UnitOfWork;

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use futures::{StreamExt, TryStreamExt, stream};
use tracing::info;
use uuid::Uuid;

use backoffice_core::config::ListingConfig;
use backoffice_core::error::AppError;
use backoffice_core::result::AppResult;
use backoffice_core::traits::ResourceReader;
use backoffice_core::types::{Columns, ExportFormat, ListQuery, Page, PageResult};
use backoffice_database::{RecordKey, RecordKeys, ResourceWriter};
use backoffice_export::{ExporterRegistry, RowStream};

use crate::profile::ResourceProfile;
use crate::resource::{BulkAction, ExportDownload, ResourceService};

/// Listing, export, point reads and transactional writes for one resource.
pub struct BaseService<R, P> {
    repo: Arc<R>,
    exporters: Arc<ExporterRegistry>,
    listing: ListingConfig,
    _profile: PhantomData<fn() -> P>,
}

impl<R, P> BaseService<R, P>
where
    R: ResourceReader,
    P: ResourceProfile<Entity = R::Entity>,
{
    /// Creates a new service.
    pub fn new(repo: Arc<R>, exporters: Arc<ExporterRegistry>, listing: ListingConfig) -> Self {
        Self {
            repo,
            exporters,
            listing,
            _profile: PhantomData,
        }
    }

    /// The underlying repository.
    pub fn repository(&self) -> &Arc<R> {
        &self.repo
    }

    /// Listing limits in effect.
    pub fn listing(&self) -> &ListingConfig {
        &self.listing
    }

    /// One page of rows matching `query`.
    pub async fn list(&self, query: &ListQuery) -> AppResult<PageResult> {
        let page = self.repo.paginate(query).await?;
        Ok(Self::page_result(page))
    }

    /// One page of the records in `ids`, newest id first. `per_page` is
    /// capped at the configured selected-listing maximum.
    pub async fn list_by_ids_desc(
        &self,
        ids: &[i64],
        page: u32,
        per_page: u32,
    ) -> AppResult<PageResult> {
        let per_page = per_page.clamp(1, self.listing.selected_max_per_page.max(1));
        let page = self.repo.paginate_by_ids_desc(ids, page, per_page).await?;
        Ok(Self::page_result(page))
    }

    /// Stream an export of every row matching `query`.
    ///
    /// `columns` narrows the profile's default export columns (unknown keys
    /// are ignored); `filename` overrides the generated name.
    pub async fn export(
        &self,
        query: &ListQuery,
        format: ExportFormat,
        columns: Option<&[String]>,
        filename: Option<String>,
    ) -> AppResult<ExportDownload> {
        let exporter = self.exporters.get(format)?;
        let columns = Self::export_columns(columns);
        let mut rows = self.export_rows(query, columns.clone());
        // The first page is read here so a failing query is reported before
        // any byte of the download is sent.
        let first = rows.try_next().await?;
        let rows: RowStream = Box::pin(stream::iter(first.map(Ok::<_, AppError>)).chain(rows));
        let filename = filename.unwrap_or_else(|| P::export_filename(format, Utc::now()));

        info!(
            resource = P::RESOURCE,
            %format,
            filename = %filename,
            page_size = self.listing.export_page_size,
            "Starting export"
        );

        Ok(ExportDownload {
            filename,
            format,
            body: exporter.stream(rows, columns),
        })
    }

    /// Lazily read and project every row matching `query`, one repository
    /// page at a time.
    pub fn export_rows(&self, query: &ListQuery, columns: Columns) -> RowStream {
        Box::pin(
            PageCursor::new(Arc::clone(&self.repo), query, self.listing.export_page_size)
                .into_stream()
                .map_ok(move |entity| columns.project(&P::to_row(&entity))),
        )
    }

    /// Find a record by primary key.
    pub async fn get_by_id(&self, id: i64) -> AppResult<Option<R::Entity>> {
        self.repo.find_by_id(id).await
    }

    /// Find a record by primary key or fail with `NotFound`.
    pub async fn get_or_fail_by_id(&self, id: i64) -> AppResult<R::Entity> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| Self::not_found(&id.to_string()))
    }

    /// Find a record by uuid.
    pub async fn get_by_uuid(&self, uuid: Uuid) -> AppResult<Option<R::Entity>> {
        self.repo.find_by_uuid(uuid).await
    }

    /// Find a record by uuid or fail with `NotFound`.
    pub async fn get_or_fail_by_uuid(&self, uuid: Uuid) -> AppResult<R::Entity> {
        self.get_by_uuid(uuid)
            .await?
            .ok_or_else(|| Self::not_found(&uuid.to_string()))
    }

    fn export_columns(selected: Option<&[String]>) -> Columns {
        let defaults = P::export_columns();
        match selected {
            Some(keys) if !keys.is_empty() => {
                let narrowed = defaults.restrict(keys);
                if narrowed.is_empty() { defaults } else { narrowed }
            }
            _ => defaults,
        }
    }

    fn page_result(page: Page<R::Entity>) -> PageResult {
        PageResult {
            meta: page.meta(),
            rows: page.items.iter().map(P::to_row).collect(),
        }
    }

    fn not_found(key: &str) -> AppError {
        AppError::not_found(format!("{} record {key} not found", P::RESOURCE))
    }
}

impl<R, P> BaseService<R, P>
where
    R: ResourceWriter,
    P: ResourceProfile<Entity = R::Entity>,
{
    /// Open a transaction for callers composing several writes.
    pub async fn transaction(&self) -> AppResult<UnitOfWork> {
        Ok(UnitOfWork::new(self.repo.begin().await?))
    }

    /// Open a transaction holding a row lock on the record with `id`.
    /// Concurrent lockers of the same row wait until the guard is committed
    /// or dropped.
    pub async fn with_pessimistic_lock_by_id(&self, id: i64) -> AppResult<UnitOfWork> {
        self.lock(RecordKey::Id(id), &id.to_string()).await
    }

    /// Open a transaction holding a row lock on the record with `uuid`.
    pub async fn with_pessimistic_lock_by_uuid(&self, uuid: Uuid) -> AppResult<UnitOfWork> {
        self.lock(RecordKey::Uuid(uuid), &uuid.to_string()).await
    }

    async fn lock(&self, key: RecordKey, label: &str) -> AppResult<UnitOfWork> {
        let mut tx = self.repo.begin().await?;
        let id = self
            .repo
            .lock(&mut *tx, key)
            .await?
            .ok_or_else(|| Self::not_found(label))?;
        Ok(UnitOfWork::locked(tx, id))
    }

    /// Insert a record.
    pub async fn create(&self, input: &R::Create) -> AppResult<R::Entity> {
        let mut work = self.transaction().await?;
        let created = self.repo.create(work.conn(), input).await?;
        work.commit().await?;
        info!(resource = P::RESOURCE, "Record created");
        Ok(created)
    }

    /// Insert several records atomically.
    pub async fn create_many(&self, inputs: &[R::Create]) -> AppResult<Vec<R::Entity>> {
        let mut work = self.transaction().await?;
        let created = self.repo.create_many(work.conn(), inputs).await?;
        work.commit().await?;
        info!(resource = P::RESOURCE, count = created.len(), "Records created");
        Ok(created)
    }

    /// Apply a partial update.
    pub async fn update(&self, id: i64, input: &R::Update) -> AppResult<R::Entity> {
        let mut work = self.transaction().await?;
        let updated = self.repo.update(work.conn(), id, input).await?;
        work.commit().await?;
        info!(resource = P::RESOURCE, id, "Record updated");
        Ok(updated)
    }

    /// Insert or update on the natural key. Returns affected rows.
    pub async fn upsert(&self, rows: &[R::Create]) -> AppResult<u64> {
        let mut work = self.transaction().await?;
        let affected = self.repo.upsert(work.conn(), rows).await?;
        work.commit().await?;
        info!(resource = P::RESOURCE, affected, "Records upserted");
        Ok(affected)
    }

    /// Soft-delete one record. `false` when it was missing or already deleted.
    pub async fn delete(&self, id: i64) -> AppResult<bool> {
        Ok(self.bulk(BulkAction::Delete, RecordKeys::Ids(&[id])).await? > 0)
    }

    /// Permanently delete one record.
    pub async fn force_delete(&self, id: i64) -> AppResult<bool> {
        Ok(self.bulk(BulkAction::ForceDelete, RecordKeys::Ids(&[id])).await? > 0)
    }

    /// Restore one soft-deleted record.
    pub async fn restore(&self, id: i64) -> AppResult<bool> {
        Ok(self.bulk(BulkAction::Restore, RecordKeys::Ids(&[id])).await? > 0)
    }

    /// Set the active flag of one live record and return it.
    pub async fn set_active(&self, id: i64, active: bool) -> AppResult<R::Entity> {
        if self.bulk(BulkAction::SetActive(active), RecordKeys::Ids(&[id])).await? == 0 {
            return Err(Self::not_found(&id.to_string()));
        }
        self.get_or_fail_by_id(id).await
    }

    /// Soft-delete records by primary key.
    pub async fn bulk_delete_by_ids(&self, ids: &[i64]) -> AppResult<u64> {
        self.bulk(BulkAction::Delete, RecordKeys::Ids(ids)).await
    }

    /// Permanently delete records by primary key.
    pub async fn bulk_force_delete_by_ids(&self, ids: &[i64]) -> AppResult<u64> {
        self.bulk(BulkAction::ForceDelete, RecordKeys::Ids(ids)).await
    }

    /// Restore records by primary key.
    pub async fn bulk_restore_by_ids(&self, ids: &[i64]) -> AppResult<u64> {
        self.bulk(BulkAction::Restore, RecordKeys::Ids(ids)).await
    }

    /// Set the active flag on records by primary key.
    pub async fn bulk_set_active_by_ids(&self, ids: &[i64], active: bool) -> AppResult<u64> {
        self.bulk(BulkAction::SetActive(active), RecordKeys::Ids(ids))
            .await
    }

    /// Soft-delete records by uuid.
    pub async fn bulk_delete_by_uuids(&self, uuids: &[Uuid]) -> AppResult<u64> {
        self.bulk(BulkAction::Delete, RecordKeys::Uuids(uuids)).await
    }

    /// Permanently delete records by uuid.
    pub async fn bulk_force_delete_by_uuids(&self, uuids: &[Uuid]) -> AppResult<u64> {
        self.bulk(BulkAction::ForceDelete, RecordKeys::Uuids(uuids))
            .await
    }

    /// Restore records by uuid.
    pub async fn bulk_restore_by_uuids(&self, uuids: &[Uuid]) -> AppResult<u64> {
        self.bulk(BulkAction::Restore, RecordKeys::Uuids(uuids)).await
    }

    /// Set the active flag on records by uuid.
    pub async fn bulk_set_active_by_uuids(&self, uuids: &[Uuid], active: bool) -> AppResult<u64> {
        self.bulk(BulkAction::SetActive(active), RecordKeys::Uuids(uuids))
            .await
    }

    async fn bulk(&self, action: BulkAction, keys: RecordKeys<'_>) -> AppResult<u64> {
        if keys.is_empty() {
            return Ok(0);
        }

        let mut work = self.transaction().await?;
        let affected = match action {
            BulkAction::Delete => self.repo.soft_delete(work.conn(), keys).await?,
            BulkAction::Restore => self.repo.restore(work.conn(), keys).await?,
            BulkAction::ForceDelete => self.repo.force_delete(work.conn(), keys).await?,
            BulkAction::SetActive(active) => {
                self.repo.set_active(work.conn(), keys, active).await?
            }
        };
        work.commit().await?;

        info!(resource = P::RESOURCE, %action, affected, "Bulk operation applied");
        Ok(affected)
    }
}

#[async_trait]
impl<R, P> ResourceService for BaseService<R, P>
where
    R: ResourceWriter,
    P: ResourceProfile<Entity = R::Entity>,
{
    async fn list(&self, query: &ListQuery) -> AppResult<PageResult> {
        BaseService::list(self, query).await
    }

    async fn list_by_ids_desc(
        &self,
        ids: &[i64],
        page: u32,
        per_page: u32,
    ) -> AppResult<PageResult> {
        BaseService::list_by_ids_desc(self, ids, page, per_page).await
    }

    async fn export(&self, query: &ListQuery, format: ExportFormat) -> AppResult<ExportDownload> {
        BaseService::export(self, query, format, None, None).await
    }

    async fn bulk_by_ids(&self, action: BulkAction, ids: &[i64]) -> AppResult<u64> {
        self.bulk(action, RecordKeys::Ids(ids)).await
    }

    async fn bulk_by_uuids(&self, action: BulkAction, uuids: &[Uuid]) -> AppResult<u64> {
        self.bulk(action, RecordKeys::Uuids(uuids)).await
    }
}

#[cfg(test)]
mod tests {
    use futures::TryStreamExt;
    use serde_json::{Value, json};

    use backoffice_core::config::ExportConfig;
    use backoffice_core::types::Row;

    use super::cursor::tests::NumbersReader;
    use super::*;

    struct Numbers;

    impl ResourceProfile for Numbers {
        type Entity = i64;
        const RESOURCE: &'static str = "numbers";

        fn to_row(n: &i64) -> Row {
            json!({"id": n, "label": format!("n{n}"), "even": n % 2 == 0})
                .as_object()
                .cloned()
                .unwrap()
        }

        fn export_columns() -> Columns {
            Columns::new([("id", "#"), ("label", "Etiqueta"), ("even", "Par")])
        }
    }

    fn service(total: i64, export_page_size: u32) -> BaseService<NumbersReader, Numbers> {
        let listing = ListingConfig {
            export_page_size,
            ..ListingConfig::default()
        };
        BaseService::new(
            Arc::new(NumbersReader::new(total)),
            Arc::new(ExporterRegistry::from_config(&ExportConfig::default())),
            listing,
        )
    }

    async fn body_text(download: ExportDownload) -> String {
        let bytes = download
            .body
            .try_fold(Vec::new(), |mut acc, chunk| async move {
                acc.extend_from_slice(&chunk);
                Ok(acc)
            })
            .await
            .unwrap();
        String::from_utf8(bytes).unwrap()
    }

    #[tokio::test]
    async fn test_list_returns_rows_and_meta() {
        let result = service(31, 1000).list(&ListQuery::new(3, 15)).await.unwrap();
        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.rows[0]["label"], "n31");
        assert_eq!(result.meta.current_page, 3);
        assert_eq!(result.meta.total, 31);
        assert_eq!(result.meta.last_page, 3);
    }

    #[tokio::test]
    async fn test_selected_rows_are_id_descending_and_capped() {
        let result = service(50, 1000)
            .list_by_ids_desc(&[3, 41, 7, 12], 1, 500)
            .await
            .unwrap();
        let ids: Vec<&Value> = result.rows.iter().map(|r| &r["id"]).collect();
        assert_eq!(ids, [&json!(41), &json!(12), &json!(7), &json!(3)]);
        assert_eq!(result.meta.per_page, 100);
    }

    #[tokio::test]
    async fn test_export_streams_every_page() {
        let service = service(5, 2);
        let download = service
            .export(&ListQuery::new(1, 15), ExportFormat::Csv, None, None)
            .await
            .unwrap();

        assert!(download.filename.starts_with("numbers_export_"));
        assert!(download.filename.ends_with(".csv"));
        assert_eq!(download.content_type(), "text/csv; charset=UTF-8");
        assert_eq!(
            body_text(download).await,
            "#,Etiqueta,Par\n1,n1,Inactivo\n2,n2,Activo\n3,n3,Inactivo\n4,n4,Activo\n5,n5,Inactivo\n"
        );
        assert_eq!(service.repository().calls.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_export_fails_before_download_when_first_page_fails() {
        let reader = NumbersReader {
            fail_on_page: Some(1),
            ..NumbersReader::new(3)
        };
        let service: BaseService<NumbersReader, Numbers> = BaseService::new(
            Arc::new(reader),
            Arc::new(ExporterRegistry::from_config(&ExportConfig::default())),
            ListingConfig::default(),
        );

        let err = service
            .export(&ListQuery::new(1, 15), ExportFormat::Csv, None, None)
            .await
            .unwrap_err();
        assert_eq!(err.kind, backoffice_core::error::ErrorKind::Database);
    }

    #[tokio::test]
    async fn test_export_projects_selected_columns() {
        let columns = vec!["label".to_string(), "secret".to_string()];
        let download = service(2, 1000)
            .export(
                &ListQuery::new(1, 15),
                ExportFormat::Csv,
                Some(&columns),
                Some("custom.csv".into()),
            )
            .await
            .unwrap();

        assert_eq!(download.filename, "custom.csv");
        assert_eq!(body_text(download).await, "Etiqueta\nn1\nn2\n");
    }

    #[tokio::test]
    async fn test_list_and_export_share_row_shape() {
        let service = service(3, 1000);
        let listed = service.list(&ListQuery::new(1, 15)).await.unwrap();
        let exported: Vec<Row> = service
            .export_rows(&ListQuery::new(1, 15), Numbers::export_columns())
            .try_collect()
            .await
            .unwrap();
        assert_eq!(listed.rows, exported);
    }

    #[tokio::test]
    async fn test_get_or_fail_reports_not_found() {
        let err = service(3, 1000).get_or_fail_by_id(9).await.unwrap_err();
        assert_eq!(err.kind, backoffice_core::error::ErrorKind::NotFound);
    }
}
