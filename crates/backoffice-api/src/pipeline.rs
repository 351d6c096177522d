//! The generic index, export, bulk and selected pipeline shared by every
//! resource.
//!
//! Authorization and validation failures are returned as errors and end the
//! request. Failures after that point are turned into a flash message for the
//! redirect back to the index: domain errors keep their message, anything
//! else is logged and replaced by a generic one.

use std::io;
use std::sync::Arc;

use futures::{StreamExt, stream};
use tracing::{error, info};

use backoffice_auth::principal::Principal;
use backoffice_auth::rbac::{Ability, RbacEnforcer, Resource};
use backoffice_core::config::ListingConfig;
use backoffice_core::error::AppError;
use backoffice_core::result::AppResult;
use backoffice_core::types::{ExportFormat, ListSpec, PageResult};
use backoffice_export::ByteStream;
use backoffice_service::resource::{BulkAction, ExportDownload, ResourceService};

use crate::dto::request::BulkRequest;
use crate::extractors::query::{QueryPairs, list_query, selected_params};
use crate::flash::FlashMessage;

/// Flashed when an export fails for a reason the user cannot act on.
pub const EXPORT_FAILED: &str = "Error durante la exportación. Inténtelo nuevamente.";
/// Flashed when a bulk action fails for a reason the user cannot act on.
pub const BULK_FAILED: &str = "Error durante la operación masiva. Inténtelo nuevamente.";
/// Flashed when a bulk request addresses no records.
pub const IDS_REQUIRED: &str = "Se requieren IDs o UUIDs para la operación";

/// Static description of a resource as served by the pipeline.
#[derive(Debug, Clone, Copy)]
pub struct ResourceConfig {
    /// Policy resource.
    pub resource: Resource,
    /// Component rendered by the index page.
    pub view: &'static str,
    /// Index URL; redirects land here.
    pub index_path: &'static str,
    /// Accepted sort fields and filters.
    pub list_spec: &'static ListSpec,
    /// Formats the export endpoint serves.
    pub export_formats: &'static [ExportFormat],
    /// Served when the requested format is missing or not allowed.
    pub default_export_format: ExportFormat,
}

/// Outcome of an export request.
#[derive(Debug)]
pub enum ExportReply {
    /// Stream the file.
    Download(ExportDownload),
    /// Go back to the index with a message.
    Redirect(FlashMessage),
}

/// Runs the generic endpoints of one resource.
pub struct IndexHandler {
    service: Arc<dyn ResourceService>,
    config: ResourceConfig,
    enforcer: Arc<RbacEnforcer>,
    listing: ListingConfig,
}

impl IndexHandler {
    /// Creates a handler for `config` backed by `service`.
    pub fn new(
        service: Arc<dyn ResourceService>,
        config: ResourceConfig,
        enforcer: Arc<RbacEnforcer>,
        listing: ListingConfig,
    ) -> Self {
        Self {
            service,
            config,
            enforcer,
            listing,
        }
    }

    /// The resource this handler serves.
    pub fn config(&self) -> &ResourceConfig {
        &self.config
    }

    /// The service behind the pipeline.
    pub fn service(&self) -> &Arc<dyn ResourceService> {
        &self.service
    }

    /// One page of rows for the index table.
    pub async fn index(&self, principal: &Principal, pairs: &QueryPairs) -> AppResult<PageResult> {
        self.authorize(principal, Ability::ViewAny)?;
        let query = list_query(pairs, self.config.list_spec, &self.listing)?;
        self.service.list(&query).await
    }

    /// Stream every row matching the listing parameters in `format`.
    pub async fn export(&self, principal: &Principal, pairs: &QueryPairs) -> AppResult<ExportReply> {
        self.authorize(principal, Ability::Export)?;
        let query = list_query(pairs, self.config.list_spec, &self.listing)?;
        let format = self.resolve_format(pairs.get("format"));

        let started = match self.service.export(&query, format).await {
            Ok(download) => first_chunk(download).await,
            Err(e) => Err(e),
        };
        match started {
            Ok(download) => Ok(ExportReply::Download(download)),
            Err(e) => Ok(ExportReply::Redirect(recover(e, EXPORT_FAILED))),
        }
    }

    /// Apply a bulk action and describe the outcome.
    pub async fn bulk(&self, principal: &Principal, request: &BulkRequest) -> AppResult<FlashMessage> {
        self.authorize(principal, Ability::Update)?;
        let action = request.checked()?;

        if request.is_empty() {
            return Ok(FlashMessage::error(IDS_REQUIRED));
        }

        match self.dispatch(action, request).await {
            Ok(count) => {
                info!(resource = %self.config.resource, %action, count, "Bulk action completed");
                Ok(FlashMessage::success(format!(
                    "{count} registro(s) {} exitosamente",
                    action.past_participle()
                )))
            }
            Err(e) => Ok(recover(e, BULK_FAILED)),
        }
    }

    /// One page of the given records, newest id first.
    pub async fn selected(&self, principal: &Principal, pairs: &QueryPairs) -> AppResult<PageResult> {
        self.authorize(principal, Ability::ViewAny)?;
        let params = selected_params(pairs, &self.listing)?;
        self.service
            .list_by_ids_desc(&params.ids, params.page, params.per_page)
            .await
    }

    /// The allowed format named by `requested`, or the resource default.
    pub fn resolve_format(&self, requested: Option<&str>) -> ExportFormat {
        requested
            .and_then(ExportFormat::parse)
            .filter(|f| self.config.export_formats.contains(f))
            .unwrap_or(self.config.default_export_format)
    }

    fn authorize(&self, principal: &Principal, ability: Ability) -> AppResult<()> {
        self.enforcer.authorize(principal, self.config.resource, ability)
    }

    // Ids first, then uuids; both run even when one list is empty.
    async fn dispatch(&self, action: BulkAction, request: &BulkRequest) -> AppResult<u64> {
        let by_ids = self.service.bulk_by_ids(action, request.ids()).await?;
        let by_uuids = self.service.bulk_by_uuids(action, request.uuids()).await?;
        Ok(by_ids + by_uuids)
    }
}

// Headers go out with the first chunk, so an encoder that fails before
// producing anything must be caught here.
async fn first_chunk(download: ExportDownload) -> AppResult<ExportDownload> {
    let ExportDownload {
        filename,
        format,
        mut body,
    } = download;
    let body: ByteStream = match body.next().await {
        Some(Ok(first)) => Box::pin(stream::iter([Ok::<_, io::Error>(first)]).chain(body)),
        Some(Err(e)) => return Err(e.into()),
        None => body,
    };
    Ok(ExportDownload {
        filename,
        format,
        body,
    })
}

/// Turn a failure into the message flashed to the user.
pub fn recover(err: AppError, generic: &str) -> FlashMessage {
    if err.is_domain() {
        FlashMessage::error(err.message)
    } else {
        error!(kind = %err.kind, error = %err, "Operation failed");
        FlashMessage::error(generic)
    }
}
