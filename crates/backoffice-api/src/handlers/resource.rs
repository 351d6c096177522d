//! Handler glue shared by the role and user endpoints: rendering listing
//! results, streaming downloads and flashing recoverable failures.

use axum::body::Body;
use axum::http::header::{CACHE_CONTROL, CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::{IntoResponse, Redirect, Response};
use tower_sessions::Session;

use backoffice_core::error::AppError;
use backoffice_core::result::AppResult;
use backoffice_core::types::PageResult;
use backoffice_service::resource::ExportDownload;

use crate::dto::request::BulkRequest;
use crate::error::ApiResult;
use crate::extractors::auth::AuthUser;
use crate::extractors::query::QueryPairs;
use crate::flash::{self, FlashMessage};
use crate::page::{PageContext, PageView};
use crate::pipeline::{ExportReply, IndexHandler};

/// The index page with `rows` and `meta` filled in.
pub async fn index_page(
    handler: &IndexHandler,
    auth: &AuthUser,
    page: PageContext,
    pairs: &QueryPairs,
) -> AppResult<PageView> {
    let result = handler.index(&auth.principal, pairs).await?;
    page_view(handler.config().view, page, result)
}

/// Stream the export, or go back to the index with the failure flashed.
pub async fn export(
    handler: &IndexHandler,
    session: &Session,
    auth: &AuthUser,
    pairs: &QueryPairs,
) -> ApiResult<Response> {
    match handler.export(&auth.principal, pairs).await? {
        ExportReply::Download(download) => Ok(download_response(download)),
        ExportReply::Redirect(message) => {
            let redirect = flash::redirect_with(session, handler.config().index_path, message).await?;
            Ok(redirect.into_response())
        }
    }
}

/// Run a generic bulk action and redirect to the index with its outcome.
pub async fn bulk(
    handler: &IndexHandler,
    session: &Session,
    auth: &AuthUser,
    request: &BulkRequest,
) -> ApiResult<Redirect> {
    let message = handler.bulk(&auth.principal, request).await?;
    Ok(flash::redirect_with(session, handler.config().index_path, message).await?)
}

/// The index view holding only the selected rows, newest id first.
pub async fn selected(
    handler: &IndexHandler,
    auth: &AuthUser,
    page: PageContext,
    pairs: &QueryPairs,
) -> AppResult<PageView> {
    let result = handler.selected(&auth.principal, pairs).await?;
    page_view(handler.config().view, page, result)
}

fn page_view(view: &str, page: PageContext, result: PageResult) -> AppResult<PageView> {
    PageView::new(view, page)?
        .with("rows", &result.rows)?
        .with("meta", result.meta)
}

/// Attachment response streaming the export body.
pub fn download_response(download: ExportDownload) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", download.filename);
    (
        [
            (CONTENT_TYPE, download.content_type().to_string()),
            (CONTENT_DISPOSITION, disposition),
            (CACHE_CONTROL, "no-store".to_string()),
        ],
        Body::from_stream(download.body),
    )
        .into_response()
}

/// Redirect with `success` flashed.
pub async fn redirect_success(session: &Session, to: &str, message: String) -> ApiResult<Redirect> {
    Ok(flash::redirect_with(session, to, FlashMessage::success(message)).await?)
}

/// Flash a domain failure and redirect to `to`; any other error is returned.
pub async fn redirect_on_domain_error(session: &Session, to: &str, err: AppError) -> ApiResult<Redirect> {
    if err.is_domain() {
        Ok(flash::redirect_with(session, to, FlashMessage::error(err.message)).await?)
    } else {
        Err(err.into())
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum::http::header::LOCATION;
    use backoffice_core::types::ExportFormat;
    use bytes::Bytes;

    use crate::flash::tests::memory_session;

    use super::*;

    #[tokio::test]
    async fn test_download_sets_attachment_headers() {
        let body = futures::stream::iter([Ok::<_, std::io::Error>(Bytes::from_static(b"ID,Nombre\n"))]);
        let response = download_response(ExportDownload {
            filename: "roles_20260101_120000.csv".into(),
            format: ExportFormat::Csv,
            body: Box::pin(body),
        });

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers[CONTENT_TYPE], "text/csv; charset=UTF-8");
        assert_eq!(
            headers[CONTENT_DISPOSITION],
            "attachment; filename=\"roles_20260101_120000.csv\""
        );

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"ID,Nombre\n");
    }

    #[test]
    fn test_listing_results_render_the_index_view() {
        let row = serde_json::json!({"id": 2, "name": "editor"})
            .as_object()
            .cloned()
            .unwrap();
        let page = PageContext {
            url: "/roles/selected?ids[]=2".into(),
            ..PageContext::default()
        };
        let result = PageResult {
            rows: vec![row],
            meta: backoffice_core::types::PageMeta::new(1, 15, 1),
        };

        let view = page_view("roles/index", page, result).unwrap();
        assert_eq!(view.component, "roles/index");
        assert_eq!(view.url, "/roles/selected?ids[]=2");
        assert_eq!(view.props["rows"][0]["name"], "editor");
        assert_eq!(view.props["meta"]["total"], 1);
        assert!(view.props.contains_key("flash"));
    }

    #[tokio::test]
    async fn test_domain_errors_are_flashed() {
        let session = memory_session();
        let redirect = redirect_on_domain_error(&session, "/roles", AppError::domain("No se puede eliminar"))
            .await
            .unwrap();

        let response = redirect.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[LOCATION], "/roles");
        assert_eq!(
            flash::take(&session).await.unwrap(),
            [FlashMessage::error("No se puede eliminar")]
        );
    }

    #[tokio::test]
    async fn test_other_errors_propagate() {
        let session = memory_session();
        let err = redirect_on_domain_error(&session, "/roles", AppError::not_found("Role not found"))
            .await
            .unwrap_err();
        assert_eq!(err.0.kind, backoffice_core::error::ErrorKind::NotFound);
        assert!(flash::take(&session).await.unwrap().is_empty());
    }
}
