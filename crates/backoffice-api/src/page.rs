//! The rendered page envelope: a client component name plus its props.

use axum::Json;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::{Map, Value};
use tower_sessions::Session;

use backoffice_core::error::AppError;
use backoffice_core::result::AppResult;

use crate::error::ApiError;
use crate::flash::{self, FlashProps};
use crate::middleware::request_id::request_id;

/// Props shared by every page: pending flash messages and the request id.
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    /// Path and query the page was requested with.
    pub url: String,
    /// `x-request-id` of the current request.
    pub request_id: Option<String>,
    /// Flash messages taken from the session.
    pub flash: FlashProps,
}

impl<S> FromRequestParts<S> for PageContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::internal("Session layer is not installed"))?;
        let messages = flash::take(&session).await?;

        Ok(Self {
            url: parts
                .uri
                .path_and_query()
                .map(|pq| pq.as_str().to_string())
                .unwrap_or_else(|| parts.uri.path().to_string()),
            request_id: request_id(&parts.headers),
            flash: messages.into_iter().collect(),
        })
    }
}

/// A page response.
#[derive(Debug, Clone, Serialize)]
pub struct PageView {
    /// Client component to mount, e.g. `roles/index`.
    pub component: String,
    /// Component props.
    pub props: Map<String, Value>,
    /// Requested URL.
    pub url: String,
}

impl PageView {
    /// Start a page with the shared props filled in.
    pub fn new(component: impl Into<String>, ctx: PageContext) -> AppResult<Self> {
        let mut props = Map::new();
        props.insert("flash".into(), serde_json::to_value(&ctx.flash)?);
        props.insert(
            "requestId".into(),
            ctx.request_id.map(Value::String).unwrap_or(Value::Null),
        );
        Ok(Self {
            component: component.into(),
            props,
            url: ctx.url,
        })
    }

    /// Add a prop.
    pub fn with(mut self, key: &str, value: impl Serialize) -> AppResult<Self> {
        self.props.insert(key.to_string(), serde_json::to_value(value)?);
        Ok(self)
    }
}

impl IntoResponse for PageView {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::flash::FlashMessage;

    use super::*;

    #[test]
    fn test_shared_props_are_always_present() {
        let page = PageView::new(
            "roles/index",
            PageContext {
                url: "/roles?page=2".into(),
                request_id: Some("req-1".into()),
                flash: [FlashMessage::success("ok")].into_iter().collect(),
            },
        )
        .unwrap()
        .with("rows", Vec::<Value>::new())
        .unwrap();

        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["component"], "roles/index");
        assert_eq!(json["url"], "/roles?page=2");
        assert_eq!(json["props"]["requestId"], "req-1");
        assert_eq!(json["props"]["flash"]["success"], "ok");
        assert_eq!(json["props"]["flash"]["error"], Value::Null);
        assert_eq!(json["props"]["rows"], json!([]));
    }
}
