//! Maps domain `AppError` to HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use backoffice_core::error::{AppError, ErrorKind, FieldErrors};

/// Standard API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// Machine-readable error code.
    pub error: String,
    /// Human-readable message.
    pub message: String,
    /// Per-field validation messages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
}

/// Handler error: an [`AppError`] rendered as a JSON response.
#[derive(Debug)]
pub struct ApiError(pub AppError);

/// Result type returned by handlers.
pub type ApiResult<T> = Result<T, ApiError>;

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        let (status, error_code) = match err.kind {
            ErrorKind::Validation => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            ErrorKind::Authentication => (StatusCode::UNAUTHORIZED, "UNAUTHENTICATED"),
            ErrorKind::Authorization => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            ErrorKind::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ErrorKind::Conflict => (StatusCode::CONFLICT, "CONFLICT"),
            ErrorKind::DomainAction => (StatusCode::UNPROCESSABLE_ENTITY, "DOMAIN_ERROR"),
            ErrorKind::Internal
            | ErrorKind::Database
            | ErrorKind::Export
            | ErrorKind::Configuration
            | ErrorKind::Serialization => {
                tracing::error!(kind = %err.kind, error = %err.message, source = ?err.source, "Internal server error");
                let body = ApiErrorResponse {
                    error: "INTERNAL_ERROR".to_string(),
                    message: "Server Error".to_string(),
                    errors: None,
                };
                return (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response();
            }
        };

        let body = ApiErrorResponse {
            error: error_code.to_string(),
            message: err.message,
            errors: err.fields,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_of(response: Response) -> ApiErrorResponse {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_validation_errors_carry_fields() {
        let response = ApiError(AppError::invalid_field("ids", "The ids field is required.")).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = body_of(response).await;
        assert_eq!(body.error, "VALIDATION_ERROR");
        assert_eq!(body.errors.unwrap()["ids"], ["The ids field is required."]);
    }

    #[tokio::test]
    async fn test_internal_detail_is_suppressed() {
        let response = ApiError(AppError::database("relation \"roles\" does not exist")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_of(response).await;
        assert_eq!(body.message, "Server Error");
        assert!(body.errors.is_none());
    }

    #[test]
    fn test_status_mapping() {
        let status = |e: AppError| ApiError(e).into_response().status();
        assert_eq!(status(AppError::authentication("x")), StatusCode::UNAUTHORIZED);
        assert_eq!(status(AppError::authorization("x")), StatusCode::FORBIDDEN);
        assert_eq!(status(AppError::not_found("x")), StatusCode::NOT_FOUND);
        assert_eq!(status(AppError::conflict("x")), StatusCode::CONFLICT);
        assert_eq!(status(AppError::domain("x")), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
