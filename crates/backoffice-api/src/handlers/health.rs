//! Health check handlers.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use backoffice_database::connection::ping;

use crate::dto::response::{ApiResponse, HealthResponse, ProbeStatus, ReadinessResponse};
use crate::state::AppState;

/// GET /health
pub async fn health() -> Json<ApiResponse<HealthResponse>> {
    Json(ApiResponse::ok(HealthResponse {
        status: ProbeStatus::Ok,
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}

/// GET /health/ready
pub async fn readiness(
    State(state): State<AppState>,
) -> (StatusCode, Json<ApiResponse<ReadinessResponse>>) {
    let report = ReadinessResponse::from_database(ping(&state.db_pool).await);
    let status = match report.status {
        ProbeStatus::Ok => StatusCode::OK,
        ProbeStatus::Degraded => StatusCode::SERVICE_UNAVAILABLE,
    };
    (status, Json(ApiResponse::ok(report)))
}
