//! HTTP surface against a real database.

use axum::http::StatusCode;

use crate::helpers::TestApp;

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_readiness_reports_database() {
    let app = TestApp::new().await;
    let response = app.get("/health/ready").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["database"], "connected");
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_index_requires_a_session() {
    let app = TestApp::new().await;
    let response = app.get("/roles?filter[status]=active").await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}
