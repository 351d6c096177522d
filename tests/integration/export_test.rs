//! Streaming exports against a real database.

use futures::TryStreamExt;

use backoffice_core::types::{ExportFormat, ListQuery};
use backoffice_service::resource::{BulkAction, ResourceService};

use crate::helpers::TestApp;

async fn collect(download: backoffice_service::resource::ExportDownload) -> String {
    let chunks: Vec<bytes::Bytes> = download.body.try_collect().await.unwrap();
    String::from_utf8(chunks.concat()).unwrap()
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_role_csv_export_streams_matching_rows() {
    let app = TestApp::new().await;
    app.create_role("exported", false).await;

    let query = ListQuery::new(1, 15).with_search(Some(app.name("exported")));
    let download = app
        .state
        .roles_index
        .service()
        .export(&query, ExportFormat::Csv)
        .await
        .unwrap();

    assert!(download.filename.starts_with("roles_"));
    assert!(download.filename.ends_with(".csv"));

    let csv = collect(download).await;
    let mut lines = csv.lines();
    assert!(lines.next().unwrap().contains("Nombre"));
    let row = lines.next().unwrap();
    assert!(row.contains(&app.name("exported")));
    assert!(row.contains("Activo"));
    assert!(lines.next().is_none());
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_generic_bulk_restore_brings_rows_back() {
    let app = TestApp::new().await;
    let role = app.create_role("restorable", false).await;
    let service = app.state.roles_index.service();

    assert_eq!(service.bulk_by_ids(BulkAction::Delete, &[role.id]).await.unwrap(), 1);
    assert_eq!(service.bulk_by_uuids(BulkAction::Restore, &[role.uuid]).await.unwrap(), 1);

    let query = ListQuery::new(1, 15).with_search(Some(app.name("restorable")));
    assert_eq!(service.list(&query).await.unwrap().meta.total, 1);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_selected_rows_are_ordered_by_id_desc() {
    let app = TestApp::new().await;
    let first = app.create_role("first", false).await;
    let second = app.create_role("second", false).await;

    let result = app
        .state
        .roles_index
        .service()
        .list_by_ids_desc(&[first.id, second.id], 1, 15)
        .await
        .unwrap();

    let ids: Vec<i64> = result.rows.iter().map(|r| r["id"].as_i64().unwrap()).collect();
    assert_eq!(ids, vec![second.id, first.id]);
}
