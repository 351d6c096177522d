//! Role lifecycle rules against a real database.

use backoffice_core::error::ErrorKind;
use backoffice_core::traits::ResourceReader;
use backoffice_core::types::{FilterValue, ListQuery};
use backoffice_entity::role::UpdateRole;
use backoffice_service::role::RoleInput;

use crate::helpers::TestApp;

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_duplicate_role_name_is_a_field_error() {
    let app = TestApp::new().await;
    app.create_role("editor", false).await;

    let err = app
        .state
        .role_service
        .create(RoleInput {
            name: format!("  {}  ", app.name("editor")),
            guard_name: None,
            is_active: true,
            permissions: None,
        })
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Validation);
    assert!(err.fields.unwrap().contains_key("name"));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_unknown_permission_is_rejected() {
    let app = TestApp::new().await;
    let err = app
        .state
        .role_service
        .create(RoleInput {
            name: app.name("ghost"),
            guard_name: None,
            is_active: true,
            permissions: Some(vec![format!("missing.{}", app.tag)]),
        })
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Validation);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_last_critical_role_cannot_be_deleted_or_deactivated() {
    let app = TestApp::new().await;
    let admin = app.create_role("admin", true).await;
    let roles = &app.state.role_service;

    let err = roles.delete_safely(admin.id).await.unwrap_err();
    assert!(err.is_domain());

    let err = roles.set_active(admin.id, false).await.unwrap_err();
    assert!(err.is_domain());

    // With a second administrative role the first one may go.
    app.create_role("backup-admin", true).await;
    let deleted = roles.delete_safely(admin.id).await.unwrap();
    assert_eq!(deleted.id, admin.id);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_protected_role_is_never_deleted() {
    let app = TestApp::new().await;
    let protected = app.create_role("protected", false).await;

    let err = app
        .state
        .role_service
        .delete_safely(protected.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::DomainAction);
    assert!(err.message.contains("protegido"));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_deleted_role_is_hidden_unless_trashed_filter() {
    let app = TestApp::new().await;
    let temp = app.create_role("temp", false).await;
    app.state.role_service.delete_safely(temp.id).await.unwrap();

    let repo = app.state.role_service.base().repository();
    let search = Some(app.name("temp"));

    let live = repo
        .paginate(&ListQuery::new(1, 15).with_search(search.clone()))
        .await
        .unwrap();
    assert_eq!(live.total, 0);

    let trashed = repo
        .paginate(
            &ListQuery::new(1, 15)
                .with_search(search)
                .with_filter("trashed", FilterValue::Text("only".into())),
        )
        .await
        .unwrap();
    assert_eq!(trashed.total, 1);
    assert!(trashed.items[0].deleted_at.is_some());

    let err = app.state.role_service.delete_safely(temp.id).await.unwrap_err();
    assert!(err.message.contains("ya fue eliminado"));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_bulk_delete_skips_blocked_roles() {
    let app = TestApp::new().await;
    let admin = app.create_role("admin", true).await;
    let a = app.create_role("a", false).await;
    let b = app.create_role("b", false).await;

    let outcome = app
        .state
        .role_service
        .bulk_delete(&[admin.id, a.id], &[b.uuid])
        .await
        .unwrap();

    assert_eq!(outcome.affected, 2);
    assert_eq!(outcome.skipped, 1);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_bulk_set_active_ignores_roles_already_in_state() {
    let app = TestApp::new().await;
    let a = app.create_role("a", false).await;
    let b = app.create_role("b", false).await;
    app.state.role_service.set_active(b.id, false).await.unwrap();

    let outcome = app
        .state
        .role_service
        .bulk_set_active(&[a.id, b.id], &[], false)
        .await
        .unwrap();

    assert_eq!(outcome.affected, 1);
    assert_eq!(outcome.skipped, 0);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_update_replaces_permissions() {
    let app = TestApp::new().await;
    let role = app.create_role("auditor", false).await;
    app.create_role("admin", true).await;

    let updated = app
        .state
        .role_service
        .update(
            role.id,
            UpdateRole {
                name: None,
                is_active: None,
                permissions: Some(vec![app.critical.clone()]),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.permissions_count, 1);

    let item = app.state.role_service.item(role.id).await.unwrap();
    assert_eq!(item["name"], app.name("auditor"));
}
