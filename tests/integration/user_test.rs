//! User rules against a real database.

use backoffice_core::error::ErrorKind;
use backoffice_core::traits::ResourceReader;
use backoffice_core::types::{FilterValue, ListQuery};
use backoffice_service::resource::BulkAction;
use backoffice_service::user::{NewUser, UserChanges};

use crate::helpers::TestApp;

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_users_cannot_delete_or_deactivate_themselves() {
    let app = TestApp::new().await;
    let me = app.create_user("me", &[]).await;
    let ctx = app.acting_as(&me);
    let users = &app.state.user_service;

    let err = users.delete(&ctx, me.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::DomainAction);

    let err = users.set_active(&ctx, me.id, false).await.unwrap_err();
    assert_eq!(err.message, "No puede desactivar su propia cuenta.");

    let err = users
        .update(
            &ctx,
            me.id,
            UserChanges {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(err.is_domain());
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_bulk_actions_spare_the_callers_own_account() {
    let app = TestApp::new().await;
    let me = app.create_user("me", &[]).await;
    let other = app.create_user("other", &[]).await;
    let ctx = app.acting_as(&me);
    let users = &app.state.user_service;

    let err = users
        .ensure_bulk_spares_self(&ctx, BulkAction::Delete, &[other.id, me.id], &[])
        .await
        .unwrap_err();
    assert_eq!(err.message, "No puede eliminar su propia cuenta.");

    let err = users
        .ensure_bulk_spares_self(&ctx, BulkAction::ForceDelete, &[], &[me.uuid])
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::DomainAction);

    let err = users
        .ensure_bulk_spares_self(&ctx, BulkAction::SetActive(false), &[], &[other.uuid, me.uuid])
        .await
        .unwrap_err();
    assert_eq!(err.message, "No puede desactivar su propia cuenta.");

    users
        .ensure_bulk_spares_self(&ctx, BulkAction::SetActive(true), &[me.id], &[me.uuid])
        .await
        .unwrap();
    users
        .ensure_bulk_spares_self(&ctx, BulkAction::Delete, &[other.id], &[other.uuid])
        .await
        .unwrap();
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_other_users_can_be_deleted() {
    let app = TestApp::new().await;
    let me = app.create_user("me", &[]).await;
    let other = app.create_user("other", &[]).await;

    let deleted = app
        .state
        .user_service
        .delete(&app.acting_as(&me), other.id)
        .await
        .unwrap();
    assert_eq!(deleted.id, other.id);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_duplicate_email_is_a_field_error() {
    let app = TestApp::new().await;
    let existing = app.create_user("dup", &[]).await;

    let err = app
        .state
        .user_service
        .create(NewUser {
            name: "Someone".into(),
            email: existing.email.clone(),
            password: "Correct-Horse-9-Battery".into(),
            is_active: true,
            roles_ids: None,
        })
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Validation);
    assert!(err.fields.unwrap().contains_key("email"));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_password_is_hashed() {
    let app = TestApp::new().await;
    let user = app.create_user("hashed", &[]).await;
    assert_ne!(user.password_hash, "Correct-Horse-9-Battery");
    assert!(user.password_hash.starts_with("$argon2"));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_role_filter_and_sync() {
    let app = TestApp::new().await;
    let editor = app.create_role("editor", false).await;
    let viewer = app.create_role("viewer", false).await;
    let user = app.create_user("member", &[&editor]).await;

    let repo = app.state.user_service.base().repository();
    let by_role = |name: String| {
        ListQuery::new(1, 15).with_filter("role", FilterValue::Text(name))
    };

    let page = repo.paginate(&by_role(editor.name.clone())).await.unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].roles, vec![editor.name.clone()]);

    let me = app.create_user("admin", &[]).await;
    app.state
        .user_service
        .update(
            &app.acting_as(&me),
            user.id,
            UserChanges {
                roles_ids: Some(vec![viewer.id]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(repo.paginate(&by_role(editor.name.clone())).await.unwrap().total, 0);
    assert_eq!(
        app.state.user_service.role_ids(user.id).await.unwrap(),
        vec![viewer.id]
    );
}
