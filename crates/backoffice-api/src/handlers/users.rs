//! User endpoints.

use axum::Json;
use axum::extract::{Path, State};
use axum::response::{Redirect, Response};
use tower_sessions::Session;

use backoffice_auth::rbac::{Ability, Resource};
use backoffice_core::types::ExportFormat;
use backoffice_entity::user::USER_LIST_SPEC;

use crate::dto::request::{BulkRequest, SetActiveRequest, StoreUserRequest, UpdateUserRequest};
use crate::error::ApiResult;
use crate::extractors::{AuthUser, QueryPairs, ValidatedJson};
use crate::flash;
use crate::handlers::resource;
use crate::page::{PageContext, PageView};
use crate::pipeline::{BULK_FAILED, ResourceConfig, recover};
use crate::state::AppState;

/// How the generic pipeline serves users.
pub const USERS: ResourceConfig = ResourceConfig {
    resource: Resource::Users,
    view: "users/index",
    index_path: "/users",
    list_spec: &USER_LIST_SPEC,
    export_formats: &[ExportFormat::Csv, ExportFormat::Xlsx, ExportFormat::Pdf],
    default_export_format: ExportFormat::Csv,
};

/// GET /users
pub async fn index(
    State(state): State<AppState>,
    auth: AuthUser,
    page: PageContext,
    pairs: QueryPairs,
) -> ApiResult<PageView> {
    Ok(resource::index_page(&state.users_index, &auth, page, &pairs).await?)
}

/// GET /users/export
pub async fn export(
    State(state): State<AppState>,
    session: Session,
    auth: AuthUser,
    pairs: QueryPairs,
) -> ApiResult<Response> {
    resource::export(&state.users_index, &session, &auth, &pairs).await
}

/// POST /users/bulk
///
/// Deleting or deactivating the caller's own account is refused before any
/// record is touched.
pub async fn bulk(
    State(state): State<AppState>,
    session: Session,
    auth: AuthUser,
    Json(request): Json<BulkRequest>,
) -> ApiResult<Redirect> {
    auth.authorize(&state, Resource::Users, Ability::Update)?;
    let action = request.checked()?;

    if let Err(e) = state
        .user_service
        .ensure_bulk_spares_self(&auth, action, request.ids(), request.uuids())
        .await
    {
        return Ok(flash::redirect_with(&session, USERS.index_path, recover(e, BULK_FAILED)).await?);
    }
    resource::bulk(&state.users_index, &session, &auth, &request).await
}

/// GET /users/selected
pub async fn selected(
    State(state): State<AppState>,
    auth: AuthUser,
    page: PageContext,
    pairs: QueryPairs,
) -> ApiResult<PageView> {
    Ok(resource::selected(&state.users_index, &auth, page, &pairs).await?)
}

/// GET /users/create
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    page: PageContext,
) -> ApiResult<PageView> {
    auth.authorize(&state, Resource::Users, Ability::Create)?;
    let options = state.user_service.form_options().await?;
    Ok(PageView::new("users/create", page)?.with("options", options)?)
}

/// POST /users
pub async fn store(
    State(state): State<AppState>,
    session: Session,
    auth: AuthUser,
    ValidatedJson(request): ValidatedJson<StoreUserRequest>,
) -> ApiResult<Redirect> {
    auth.authorize(&state, Resource::Users, Ability::Create)?;
    match state.user_service.create(request.into()).await {
        Ok(user) => {
            resource::redirect_success(
                &session,
                USERS.index_path,
                format!("El usuario '{}' ha sido creado correctamente.", user.name),
            )
            .await
        }
        Err(e) => resource::redirect_on_domain_error(&session, USERS.index_path, e).await,
    }
}

/// GET /users/{id}
pub async fn show(
    State(state): State<AppState>,
    auth: AuthUser,
    page: PageContext,
    Path(id): Path<i64>,
) -> ApiResult<PageView> {
    auth.authorize(&state, Resource::Users, Ability::View)?;
    let item = state.user_service.item(id).await?;
    Ok(PageView::new("users/show", page)?.with("item", item)?)
}

/// GET /users/{id}/edit
pub async fn edit(
    State(state): State<AppState>,
    auth: AuthUser,
    page: PageContext,
    Path(id): Path<i64>,
) -> ApiResult<PageView> {
    auth.authorize(&state, Resource::Users, Ability::Update)?;
    let item = state.user_service.item(id).await?;
    let role_ids = state.user_service.role_ids(id).await?;
    let options = state.user_service.form_options().await?;
    Ok(PageView::new("users/edit", page)?
        .with("item", item)?
        .with("rolesIds", role_ids)?
        .with("options", options)?)
}

/// PUT /users/{id}
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    auth: AuthUser,
    Path(id): Path<i64>,
    ValidatedJson(request): ValidatedJson<UpdateUserRequest>,
) -> ApiResult<Redirect> {
    auth.authorize(&state, Resource::Users, Ability::Update)?;
    match state.user_service.update(&auth, id, request.into()).await {
        Ok(user) => {
            resource::redirect_success(
                &session,
                USERS.index_path,
                format!("El usuario '{}' ha sido actualizado correctamente.", user.name),
            )
            .await
        }
        Err(e) => resource::redirect_on_domain_error(&session, USERS.index_path, e).await,
    }
}

/// PATCH /users/{id}/active
pub async fn set_active(
    State(state): State<AppState>,
    session: Session,
    auth: AuthUser,
    Path(id): Path<i64>,
    ValidatedJson(request): ValidatedJson<SetActiveRequest>,
) -> ApiResult<Redirect> {
    auth.authorize(&state, Resource::Users, Ability::SetActive)?;
    match state.user_service.set_active(&auth, id, request.active).await {
        Ok(user) => {
            let verb = if request.active { "activado" } else { "desactivado" };
            resource::redirect_success(
                &session,
                USERS.index_path,
                format!("El usuario '{}' ha sido {verb} correctamente.", user.name),
            )
            .await
        }
        Err(e) => resource::redirect_on_domain_error(&session, USERS.index_path, e).await,
    }
}

/// DELETE /users/{id}
pub async fn destroy(
    State(state): State<AppState>,
    session: Session,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<Redirect> {
    auth.authorize(&state, Resource::Users, Ability::Delete)?;
    match state.user_service.delete(&auth, id).await {
        Ok(user) => {
            resource::redirect_success(
                &session,
                USERS.index_path,
                format!("El usuario '{}' ha sido eliminado correctamente.", user.name),
            )
            .await
        }
        Err(e) => resource::redirect_on_domain_error(&session, USERS.index_path, e).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_users_export_formats() {
        assert_eq!(USERS.default_export_format, ExportFormat::Csv);
        assert!(USERS.export_formats.contains(&ExportFormat::Pdf));
        assert!(!USERS.export_formats.contains(&ExportFormat::Json));
    }

    #[test]
    fn test_users_sort_allow_list_excludes_secrets() {
        assert!(USERS.list_spec.is_sortable("email"));
        assert!(!USERS.list_spec.is_sortable("password"));
    }
}
