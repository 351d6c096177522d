//! Role endpoints.

use axum::Json;
use axum::extract::{Path, State};
use axum::response::{Redirect, Response};
use tower_sessions::Session;

use backoffice_auth::rbac::{Ability, Resource};
use backoffice_core::types::ExportFormat;
use backoffice_entity::role::ROLE_LIST_SPEC;
use backoffice_service::resource::BulkAction;
use backoffice_service::role::RoleBulkOutcome;

use crate::dto::request::{BulkRequest, SetActiveRequest, StoreRoleRequest, UpdateRoleRequest};
use crate::error::ApiResult;
use crate::extractors::{AuthUser, QueryPairs, ValidatedJson};
use crate::flash::{self, FlashMessage};
use crate::handlers::resource;
use crate::page::{PageContext, PageView};
use crate::pipeline::{BULK_FAILED, IDS_REQUIRED, ResourceConfig, recover};
use crate::state::AppState;

/// How the generic pipeline serves roles.
pub const ROLES: ResourceConfig = ResourceConfig {
    resource: Resource::Roles,
    view: "roles/index",
    index_path: "/roles",
    list_spec: &ROLE_LIST_SPEC,
    export_formats: &[ExportFormat::Csv, ExportFormat::Xlsx, ExportFormat::Json],
    default_export_format: ExportFormat::Csv,
};

/// GET /roles
pub async fn index(
    State(state): State<AppState>,
    auth: AuthUser,
    page: PageContext,
    pairs: QueryPairs,
) -> ApiResult<PageView> {
    let view = resource::index_page(&state.roles_index, &auth, page, &pairs).await?;
    let extras = state.role_service.index_extras().await?;
    Ok(view
        .with("stats", &extras.stats)?
        .with("availablePermissions", &extras.available_permissions)?)
}

/// GET /roles/export
pub async fn export(
    State(state): State<AppState>,
    session: Session,
    auth: AuthUser,
    pairs: QueryPairs,
) -> ApiResult<Response> {
    resource::export(&state.roles_index, &session, &auth, &pairs).await
}

/// POST /roles/bulk
///
/// Delete and setActive go through the role guards; the other actions use
/// the generic pipeline. The body is validated once the caller is authorized.
pub async fn bulk(
    State(state): State<AppState>,
    session: Session,
    auth: AuthUser,
    Json(request): Json<BulkRequest>,
) -> ApiResult<Redirect> {
    auth.authorize(&state, Resource::Roles, bulk_ability(request.bulk_action()))?;
    let action = request.checked()?;

    let message = match action {
        BulkAction::Delete | BulkAction::SetActive(_) if request.is_empty() => {
            FlashMessage::error(IDS_REQUIRED)
        }
        BulkAction::Delete => {
            match state.role_service.bulk_delete(request.ids(), request.uuids()).await {
                Ok(outcome) => bulk_delete_message(outcome),
                Err(e) => recover(e, BULK_FAILED),
            }
        }
        BulkAction::SetActive(active) => {
            match state
                .role_service
                .bulk_set_active(request.ids(), request.uuids(), active)
                .await
            {
                Ok(outcome) => bulk_set_active_message(outcome, active),
                Err(e) => recover(e, BULK_FAILED),
            }
        }
        _ => return resource::bulk(&state.roles_index, &session, &auth, &request).await,
    };

    Ok(flash::redirect_with(&session, ROLES.index_path, message).await?)
}

/// GET /roles/selected
pub async fn selected(
    State(state): State<AppState>,
    auth: AuthUser,
    page: PageContext,
    pairs: QueryPairs,
) -> ApiResult<PageView> {
    Ok(resource::selected(&state.roles_index, &auth, page, &pairs).await?)
}

/// GET /roles/create
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    page: PageContext,
) -> ApiResult<PageView> {
    auth.authorize(&state, Resource::Roles, Ability::Create)?;
    let options = state.role_service.form_options().await?;
    Ok(PageView::new("roles/create", page)?.with("options", options)?)
}

/// POST /roles
pub async fn store(
    State(state): State<AppState>,
    session: Session,
    auth: AuthUser,
    ValidatedJson(request): ValidatedJson<StoreRoleRequest>,
) -> ApiResult<Redirect> {
    auth.authorize(&state, Resource::Roles, Ability::Create)?;
    match state.role_service.create(request.into()).await {
        Ok(role) => {
            resource::redirect_success(
                &session,
                ROLES.index_path,
                format!("El rol '{}' ha sido creado correctamente.", role.name),
            )
            .await
        }
        Err(e) => resource::redirect_on_domain_error(&session, ROLES.index_path, e).await,
    }
}

/// GET /roles/{id}
pub async fn show(
    State(state): State<AppState>,
    auth: AuthUser,
    page: PageContext,
    Path(id): Path<i64>,
) -> ApiResult<PageView> {
    auth.authorize(&state, Resource::Roles, Ability::View)?;
    let item = state.role_service.item(id).await?;
    Ok(PageView::new("roles/show", page)?.with("item", item)?)
}

/// GET /roles/{id}/edit
pub async fn edit(
    State(state): State<AppState>,
    auth: AuthUser,
    page: PageContext,
    Path(id): Path<i64>,
) -> ApiResult<PageView> {
    auth.authorize(&state, Resource::Roles, Ability::Update)?;
    let item = state.role_service.item(id).await?;
    let options = state.role_service.form_options().await?;
    Ok(PageView::new("roles/edit", page)?
        .with("item", item)?
        .with("options", options)?)
}

/// PUT /roles/{id}
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    auth: AuthUser,
    Path(id): Path<i64>,
    ValidatedJson(request): ValidatedJson<UpdateRoleRequest>,
) -> ApiResult<Redirect> {
    auth.authorize(&state, Resource::Roles, Ability::Update)?;
    match state.role_service.update(id, request.into()).await {
        Ok(role) => {
            resource::redirect_success(
                &session,
                ROLES.index_path,
                format!("El rol '{}' ha sido actualizado correctamente.", role.name),
            )
            .await
        }
        Err(e) => resource::redirect_on_domain_error(&session, ROLES.index_path, e).await,
    }
}

/// PATCH /roles/{id}/active
pub async fn set_active(
    State(state): State<AppState>,
    session: Session,
    auth: AuthUser,
    Path(id): Path<i64>,
    ValidatedJson(request): ValidatedJson<SetActiveRequest>,
) -> ApiResult<Redirect> {
    auth.authorize(&state, Resource::Roles, Ability::SetActive)?;
    match state.role_service.set_active(id, request.active).await {
        Ok(role) => {
            let verb = if request.active { "activado" } else { "desactivado" };
            resource::redirect_success(
                &session,
                ROLES.index_path,
                format!("El rol '{}' ha sido {verb} correctamente.", role.name),
            )
            .await
        }
        Err(e) => resource::redirect_on_domain_error(&session, ROLES.index_path, e).await,
    }
}

/// DELETE /roles/{id}
pub async fn destroy(
    State(state): State<AppState>,
    session: Session,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<Redirect> {
    auth.authorize(&state, Resource::Roles, Ability::Delete)?;
    match state.role_service.delete_safely(id).await {
        Ok(role) => {
            resource::redirect_success(
                &session,
                ROLES.index_path,
                format!("El rol '{}' ha sido eliminado correctamente.", role.name),
            )
            .await
        }
        Err(e) => resource::redirect_on_domain_error(&session, ROLES.index_path, e).await,
    }
}

// Unknown actions fall back to the generic permission and fail validation.
fn bulk_ability(action: Option<BulkAction>) -> Ability {
    match action {
        Some(BulkAction::Delete) => Ability::Delete,
        Some(BulkAction::SetActive(_)) => Ability::SetActive,
        _ => Ability::Update,
    }
}

fn bulk_delete_message(outcome: RoleBulkOutcome) -> FlashMessage {
    let RoleBulkOutcome { affected, skipped } = outcome;
    if skipped > 0 {
        FlashMessage::warning(format!(
            "Se eliminaron {affected} rol(es). Se omitieron {skipped} rol(es) por validaciones de eliminación."
        ))
    } else {
        FlashMessage::success(format!("Se eliminaron {affected} rol(es) correctamente."))
    }
}

fn bulk_set_active_message(outcome: RoleBulkOutcome, active: bool) -> FlashMessage {
    let RoleBulkOutcome { affected, skipped } = outcome;
    let verb = if active { "activaron" } else { "desactivaron" };
    if skipped > 0 {
        FlashMessage::warning(format!(
            "Se {verb} {affected} rol(es). Se omitieron {skipped} rol(es) por validaciones."
        ))
    } else if affected == 0 {
        FlashMessage::info(
            "No se realizó ningún cambio. Todos los roles ya estaban en el estado solicitado.",
        )
    } else {
        FlashMessage::success(format!("Se {verb} {affected} rol(es) correctamente."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(affected: u64, skipped: u64) -> RoleBulkOutcome {
        RoleBulkOutcome { affected, skipped }
    }

    #[test]
    fn test_bulk_delete_messages() {
        assert_eq!(
            bulk_delete_message(outcome(2, 0)),
            FlashMessage::success("Se eliminaron 2 rol(es) correctamente.")
        );
        assert_eq!(
            bulk_delete_message(outcome(1, 3)),
            FlashMessage::warning(
                "Se eliminaron 1 rol(es). Se omitieron 3 rol(es) por validaciones de eliminación."
            )
        );
    }

    #[test]
    fn test_bulk_set_active_messages() {
        assert_eq!(
            bulk_set_active_message(outcome(4, 0), true),
            FlashMessage::success("Se activaron 4 rol(es) correctamente.")
        );
        assert_eq!(
            bulk_set_active_message(outcome(1, 1), false),
            FlashMessage::warning("Se desactivaron 1 rol(es). Se omitieron 1 rol(es) por validaciones.")
        );
        assert_eq!(
            bulk_set_active_message(outcome(0, 0), false).kind,
            crate::flash::FlashKind::Info
        );
    }

    #[test]
    fn test_bulk_ability_follows_the_action() {
        assert_eq!(bulk_ability(Some(BulkAction::Delete)), Ability::Delete);
        assert_eq!(bulk_ability(Some(BulkAction::SetActive(false))), Ability::SetActive);
        assert_eq!(bulk_ability(Some(BulkAction::Restore)), Ability::Update);
        assert_eq!(bulk_ability(None), Ability::Update);
    }

    #[test]
    fn test_roles_export_formats() {
        assert!(ROLES.export_formats.contains(&ExportFormat::Json));
        assert!(!ROLES.export_formats.contains(&ExportFormat::Pdf));
    }
}
