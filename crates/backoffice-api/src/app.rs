//! Application builder: wires repositories, services and the router into
//! a served Axum app.

use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use sqlx::PgPool;
use tokio::sync::watch;

use backoffice_auth::password::{PasswordHasher, PasswordValidator};
use backoffice_auth::principal::PgPrincipalResolver;
use backoffice_auth::rbac::RbacEnforcer;
use backoffice_core::config::AppConfig;
use backoffice_core::error::AppError;
use backoffice_core::types::ExportFormat;
use backoffice_database::repositories::{PermissionRepository, RoleRepository, UserRepository};
use backoffice_export::ExporterRegistry;
use backoffice_service::base::BaseService;
use backoffice_service::role::{DeletionGuard, RoleService};
use backoffice_service::user::UserService;

use crate::handlers::roles::ROLES;
use crate::handlers::users::USERS;
use crate::pipeline::{IndexHandler, ResourceConfig};
use crate::router::build_router;
use crate::state::AppState;

/// Builds the complete Axum application with all routes and middleware.
pub fn build_app(state: AppState) -> Router {
    build_router(state)
}

/// Construct every repository, service and pipeline handler.
///
/// Nothing here touches the database; the pool connects lazily on first use.
pub fn build_state(config: AppConfig, db_pool: PgPool) -> AppState {
    let exporters = Arc::new(ExporterRegistry::from_config(&config.export));
    let guard_name = config.auth.guard_name.clone();

    // ── Repositories ─────────────────────────────────────────────
    let role_repo = Arc::new(RoleRepository::new(db_pool.clone()));
    let user_repo = Arc::new(UserRepository::new(db_pool.clone()));
    let permission_repo = PermissionRepository::new(db_pool.clone());

    // ── Auth ─────────────────────────────────────────────────────
    let rbac_enforcer = Arc::new(RbacEnforcer::new());
    let principal_resolver = Arc::new(PgPrincipalResolver::new(
        permission_repo.clone(),
        guard_name.clone(),
    ));

    // ── Services ─────────────────────────────────────────────────
    let role_base = Arc::new(BaseService::new(
        Arc::clone(&role_repo),
        Arc::clone(&exporters),
        config.listing.clone(),
    ));
    let user_base = Arc::new(BaseService::new(
        Arc::clone(&user_repo),
        Arc::clone(&exporters),
        config.listing.clone(),
    ));

    let role_service = Arc::new(RoleService::new(
        Arc::clone(&role_base),
        permission_repo,
        DeletionGuard::new(&config.roles),
        guard_name.clone(),
    ));
    let user_service = Arc::new(UserService::new(
        Arc::clone(&user_base),
        Arc::clone(&role_repo),
        PasswordHasher::new(),
        PasswordValidator::new(&config.auth),
        guard_name,
    ));

    // ── Generic pipelines ────────────────────────────────────────
    let roles_index = Arc::new(IndexHandler::new(
        role_base,
        with_default_format(ROLES, &config.export.default_format),
        Arc::clone(&rbac_enforcer),
        config.listing.clone(),
    ));
    let users_index = Arc::new(IndexHandler::new(
        user_base,
        with_default_format(USERS, &config.export.default_format),
        Arc::clone(&rbac_enforcer),
        config.listing.clone(),
    ));

    AppState {
        config: Arc::new(config),
        db_pool,
        rbac_enforcer,
        principal_resolver,
        role_service,
        user_service,
        roles_index,
        users_index,
    }
}

/// The configured fallback format, when the resource serves it.
fn with_default_format(config: ResourceConfig, configured: &str) -> ResourceConfig {
    match ExportFormat::parse(configured) {
        Some(format) if config.export_formats.contains(&format) => ResourceConfig {
            default_export_format: format,
            ..config
        },
        _ => config,
    }
}

/// Runs the backoffice server with the given configuration and database pool.
pub async fn run_server(config: AppConfig, db_pool: PgPool) -> Result<(), AppError> {
    tracing::info!("Starting backoffice server...");

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let grace = Duration::from_secs(config.server.shutdown_grace_seconds);

    let app = build_app(build_state(config, db_pool));
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {}: {}", addr, e)))?;

    tracing::info!("Backoffice server listening on {}", addr);

    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            let _ = shutdown_tx.send(true);
        })
        .into_future();
    tokio::pin!(server);

    // In-flight requests get `grace` to finish once the signal arrives.
    let result = tokio::select! {
        result = &mut server => result,
        _ = shutdown_rx.changed() => {
            tracing::info!(grace_seconds = grace.as_secs(), "Shutdown signal received, draining connections");
            match tokio::time::timeout(grace, &mut server).await {
                Ok(result) => result,
                Err(_) => {
                    tracing::warn!("Grace period elapsed with requests still in flight");
                    Ok(())
                }
            }
        }
    };

    result.map_err(|e| AppError::internal(format!("Server error: {}", e)))?;
    tracing::info!("Backoffice server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configured_default_format_applies_when_allowed() {
        assert_eq!(with_default_format(ROLES, "json").default_export_format, ExportFormat::Json);
        assert_eq!(with_default_format(USERS, "json").default_export_format, ExportFormat::Csv);
        assert_eq!(with_default_format(USERS, "PDF").default_export_format, ExportFormat::Pdf);
    }
}
