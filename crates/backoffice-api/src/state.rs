//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use sqlx::PgPool;

use backoffice_auth::principal::PrincipalResolver;
use backoffice_auth::rbac::RbacEnforcer;
use backoffice_core::config::AppConfig;
use backoffice_service::role::RoleService;
use backoffice_service::user::UserService;

use crate::pipeline::IndexHandler;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are `Arc`-wrapped for cheap cloning across tasks.
#[derive(Clone)]
pub struct AppState {
    // ── Configuration ────────────────────────────────────────
    /// Application configuration
    pub config: Arc<AppConfig>,

    // ── Infrastructure ───────────────────────────────────────
    /// PostgreSQL connection pool
    pub db_pool: PgPool,

    // ── Auth ─────────────────────────────────────────────────
    /// Role-based access control enforcer
    pub rbac_enforcer: Arc<RbacEnforcer>,
    /// Loads the acting user's permissions
    pub principal_resolver: Arc<dyn PrincipalResolver>,

    // ── Services ─────────────────────────────────────────────
    /// Role service
    pub role_service: Arc<RoleService>,
    /// User service
    pub user_service: Arc<UserService>,

    // ── Generic pipelines ────────────────────────────────────
    /// Index/export/bulk/selected for roles
    pub roles_index: Arc<IndexHandler>,
    /// Index/export/bulk/selected for users
    pub users_index: Arc<IndexHandler>,
}
