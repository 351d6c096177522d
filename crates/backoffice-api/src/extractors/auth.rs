//! `AuthUser` extractor: resolves the session user into a principal and a
//! request context.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use tower_sessions::Session;

use backoffice_auth::principal::Principal;
use backoffice_auth::rbac::{Ability, Resource};
use backoffice_core::error::{AppError, ErrorKind};
use backoffice_service::context::RequestContext;

use crate::error::ApiError;
use crate::middleware::request_id::request_id;
use crate::state::AppState;

/// The authenticated user available in handlers.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// Permissions of the acting user.
    pub principal: Principal,
    /// Who is acting and under which request id.
    pub context: RequestContext,
}

impl AuthUser {
    /// Returns the inner `RequestContext`.
    pub fn context(&self) -> &RequestContext {
        &self.context
    }

    /// Fail with 403 unless the user may perform `ability` on `resource`.
    pub fn authorize(
        &self,
        state: &AppState,
        resource: Resource,
        ability: Ability,
    ) -> Result<(), AppError> {
        state.rbac_enforcer.authorize(&self.principal, resource, ability)
    }
}

impl std::ops::Deref for AuthUser {
    type Target = RequestContext;
    fn deref(&self) -> &Self::Target {
        &self.context
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::internal("Session layer is not installed"))?;

        let user_id: i64 = session
            .get(&state.config.auth.session_key)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Internal, "Failed to read session", e))?
            .ok_or_else(|| AppError::authentication("Unauthenticated."))?;

        let principal = state
            .principal_resolver
            .resolve(user_id)
            .await?
            .ok_or_else(|| AppError::authentication("Unauthenticated."))?;

        let context = RequestContext::new(user_id, request_id(&parts.headers));

        Ok(AuthUser { principal, context })
    }
}
