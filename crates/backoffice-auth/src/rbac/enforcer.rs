//! RBAC enforcement logic: checks whether a principal holds the permission
//! an ability requires.

use backoffice_core::error::AppError;

use super::policies::{Ability, Permission, Resource};
use crate::principal::Principal;

/// Enforces resource policies for the authenticated principal.
#[derive(Debug, Clone, Copy, Default)]
pub struct RbacEnforcer;

impl RbacEnforcer {
    /// Creates a new enforcer.
    pub fn new() -> Self {
        Self
    }

    /// Whether the principal may perform `ability` on `resource`.
    pub fn allows(&self, principal: &Principal, resource: Resource, ability: Ability) -> bool {
        principal.has_permission(Permission::for_ability(resource, ability))
    }

    /// Returns `Ok(())` if allowed, or an authorization error if denied.
    pub fn authorize(
        &self,
        principal: &Principal,
        resource: Resource,
        ability: Ability,
    ) -> Result<(), AppError> {
        if self.allows(principal, resource, ability) {
            Ok(())
        } else {
            let permission = Permission::for_ability(resource, ability);
            tracing::warn!(
                user_id = principal.user_id,
                %resource,
                %ability,
                %permission,
                "Authorization denied"
            );
            Err(AppError::authorization("This action is unauthorized."))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backoffice_core::error::ErrorKind;

    #[test]
    fn test_authorize_uses_mapped_permission() {
        let principal = Principal::new(1, "Ana", ["roles.view", "roles.update"]);
        let enforcer = RbacEnforcer::new();

        assert!(enforcer.authorize(&principal, Resource::Roles, Ability::ViewAny).is_ok());
        assert!(enforcer.authorize(&principal, Resource::Roles, Ability::SetActive).is_ok());

        let err = enforcer
            .authorize(&principal, Resource::Roles, Ability::Export)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authorization);
        assert!(!enforcer.allows(&principal, Resource::Users, Ability::ViewAny));
    }
}
