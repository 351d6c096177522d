//! Request DTOs with validation.

use serde::Deserialize;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use backoffice_core::error::AppError;
use backoffice_core::result::AppResult;
use backoffice_entity::role::UpdateRole;
use backoffice_service::resource::BulkAction;
use backoffice_service::role::RoleInput;
use backoffice_service::user::{NewUser, UserChanges};

use crate::extractors::json::validation_error;

fn validate_bulk_action(action: &str) -> Result<(), ValidationError> {
    if BulkAction::NAMES.contains(&action) {
        Ok(())
    } else {
        Err(ValidationError::new("in").with_message("The selected action is invalid.".into()))
    }
}

fn validate_positive_ids(ids: &[i64]) -> Result<(), ValidationError> {
    if ids.iter().all(|id| *id >= 1) {
        Ok(())
    } else {
        Err(ValidationError::new("min").with_message("Every id must be at least 1.".into()))
    }
}

/// Bulk action body: `{action, ids?, uuids?, active?}`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct BulkRequest {
    /// `delete`, `restore`, `forceDelete` or `setActive`.
    #[validate(custom(function = "validate_bulk_action"))]
    pub action: String,
    /// Primary keys.
    #[serde(default)]
    #[validate(custom(function = "validate_positive_ids"))]
    pub ids: Option<Vec<i64>>,
    /// External identifiers.
    #[serde(default)]
    pub uuids: Option<Vec<Uuid>>,
    /// Target flag for `setActive`; defaults to `true`.
    #[serde(default)]
    pub active: Option<bool>,
}

impl BulkRequest {
    /// The requested action. `None` only for bodies that skipped validation.
    pub fn bulk_action(&self) -> Option<BulkAction> {
        BulkAction::parse(&self.action, self.active.unwrap_or(true))
    }

    /// Validate the body and return its action. Handlers call this only
    /// after the caller is authorized.
    pub fn checked(&self) -> AppResult<BulkAction> {
        self.validate().map_err(validation_error)?;
        self.bulk_action()
            .ok_or_else(|| AppError::invalid_field("action", "The selected action is invalid."))
    }

    /// Requested primary keys.
    pub fn ids(&self) -> &[i64] {
        self.ids.as_deref().unwrap_or_default()
    }

    /// Requested external identifiers.
    pub fn uuids(&self) -> &[Uuid] {
        self.uuids.as_deref().unwrap_or_default()
    }

    /// Whether neither ids nor uuids were given.
    pub fn is_empty(&self) -> bool {
        self.ids().is_empty() && self.uuids().is_empty()
    }
}

/// Toggle body for `PATCH /{resource}/{id}/active`.
#[derive(Debug, Clone, Copy, Deserialize, Validate)]
pub struct SetActiveRequest {
    /// Desired state.
    pub active: bool,
}

/// Create role body.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct StoreRoleRequest {
    /// Role name.
    #[validate(length(min = 1, max = 255, message = "The name field is required and may not exceed 255 characters."))]
    pub name: String,
    /// Guard; the configured default when absent.
    #[validate(length(max = 255))]
    pub guard_name: Option<String>,
    /// Initial state; active when absent.
    pub is_active: Option<bool>,
    /// Permission names to grant.
    pub permissions: Option<Vec<String>>,
}

impl From<StoreRoleRequest> for RoleInput {
    fn from(req: StoreRoleRequest) -> Self {
        Self {
            name: req.name,
            guard_name: req.guard_name,
            is_active: req.is_active.unwrap_or(true),
            permissions: req.permissions,
        }
    }
}

/// Update role body. Absent fields stay unchanged.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateRoleRequest {
    /// New name.
    #[validate(length(min = 1, max = 255, message = "The name field is required and may not exceed 255 characters."))]
    pub name: Option<String>,
    /// New state.
    pub is_active: Option<bool>,
    /// Replacement permission names.
    pub permissions: Option<Vec<String>>,
}

impl From<UpdateRoleRequest> for UpdateRole {
    fn from(req: UpdateRoleRequest) -> Self {
        Self {
            name: req.name,
            is_active: req.is_active,
            permissions: req.permissions,
        }
    }
}

/// Create user body.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct StoreUserRequest {
    /// Display name.
    #[validate(length(min = 1, max = 255, message = "The name field is required and may not exceed 255 characters."))]
    pub name: String,
    /// Email address.
    #[validate(email(message = "The email field must be a valid email address."), length(max = 255))]
    pub email: String,
    /// Plain-text password.
    #[validate(length(min = 1, message = "The password field is required."))]
    pub password: String,
    /// Initial state; active when absent.
    pub is_active: Option<bool>,
    /// Role ids to assign.
    #[validate(custom(function = "validate_positive_ids"))]
    pub roles_ids: Option<Vec<i64>>,
}

impl From<StoreUserRequest> for NewUser {
    fn from(req: StoreUserRequest) -> Self {
        Self {
            name: req.name,
            email: req.email,
            password: req.password,
            is_active: req.is_active.unwrap_or(true),
            roles_ids: req.roles_ids,
        }
    }
}

/// Update user body. Absent fields stay unchanged; an empty password is
/// ignored.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateUserRequest {
    /// New display name.
    #[validate(length(min = 1, max = 255, message = "The name field is required and may not exceed 255 characters."))]
    pub name: Option<String>,
    /// New email address.
    #[validate(email(message = "The email field must be a valid email address."), length(max = 255))]
    pub email: Option<String>,
    /// New password.
    pub password: Option<String>,
    /// New state.
    pub is_active: Option<bool>,
    /// Replacement role ids.
    #[validate(custom(function = "validate_positive_ids"))]
    pub roles_ids: Option<Vec<i64>>,
}

impl From<UpdateUserRequest> for UserChanges {
    fn from(req: UpdateUserRequest) -> Self {
        Self {
            name: req.name,
            email: req.email,
            password: req.password,
            is_active: req.is_active,
            roles_ids: req.roles_ids,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bulk(json: serde_json::Value) -> BulkRequest {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_bulk_defaults() {
        let req = bulk(serde_json::json!({"action": "setActive", "ids": [5]}));
        assert!(req.validate().is_ok());
        assert_eq!(req.bulk_action(), Some(BulkAction::SetActive(true)));
        assert_eq!(req.ids(), [5]);
        assert!(req.uuids().is_empty());
        assert!(!req.is_empty());
    }

    #[test]
    fn test_bulk_rejects_unknown_actions_and_non_positive_ids() {
        let errors = bulk(serde_json::json!({"action": "invalid_action", "ids": [0]}))
            .validate()
            .unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("action"));
        assert!(fields.contains_key("ids"));
    }

    #[test]
    fn test_bulk_checked_reports_field_errors() {
        let err = bulk(serde_json::json!({"action": "archive", "ids": [0]}))
            .checked()
            .unwrap_err();
        let fields = err.fields.unwrap();
        assert_eq!(fields["action"], ["The selected action is invalid."]);
        assert_eq!(fields["ids"], ["Every id must be at least 1."]);

        let action = bulk(serde_json::json!({"action": "setActive", "active": false}))
            .checked()
            .unwrap();
        assert_eq!(action, BulkAction::SetActive(false));
    }

    #[test]
    fn test_bulk_null_lists_are_empty() {
        let req = bulk(serde_json::json!({"action": "delete", "ids": null, "uuids": null}));
        assert!(req.is_empty());
    }

    #[test]
    fn test_store_user_requires_a_valid_email() {
        let req: StoreUserRequest = serde_json::from_value(serde_json::json!({
            "name": "Ana",
            "email": "not-an-email",
            "password": "secret"
        }))
        .unwrap();
        assert!(req.validate().unwrap_err().field_errors().contains_key("email"));
    }
}
