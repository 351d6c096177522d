//! Administrative user management: creation, edits, activation and deletion.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use backoffice_auth::password::{PasswordHasher, PasswordValidator};
use backoffice_core::error::{AppError, FieldErrors};
use backoffice_core::result::AppResult;
use backoffice_core::types::Row;
use backoffice_database::repositories::{RoleRepository, UserRepository};
use backoffice_database::{RecordKeys, ResourceWriter};
use backoffice_entity::user::{CreateUser, RoleRef, UpdateUser, User};

use crate::base::BaseService;
use crate::context::RequestContext;
use crate::resource::BulkAction;
use crate::user::profile::UserProfile;

const SELF_DELETE: &str = "No puede eliminar su propia cuenta.";
const SELF_DEACTIVATE: &str = "No puede desactivar su propia cuenta.";

/// Data for a new user, after request validation.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Plain-text password.
    pub password: String,
    /// Initial active flag.
    pub is_active: bool,
    /// Role ids to assign.
    pub roles_ids: Option<Vec<i64>>,
}

/// Changes to an existing user. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    /// New display name.
    pub name: Option<String>,
    /// New email address.
    pub email: Option<String>,
    /// New plain-text password.
    pub password: Option<String>,
    /// New active flag.
    pub is_active: Option<bool>,
    /// Replacement role ids.
    pub roles_ids: Option<Vec<i64>>,
}

/// Choices offered by the create and edit forms.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserFormOptions {
    /// Assignable roles.
    pub role_options: Vec<RoleRef>,
}

/// Handles administrative user operations.
pub struct UserService {
    base: Arc<BaseService<UserRepository, UserProfile>>,
    roles: Arc<RoleRepository>,
    hasher: PasswordHasher,
    validator: PasswordValidator,
    guard_name: String,
}

impl UserService {
    /// Creates a new user service.
    pub fn new(
        base: Arc<BaseService<UserRepository, UserProfile>>,
        roles: Arc<RoleRepository>,
        hasher: PasswordHasher,
        validator: PasswordValidator,
        guard_name: impl Into<String>,
    ) -> Self {
        Self {
            base,
            roles,
            hasher,
            validator,
            guard_name: guard_name.into(),
        }
    }

    /// The generic listing/export/bulk service for users.
    pub fn base(&self) -> &Arc<BaseService<UserRepository, UserProfile>> {
        &self.base
    }

    /// Options for the user forms.
    pub async fn form_options(&self) -> AppResult<UserFormOptions> {
        Ok(UserFormOptions {
            role_options: self.roles.list_options(&self.guard_name).await?,
        })
    }

    /// Show-view shape of a user.
    pub async fn item(&self, id: i64) -> AppResult<Row> {
        let user = self.base.get_or_fail_by_id(id).await?;
        let roles = self.base.repository().roles_of(user.id).await?;
        Ok(UserProfile::to_item(&user, &roles))
    }

    /// Role ids currently assigned, for the edit form.
    pub async fn role_ids(&self, id: i64) -> AppResult<Vec<i64>> {
        let roles = self.base.repository().roles_of(id).await?;
        Ok(roles.into_iter().map(|r| r.id).collect())
    }

    /// Create a user with a hashed password and its role assignments.
    pub async fn create(&self, input: NewUser) -> AppResult<User> {
        let email = input.email.trim().to_string();

        let mut errors = FieldErrors::new();
        self.check_password(&input.password, &mut errors);
        self.check_email(&email, None, &mut errors).await?;
        if let Some(ids) = &input.roles_ids {
            self.check_role_ids(ids, &mut errors).await?;
        }
        if !errors.is_empty() {
            return Err(AppError::validation_fields(errors));
        }

        let user = self
            .base
            .create(&CreateUser {
                name: input.name.trim().to_string(),
                email,
                password_hash: self.hasher.hash_password(&input.password)?,
                is_active: input.is_active,
                roles_ids: input.roles_ids,
            })
            .await?;

        info!(user_id = user.id, "User created");
        Ok(user)
    }

    /// Apply changes to a user. A user cannot deactivate their own account.
    pub async fn update(
        &self,
        ctx: &RequestContext,
        id: i64,
        changes: UserChanges,
    ) -> AppResult<User> {
        if ctx.is_self(id) && changes.is_active == Some(false) {
            return Err(AppError::domain(SELF_DEACTIVATE));
        }

        let email = changes.email.map(|e| e.trim().to_string());
        let password = changes.password.filter(|p| !p.is_empty());

        let mut errors = FieldErrors::new();
        if let Some(password) = &password {
            self.check_password(password, &mut errors);
        }
        if let Some(email) = &email {
            self.check_email(email, Some(id), &mut errors).await?;
        }
        if let Some(ids) = &changes.roles_ids {
            self.check_role_ids(ids, &mut errors).await?;
        }
        if !errors.is_empty() {
            return Err(AppError::validation_fields(errors));
        }

        let password_hash = password
            .map(|p| self.hasher.hash_password(&p))
            .transpose()?;

        let user = self
            .base
            .update(
                id,
                &UpdateUser {
                    name: changes.name.map(|n| n.trim().to_string()),
                    email,
                    password_hash,
                    is_active: changes.is_active,
                    roles_ids: changes.roles_ids,
                },
            )
            .await?;

        info!(user_id = id, actor = ctx.user_id, "User updated");
        Ok(user)
    }

    /// Soft-delete a user. A user cannot delete their own account.
    pub async fn delete(&self, ctx: &RequestContext, id: i64) -> AppResult<User> {
        if ctx.is_self(id) {
            return Err(AppError::domain(SELF_DELETE));
        }

        let mut work = self.base.with_pessimistic_lock_by_id(id).await?;
        let user = self.base.get_or_fail_by_id(id).await?;
        if user.deleted_at.is_some() {
            return Err(AppError::domain(format!(
                "El usuario '{}' ya fue eliminado.",
                user.name
            )));
        }
        self.base
            .repository()
            .soft_delete(work.conn(), RecordKeys::Ids(&[id]))
            .await?;
        work.commit().await?;

        info!(user_id = id, actor = ctx.user_id, "User deleted");
        Ok(user)
    }

    /// Toggle the active flag. A user cannot deactivate their own account.
    pub async fn set_active(&self, ctx: &RequestContext, id: i64, active: bool) -> AppResult<User> {
        if ctx.is_self(id) && !active {
            return Err(AppError::domain(SELF_DEACTIVATE));
        }
        let user = self.base.set_active(id, active).await?;
        info!(user_id = id, active, actor = ctx.user_id, "User activation changed");
        Ok(user)
    }

    /// Reject a bulk action that would delete or deactivate the acting
    /// user's own account, addressed either by id or by uuid.
    pub async fn ensure_bulk_spares_self(
        &self,
        ctx: &RequestContext,
        action: BulkAction,
        ids: &[i64],
        uuids: &[Uuid],
    ) -> AppResult<()> {
        let Some(message) = self_protection_message(action) else {
            return Ok(());
        };

        let own_uuid = if uuids.is_empty() {
            None
        } else {
            self.base.get_by_id(ctx.user_id).await?.map(|user| user.uuid)
        };

        if targets_self(ctx, own_uuid, ids, uuids) {
            warn!(actor = ctx.user_id, %action, "Bulk action on own account rejected");
            return Err(AppError::domain(message));
        }
        Ok(())
    }

    fn check_password(&self, password: &str, errors: &mut FieldErrors) {
        if let Err(e) = self.validator.validate(password) {
            merge_fields(errors, e);
        }
    }

    async fn check_email(
        &self,
        email: &str,
        except_id: Option<i64>,
        errors: &mut FieldErrors,
    ) -> AppResult<()> {
        if self.base.repository().email_taken(email, except_id).await? {
            errors
                .entry("email".into())
                .or_default()
                .push("The email has already been taken.".into());
        }
        Ok(())
    }

    async fn check_role_ids(&self, ids: &[i64], errors: &mut FieldErrors) -> AppResult<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let existing = self.base.repository().existing_role_ids(ids).await?;
        if ids.iter().any(|id| !existing.contains(id)) {
            errors
                .entry("roles_ids".into())
                .or_default()
                .push("The selected roles ids is invalid.".into());
        }
        Ok(())
    }
}

fn self_protection_message(action: BulkAction) -> Option<&'static str> {
    match action {
        BulkAction::Delete | BulkAction::ForceDelete => Some(SELF_DELETE),
        BulkAction::SetActive(false) => Some(SELF_DEACTIVATE),
        BulkAction::Restore | BulkAction::SetActive(true) => None,
    }
}

fn targets_self(ctx: &RequestContext, own_uuid: Option<Uuid>, ids: &[i64], uuids: &[Uuid]) -> bool {
    ids.iter().any(|id| ctx.is_self(*id)) || own_uuid.is_some_and(|own| uuids.contains(&own))
}

fn merge_fields(errors: &mut FieldErrors, error: AppError) {
    match error.fields {
        Some(fields) => {
            for (field, messages) in fields {
                errors.entry(field).or_default().extend(messages);
            }
        }
        None => errors
            .entry("password".into())
            .or_default()
            .push(error.message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_fields_keeps_existing_messages() {
        let mut errors = FieldErrors::new();
        errors.insert("email".into(), vec!["taken".into()]);
        merge_fields(&mut errors, AppError::invalid_field("password", "too short"));
        merge_fields(&mut errors, AppError::validation("weak"));

        assert_eq!(errors["email"], ["taken"]);
        assert_eq!(errors["password"], ["too short", "weak"]);
    }

    #[test]
    fn test_destructive_bulk_actions_protect_own_account() {
        assert_eq!(self_protection_message(BulkAction::Delete), Some(SELF_DELETE));
        assert_eq!(self_protection_message(BulkAction::ForceDelete), Some(SELF_DELETE));
        assert_eq!(self_protection_message(BulkAction::SetActive(false)), Some(SELF_DEACTIVATE));
        assert_eq!(self_protection_message(BulkAction::SetActive(true)), None);
        assert_eq!(self_protection_message(BulkAction::Restore), None);
    }

    #[test]
    fn test_targets_self_by_id_or_uuid() {
        let ctx = RequestContext::new(1, None);
        let own = Uuid::new_v4();
        let other = Uuid::new_v4();

        assert!(targets_self(&ctx, None, &[3, 1], &[]));
        assert!(targets_self(&ctx, Some(own), &[3], &[other, own]));
        assert!(!targets_self(&ctx, Some(own), &[2, 3], &[other]));
        assert!(!targets_self(&ctx, None, &[], &[own]));
    }
}
