//! Role management with deletion and deactivation guards.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use backoffice_core::error::{AppError, FieldErrors};
use backoffice_core::result::AppResult;
use backoffice_core::types::Row;
use backoffice_database::repositories::{PermissionRepository, RoleRepository};
use backoffice_database::{RecordKeys, ResourceWriter};
use backoffice_entity::role::{CreateRole, Role, RoleStats, UpdateRole};

use crate::base::BaseService;
use crate::role::guard::{DeletionGuard, last_critical_role_message};
use crate::role::profile::RoleProfile;

/// Data for a new role, after request validation.
#[derive(Debug, Clone)]
pub struct RoleInput {
    /// Role name, unique per guard.
    pub name: String,
    /// Guard; the configured default when `None`.
    pub guard_name: Option<String>,
    /// Initial active flag.
    pub is_active: bool,
    /// Permission names to grant.
    pub permissions: Option<Vec<String>>,
}

/// A grantable permission as offered by role forms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PermissionOption {
    /// Permission name.
    pub name: String,
    /// Human description.
    pub description: Option<String>,
}

/// Extra props rendered next to the roles index rows.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleIndexExtras {
    /// Header counters.
    pub stats: RoleStats,
    /// Permissions of the default guard.
    pub available_permissions: Vec<PermissionOption>,
}

/// Choices offered by the create and edit forms.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleFormOptions {
    /// Guards a role may belong to.
    pub guards: Vec<String>,
    /// Permissions of the default guard.
    pub available_permissions: Vec<PermissionOption>,
}

/// Result of a guarded bulk operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoleBulkOutcome {
    /// Roles changed.
    pub affected: u64,
    /// Roles left alone because a rule blocked them.
    pub skipped: u64,
}

/// Handles role operations that go beyond the generic pipeline.
pub struct RoleService {
    base: Arc<BaseService<RoleRepository, RoleProfile>>,
    permissions: PermissionRepository,
    guard: DeletionGuard,
    guard_name: String,
}

impl RoleService {
    /// Creates a new role service.
    pub fn new(
        base: Arc<BaseService<RoleRepository, RoleProfile>>,
        permissions: PermissionRepository,
        guard: DeletionGuard,
        guard_name: impl Into<String>,
    ) -> Self {
        Self {
            base,
            permissions,
            guard,
            guard_name: guard_name.into(),
        }
    }

    /// The generic listing/export/bulk service for roles.
    pub fn base(&self) -> &Arc<BaseService<RoleRepository, RoleProfile>> {
        &self.base
    }

    fn repo(&self) -> &RoleRepository {
        self.base.repository()
    }

    /// Stats and permission catalog for the index page.
    pub async fn index_extras(&self) -> AppResult<RoleIndexExtras> {
        Ok(RoleIndexExtras {
            stats: self.repo().stats().await?,
            available_permissions: self.available_permissions().await?,
        })
    }

    /// Options for the role forms.
    pub async fn form_options(&self) -> AppResult<RoleFormOptions> {
        Ok(RoleFormOptions {
            guards: vec![self.guard_name.clone()],
            available_permissions: self.available_permissions().await?,
        })
    }

    async fn available_permissions(&self) -> AppResult<Vec<PermissionOption>> {
        Ok(self
            .permissions
            .list(&self.guard_name)
            .await?
            .into_iter()
            .map(|p| PermissionOption {
                name: p.name,
                description: p.description,
            })
            .collect())
    }

    /// Show-view shape of a role.
    pub async fn item(&self, id: i64) -> AppResult<Row> {
        let role = self.base.get_or_fail_by_id(id).await?;
        let permissions = self.repo().permissions_of(role.id).await?;
        Ok(RoleProfile::to_item(&role, &permissions))
    }

    /// Create a role and grant its permissions.
    pub async fn create(&self, input: RoleInput) -> AppResult<Role> {
        let name = input.name.trim().to_string();
        let guard_name = input
            .guard_name
            .filter(|g| !g.trim().is_empty())
            .unwrap_or_else(|| self.guard_name.clone());

        let mut errors = FieldErrors::new();
        self.check_name(&name, &guard_name, None, &mut errors).await?;
        if let Some(names) = &input.permissions {
            self.check_permissions(&guard_name, names, &mut errors)
                .await?;
        }
        if !errors.is_empty() {
            return Err(AppError::validation_fields(errors));
        }

        let role = self
            .base
            .create(&CreateRole {
                name,
                guard_name,
                is_active: input.is_active,
                permissions: input.permissions,
            })
            .await?;

        info!(role_id = role.id, name = %role.name, "Role created");
        Ok(role)
    }

    /// Apply changes to a role. Deactivation goes through the same rules as
    /// [`set_active`](Self::set_active).
    pub async fn update(&self, id: i64, changes: UpdateRole) -> AppResult<Role> {
        let role = self.base.get_or_fail_by_id(id).await?;
        if role.is_trashed() {
            return Err(AppError::not_found(format!("roles record {id} not found")));
        }

        let changes = UpdateRole {
            name: changes.name.map(|n| n.trim().to_string()),
            ..changes
        };

        let mut errors = FieldErrors::new();
        if let Some(name) = &changes.name {
            self.check_name(name, &role.guard_name, Some(id), &mut errors)
                .await?;
        }
        if let Some(names) = &changes.permissions {
            self.check_permissions(&role.guard_name, names, &mut errors)
                .await?;
        }
        if !errors.is_empty() {
            return Err(AppError::validation_fields(errors));
        }

        if changes.is_active == Some(false) && role.is_active {
            if let Some(reason) = self.deactivation_blocker(&role).await? {
                return Err(AppError::domain(reason));
            }
        }

        let updated = self.base.update(id, &changes).await?;
        info!(role_id = id, "Role updated");
        Ok(updated)
    }

    /// Soft-delete a role unless a deletion rule blocks it. The row stays
    /// locked while the rules are evaluated.
    pub async fn delete_safely(&self, id: i64) -> AppResult<Role> {
        let mut work = self.base.with_pessimistic_lock_by_id(id).await?;
        let role = self.base.get_or_fail_by_id(id).await?;

        if let Some(reason) = self.deletion_blocker(&role).await? {
            return Err(AppError::domain(reason));
        }

        self.repo()
            .soft_delete(work.conn(), RecordKeys::Ids(&[id]))
            .await?;
        work.commit().await?;

        info!(role_id = id, name = %role.name, "Role deleted");
        Ok(role)
    }

    /// Set the active flag of one role. Protected roles and the last
    /// administrative role cannot be deactivated.
    pub async fn set_active(&self, id: i64, active: bool) -> AppResult<Role> {
        let mut work = self.base.with_pessimistic_lock_by_id(id).await?;
        let role = self.base.get_or_fail_by_id(id).await?;

        if !active {
            if let Some(reason) = self.deactivation_blocker(&role).await? {
                return Err(AppError::domain(reason));
            }
        }

        let changed = self
            .repo()
            .set_active(work.conn(), RecordKeys::Ids(&[id]), active)
            .await?;
        if changed == 0 {
            return Err(AppError::not_found(format!("roles record {id} not found")));
        }
        work.commit().await?;

        info!(role_id = id, active, "Role activation changed");
        self.base.get_or_fail_by_id(id).await
    }

    /// Delete the addressed roles one by one, skipping those a rule blocks.
    pub async fn bulk_delete(&self, ids: &[i64], uuids: &[Uuid]) -> AppResult<RoleBulkOutcome> {
        let mut outcome = RoleBulkOutcome::default();
        for role in self.repo().find_many(ids, uuids).await? {
            match self.delete_safely(role.id).await {
                Ok(_) => outcome.affected += 1,
                Err(e) if e.is_domain() => {
                    debug!(role_id = role.id, reason = %e.message, "Role deletion skipped");
                    outcome.skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }
        info!(
            deleted = outcome.affected,
            skipped = outcome.skipped,
            "Bulk role deletion finished"
        );
        Ok(outcome)
    }

    /// Move the addressed roles to `active`. Roles already in that state are
    /// left alone and counted in neither total; blocked ones are skipped.
    pub async fn bulk_set_active(
        &self,
        ids: &[i64],
        uuids: &[Uuid],
        active: bool,
    ) -> AppResult<RoleBulkOutcome> {
        let mut outcome = RoleBulkOutcome::default();
        for role in self.repo().find_many(ids, uuids).await? {
            if role.is_trashed() {
                outcome.skipped += 1;
                continue;
            }
            if role.is_active == active {
                continue;
            }
            match self.set_active(role.id, active).await {
                Ok(_) => outcome.affected += 1,
                Err(e) if e.is_domain() => {
                    debug!(role_id = role.id, reason = %e.message, "Role activation skipped");
                    outcome.skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }
        info!(
            active,
            updated = outcome.affected,
            skipped = outcome.skipped,
            "Bulk role activation finished"
        );
        Ok(outcome)
    }

    async fn deletion_blocker(&self, role: &Role) -> AppResult<Option<String>> {
        if let Some(reason) = self.guard.deletion_blocker(role) {
            return Ok(Some(reason));
        }
        if self.is_last_critical(role).await? {
            return Ok(Some(last_critical_role_message(role, "eliminarse")));
        }
        Ok(None)
    }

    async fn deactivation_blocker(&self, role: &Role) -> AppResult<Option<String>> {
        if let Some(reason) = self.guard.deactivation_blocker(role) {
            return Ok(Some(reason));
        }
        if self.is_last_critical(role).await? {
            return Ok(Some(last_critical_role_message(role, "desactivarse")));
        }
        Ok(None)
    }

    async fn is_last_critical(&self, role: &Role) -> AppResult<bool> {
        if !self.guard.needs_successor(role) {
            return Ok(false);
        }
        let others = self
            .repo()
            .count_granting_all(self.guard.critical_permissions(), &[role.id])
            .await?;
        Ok(others == 0)
    }

    async fn check_name(
        &self,
        name: &str,
        guard_name: &str,
        except_id: Option<i64>,
        errors: &mut FieldErrors,
    ) -> AppResult<()> {
        if self.repo().name_taken(name, guard_name, except_id).await? {
            errors
                .entry("name".into())
                .or_default()
                .push("The name has already been taken.".into());
        }
        Ok(())
    }

    async fn check_permissions(
        &self,
        guard_name: &str,
        names: &[String],
        errors: &mut FieldErrors,
    ) -> AppResult<()> {
        if names.is_empty() {
            return Ok(());
        }
        let existing = self.permissions.existing_names(guard_name, names).await?;
        let unknown: Vec<&str> = names
            .iter()
            .filter(|n| !existing.contains(n))
            .map(String::as_str)
            .collect();
        if !unknown.is_empty() {
            errors
                .entry("permissions".into())
                .or_default()
                .push(format!("Unknown permissions: {}.", unknown.join(", ")));
        }
        Ok(())
    }
}
