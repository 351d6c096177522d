//! Seeding commands: the permission catalog and the admin role.

use clap::{Args, Subcommand};

use backoffice_auth::rbac::Permission;
use backoffice_core::config::AppConfig;
use backoffice_core::error::AppError;
use backoffice_database::repositories::PermissionRepository;
use backoffice_entity::role::UpdateRole;
use backoffice_service::role::RoleInput;

use crate::output;

/// Arguments for the seed command
#[derive(Debug, Args)]
pub struct SeedArgs {
    /// Seed subcommand
    #[command(subcommand)]
    pub command: SeedCommand,
}

/// Seed subcommands
#[derive(Debug, Subcommand)]
pub enum SeedCommand {
    /// Create or refresh every known permission
    Permissions,
    /// Create or refresh a role holding every permission
    Admin {
        /// Role name
        #[arg(long, default_value = "admin")]
        role: String,
    },
}

/// Execute seed commands
pub async fn execute(args: &SeedArgs, config: &AppConfig) -> Result<(), AppError> {
    let state = super::connect(config).await?;
    let permissions = PermissionRepository::new(state.db_pool.clone());
    let guard = config.auth.guard_name.as_str();

    seed_permissions(&permissions, guard).await?;

    if let SeedCommand::Admin { role } = &args.command {
        let all: Vec<String> = Permission::ALL.iter().map(|p| p.name().to_string()).collect();
        let existing = state
            .role_service
            .base()
            .repository()
            .find_by_name(role, guard)
            .await?;

        match existing {
            Some(current) => {
                state
                    .role_service
                    .update(
                        current.id,
                        UpdateRole {
                            name: None,
                            is_active: Some(true),
                            permissions: Some(all),
                        },
                    )
                    .await?;
                output::print_success(&format!("Role '{}' refreshed with every permission", role));
            }
            None => {
                state
                    .role_service
                    .create(RoleInput {
                        name: role.clone(),
                        guard_name: None,
                        is_active: true,
                        permissions: Some(all),
                    })
                    .await?;
                output::print_success(&format!("Role '{}' created with every permission", role));
            }
        }
    }

    Ok(())
}

async fn seed_permissions(repo: &PermissionRepository, guard: &str) -> Result<(), AppError> {
    for permission in Permission::ALL {
        repo.ensure(permission.name(), guard, Some(permission.description()))
            .await?;
    }
    output::print_success(&format!(
        "{} permissions seeded for guard '{}'",
        Permission::ALL.len(),
        guard
    ));
    Ok(())
}
