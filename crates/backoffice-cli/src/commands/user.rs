//! User management CLI commands.

use clap::{Args, Subcommand};
use dialoguer::{Input, Password};
use serde::Serialize;
use tabled::Tabled;

use backoffice_core::config::AppConfig;
use backoffice_core::error::AppError;
use backoffice_core::traits::ResourceReader;
use backoffice_core::types::{FilterValue, ListQuery};
use backoffice_service::user::NewUser;

use crate::output::{self, OutputFormat};

/// Arguments for user commands
#[derive(Debug, Args)]
pub struct UserArgs {
    /// User subcommand
    #[command(subcommand)]
    pub command: UserCommand,
}

/// User subcommands
#[derive(Debug, Subcommand)]
pub enum UserCommand {
    /// List users
    List {
        /// Only users holding this role
        #[arg(short, long)]
        role: Option<String>,
        /// Free-text search on name and email
        #[arg(short, long)]
        search: Option<String>,
        /// Page number
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// Rows per page
        #[arg(long, default_value_t = 50)]
        per_page: u32,
    },
    /// Create a user; missing values are prompted for
    Create {
        /// Display name
        #[arg(long)]
        name: Option<String>,
        /// Email address
        #[arg(long)]
        email: Option<String>,
        /// Roles to assign, by name
        #[arg(long = "role")]
        roles: Vec<String>,
        /// Create the account disabled
        #[arg(long)]
        inactive: bool,
    },
}

/// User display row for table output
#[derive(Debug, Serialize, Tabled)]
struct UserRow {
    /// User ID
    id: i64,
    /// Name
    name: String,
    /// Email
    email: String,
    /// Roles
    roles: String,
    /// Active
    active: String,
    /// Created at
    created_at: String,
}

fn prompt_error(e: dialoguer::Error) -> AppError {
    AppError::internal(format!("Input error: {}", e))
}

/// Execute user commands
pub async fn execute(
    args: &UserArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let state = super::connect(config).await?;

    match &args.command {
        UserCommand::List {
            role,
            search,
            page,
            per_page,
        } => {
            let mut query = ListQuery::new((*page).max(1), (*per_page).clamp(1, 500))
                .with_search(search.clone());
            if let Some(role) = role {
                query = query.with_filter("role", FilterValue::Text(role.clone()));
            }

            let result = state.user_service.base().repository().paginate(&query).await?;
            let rows: Vec<UserRow> = result
                .items
                .iter()
                .map(|u| UserRow {
                    id: u.id,
                    name: u.name.clone(),
                    email: u.email.clone(),
                    roles: u.roles.join(", "),
                    active: output::yes_no(u.is_active),
                    created_at: output::timestamp(&u.created_at),
                })
                .collect();

            output::print_list(&rows, format);
        }
        UserCommand::Create {
            name,
            email,
            roles,
            inactive,
        } => {
            let name = match name {
                Some(name) => name.clone(),
                None => Input::new()
                    .with_prompt("Name")
                    .interact_text()
                    .map_err(prompt_error)?,
            };
            let email = match email {
                Some(email) => email.clone(),
                None => Input::new()
                    .with_prompt("Email")
                    .interact_text()
                    .map_err(prompt_error)?,
            };
            let password = Password::new()
                .with_prompt("Password")
                .with_confirmation("Confirm password", "Passwords do not match")
                .interact()
                .map_err(prompt_error)?;

            let repo = state.role_service.base().repository();
            let mut roles_ids = Vec::with_capacity(roles.len());
            for role in roles {
                let found = repo
                    .find_by_name(role, &config.auth.guard_name)
                    .await?
                    .ok_or_else(|| AppError::not_found(format!("Role '{}' not found", role)))?;
                roles_ids.push(found.id);
            }

            let user = state
                .user_service
                .create(NewUser {
                    name,
                    email,
                    password,
                    is_active: !inactive,
                    roles_ids: Some(roles_ids),
                })
                .await?;

            output::print_success(&format!("User '{}' created with id {}", user.email, user.id));
        }
    }

    Ok(())
}
