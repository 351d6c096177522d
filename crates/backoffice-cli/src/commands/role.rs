//! Role management CLI commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use backoffice_core::config::AppConfig;
use backoffice_core::error::AppError;
use backoffice_core::traits::ResourceReader;
use backoffice_core::types::{FilterValue, ListQuery, SortDirection};

use crate::output::{self, OutputFormat};

/// Arguments for role commands
#[derive(Debug, Args)]
pub struct RoleArgs {
    /// Role subcommand
    #[command(subcommand)]
    pub command: RoleCommand,
}

/// Role subcommands
#[derive(Debug, Subcommand)]
pub enum RoleCommand {
    /// List roles
    List {
        /// Include soft-deleted roles
        #[arg(long)]
        trashed: bool,
        /// Page number
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// Rows per page
        #[arg(long, default_value_t = 50)]
        per_page: u32,
    },
}

/// Role display row for table output
#[derive(Debug, Serialize, Tabled)]
struct RoleRow {
    /// Role ID
    id: i64,
    /// Name
    name: String,
    /// Guard
    guard: String,
    /// Active
    active: String,
    /// Permission count
    permissions: i64,
    /// Deleted
    deleted: String,
    /// Created at
    created_at: String,
}

/// Execute role commands
pub async fn execute(
    args: &RoleArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let state = super::connect(config).await?;
    let repo = state.role_service.base().repository();

    match &args.command {
        RoleCommand::List {
            trashed,
            page,
            per_page,
        } => {
            let mut query = ListQuery::new((*page).max(1), (*per_page).clamp(1, 500))
                .with_sort(Some("name".into()), SortDirection::Asc);
            if *trashed {
                query = query.with_filter("trashed", FilterValue::Text("with".into()));
            }

            let result = repo.paginate(&query).await?;
            let rows: Vec<RoleRow> = result
                .items
                .iter()
                .map(|r| RoleRow {
                    id: r.id,
                    name: r.name.clone(),
                    guard: r.guard_name.clone(),
                    active: output::yes_no(r.is_active),
                    permissions: r.permissions_count,
                    deleted: r.deleted_at.as_ref().map(output::timestamp).unwrap_or_default(),
                    created_at: output::timestamp(&r.created_at),
                })
                .collect();

            output::print_list(&rows, format);
            if format == OutputFormat::Table {
                let meta = result.meta();
                println!("Page {} of {} ({} roles)", meta.current_page, meta.last_page, meta.total);
            }
        }
    }

    Ok(())
}
