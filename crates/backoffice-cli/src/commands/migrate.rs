//! Database migration management commands.

use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use backoffice_core::config::AppConfig;
use backoffice_core::error::{AppError, ErrorKind};
use backoffice_database::migration::run_migrations;

use crate::output::{self, OutputFormat};

/// Arguments for the migrate command
#[derive(Debug, Args)]
pub struct MigrateArgs {
    /// Migration subcommand
    #[command(subcommand)]
    pub command: MigrateCommand,
}

/// Migration subcommands
#[derive(Debug, Subcommand)]
pub enum MigrateCommand {
    /// Run all pending migrations
    Run,
    /// Show applied migrations
    Status,
}

/// Applied migration row for table output
#[derive(Debug, Serialize, Tabled)]
struct MigrationRow {
    /// Version
    version: i64,
    /// Description
    description: String,
    /// When it was applied
    installed_on: String,
    /// Whether it completed
    success: bool,
}

/// Execute migration commands
pub async fn execute(
    args: &MigrateArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let pool = super::create_db_pool(config).await?;

    match &args.command {
        MigrateCommand::Run => {
            println!("Running database migrations...");
            run_migrations(&pool).await?;
            output::print_success("All migrations applied successfully.");
        }
        MigrateCommand::Status => {
            let applied: Vec<(i64, String, DateTime<Utc>, bool)> = sqlx::query_as(
                "SELECT version, description, installed_on, success \
                 FROM _sqlx_migrations ORDER BY version",
            )
            .fetch_all(&pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to read migration status", e)
            })?;

            let rows: Vec<MigrationRow> = applied
                .into_iter()
                .map(|(version, description, installed_on, success)| MigrationRow {
                    version,
                    description,
                    installed_on: output::timestamp(&installed_on),
                    success,
                })
                .collect();

            if rows.iter().any(|r| !r.success) {
                output::print_warning("At least one migration did not complete.");
            }
            output::print_list(&rows, format);
        }
    }

    Ok(())
}
