//! CLI command definitions and dispatch.

pub mod migrate;
pub mod role;
pub mod seed;
pub mod user;

use clap::{Parser, Subcommand};

use backoffice_api::{AppState, build_state};
use backoffice_core::config::AppConfig;
use backoffice_core::error::AppError;
use backoffice_database::DatabasePool;

use crate::output::OutputFormat;

/// Backoffice: role and user administration
#[derive(Debug, Parser)]
#[command(name = "backoffice", version, about, long_about = None)]
pub struct Cli {
    /// Directory holding `default.toml` and the environment overlays
    #[arg(short, long, default_value = "config")]
    pub config_dir: String,

    /// Environment overlay to load on top of the defaults
    #[arg(short, long, env = "BACKOFFICE_ENV", default_value = "development")]
    pub env: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Database migration management
    Migrate(migrate::MigrateArgs),
    /// Seed the permission catalog and the admin role
    Seed(seed::SeedArgs),
    /// Role management
    Role(role::RoleArgs),
    /// User management
    User(user::UserArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<(), AppError> {
        let config = AppConfig::load_from(&self.config_dir, &self.env)?;
        match &self.command {
            Commands::Migrate(args) => migrate::execute(args, &config, self.format).await,
            Commands::Seed(args) => seed::execute(args, &config).await,
            Commands::Role(args) => role::execute(args, &config, self.format).await,
            Commands::User(args) => user::execute(args, &config, self.format).await,
        }
    }
}

/// Helper: create database pool from config
pub async fn create_db_pool(config: &AppConfig) -> Result<sqlx::PgPool, AppError> {
    let pool = DatabasePool::connect(&config.database).await?;
    Ok(pool.pool().clone())
}

/// Helper: repositories and services wired the same way the server wires them
pub async fn connect(config: &AppConfig) -> Result<AppState, AppError> {
    let pool = create_db_pool(config).await?;
    Ok(build_state(config.clone(), pool))
}
