//! Backoffice Server: role and user administration.
//!
//! Main entry point that loads configuration, prepares the database and
//! starts the HTTP server.

use tracing_subscriber::{EnvFilter, fmt};

use backoffice_core::config::AppConfig;
use backoffice_core::error::AppError;
use backoffice_database::DatabasePool;
use backoffice_database::migration::run_migrations;

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Load `config/default.toml`, the environment overlay and `BACKOFFICE__*` variables
fn load_configuration() -> Result<AppConfig, AppError> {
    let dir = std::env::var("BACKOFFICE_CONFIG_DIR").unwrap_or_else(|_| "config".to_string());
    let env = std::env::var("BACKOFFICE_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load_from(&dir, &env)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting Backoffice v{}", env!("CARGO_PKG_VERSION"));

    tracing::info!("Connecting to database...");
    let database = DatabasePool::connect(&config.database).await?;

    if config.database.run_migrations {
        tracing::info!("Running database migrations...");
        run_migrations(database.pool()).await?;
        tracing::info!("Database migrations complete");
    }

    let pool = database.pool().clone();
    backoffice_api::run_server(config, pool).await?;

    database.close().await;
    tracing::info!("Backoffice server shut down gracefully");
    Ok(())
}
