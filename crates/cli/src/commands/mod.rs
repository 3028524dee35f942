//! Subcommand implementations.

pub mod migrate;
pub mod seed;
pub mod user;

use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;

use strive_api::db::RepositoryError;
use strive_api::services::AuthError;

/// Errors that can end a CLI command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration failed.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Repository call failed.
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// Account could not be created.
    #[error("Account error: {0}")]
    Account(#[from] AuthError),

    /// Invalid role.
    #[error("Invalid role: {0}. Valid roles: admin, manager, customer")]
    InvalidRole(String),

    /// Seed file could not be read.
    #[error("Seed file error: {0}")]
    SeedFile(#[from] std::io::Error),

    /// Seed file is not valid YAML for a category tree.
    #[error("Seed file is invalid: {0}")]
    SeedFormat(#[from] serde_yaml::Error),
}

/// Connect to the database named by `STRIVE_DATABASE_URL`.
async fn connect() -> Result<PgPool, CliError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("STRIVE_DATABASE_URL")
        .map(SecretString::from)
        .map_err(|_| CliError::MissingEnvVar("STRIVE_DATABASE_URL"))?;

    tracing::info!("Connecting to database...");
    Ok(strive_api::db::create_pool(&database_url).await?)
}
