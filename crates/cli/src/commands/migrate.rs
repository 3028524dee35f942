//! Database migration command.
//!
//! ```bash
//! strive migrate
//! ```
//!
//! Migrations live in `crates/api/migrations/` and are embedded at build time.

use super::{CliError, connect};

/// Apply every pending migration.
///
/// # Errors
///
/// Returns an error if the connection or a migration fails.
pub async fn run() -> Result<(), CliError> {
    let pool = connect().await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../api/migrations").run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
