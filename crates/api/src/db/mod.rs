//! Database operations for the Strive `PostgreSQL` store.
//!
//! # Schema: `shop`
//!
//! ## Tables
//!
//! - `users`, `addresses`, `notification_preferences`, `password_reset_tokens` - Accounts
//! - `categories`, `products`, `product_images`, `stocks`, `featured_products`, `reviews` - Catalog
//! - `promotional_banners`, `featured_categories` - Home page merchandising
//! - `orders`, `order_items`, `order_addresses` - Orders and their shipping snapshots
//! - `financial_metrics`, `financial_transactions` - Ledger
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p strive-cli -- migrate
//! ```
//!
//! Multi-step writes open their transaction inside the repository method so
//! callers never hold a transaction across an `await` on anything but the
//! database.

pub mod addresses;
pub mod banners;
pub mod categories;
pub mod featured_categories;
pub mod finance;
pub mod orders;
pub mod password_reset;
pub mod preferences;
pub mod products;
pub mod reviews;
pub mod users;

use std::str::FromStr;
use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use addresses::AddressRepository;
pub use banners::BannerRepository;
pub use categories::CategoryRepository;
pub use featured_categories::FeaturedCategoryRepository;
pub use finance::FinanceRepository;
pub use orders::OrderRepository;
pub use password_reset::PasswordResetRepository;
pub use preferences::PreferencesRepository;
pub use products::ProductRepository;
pub use reviews::ReviewRepository;
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Map a unique violation to `Conflict(message)`, anything else to `Database`.
pub(crate) fn conflict_on_unique(message: &str) -> impl FnOnce(sqlx::Error) -> RepositoryError {
    move |e| {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_unique_violation()
        {
            return RepositoryError::Conflict(message.to_owned());
        }
        RepositoryError::Database(e)
    }
}

/// Parse an upper-case text column into one of the core enums.
pub(crate) fn parse_column<T>(value: &str) -> Result<T, RepositoryError>
where
    T: FromStr<Err = strive_core::UnknownVariant>,
{
    value
        .parse()
        .map_err(|e| RepositoryError::DataCorruption(format!("{e} in database")))
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
