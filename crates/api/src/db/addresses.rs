//! Address book repository.

use sqlx::PgPool;

use strive_core::{AddressId, UserId};

use super::RepositoryError;
use crate::models::address::{Address, AddressInput};

const ADDRESS_COLUMNS: &str = "id, user_id, name, recipient_name, recipient_phone, \
                               street_address, city, state, postal_code, country, is_default";

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct AddressRow {
    id: i32,
    user_id: i32,
    name: String,
    recipient_name: String,
    recipient_phone: String,
    street_address: String,
    city: String,
    state: Option<String>,
    postal_code: Option<String>,
    country: String,
    is_default: bool,
}

impl From<AddressRow> for Address {
    fn from(row: AddressRow) -> Self {
        Self {
            id: AddressId::new(row.id),
            user_id: UserId::new(row.user_id),
            name: row.name,
            recipient_name: row.recipient_name,
            recipient_phone: row.recipient_phone,
            street_address: row.street_address,
            city: row.city,
            state: row.state,
            postal_code: row.postal_code,
            country: row.country,
            is_default: row.is_default,
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for saved addresses.
pub struct AddressRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AddressRepository<'a> {
    /// Create a new address repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All addresses of a user, by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Address>, RepositoryError> {
        let rows = sqlx::query_as::<_, AddressRow>(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM shop.addresses WHERE user_id = $1 ORDER BY id"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Get an address by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: AddressId) -> Result<Option<Address>, RepositoryError> {
        let row = sqlx::query_as::<_, AddressRow>(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM shop.addresses WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Save a new address. A default address takes the flag from the user's
    /// other addresses in the same transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create(&self, input: &AddressInput) -> Result<Address, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        if input.is_default {
            clear_default(&mut tx, input.user_id).await?;
        }

        let row = sqlx::query_as::<_, AddressRow>(&format!(
            "INSERT INTO shop.addresses \
                 (user_id, name, recipient_name, recipient_phone, street_address, \
                  city, state, postal_code, country, is_default) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {ADDRESS_COLUMNS}"
        ))
        .bind(input.user_id)
        .bind(&input.name)
        .bind(&input.recipient_name)
        .bind(&input.recipient_phone)
        .bind(&input.street_address)
        .bind(&input.city)
        .bind(input.state.as_deref())
        .bind(input.postal_code.as_deref())
        .bind(&input.country)
        .bind(input.is_default)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(row.into())
    }

    /// Overwrite an address owned by `input.user_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such address belongs to the user.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn update(
        &self,
        id: AddressId,
        input: &AddressInput,
    ) -> Result<Address, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        if input.is_default {
            clear_default(&mut tx, input.user_id).await?;
        }

        let row = sqlx::query_as::<_, AddressRow>(&format!(
            "UPDATE shop.addresses SET \
                 name = $3, recipient_name = $4, recipient_phone = $5, street_address = $6, \
                 city = $7, state = $8, postal_code = $9, country = $10, is_default = $11 \
             WHERE id = $1 AND user_id = $2 \
             RETURNING {ADDRESS_COLUMNS}"
        ))
        .bind(id)
        .bind(input.user_id)
        .bind(&input.name)
        .bind(&input.recipient_name)
        .bind(&input.recipient_phone)
        .bind(&input.street_address)
        .bind(&input.city)
        .bind(input.state.as_deref())
        .bind(input.postal_code.as_deref())
        .bind(&input.country)
        .bind(input.is_default)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        tx.commit().await?;

        Ok(row.into())
    }

    /// Delete an address owned by `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: AddressId, user_id: UserId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.addresses WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

async fn clear_default(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    user_id: UserId,
) -> Result<(), RepositoryError> {
    sqlx::query("UPDATE shop.addresses SET is_default = FALSE WHERE user_id = $1 AND is_default")
        .bind(user_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}
