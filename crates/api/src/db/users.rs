//! User repository for database operations.
//!
//! Registration writes the user and their default notification preferences in
//! one transaction, so every account has exactly one preferences row.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use strive_core::{Email, Role, UserId};

use super::{RepositoryError, conflict_on_unique, parse_column};
use crate::models::notification_preferences::PreferenceFlags;
use crate::models::user::{NewUser, ProfileChanges, User};

const EMAIL_IN_USE: &str = "Email is already in use";

const USER_COLUMNS: &str = "id, email, first_name, last_name, phone, country_code, role, \
                            created_at, updated_at";

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for `PostgreSQL` user queries.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i32,
    email: String,
    first_name: String,
    last_name: String,
    phone: Option<String>,
    country_code: Option<String>,
    role: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: UserId::new(row.id),
            email,
            first_name: row.first_name,
            last_name: row.last_name,
            phone: row.phone,
            country_code: row.country_code,
            role: parse_column(&row.role)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Internal row type for login lookups.
#[derive(Debug, sqlx::FromRow)]
struct CredentialRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all users by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn list_all(&self) -> Result<Vec<User>, RepositoryError> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM shop.users ORDER BY id"
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// List users holding any of `roles`, by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn list_by_roles(&self, roles: &[Role]) -> Result<Vec<User>, RepositoryError> {
        let names: Vec<&str> = roles.iter().copied().map(Role::as_str).collect();
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM shop.users WHERE role = ANY($1) ORDER BY id"
        ))
        .bind(names)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM shop.users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get a user by their email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM shop.users WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get a user together with their password hash for login.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn get_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, CredentialRow>(&format!(
            "SELECT {USER_COLUMNS}, password_hash FROM shop.users WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(|row| {
            let user = User::try_from(row.user)?;
            Ok((user, row.password_hash))
        })
        .transpose()
    }

    /// Create a user and their notification preferences in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email is already registered.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create_with_preferences(
        &self,
        user: &NewUser,
        preferences: PreferenceFlags,
    ) -> Result<User, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, UserRow>(&format!(
            "INSERT INTO shop.users \
                 (email, password_hash, first_name, last_name, phone, country_code, role) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(user.email.as_str())
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.phone.as_deref())
        .bind(user.country_code.as_deref())
        .bind(user.role.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(conflict_on_unique(EMAIL_IN_USE))?;

        sqlx::query(
            "INSERT INTO shop.notification_preferences \
                 (user_id, email_notifications, order_updates, promotions, newsletter) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(row.id)
        .bind(preferences.email_notifications)
        .bind(preferences.order_updates)
        .bind(preferences.promotions)
        .bind(preferences.newsletter)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        row.try_into()
    }

    /// Apply a profile update. Absent names and email keep their values;
    /// phone and country code are always written.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    /// Returns `RepositoryError::Conflict` if the new email is taken.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn update_profile(
        &self,
        id: UserId,
        changes: &ProfileChanges,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE shop.users SET \
                 first_name = COALESCE($2, first_name), \
                 last_name = COALESCE($3, last_name), \
                 email = COALESCE($4, email), \
                 phone = $5, \
                 country_code = $6, \
                 updated_at = now() \
             WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(changes.first_name.as_deref())
        .bind(changes.last_name.as_deref())
        .bind(changes.email.as_ref().map(Email::as_str))
        .bind(changes.phone.as_deref())
        .bind(changes.country_code.as_deref())
        .fetch_optional(self.pool)
        .await
        .map_err(conflict_on_unique(EMAIL_IN_USE))?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    /// Update a staff member. `None` keeps the stored value.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    /// Returns `RepositoryError::Conflict` if the new email is taken.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn update_employee(
        &self,
        id: UserId,
        first_name: Option<&str>,
        last_name: Option<&str>,
        email: Option<&Email>,
        role: Option<Role>,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE shop.users SET \
                 first_name = COALESCE($2, first_name), \
                 last_name = COALESCE($3, last_name), \
                 email = COALESCE($4, email), \
                 role = COALESCE($5, role), \
                 updated_at = now() \
             WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(first_name)
        .bind(last_name)
        .bind(email.map(Email::as_str))
        .bind(role.map(Role::as_str))
        .fetch_optional(self.pool)
        .await
        .map_err(conflict_on_unique(EMAIL_IN_USE))?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    /// Replace a user's password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn update_password(
        &self,
        id: UserId,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE shop.users SET password_hash = $2, updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .bind(password_hash)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Delete a user. Their addresses, preferences, reviews and orders go
    /// with them.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: UserId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.users WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::{PreferencesRepository, fixtures};

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: Email::parse(email).unwrap(),
            password_hash: "hash".into(),
            first_name: "Ana".into(),
            last_name: "Silva".into(),
            phone: None,
            country_code: None,
            role: Role::Customer,
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_account_gets_preferences_once(pool: PgPool) {
        let user = UserRepository::new(&pool)
            .create_with_preferences(&new_user("ana@strive.shop"), PreferenceFlags::default())
            .await
            .unwrap();

        let preferences = PreferencesRepository::new(&pool);
        let stored = preferences.get_or_create(user.id).await.unwrap();
        assert!(stored.email_notifications);
        assert!(!stored.promotions);
        let again = preferences.get_or_create(user.id).await.unwrap();
        assert_eq!(again.id, stored.id);
        assert_eq!(fixtures::count(&pool, "notification_preferences").await, 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_duplicate_email_leaves_no_rows(pool: PgPool) {
        let repo = UserRepository::new(&pool);
        repo.create_with_preferences(&new_user("ana@strive.shop"), PreferenceFlags::default())
            .await
            .unwrap();

        let result = repo
            .create_with_preferences(&new_user("ana@strive.shop"), PreferenceFlags::default())
            .await;
        assert!(matches!(result, Err(RepositoryError::Conflict(_))));
        assert_eq!(fixtures::count(&pool, "users").await, 1);
        assert_eq!(fixtures::count(&pool, "notification_preferences").await, 1);
    }
}
