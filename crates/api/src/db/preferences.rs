//! Notification preferences repository.

use sqlx::PgPool;

use strive_core::{PreferencesId, UserId};

use super::RepositoryError;
use crate::models::notification_preferences::{NotificationPreferences, PreferenceFlags};

#[derive(Debug, sqlx::FromRow)]
struct PreferencesRow {
    id: i32,
    user_id: i32,
    email_notifications: bool,
    order_updates: bool,
    promotions: bool,
    newsletter: bool,
}

impl From<PreferencesRow> for NotificationPreferences {
    fn from(row: PreferencesRow) -> Self {
        Self {
            id: PreferencesId::new(row.id),
            user_id: UserId::new(row.user_id),
            email_notifications: row.email_notifications,
            order_updates: row.order_updates,
            promotions: row.promotions,
            newsletter: row.newsletter,
        }
    }
}

/// Repository for per-user notification flags.
pub struct PreferencesRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PreferencesRepository<'a> {
    /// Create a new preferences repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user's preferences, creating the defaults if the row is missing.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, including
    /// when the user does not exist.
    pub async fn get_or_create(
        &self,
        user_id: UserId,
    ) -> Result<NotificationPreferences, RepositoryError> {
        self.write(user_id, PreferenceFlags::default(), false).await
    }

    /// Insert or overwrite a user's preferences.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, including
    /// when the user does not exist.
    pub async fn upsert(
        &self,
        user_id: UserId,
        flags: PreferenceFlags,
    ) -> Result<NotificationPreferences, RepositoryError> {
        self.write(user_id, flags, true).await
    }

    /// Get a user's stored preferences without creating them.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(
        &self,
        user_id: UserId,
    ) -> Result<Option<NotificationPreferences>, RepositoryError> {
        let row = sqlx::query_as::<_, PreferencesRow>(
            "SELECT id, user_id, email_notifications, order_updates, promotions, newsletter \
             FROM shop.notification_preferences WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn write(
        &self,
        user_id: UserId,
        flags: PreferenceFlags,
        overwrite: bool,
    ) -> Result<NotificationPreferences, RepositoryError> {
        // The no-op update on conflict makes RETURNING yield the existing row.
        let row = sqlx::query_as::<_, PreferencesRow>(
            "INSERT INTO shop.notification_preferences \
                 (user_id, email_notifications, order_updates, promotions, newsletter) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (user_id) DO UPDATE SET \
                 email_notifications = CASE WHEN $6 THEN EXCLUDED.email_notifications \
                     ELSE shop.notification_preferences.email_notifications END, \
                 order_updates = CASE WHEN $6 THEN EXCLUDED.order_updates \
                     ELSE shop.notification_preferences.order_updates END, \
                 promotions = CASE WHEN $6 THEN EXCLUDED.promotions \
                     ELSE shop.notification_preferences.promotions END, \
                 newsletter = CASE WHEN $6 THEN EXCLUDED.newsletter \
                     ELSE shop.notification_preferences.newsletter END \
             RETURNING id, user_id, email_notifications, order_updates, promotions, newsletter",
        )
        .bind(user_id)
        .bind(flags.email_notifications)
        .bind(flags.order_updates)
        .bind(flags.promotions)
        .bind(flags.newsletter)
        .bind(overwrite)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }
}
