//! Password reset token repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use strive_core::UserId;

use super::RepositoryError;

/// A stored reset token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetToken {
    pub token: String,
    pub user_id: UserId,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct ResetTokenRow {
    token: String,
    user_id: i32,
    expires_at: DateTime<Utc>,
}

impl From<ResetTokenRow> for ResetToken {
    fn from(row: ResetTokenRow) -> Self {
        Self {
            token: row.token,
            user_id: UserId::new(row.user_id),
            expires_at: row.expires_at,
        }
    }
}

/// Outcome of redeeming a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redemption {
    /// Password replaced; the token is gone.
    Done,
    /// No such token.
    Unknown,
    /// Token was past its expiry; it has been deleted.
    Expired,
}

/// Repository for password reset tokens.
pub struct PasswordResetRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PasswordResetRepository<'a> {
    /// Create a new password reset repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Replace any earlier tokens of the user with a fresh one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn issue(
        &self,
        user_id: UserId,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<ResetToken, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM shop.password_reset_tokens WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        let row = sqlx::query_as::<_, ResetTokenRow>(
            "INSERT INTO shop.password_reset_tokens (token, user_id, expires_at) \
             VALUES ($1, $2, $3) \
             RETURNING token, user_id, expires_at",
        )
        .bind(token)
        .bind(user_id)
        .bind(expires_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(row.into())
    }

    /// Redeem a token: if it exists and is still valid at `now`, set the
    /// user's password hash and delete the token, all in one transaction.
    /// An expired token is deleted without touching the password.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn redeem(
        &self,
        token: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Redemption, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, ResetTokenRow>(
            "DELETE FROM shop.password_reset_tokens WHERE token = $1 \
             RETURNING token, user_id, expires_at",
        )
        .bind(token)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(stored) = row.map(ResetToken::from) else {
            return Ok(Redemption::Unknown);
        };

        if stored.expires_at < now {
            tx.commit().await?;
            return Ok(Redemption::Expired);
        }

        sqlx::query("UPDATE shop.users SET password_hash = $2, updated_at = now() WHERE id = $1")
            .bind(stored.user_id)
            .bind(password_hash)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Redemption::Done)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Duration;

    use crate::db::fixtures;

    async fn password_hash(pool: &PgPool, user_id: UserId) -> String {
        sqlx::query_scalar("SELECT password_hash FROM shop.users WHERE id = $1")
            .bind(user_id)
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_expired_token_is_deleted_without_reset(pool: PgPool) {
        let user = fixtures::user(&pool, "ana@strive.shop").await;
        let repo = PasswordResetRepository::new(&pool);
        let now = Utc::now();

        repo.issue(user, "stale", now - Duration::minutes(1)).await.unwrap();

        assert_eq!(
            repo.redeem("stale", "new-hash", now).await.unwrap(),
            Redemption::Expired
        );
        assert_eq!(password_hash(&pool, user).await, "x");
        assert_eq!(fixtures::count(&pool, "password_reset_tokens").await, 0);

        // A second attempt finds nothing
        assert_eq!(
            repo.redeem("stale", "new-hash", now).await.unwrap(),
            Redemption::Unknown
        );
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_valid_token_is_single_use(pool: PgPool) {
        let user = fixtures::user(&pool, "ana@strive.shop").await;
        let repo = PasswordResetRepository::new(&pool);
        let now = Utc::now();

        repo.issue(user, "first", now + Duration::minutes(30)).await.unwrap();
        repo.issue(user, "second", now + Duration::minutes(30)).await.unwrap();
        assert_eq!(fixtures::count(&pool, "password_reset_tokens").await, 1);
        assert_eq!(
            repo.redeem("first", "new-hash", now).await.unwrap(),
            Redemption::Unknown
        );

        assert_eq!(
            repo.redeem("second", "new-hash", now).await.unwrap(),
            Redemption::Done
        );
        assert_eq!(password_hash(&pool, user).await, "new-hash");
        assert_eq!(
            repo.redeem("second", "other-hash", now).await.unwrap(),
            Redemption::Unknown
        );
    }
}
