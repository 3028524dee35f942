//! Review repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use strive_core::{ProductId, ReviewId, UserId};

use super::RepositoryError;
use crate::models::review::{Review, ReviewInput, display_name};

const REVIEW_SELECT: &str = "SELECT r.id, r.product_id, r.user_id, r.rating, r.comment, \
                                    r.created_at, u.first_name, u.last_name \
                             FROM shop.reviews r \
                             LEFT JOIN shop.users u ON u.id = r.user_id";

#[derive(Debug, sqlx::FromRow)]
struct ReviewRow {
    id: i32,
    product_id: i32,
    user_id: i32,
    rating: i32,
    comment: Option<String>,
    created_at: DateTime<Utc>,
    first_name: Option<String>,
    last_name: Option<String>,
}

impl From<ReviewRow> for Review {
    fn from(row: ReviewRow) -> Self {
        Self {
            id: ReviewId::new(row.id),
            product_id: ProductId::new(row.product_id),
            user_id: UserId::new(row.user_id),
            user_name: display_name(row.first_name.as_deref(), row.last_name.as_deref()),
            rating: row.rating,
            comment: row.comment,
            created_at: row.created_at,
        }
    }
}

/// Repository for product reviews.
pub struct ReviewRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReviewRepository<'a> {
    /// Create a new review repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Reviews of a product, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_product(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<Review>, RepositoryError> {
        let rows = sqlx::query_as::<_, ReviewRow>(&format!(
            "{REVIEW_SELECT} WHERE r.product_id = $1 ORDER BY r.created_at DESC, r.id DESC"
        ))
        .bind(product_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Reviews written by a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Review>, RepositoryError> {
        let rows = sqlx::query_as::<_, ReviewRow>(&format!(
            "{REVIEW_SELECT} WHERE r.user_id = $1 ORDER BY r.created_at DESC, r.id DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// A user's review of one product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_for_user_product(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<Option<Review>, RepositoryError> {
        let row = sqlx::query_as::<_, ReviewRow>(&format!(
            "{REVIEW_SELECT} WHERE r.user_id = $1 AND r.product_id = $2"
        ))
        .bind(user_id)
        .bind(product_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Mean rating of a product, `None` without reviews.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn average_rating(
        &self,
        product_id: ProductId,
    ) -> Result<Option<f64>, RepositoryError> {
        let average: Option<f64> = sqlx::query_scalar(
            "SELECT AVG(rating)::float8 FROM shop.reviews WHERE product_id = $1",
        )
        .bind(product_id)
        .fetch_one(self.pool)
        .await?;

        Ok(average)
    }

    /// Write a review, replacing rating and comment of the user's earlier
    /// review of the same product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, including
    /// when the product or user does not exist.
    pub async fn upsert(&self, input: &ReviewInput) -> Result<Review, RepositoryError> {
        let id: ReviewId = sqlx::query_scalar(
            "INSERT INTO shop.reviews (product_id, user_id, rating, comment) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (user_id, product_id) \
                 DO UPDATE SET rating = EXCLUDED.rating, comment = EXCLUDED.comment \
             RETURNING id",
        )
        .bind(input.product_id)
        .bind(input.user_id)
        .bind(input.rating)
        .bind(input.comment.as_deref())
        .fetch_one(self.pool)
        .await?;

        let row = sqlx::query_as::<_, ReviewRow>(&format!("{REVIEW_SELECT} WHERE r.id = $1"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::fixtures;

    #[sqlx::test(migrations = "./migrations")]
    async fn test_second_review_replaces_first(pool: PgPool) {
        let user_id = fixtures::user(&pool, "ana@strive.shop").await;
        let product_id = fixtures::product(&pool, "Trail Runner").await;
        let repo = ReviewRepository::new(&pool);

        let first = repo
            .upsert(&ReviewInput {
                product_id,
                user_id,
                rating: 2,
                comment: Some("Tight fit".into()),
            })
            .await
            .unwrap();
        let second = repo
            .upsert(&ReviewInput {
                product_id,
                user_id,
                rating: 5,
                comment: None,
            })
            .await
            .unwrap();

        assert_eq!(second.id, first.id);
        assert_eq!(second.rating, 5);
        assert_eq!(second.comment, None);
        assert_eq!(fixtures::count(&pool, "reviews").await, 1);
        let average = repo.average_rating(product_id).await.unwrap();
        assert!(average.is_some_and(|a| (a - 5.0).abs() < f64::EPSILON));
    }
}
