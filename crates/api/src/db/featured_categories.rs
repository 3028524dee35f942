//! Featured category repository.

use sqlx::PgPool;

use strive_core::ordering::{
    Direction, MAX_FEATURED_CATEGORIES, Slot, next_display_order, plan_close_gap, plan_step,
};
use strive_core::{CategoryId, FeaturedCategoryId};

use super::{RepositoryError, conflict_on_unique};
use crate::models::featured_category::{FeaturedCategory, limit_message};

#[derive(Debug, sqlx::FromRow)]
struct FeaturedCategoryRow {
    id: i32,
    category_id: i32,
    display_order: i32,
}

impl From<FeaturedCategoryRow> for FeaturedCategory {
    fn from(row: FeaturedCategoryRow) -> Self {
        Self {
            id: FeaturedCategoryId::new(row.id),
            category_id: CategoryId::new(row.category_id),
            display_order: row.display_order,
        }
    }
}

/// Repository for featured category slots.
pub struct FeaturedCategoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> FeaturedCategoryRepository<'a> {
    /// Create a new featured category repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Every slot by display order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<FeaturedCategory>, RepositoryError> {
        let rows = sqlx::query_as::<_, FeaturedCategoryRow>(
            "SELECT id, category_id, display_order FROM shop.featured_categories \
             ORDER BY display_order, id",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Append a category after the last slot.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the list is full or the
    /// category is already featured.
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn add(&self, category_id: CategoryId) -> Result<FeaturedCategory, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        // Serializes concurrent adds so the cap holds.
        sqlx::query("LOCK TABLE shop.featured_categories IN SHARE ROW EXCLUSIVE MODE")
            .execute(&mut *tx)
            .await?;

        let (count, max): (i64, Option<i32>) = sqlx::query_as(
            "SELECT COUNT(*), MAX(display_order) FROM shop.featured_categories",
        )
        .fetch_one(&mut *tx)
        .await?;

        if count >= MAX_FEATURED_CATEGORIES {
            return Err(RepositoryError::Conflict(limit_message(
                MAX_FEATURED_CATEGORIES,
            )));
        }

        let row = sqlx::query_as::<_, FeaturedCategoryRow>(
            "INSERT INTO shop.featured_categories (category_id, display_order) \
             VALUES ($1, $2) \
             RETURNING id, category_id, display_order",
        )
        .bind(category_id)
        .bind(next_display_order(max))
        .fetch_one(&mut *tx)
        .await
        .map_err(conflict_on_unique("Category is already featured"))?;

        tx.commit().await?;

        Ok(row.into())
    }

    /// Remove a slot and move every later slot up by one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the slot doesn't exist.
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn remove(&self, id: FeaturedCategoryId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let removed: i32 = sqlx::query_scalar(
            "DELETE FROM shop.featured_categories WHERE id = $1 RETURNING display_order",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        let slots = load_slots(&mut tx).await?;
        for slot in plan_close_gap(&slots, removed) {
            write_slot(&mut tx, slot).await?;
        }

        tx.commit().await?;

        Ok(())
    }

    /// Swap a slot with its neighbour above or below. Moving past either end
    /// does nothing.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the slot doesn't exist.
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn step(
        &self,
        id: FeaturedCategoryId,
        direction: Direction,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let slots = load_slots(&mut tx).await?;
        let plan = plan_step(&slots, id, direction).map_err(|_| RepositoryError::NotFound)?;
        for slot in plan {
            write_slot(&mut tx, slot).await?;
        }

        tx.commit().await?;

        Ok(())
    }
}

async fn load_slots(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
) -> Result<Vec<Slot<FeaturedCategoryId>>, RepositoryError> {
    let rows = sqlx::query_as::<_, FeaturedCategoryRow>(
        "SELECT id, category_id, display_order FROM shop.featured_categories FOR UPDATE",
    )
    .fetch_all(&mut **tx)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| Slot::new(FeaturedCategoryId::new(row.id), row.display_order))
        .collect())
}

async fn write_slot(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    slot: Slot<FeaturedCategoryId>,
) -> Result<(), RepositoryError> {
    sqlx::query("UPDATE shop.featured_categories SET display_order = $2 WHERE id = $1")
        .bind(slot.id)
        .bind(slot.display_order)
        .execute(&mut **tx)
        .await?;
    Ok(())
}
