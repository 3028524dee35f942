//! Promotional banner repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use strive_core::BannerId;
use strive_core::ordering::{Slot, next_display_order, plan_move_to};

use super::RepositoryError;
use crate::models::banner::{Banner, BannerInput};

const BANNER_COLUMNS: &str = "id, title, subtitle, highlight, icon, background_color, \
                              display_order, active, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct BannerRow {
    id: i32,
    title: String,
    subtitle: String,
    highlight: String,
    icon: String,
    background_color: String,
    display_order: i32,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<BannerRow> for Banner {
    fn from(row: BannerRow) -> Self {
        Self {
            id: BannerId::new(row.id),
            title: row.title,
            subtitle: row.subtitle,
            highlight: row.highlight,
            icon: row.icon,
            background_color: row.background_color,
            display_order: row.display_order,
            active: row.active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SlotRow {
    id: i32,
    display_order: i32,
}

/// Repository for promotional banners.
pub struct BannerRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> BannerRepository<'a> {
    /// Create a new banner repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Every banner by display order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Banner>, RepositoryError> {
        let rows = sqlx::query_as::<_, BannerRow>(&format!(
            "SELECT {BANNER_COLUMNS} FROM shop.promotional_banners ORDER BY display_order, id"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Active banners by display order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_active(&self) -> Result<Vec<Banner>, RepositoryError> {
        let rows = sqlx::query_as::<_, BannerRow>(&format!(
            "SELECT {BANNER_COLUMNS} FROM shop.promotional_banners \
             WHERE active ORDER BY display_order, id"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Get a banner by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: BannerId) -> Result<Option<Banner>, RepositoryError> {
        let row = sqlx::query_as::<_, BannerRow>(&format!(
            "SELECT {BANNER_COLUMNS} FROM shop.promotional_banners WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Create a banner, appending it after the last one unless the input
    /// names a position. Banners are active unless told otherwise.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn create(&self, input: &BannerInput) -> Result<Banner, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let display_order = match input.display_order {
            Some(order) => order,
            None => {
                let max: Option<i32> = sqlx::query_scalar(
                    "SELECT MAX(display_order) FROM shop.promotional_banners",
                )
                .fetch_one(&mut *tx)
                .await?;
                next_display_order(max)
            }
        };

        let row = sqlx::query_as::<_, BannerRow>(&format!(
            "INSERT INTO shop.promotional_banners \
                 (title, subtitle, highlight, icon, background_color, display_order, active) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {BANNER_COLUMNS}"
        ))
        .bind(&input.title)
        .bind(&input.subtitle)
        .bind(&input.highlight)
        .bind(&input.icon)
        .bind(&input.background_color)
        .bind(display_order)
        .bind(input.active.unwrap_or(true))
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(row.into())
    }

    /// Overwrite a banner's text fields. Absent position and active flag keep
    /// their stored values.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the banner doesn't exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn update(&self, id: BannerId, input: &BannerInput) -> Result<Banner, RepositoryError> {
        let row = sqlx::query_as::<_, BannerRow>(&format!(
            "UPDATE shop.promotional_banners SET \
                 title = $2, subtitle = $3, highlight = $4, icon = $5, background_color = $6, \
                 display_order = COALESCE($7, display_order), \
                 active = COALESCE($8, active), \
                 updated_at = now() \
             WHERE id = $1 \
             RETURNING {BANNER_COLUMNS}"
        ))
        .bind(id)
        .bind(&input.title)
        .bind(&input.subtitle)
        .bind(&input.highlight)
        .bind(&input.icon)
        .bind(&input.background_color)
        .bind(input.display_order)
        .bind(input.active)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    /// Switch a banner on or off.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the banner doesn't exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn set_active(&self, id: BannerId, active: bool) -> Result<Banner, RepositoryError> {
        let row = sqlx::query_as::<_, BannerRow>(&format!(
            "UPDATE shop.promotional_banners SET active = $2, updated_at = now() \
             WHERE id = $1 \
             RETURNING {BANNER_COLUMNS}"
        ))
        .bind(id)
        .bind(active)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    /// Move a banner to `target`. A banner already at `target` takes the
    /// moving banner's old position; it is parked at the sentinel position
    /// while the moving banner lands.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the banner doesn't exist.
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn move_to(&self, id: BannerId, target: i32) -> Result<Banner, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let slots: Vec<Slot<BannerId>> = sqlx::query_as::<_, SlotRow>(
            "SELECT id, display_order FROM shop.promotional_banners FOR UPDATE",
        )
        .fetch_all(&mut *tx)
        .await?
        .into_iter()
        .map(|row| Slot::new(BannerId::new(row.id), row.display_order))
        .collect();

        let plan = plan_move_to(&slots, id, target).map_err(|_| RepositoryError::NotFound)?;
        for slot in plan {
            sqlx::query(
                "UPDATE shop.promotional_banners SET display_order = $2, updated_at = now() \
                 WHERE id = $1",
            )
            .bind(slot.id)
            .bind(slot.display_order)
            .execute(&mut *tx)
            .await?;
        }

        let row = sqlx::query_as::<_, BannerRow>(&format!(
            "SELECT {BANNER_COLUMNS} FROM shop.promotional_banners WHERE id = $1"
        ))
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(row.into())
    }

    /// Delete a banner. Other banners keep their positions.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: BannerId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.promotional_banners WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
