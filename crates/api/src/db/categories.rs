//! Category repository.
//!
//! Categories are few, so the tree is assembled in memory from one query.

use sqlx::PgPool;

use strive_core::CategoryId;

use super::RepositoryError;
use crate::models::StoredImage;
use crate::models::category::{Category, ImageChange};

const CATEGORY_COLUMNS: &str = "id, name, parent_id, image_data, image_type";

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: i32,
    name: String,
    parent_id: Option<i32>,
    image_data: Option<Vec<u8>>,
    image_type: Option<String>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: CategoryId::new(row.id),
            name: row.name,
            parent_id: row.parent_id.map(CategoryId::new),
            image: row.image_data.map(|data| StoredImage {
                data,
                content_type: row.image_type,
            }),
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for catalog categories.
pub struct CategoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CategoryRepository<'a> {
    /// Create a new category repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Every category, by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryRow>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM shop.categories ORDER BY id"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Get a category by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM shop.categories WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Whether a category exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn exists(&self, id: CategoryId) -> Result<bool, RepositoryError> {
        let found: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM shop.categories WHERE id = $1)")
                .bind(id)
                .fetch_one(self.pool)
                .await?;
        Ok(found)
    }

    /// Create a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create(
        &self,
        name: &str,
        parent_id: Option<CategoryId>,
        image: Option<&StoredImage>,
    ) -> Result<Category, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(&format!(
            "INSERT INTO shop.categories (name, parent_id, image_data, image_type) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {CATEGORY_COLUMNS}"
        ))
        .bind(name)
        .bind(parent_id)
        .bind(image.map(|i| i.data.as_slice()))
        .bind(image.and_then(|i| i.content_type.as_deref()))
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Rename and re-parent a category, applying `image` to its picture.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category doesn't exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn update(
        &self,
        id: CategoryId,
        name: &str,
        parent_id: Option<CategoryId>,
        image: &ImageChange,
    ) -> Result<Category, RepositoryError> {
        let (replace, data, content_type) = match image {
            ImageChange::Keep => (false, None, None),
            ImageChange::Remove => (true, None, None),
            ImageChange::Replace(new) => {
                (true, Some(new.data.as_slice()), new.content_type.as_deref())
            }
        };

        let row = sqlx::query_as::<_, CategoryRow>(&format!(
            "UPDATE shop.categories SET \
                 name = $2, \
                 parent_id = $3, \
                 image_data = CASE WHEN $4 THEN $5 ELSE image_data END, \
                 image_type = CASE WHEN $4 THEN $6 ELSE image_type END \
             WHERE id = $1 \
             RETURNING {CATEGORY_COLUMNS}"
        ))
        .bind(id)
        .bind(name)
        .bind(parent_id)
        .bind(replace)
        .bind(data)
        .bind(content_type)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    /// Delete a category and its subtree. Products in it become uncategorized.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: CategoryId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.categories WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
