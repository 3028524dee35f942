//! Product repository: products with their images, stock, featured slots and
//! review aggregates.
//!
//! Reads assemble [`ProductView`]s from one query per collection keyed by
//! `product_id = ANY($1)`, never one query per product.

use std::collections::HashMap;

use rust_decimal::Decimal;
use sqlx::PgPool;

use strive_core::ordering::{Slot, next_display_order, plan_close_gap, plan_sequence};
use strive_core::{CategoryId, ProductId, ProductImageId, ProductStatus, StockId};

use super::{RepositoryError, parse_column};
use crate::models::StoredImage;
use crate::models::product::{
    Product, ProductImage, ProductInput, ProductParts, ProductStock, ProductView, RatingSummary,
    StockInput,
};

const PRODUCT_SELECT: &str = "SELECT p.id, p.name, p.description, p.price, p.category_id, \
                                     p.status, c.name AS category_name \
                              FROM shop.products p \
                              LEFT JOIN shop.categories c ON c.id = p.category_id";

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i32,
    name: String,
    description: Option<String>,
    price: Decimal,
    category_id: Option<i32>,
    status: String,
    category_name: Option<String>,
}

impl ProductRow {
    fn split(self) -> Result<(Product, Option<String>), RepositoryError> {
        let product = Product {
            id: ProductId::new(self.id),
            name: self.name,
            description: self.description,
            price: self.price,
            category_id: self.category_id.map(CategoryId::new),
            status: parse_column(&self.status)?,
        };
        Ok((product, self.category_name))
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ImageRow {
    id: i32,
    product_id: i32,
    image_data: Vec<u8>,
    image_type: Option<String>,
    display_order: i32,
}

impl From<ImageRow> for ProductImage {
    fn from(row: ImageRow) -> Self {
        Self {
            id: ProductImageId::new(row.id),
            product_id: ProductId::new(row.product_id),
            image: StoredImage {
                data: row.image_data,
                content_type: row.image_type,
            },
            display_order: row.display_order,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct StockRow {
    id: i32,
    product_id: i32,
    size: String,
    stock: i32,
}

#[derive(Debug, sqlx::FromRow)]
struct FeaturedRow {
    product_id: i32,
    display_order: i32,
}

#[derive(Debug, sqlx::FromRow)]
struct RatingRow {
    product_id: i32,
    average: f64,
    count: i64,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for products and their collections.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Every product in store order (id ascending).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    /// Returns `RepositoryError::DataCorruption` if a status is invalid.
    pub async fn list_views(&self) -> Result<Vec<ProductView>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!("{PRODUCT_SELECT} ORDER BY p.id"))
            .fetch_all(self.pool)
            .await?;

        self.assemble(rows).await
    }

    /// One product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    /// Returns `RepositoryError::DataCorruption` if the status is invalid.
    pub async fn get_view(&self, id: ProductId) -> Result<Option<ProductView>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!("{PRODUCT_SELECT} WHERE p.id = $1"))
            .bind(id)
            .fetch_all(self.pool)
            .await?;

        Ok(self.assemble(rows).await?.into_iter().next())
    }

    /// Several products, in the order of `ids`. Unknown ids are skipped.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    /// Returns `RepositoryError::DataCorruption` if a status is invalid.
    pub async fn get_views(&self, ids: &[ProductId]) -> Result<Vec<ProductView>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!("{PRODUCT_SELECT} WHERE p.id = ANY($1)"))
            .bind(ids)
            .fetch_all(self.pool)
            .await?;

        let mut views: HashMap<ProductId, ProductView> = self
            .assemble(rows)
            .await?
            .into_iter()
            .map(|view| (view.id, view))
            .collect();
        Ok(ids.iter().filter_map(|id| views.remove(id)).collect())
    }

    /// Featured products by featured display order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    /// Returns `RepositoryError::DataCorruption` if a status is invalid.
    pub async fn featured_views(&self) -> Result<Vec<ProductView>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "{PRODUCT_SELECT} \
             JOIN shop.featured_products f ON f.product_id = p.id \
             ORDER BY f.display_order, p.id"
        ))
        .fetch_all(self.pool)
        .await?;

        self.assemble(rows).await
    }

    /// Whether a product exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn exists(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let found: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM shop.products WHERE id = $1)")
                .bind(id)
                .fetch_one(self.pool)
                .await?;
        Ok(found)
    }

    /// Create a product with its stock and images in one transaction.
    /// Images take positions 1, 2, ... in upload order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn create(
        &self,
        input: &ProductInput,
        images: &[StoredImage],
    ) -> Result<ProductId, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let id: ProductId = sqlx::query_scalar(
            "INSERT INTO shop.products (name, description, price, category_id, status) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id",
        )
        .bind(&input.name)
        .bind(input.description.as_deref())
        .bind(input.price)
        .bind(input.category_id)
        .bind(input.status.unwrap_or_default().as_str())
        .fetch_one(&mut *tx)
        .await?;

        if let Some(stocks) = &input.stocks {
            insert_stocks(&mut tx, id, stocks).await?;
        }
        insert_images(&mut tx, id, images, 1).await?;

        tx.commit().await?;

        Ok(id)
    }

    /// Overwrite a product's fields. Absent status keeps the stored one;
    /// present stocks replace the stored list; images are appended after the
    /// existing ones.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn update(
        &self,
        id: ProductId,
        input: &ProductInput,
        images: &[StoredImage],
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE shop.products SET \
                 name = $2, description = $3, price = $4, category_id = $5, \
                 status = COALESCE($6, status), updated_at = now() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(&input.name)
        .bind(input.description.as_deref())
        .bind(input.price)
        .bind(input.category_id)
        .bind(input.status.map(ProductStatus::as_str))
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        if let Some(stocks) = &input.stocks {
            sqlx::query("DELETE FROM shop.stocks WHERE product_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            insert_stocks(&mut tx, id, stocks).await?;
        }

        if !images.is_empty() {
            let count: i64 =
                sqlx::query_scalar("SELECT COUNT(*) FROM shop.product_images WHERE product_id = $1")
                    .bind(id)
                    .fetch_one(&mut *tx)
                    .await?;
            let first = i32::try_from(count).unwrap_or(i32::MAX).saturating_add(1);
            insert_images(&mut tx, id, images, first).await?;
        }

        tx.commit().await?;

        Ok(())
    }

    /// Set a product's status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn set_status(
        &self,
        id: ProductId,
        status: ProductStatus,
    ) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("UPDATE shop.products SET status = $2, updated_at = now() WHERE id = $1")
                .bind(id)
                .bind(status.as_str())
                .execute(self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Delete a product with its images, stock, featured slot and reviews.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let removed: Option<i32> = sqlx::query_scalar(
            "DELETE FROM shop.featured_products WHERE product_id = $1 RETURNING display_order",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let result = sqlx::query("DELETE FROM shop.products WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if let Some(order) = removed {
            close_featured_gap(&mut tx, order).await?;
        }

        tx.commit().await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete one image of a product. Remaining images keep their positions.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete_image(
        &self,
        product_id: ProductId,
        image_id: ProductImageId,
    ) -> Result<bool, RepositoryError> {
        let result =
            sqlx::query("DELETE FROM shop.product_images WHERE id = $1 AND product_id = $2")
                .bind(image_id)
                .bind(product_id)
                .execute(self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Give the listed images positions 1, 2, ... in list order. Images of
    /// the product that are not listed keep their positions; ids of other
    /// products' images are ignored.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn reorder_images(
        &self,
        product_id: ProductId,
        image_ids: &[ProductImageId],
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        for slot in plan_sequence(image_ids) {
            sqlx::query(
                "UPDATE shop.product_images SET display_order = $3 \
                 WHERE id = $1 AND product_id = $2",
            )
            .bind(slot.id)
            .bind(product_id)
            .bind(slot.display_order)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(())
    }

    /// Remove the product's featured slot if it has one, closing the gap;
    /// otherwise add it at `display_order` or after the last slot.
    ///
    /// Returns whether the product is featured afterwards.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn toggle_featured(
        &self,
        id: ProductId,
        display_order: Option<i32>,
    ) -> Result<bool, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let removed: Option<i32> = sqlx::query_scalar(
            "DELETE FROM shop.featured_products WHERE product_id = $1 RETURNING display_order",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let featured = if let Some(order) = removed {
            close_featured_gap(&mut tx, order).await?;
            false
        } else {
            let order = match display_order {
                Some(order) => order,
                None => {
                    let max: Option<i32> =
                        sqlx::query_scalar("SELECT MAX(display_order) FROM shop.featured_products")
                            .fetch_one(&mut *tx)
                            .await?;
                    next_display_order(max)
                }
            };
            sqlx::query(
                "INSERT INTO shop.featured_products (product_id, display_order) VALUES ($1, $2)",
            )
            .bind(id)
            .bind(order)
            .execute(&mut *tx)
            .await?;
            true
        };

        tx.commit().await?;

        Ok(featured)
    }

    /// Feature the listed products at positions 1, 2, ... in list order,
    /// creating slots where missing. Unknown product ids are ignored.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn reorder_featured(&self, product_ids: &[ProductId]) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        for slot in plan_sequence(product_ids) {
            sqlx::query(
                "INSERT INTO shop.featured_products (product_id, display_order) \
                 SELECT $1, $2 WHERE EXISTS (SELECT 1 FROM shop.products WHERE id = $1) \
                 ON CONFLICT (product_id) DO UPDATE SET display_order = EXCLUDED.display_order",
            )
            .bind(slot.id)
            .bind(slot.display_order)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(())
    }

    async fn assemble(&self, rows: Vec<ProductRow>) -> Result<Vec<ProductView>, RepositoryError> {
        let ids: Vec<i32> = rows.iter().map(|row| row.id).collect();
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut parts: HashMap<i32, ProductParts> =
            ids.iter().map(|id| (*id, ProductParts::default())).collect();

        let images = sqlx::query_as::<_, ImageRow>(
            "SELECT id, product_id, image_data, image_type, display_order \
             FROM shop.product_images WHERE product_id = ANY($1) \
             ORDER BY display_order, id",
        )
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;
        for image in images {
            if let Some(entry) = parts.get_mut(&image.product_id) {
                entry.images.push(image.into());
            }
        }

        let stocks = sqlx::query_as::<_, StockRow>(
            "SELECT id, product_id, size, stock FROM shop.stocks \
             WHERE product_id = ANY($1) ORDER BY id",
        )
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;
        for stock in stocks {
            if let Some(entry) = parts.get_mut(&stock.product_id) {
                entry.stocks.push(ProductStock {
                    id: StockId::new(stock.id),
                    size: stock.size,
                    stock: stock.stock,
                });
            }
        }

        let featured = sqlx::query_as::<_, FeaturedRow>(
            "SELECT product_id, display_order FROM shop.featured_products \
             WHERE product_id = ANY($1)",
        )
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;
        for slot in featured {
            if let Some(entry) = parts.get_mut(&slot.product_id) {
                entry.featured_order = Some(slot.display_order);
            }
        }

        let ratings = sqlx::query_as::<_, RatingRow>(
            "SELECT product_id, AVG(rating)::float8 AS average, COUNT(*) AS count \
             FROM shop.reviews WHERE product_id = ANY($1) GROUP BY product_id",
        )
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;
        for rating in ratings {
            if let Some(entry) = parts.get_mut(&rating.product_id) {
                entry.rating = Some(RatingSummary {
                    average: rating.average,
                    count: rating.count,
                });
            }
        }

        rows.into_iter()
            .map(|row| {
                let mut entry = parts.remove(&row.id).unwrap_or_default();
                let (product, category_name) = row.split()?;
                entry.category_name = category_name;
                Ok(ProductView::assemble(product, entry))
            })
            .collect()
    }
}

async fn insert_stocks(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    product_id: ProductId,
    stocks: &[StockInput],
) -> Result<(), RepositoryError> {
    for stock in stocks {
        sqlx::query("INSERT INTO shop.stocks (product_id, size, stock) VALUES ($1, $2, $3)")
            .bind(product_id)
            .bind(stock.size.trim())
            .bind(stock.stock)
            .execute(&mut **tx)
            .await?;
    }
    Ok(())
}

async fn insert_images(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    product_id: ProductId,
    images: &[StoredImage],
    first_order: i32,
) -> Result<(), RepositoryError> {
    for (image, order) in images.iter().zip(first_order..) {
        sqlx::query(
            "INSERT INTO shop.product_images (product_id, image_data, image_type, display_order) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(product_id)
        .bind(image.data.as_slice())
        .bind(image.content_type.as_deref())
        .bind(order)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

async fn close_featured_gap(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    removed_order: i32,
) -> Result<(), RepositoryError> {
    let rows = sqlx::query_as::<_, FeaturedRow>(
        "SELECT product_id, display_order FROM shop.featured_products \
         WHERE display_order > $1",
    )
    .bind(removed_order)
    .fetch_all(&mut **tx)
    .await?;

    let slots: Vec<Slot<i32>> = rows
        .iter()
        .map(|row| Slot::new(row.product_id, row.display_order))
        .collect();

    for slot in plan_close_gap(&slots, removed_order) {
        sqlx::query("UPDATE shop.featured_products SET display_order = $2 WHERE product_id = $1")
            .bind(slot.id)
            .bind(slot.display_order)
            .execute(&mut **tx)
            .await?;
    }
    Ok(())
}
