//! Products, their images, per-size stock and the catalog view.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use strive_core::search::{Listing, PageRequest, ProductFilter, SortOrder, parse_category_ids, split_csv};
use strive_core::{CategoryId, ProductId, ProductImageId, ProductStatus, StockId};

use super::{StoredImage, check_length, require_text};

const MAX_NAME_LENGTH: usize = 255;
const MAX_SIZE_LENGTH: usize = 20;

/// A product row without its collections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub category_id: Option<CategoryId>,
    pub status: ProductStatus,
}

/// A stored product image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductImage {
    pub id: ProductImageId,
    pub product_id: ProductId,
    pub image: StoredImage,
    pub display_order: i32,
}

/// Stock count for one size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductStock {
    pub id: StockId,
    pub size: String,
    pub stock: i32,
}

/// Review aggregate for one product.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingSummary {
    pub average: f64,
    pub count: i64,
}

/// JSON view of an image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductImageView {
    pub id: ProductImageId,
    pub image_base64: String,
    pub image_type: Option<String>,
    pub display_order: i32,
}

impl From<&ProductImage> for ProductImageView {
    fn from(image: &ProductImage) -> Self {
        Self {
            id: image.id,
            image_base64: image.image.to_base64(),
            image_type: image.image.content_type.clone(),
            display_order: image.display_order,
        }
    }
}

/// A product as the catalog shows it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub category_id: Option<CategoryId>,
    pub category_name: Option<String>,
    pub status: ProductStatus,
    pub images: Vec<ProductImageView>,
    pub stocks: Vec<ProductStock>,
    pub is_featured: bool,
    /// Featured position, `None` when not featured.
    pub display_order: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_count: Option<i64>,
}

/// Everything needed to assemble a [`ProductView`].
#[derive(Debug, Clone, Default)]
pub struct ProductParts {
    pub category_name: Option<String>,
    pub images: Vec<ProductImage>,
    pub stocks: Vec<ProductStock>,
    pub featured_order: Option<i32>,
    pub rating: Option<RatingSummary>,
}

impl ProductView {
    /// Assemble the view. Images are sorted by display order.
    #[must_use]
    pub fn assemble(product: Product, mut parts: ProductParts) -> Self {
        parts.images.sort_by_key(|image| image.display_order);
        let rating = parts.rating.filter(|r| r.count > 0);
        Self {
            id: product.id,
            name: product.name,
            description: product.description,
            price: product.price,
            category_id: product.category_id,
            category_name: parts.category_name,
            status: product.status,
            images: parts.images.iter().map(ProductImageView::from).collect(),
            stocks: parts.stocks,
            is_featured: parts.featured_order.is_some(),
            display_order: parts.featured_order,
            average_rating: rating.map(|r| r.average),
            review_count: rating.map(|r| r.count),
        }
    }
}

impl Listing for ProductView {
    fn category_id(&self) -> Option<CategoryId> {
        self.category_id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    fn price(&self) -> Decimal {
        self.price
    }

    fn average_rating(&self) -> Option<f64> {
        self.average_rating
    }

    fn has_size_in_stock(&self, sizes: &[String]) -> bool {
        self.stocks
            .iter()
            .any(|stock| stock.stock > 0 && sizes.iter().any(|size| *size == stock.size))
    }
}

/// Stock entry in a create/update body.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StockInput {
    pub size: String,
    pub stock: i32,
}

/// Create/update body. Sent as JSON, or as the `product` part of a
/// multipart request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub category_id: Option<CategoryId>,
    /// On update, absent keeps the stored status.
    pub status: Option<ProductStatus>,
    /// On update, absent keeps the stored stock list.
    pub stocks: Option<Vec<StockInput>>,
}

impl ProductInput {
    /// # Errors
    ///
    /// Returns the client-facing message for the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        require_text(&self.name, "Name", MAX_NAME_LENGTH)?;
        if self.price.is_sign_negative() {
            return Err("Price must not be negative".to_string());
        }
        for stock in self.stocks.iter().flatten() {
            require_text(&stock.size, "Size", MAX_SIZE_LENGTH)?;
            if stock.stock < 0 {
                return Err("Stock must not be negative".to_string());
            }
        }
        let mut sizes: Vec<&str> = self
            .stocks
            .iter()
            .flatten()
            .map(|s| s.size.as_str())
            .collect();
        sizes.sort_unstable();
        if sizes.windows(2).any(|pair| pair.first() == pair.last()) {
            return Err("Each size may only appear once".to_string());
        }
        Ok(())
    }
}

/// Query of `GET /api/products/paginated`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogQuery {
    pub page: Option<u32>,
    pub size: Option<u32>,
    pub category_ids: Option<String>,
    /// Matched against name and description.
    pub name: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub min_rating: Option<i32>,
    pub sizes: Option<String>,
    pub sort: Option<String>,
}

impl CatalogQuery {
    /// Split into filter, sort and page request.
    ///
    /// # Errors
    ///
    /// Returns a message for a malformed category id list.
    pub fn into_search(self) -> Result<(ProductFilter, Option<SortOrder>, PageRequest), String> {
        let defaults = PageRequest::default();
        let request = PageRequest {
            page: self.page.unwrap_or(defaults.page),
            size: self.size.unwrap_or(defaults.size),
        };
        let filter = ProductFilter {
            category_ids: parse_category_ids(self.category_ids.as_deref())?,
            text: self.name,
            min_price: self.min_price,
            max_price: self.max_price,
            min_rating: self.min_rating,
            sizes: split_csv(self.sizes.as_deref()),
        };
        Ok((filter, SortOrder::parse_lenient(self.sort.as_deref()), request))
    }
}

/// Query of `PUT /api/products/{id}/status`.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusQuery {
    pub status: String,
}

/// Query of `PUT /api/products/{id}/featured`.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeaturedQuery {
    pub display_order: Option<i32>,
}

/// An uploaded file, checked for an image content type.
///
/// # Errors
///
/// Returns a message when the declared type is not `image/*`.
pub fn accept_image(data: Vec<u8>, content_type: Option<String>) -> Result<StoredImage, String> {
    check_length(content_type.as_deref(), "Image type", 100)?;
    if let Some(ct) = content_type.as_deref()
        && !ct.starts_with("image/")
    {
        return Err(format!("Unsupported image type: {ct}"));
    }
    Ok(StoredImage { data, content_type })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product() -> Product {
        Product {
            id: ProductId::new(1),
            name: "Trail Runner".into(),
            description: Some("Lightweight trail shoe".into()),
            price: Decimal::new(8999, 2),
            category_id: Some(CategoryId::new(3)),
            status: ProductStatus::Active,
        }
    }

    fn stock(size: &str, count: i32) -> ProductStock {
        ProductStock {
            id: StockId::new(1),
            size: size.into(),
            stock: count,
        }
    }

    #[test]
    fn test_view_omits_rating_without_reviews() {
        let view = ProductView::assemble(product(), ProductParts::default());
        let json = serde_json::to_value(&view).unwrap();
        assert!(json.get("averageRating").is_none());
        assert!(json.get("reviewCount").is_none());
        assert_eq!(json["isFeatured"], false);
        assert_eq!(json["displayOrder"], serde_json::Value::Null);
        assert_eq!(json["price"], "89.99");
    }

    #[test]
    fn test_view_includes_rating_and_featured_order() {
        let parts = ProductParts {
            featured_order: Some(2),
            rating: Some(RatingSummary {
                average: 4.0,
                count: 3,
            }),
            ..ProductParts::default()
        };
        let json = serde_json::to_value(ProductView::assemble(product(), parts)).unwrap();
        assert_eq!(json["averageRating"], 4.0);
        assert_eq!(json["reviewCount"], 3);
        assert_eq!(json["isFeatured"], true);
        assert_eq!(json["displayOrder"], 2);
    }

    #[test]
    fn test_images_sorted_by_display_order() {
        let image = |id: i32, order: i32| ProductImage {
            id: ProductImageId::new(id),
            product_id: ProductId::new(1),
            image: StoredImage {
                data: vec![0],
                content_type: Some("image/png".into()),
            },
            display_order: order,
        };
        let parts = ProductParts {
            images: vec![image(7, 2), image(8, 1)],
            ..ProductParts::default()
        };
        let view = ProductView::assemble(product(), parts);
        let ids: Vec<_> = view.images.iter().map(|i| i.id.as_i32()).collect();
        assert_eq!(ids, vec![8, 7]);
    }

    #[test]
    fn test_size_in_stock_needs_positive_count() {
        let parts = ProductParts {
            stocks: vec![stock("M", 0), stock("L", 2)],
            ..ProductParts::default()
        };
        let view = ProductView::assemble(product(), parts);
        assert!(!view.has_size_in_stock(&["M".into()]));
        assert!(view.has_size_in_stock(&["M".into(), "L".into()]));
    }

    #[test]
    fn test_input_rejects_duplicate_sizes() {
        let input: ProductInput = serde_json::from_value(serde_json::json!({
            "name": "Tee",
            "price": 19.5,
            "stocks": [{"size": "M", "stock": 1}, {"size": "M", "stock": 2}]
        }))
        .unwrap();
        assert_eq!(input.validate(), Err("Each size may only appear once".into()));
    }

    #[test]
    fn test_catalog_query_defaults() {
        let (filter, sort, request) = CatalogQuery::default().into_search().unwrap();
        assert_eq!(request, PageRequest::default());
        assert!(sort.is_none());
        assert!(filter.category_ids.is_empty());

        let query = CatalogQuery {
            category_ids: Some("1,x".into()),
            ..CatalogQuery::default()
        };
        assert!(query.into_search().is_err());
    }

    #[test]
    fn test_accept_image() {
        assert!(accept_image(vec![1], Some("image/webp".into())).is_ok());
        assert!(accept_image(vec![1], None).is_ok());
        assert!(accept_image(vec![1], Some("text/plain".into())).is_err());
    }
}
