//! Categories promoted on the storefront home page.

use serde::{Deserialize, Serialize};

use strive_core::{CategoryId, FeaturedCategoryId};

use super::category::{Category, ancestor_path};
use super::StoredImage;

/// A featured slot as stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeaturedCategory {
    pub id: FeaturedCategoryId,
    pub category_id: CategoryId,
    pub display_order: i32,
}

/// JSON view of a featured slot with the category it points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeaturedCategoryView {
    pub id: FeaturedCategoryId,
    pub category_id: CategoryId,
    pub name: String,
    pub image_base64: Option<String>,
    pub image_type: Option<String>,
    pub display_order: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_path: Option<String>,
}

impl FeaturedCategoryView {
    /// Join slots with their categories. Slots whose category vanished are
    /// dropped.
    #[must_use]
    pub fn join(slots: &[FeaturedCategory], categories: &[Category]) -> Vec<Self> {
        slots
            .iter()
            .filter_map(|slot| {
                let category = categories.iter().find(|c| c.id == slot.category_id)?;
                Some(Self {
                    id: slot.id,
                    category_id: category.id,
                    name: category.name.clone(),
                    image_base64: category.image.as_ref().map(StoredImage::to_base64),
                    image_type: category
                        .image
                        .as_ref()
                        .and_then(|image| image.content_type.clone()),
                    display_order: slot.display_order,
                    parent_path: ancestor_path(categories, category.id),
                })
            })
            .collect()
    }
}

/// Body of `POST /api/featured-categories`.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddFeaturedCategory {
    pub category_id: CategoryId,
}

/// Body of `PUT /api/featured-categories/{id}/order`.
#[derive(Debug, Clone, Deserialize)]
pub struct DirectionChange {
    pub direction: String,
}

/// Message for a full featured list.
#[must_use]
pub fn limit_message(limit: i64) -> String {
    format!("Maximum number of featured categories ({limit}) has been reached")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_join_adds_parent_path_for_nested_categories() {
        let categories = vec![
            Category {
                id: CategoryId::new(1),
                name: "Men".into(),
                parent_id: None,
                image: None,
            },
            Category {
                id: CategoryId::new(2),
                name: "Shoes".into(),
                parent_id: Some(CategoryId::new(1)),
                image: Some(StoredImage {
                    data: vec![0xff],
                    content_type: Some("image/jpeg".into()),
                }),
            },
        ];
        let slots = [
            FeaturedCategory {
                id: FeaturedCategoryId::new(10),
                category_id: CategoryId::new(1),
                display_order: 1,
            },
            FeaturedCategory {
                id: FeaturedCategoryId::new(11),
                category_id: CategoryId::new(2),
                display_order: 2,
            },
        ];

        let json = serde_json::to_value(FeaturedCategoryView::join(&slots, &categories)).unwrap();
        assert!(json[0].get("parentPath").is_none());
        assert_eq!(json[1]["parentPath"], "Men → Shoes");
        assert_eq!(json[1]["imageType"], "image/jpeg");
        assert_eq!(json[1]["categoryId"], 2);
    }

    #[test]
    fn test_limit_message() {
        assert_eq!(
            limit_message(6),
            "Maximum number of featured categories (6) has been reached"
        );
    }
}
