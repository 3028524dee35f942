//! Promotional banners shown on the storefront home page.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use strive_core::BannerId;

use super::require_text;

/// A promotional banner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Banner {
    pub id: BannerId,
    pub title: String,
    pub subtitle: String,
    pub highlight: String,
    pub icon: String,
    pub background_color: String,
    pub display_order: i32,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create/update body. On update, absent `displayOrder` and `active` keep
/// their stored values.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BannerInput {
    pub title: String,
    pub subtitle: String,
    pub highlight: String,
    pub icon: String,
    pub background_color: String,
    pub display_order: Option<i32>,
    pub active: Option<bool>,
}

impl BannerInput {
    /// Check required fields and column limits.
    ///
    /// # Errors
    ///
    /// Returns the client-facing message for the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        require_text(&self.title, "Title", 50)?;
        require_text(&self.subtitle, "Subtitle", 100)?;
        require_text(&self.highlight, "Highlight", 100)?;
        require_text(&self.icon, "Icon", 50)?;
        require_text(&self.background_color, "Background color", 20)
    }
}

/// Body of `PATCH /api/banners/{id}/active`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ActiveChange {
    pub active: bool,
}

/// Body of `PATCH /api/banners/{id}/order`. The admin UI sends the order
/// either as a number or as a numeric string.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderChange {
    pub display_order: serde_json::Value,
}

impl OrderChange {
    /// The requested position.
    ///
    /// # Errors
    ///
    /// Returns a message when the value is not an integer.
    pub fn target(&self) -> Result<i32, String> {
        let parsed = match &self.display_order {
            serde_json::Value::Number(n) => n.as_i64().and_then(|n| i32::try_from(n).ok()),
            serde_json::Value::String(s) => s.trim().parse::<i32>().ok(),
            _ => None,
        };
        parsed.ok_or_else(|| "displayOrder must be an integer".to_string())
    }
}

/// Error message for a missing banner.
#[must_use]
pub fn not_found_message(id: BannerId) -> String {
    format!("Banner not found with id: {id}")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn input() -> BannerInput {
        BannerInput {
            title: "Summer Sale".into(),
            subtitle: "Up to 50% off running gear".into(),
            highlight: "50% OFF".into(),
            icon: "sun".into(),
            background_color: "#ffcc00".into(),
            display_order: None,
            active: None,
        }
    }

    #[test]
    fn test_validate_limits() {
        assert!(input().validate().is_ok());

        let mut long_title = input();
        long_title.title = "t".repeat(51);
        assert_eq!(
            long_title.validate(),
            Err("Title must not exceed 50 characters".into())
        );

        let mut long_color = input();
        long_color.background_color = "c".repeat(21);
        assert!(long_color.validate().is_err());
    }

    #[test]
    fn test_order_change_accepts_number_or_string() {
        let number: OrderChange = serde_json::from_str(r#"{"displayOrder": 3}"#).unwrap();
        assert_eq!(number.target(), Ok(3));

        let text: OrderChange = serde_json::from_str(r#"{"displayOrder": " 4 "}"#).unwrap();
        assert_eq!(text.target(), Ok(4));

        let bad: OrderChange = serde_json::from_str(r#"{"displayOrder": "top"}"#).unwrap();
        assert!(bad.target().is_err());
    }

    #[test]
    fn test_not_found_message() {
        assert_eq!(not_found_message(BannerId::new(7)), "Banner not found with id: 7");
    }
}
