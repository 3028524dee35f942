//! Domain models for the API.
//!
//! Each submodule holds the validated domain types for one resource, the
//! JSON views returned to clients, and the request bodies accepted from them.
//! Repositories convert database rows into these types; routes serialize them.

pub mod address;
pub mod banner;
pub mod category;
pub mod featured_category;
pub mod finance;
pub mod notification_preferences;
pub mod order;
pub mod product;
pub mod review;
pub mod user;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Binary image stored in the database next to its MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    pub data: Vec<u8>,
    pub content_type: Option<String>,
}

impl StoredImage {
    /// Base64 encoding used in JSON responses and inline email images.
    #[must_use]
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.data)
    }

    /// `data:` URI for embedding in HTML.
    #[must_use]
    pub fn data_uri(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.content_type.as_deref().unwrap_or("application/octet-stream"),
            self.to_base64()
        )
    }
}

/// Check a required text field: present, not blank, at most `max` characters.
///
/// # Errors
///
/// Returns the client-facing message for the first rule that fails.
pub fn require_text(value: &str, label: &str, max: usize) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{label} is required"));
    }
    check_length(Some(value), label, max)
}

/// Check an optional text field is at most `max` characters.
///
/// # Errors
///
/// Returns the client-facing message when the value is too long.
pub fn check_length(value: Option<&str>, label: &str, max: usize) -> Result<(), String> {
    match value {
        Some(v) if v.chars().count() > max => {
            Err(format!("{label} must not exceed {max} characters"))
        }
        _ => Ok(()),
    }
}

/// Trim a value and treat blank as absent.
#[must_use]
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_text() {
        assert_eq!(require_text("  ", "City", 25), Err("City is required".into()));
        assert_eq!(
            require_text(&"x".repeat(26), "City", 25),
            Err("City must not exceed 25 characters".into())
        );
        assert!(require_text("Lisbon", "City", 25).is_ok());
    }

    #[test]
    fn test_length_counts_characters() {
        assert!(check_length(Some("ÅÅÅ"), "Icon", 3).is_ok());
        assert!(check_length(None, "Icon", 0).is_ok());
    }

    #[test]
    fn test_data_uri() {
        let image = StoredImage {
            data: vec![1, 2, 3],
            content_type: Some("image/png".into()),
        };
        assert_eq!(image.to_base64(), "AQID");
        assert_eq!(image.data_uri(), "data:image/png;base64,AQID");
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some("  ".into())), None);
        assert_eq!(non_blank(Some(" +351 ".into())), Some("+351".into()));
    }
}
