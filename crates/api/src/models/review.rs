//! Product reviews.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use strive_core::{ProductId, ReviewId, UserId};

use super::check_length;

/// Name shown for reviews whose author is gone.
pub const ANONYMOUS: &str = "Anonymous";

const MAX_COMMENT_LENGTH: usize = 2000;

/// A review with its author's display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: ReviewId,
    pub product_id: ProductId,
    pub user_id: UserId,
    pub user_name: String,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Display name from the author's names, or [`ANONYMOUS`].
#[must_use]
pub fn display_name(first_name: Option<&str>, last_name: Option<&str>) -> String {
    let name = format!("{} {}", first_name.unwrap_or(""), last_name.unwrap_or(""));
    let name = name.trim();
    if name.is_empty() {
        ANONYMOUS.to_string()
    } else {
        name.to_string()
    }
}

/// Body of `POST /api/reviews`. Replaces the user's earlier review of the
/// same product if there is one.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewInput {
    pub product_id: ProductId,
    pub user_id: UserId,
    pub rating: i32,
    pub comment: Option<String>,
}

impl ReviewInput {
    /// # Errors
    ///
    /// Returns a message when the rating is outside 1 to 5 or the comment is
    /// too long.
    pub fn validate(&self) -> Result<(), String> {
        if !(1..=5).contains(&self.rating) {
            return Err("Rating must be between 1 and 5".to_string());
        }
        check_length(self.comment.as_deref(), "Comment", MAX_COMMENT_LENGTH)
    }
}
