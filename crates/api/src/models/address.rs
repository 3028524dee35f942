//! Saved addresses in a user's address book.

use serde::{Deserialize, Serialize};

use strive_core::{AddressId, UserId};

use super::{check_length, require_text};

const SHORT_FIELD: usize = 25;
const STREET_FIELD: usize = 255;

/// A saved shipping address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: AddressId,
    pub user_id: UserId,
    /// Label such as "Home" or "Work".
    pub name: String,
    pub recipient_name: String,
    pub recipient_phone: String,
    pub street_address: String,
    pub city: String,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: String,
    pub is_default: bool,
}

/// Create/update body for an address.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressInput {
    pub user_id: UserId,
    pub name: String,
    pub recipient_name: String,
    pub recipient_phone: String,
    pub street_address: String,
    pub city: String,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: String,
    #[serde(default)]
    pub is_default: bool,
}

impl AddressInput {
    /// Check required fields and length limits.
    ///
    /// # Errors
    ///
    /// Returns the client-facing message for the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        require_text(&self.name, "Name", SHORT_FIELD)?;
        require_text(&self.recipient_name, "Recipient name", SHORT_FIELD)?;
        require_text(&self.recipient_phone, "Recipient phone", SHORT_FIELD)?;
        require_text(&self.street_address, "Street address", STREET_FIELD)?;
        require_text(&self.city, "City", SHORT_FIELD)?;
        check_length(self.state.as_deref(), "State", SHORT_FIELD)?;
        check_length(self.postal_code.as_deref(), "Postal code", SHORT_FIELD)?;
        require_text(&self.country, "Country", SHORT_FIELD)
    }
}
