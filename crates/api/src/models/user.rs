//! User accounts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use strive_core::{Email, Role, UserId};

use super::{check_length, non_blank, require_text};

/// Maximum length of a first or last name.
pub const MAX_NAME_LENGTH: usize = 50;
/// Maximum length of a phone number.
pub const MAX_PHONE_LENGTH: usize = 20;
/// Maximum length of a dialling code such as `+351`.
pub const MAX_COUNTRY_CODE_LENGTH: usize = 10;
/// Maximum stored email length.
pub const MAX_EMAIL_LENGTH: usize = 100;

/// A customer or staff account. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub country_code: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// "First Last", trimmed.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Values for inserting a user. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: Email,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub country_code: Option<String>,
    pub role: Role,
}

/// Partial profile update. `None` keeps the stored value, except for the
/// phone: an absent or blank phone clears both phone and country code.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub country_code: Option<String>,
}

/// Resolved profile changes ready for the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<Email>,
    pub phone: Option<String>,
    pub country_code: Option<String>,
}

impl UserUpdate {
    /// Validate and resolve the update.
    ///
    /// # Errors
    ///
    /// Returns the client-facing message for an invalid email or an overlong
    /// field.
    pub fn into_changes(self) -> Result<ProfileChanges, String> {
        check_length(self.first_name.as_deref(), "First name", MAX_NAME_LENGTH)?;
        check_length(self.last_name.as_deref(), "Last name", MAX_NAME_LENGTH)?;
        check_length(self.phone.as_deref(), "Phone", MAX_PHONE_LENGTH)?;
        check_length(self.country_code.as_deref(), "Country code", MAX_COUNTRY_CODE_LENGTH)?;
        check_length(self.email.as_deref().map(str::trim), "Email", MAX_EMAIL_LENGTH)?;

        let email = self
            .email
            .as_deref()
            .map(Email::parse)
            .transpose()
            .map_err(|e| format!("Invalid email address: {e}"))?;

        let phone = non_blank(self.phone);
        let country_code = if phone.is_some() {
            non_blank(self.country_code)
        } else {
            None
        };

        Ok(ProfileChanges {
            first_name: self.first_name,
            last_name: self.last_name,
            email,
            phone,
            country_code,
        })
    }
}

/// Body for creating an account from the back office.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUser {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub country_code: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
}

impl CreateUser {
    /// Validate the name and phone fields.
    ///
    /// # Errors
    ///
    /// Returns the client-facing message for the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        require_text(&self.first_name, "First name", MAX_NAME_LENGTH)?;
        require_text(&self.last_name, "Last name", MAX_NAME_LENGTH)?;
        check_length(self.phone.as_deref(), "Phone", MAX_PHONE_LENGTH)?;
        check_length(self.country_code.as_deref(), "Country code", MAX_COUNTRY_CODE_LENGTH)
    }
}

/// Staff update body. `None` keeps the stored value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
}

impl EmployeeUpdate {
    /// Check the name fields. The email and role are parsed separately.
    ///
    /// # Errors
    ///
    /// Returns the client-facing message for a blank or overlong name.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(first_name) = &self.first_name {
            require_text(first_name, "First name", MAX_NAME_LENGTH)?;
        }
        if let Some(last_name) = &self.last_name {
            require_text(last_name, "Last name", MAX_NAME_LENGTH)?;
        }
        Ok(())
    }
}

/// Cut a name from an outside profile down to the column width.
#[must_use]
pub fn clip_name(name: Option<&str>) -> String {
    name.unwrap_or_default()
        .trim()
        .chars()
        .take(MAX_NAME_LENGTH)
        .collect()
}

/// Response to login, registration and Google sign-in.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user_id: UserId,
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub country_code: Option<String>,
    pub role: Role,
    pub token: String,
}

impl AuthResponse {
    #[must_use]
    pub fn new(user: User, token: String) -> Self {
        Self {
            user_id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            phone: user.phone,
            country_code: user.country_code,
            role: user.role,
            token,
        }
    }
}
