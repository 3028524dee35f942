//! Per-user notification settings.

use serde::{Deserialize, Serialize};

use strive_core::{PreferencesId, UserId};

/// Stored notification flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPreferences {
    pub id: PreferencesId,
    pub user_id: UserId,
    pub email_notifications: bool,
    pub order_updates: bool,
    pub promotions: bool,
    pub newsletter: bool,
}

/// The four flags without identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreferenceFlags {
    pub email_notifications: bool,
    pub order_updates: bool,
    pub promotions: bool,
    pub newsletter: bool,
}

impl Default for PreferenceFlags {
    /// Everything on except promotions.
    fn default() -> Self {
        Self {
            email_notifications: true,
            order_updates: true,
            promotions: false,
            newsletter: true,
        }
    }
}

impl From<&NotificationPreferences> for PreferenceFlags {
    fn from(prefs: &NotificationPreferences) -> Self {
        Self {
            email_notifications: prefs.email_notifications,
            order_updates: prefs.order_updates,
            promotions: prefs.promotions,
            newsletter: prefs.newsletter,
        }
    }
}

/// Update body. Absent flags keep their stored value.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesUpdate {
    pub email_notifications: Option<bool>,
    pub order_updates: Option<bool>,
    pub promotions: Option<bool>,
    pub newsletter: Option<bool>,
}

impl PreferencesUpdate {
    /// Apply the update on top of `current`.
    #[must_use]
    pub fn apply(self, current: PreferenceFlags) -> PreferenceFlags {
        PreferenceFlags {
            email_notifications: self
                .email_notifications
                .unwrap_or(current.email_notifications),
            order_updates: self.order_updates.unwrap_or(current.order_updates),
            promotions: self.promotions.unwrap_or(current.promotions),
            newsletter: self.newsletter.unwrap_or(current.newsletter),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let flags = PreferenceFlags::default();
        assert!(flags.email_notifications);
        assert!(flags.order_updates);
        assert!(!flags.promotions);
        assert!(flags.newsletter);
    }

    #[test]
    fn test_partial_update_keeps_other_flags() {
        let update = PreferencesUpdate {
            promotions: Some(true),
            newsletter: Some(false),
            ..PreferencesUpdate::default()
        };
        let flags = update.apply(PreferenceFlags::default());
        assert!(flags.email_notifications);
        assert!(flags.promotions);
        assert!(!flags.newsletter);
    }
}
