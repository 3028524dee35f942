//! Notification preference handlers.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use tracing::instrument;

use strive_core::UserId;

use crate::db::preferences::PreferencesRepository;
use crate::error::Result;
use crate::middleware::auth::{RequireAuth, ensure_self_or_staff};
use crate::models::notification_preferences::{
    NotificationPreferences, PreferenceFlags, PreferencesUpdate,
};
use crate::state::AppState;

/// Build the notification preferences router.
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/user/{user_id}",
        get(get_preferences).put(update_preferences),
    )
}

/// Accounts created before preferences existed get the defaults on first read.
#[instrument(skip(state, claims))]
async fn get_preferences(
    RequireAuth(claims): RequireAuth,
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> Result<Json<NotificationPreferences>> {
    ensure_self_or_staff(&claims, user_id)?;
    let prefs = PreferencesRepository::new(state.pool())
        .get_or_create(user_id)
        .await?;
    Ok(Json(prefs))
}

#[instrument(skip(state, claims, update))]
async fn update_preferences(
    RequireAuth(claims): RequireAuth,
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
    Json(update): Json<PreferencesUpdate>,
) -> Result<Json<NotificationPreferences>> {
    ensure_self_or_staff(&claims, user_id)?;
    let repo = PreferencesRepository::new(state.pool());

    let current = repo
        .get(user_id)
        .await?
        .as_ref()
        .map_or_else(PreferenceFlags::default, PreferenceFlags::from);
    let prefs = repo.upsert(user_id, update.apply(current)).await?;

    tracing::info!(user_id = %user_id, "Notification preferences updated");
    Ok(Json(prefs))
}
