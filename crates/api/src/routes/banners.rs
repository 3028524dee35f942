//! Promotional banner handlers.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch},
};
use tracing::instrument;

use strive_core::BannerId;

use crate::db::banners::BannerRepository;
use crate::error::{AppError, Result};
use crate::middleware::auth::RequireStaff;
use crate::models::banner::{ActiveChange, Banner, BannerInput, OrderChange, not_found_message};
use crate::state::AppState;

/// Build the banners router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_banners).post(create_banner))
        .route("/active", get(list_active_banners))
        .route(
            "/{id}",
            get(get_banner).put(update_banner).delete(delete_banner),
        )
        .route("/{id}/active", patch(set_active))
        .route("/{id}/order", patch(move_banner))
}

#[instrument(skip(state))]
async fn list_banners(State(state): State<AppState>) -> Result<Json<Vec<Banner>>> {
    Ok(Json(BannerRepository::new(state.pool()).list_all().await?))
}

#[instrument(skip(state))]
async fn list_active_banners(State(state): State<AppState>) -> Result<Json<Vec<Banner>>> {
    Ok(Json(BannerRepository::new(state.pool()).list_active().await?))
}

#[instrument(skip(state))]
async fn get_banner(
    State(state): State<AppState>,
    Path(id): Path<BannerId>,
) -> Result<Json<Banner>> {
    BannerRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(not_found_message(id)))
}

#[instrument(skip(state, input))]
async fn create_banner(
    RequireStaff(_): RequireStaff,
    State(state): State<AppState>,
    Json(input): Json<BannerInput>,
) -> Result<(StatusCode, Json<Banner>)> {
    input.validate().map_err(AppError::BadRequest)?;
    let banner = BannerRepository::new(state.pool()).create(&input).await?;
    tracing::info!(banner_id = %banner.id, order = banner.display_order, "Banner created");
    Ok((StatusCode::CREATED, Json(banner)))
}

#[instrument(skip(state, input))]
async fn update_banner(
    RequireStaff(_): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<BannerId>,
    Json(input): Json<BannerInput>,
) -> Result<Json<Banner>> {
    input.validate().map_err(AppError::BadRequest)?;
    let banner = BannerRepository::new(state.pool())
        .update(id, &input)
        .await
        .map_err(AppError::not_found_as(&not_found_message(id)))?;
    Ok(Json(banner))
}

#[instrument(skip(state))]
async fn delete_banner(
    RequireStaff(_): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<BannerId>,
) -> Result<StatusCode> {
    if BannerRepository::new(state.pool()).delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(not_found_message(id)))
    }
}

#[instrument(skip(state))]
async fn set_active(
    RequireStaff(_): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<BannerId>,
    Json(change): Json<ActiveChange>,
) -> Result<Json<Banner>> {
    let banner = BannerRepository::new(state.pool())
        .set_active(id, change.active)
        .await
        .map_err(AppError::not_found_as(&not_found_message(id)))?;
    Ok(Json(banner))
}

/// Move a banner to an explicit position. The banner holding that position
/// takes the moved banner's old one.
#[instrument(skip(state))]
async fn move_banner(
    RequireStaff(_): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<BannerId>,
    Json(change): Json<OrderChange>,
) -> Result<Json<Banner>> {
    let target = change.target().map_err(AppError::BadRequest)?;
    let banner = BannerRepository::new(state.pool())
        .move_to(id, target)
        .await
        .map_err(AppError::not_found_as(&not_found_message(id)))?;
    Ok(Json(banner))
}
