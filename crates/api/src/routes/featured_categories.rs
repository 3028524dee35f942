//! Featured category handlers.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, put},
};
use tracing::instrument;

use strive_core::FeaturedCategoryId;
use strive_core::ordering::Direction;

use crate::db::categories::CategoryRepository;
use crate::db::featured_categories::FeaturedCategoryRepository;
use crate::error::{AppError, Result};
use crate::middleware::auth::RequireStaff;
use crate::models::featured_category::{
    AddFeaturedCategory, DirectionChange, FeaturedCategoryView,
};
use crate::state::AppState;

const SLOT_NOT_FOUND: &str = "Featured category not found";

/// Build the featured categories router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_featured).post(add_featured))
        .route("/{id}", delete(remove_featured))
        .route("/{id}/order", put(step_featured))
}

#[instrument(skip(state))]
async fn list_featured(State(state): State<AppState>) -> Result<Json<Vec<FeaturedCategoryView>>> {
    Ok(Json(load_views(&state).await?))
}

#[instrument(skip(state))]
async fn add_featured(
    RequireStaff(_): RequireStaff,
    State(state): State<AppState>,
    Json(body): Json<AddFeaturedCategory>,
) -> Result<(StatusCode, Json<FeaturedCategoryView>)> {
    if !CategoryRepository::new(state.pool())
        .exists(body.category_id)
        .await?
    {
        return Err(AppError::not_found("Category not found"));
    }

    let slot = FeaturedCategoryRepository::new(state.pool())
        .add(body.category_id)
        .await?;
    tracing::info!(category_id = %slot.category_id, order = slot.display_order, "Category featured");

    let view = load_views(&state)
        .await?
        .into_iter()
        .find(|view| view.id == slot.id)
        .ok_or_else(|| AppError::not_found(SLOT_NOT_FOUND))?;
    Ok((StatusCode::CREATED, Json(view)))
}

#[instrument(skip(state))]
async fn remove_featured(
    RequireStaff(_): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<FeaturedCategoryId>,
) -> Result<StatusCode> {
    FeaturedCategoryRepository::new(state.pool())
        .remove(id)
        .await
        .map_err(AppError::not_found_as(SLOT_NOT_FOUND))?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, change))]
async fn step_featured(
    RequireStaff(_): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<FeaturedCategoryId>,
    Json(change): Json<DirectionChange>,
) -> Result<StatusCode> {
    let direction: Direction = change.direction.parse().map_err(AppError::BadRequest)?;
    FeaturedCategoryRepository::new(state.pool())
        .step(id, direction)
        .await
        .map_err(AppError::not_found_as(SLOT_NOT_FOUND))?;
    Ok(StatusCode::NO_CONTENT)
}

async fn load_views(state: &AppState) -> Result<Vec<FeaturedCategoryView>> {
    let slots = FeaturedCategoryRepository::new(state.pool()).list().await?;
    let categories = CategoryRepository::new(state.pool()).list_all().await?;
    Ok(FeaturedCategoryView::join(&slots, &categories))
}
