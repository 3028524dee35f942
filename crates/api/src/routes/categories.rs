//! Category handlers.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
};
use tracing::instrument;

use strive_core::CategoryId;

use super::uploads::Submission;
use crate::db::categories::CategoryRepository;
use crate::error::{AppError, Result};
use crate::middleware::auth::RequireStaff;
use crate::models::StoredImage;
use crate::models::category::{CategoryInput, CategoryNode, ImageChange, build_tree, is_within};
use crate::state::AppState;

const CATEGORY_NOT_FOUND: &str = "Category not found";
const PARENT_NOT_FOUND: &str = "Parent category not found";

/// Build the categories router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_categories).post(create_category))
        .route("/{id}", put(update_category).delete(delete_category))
        .route("/{id}/with-image", put(update_category_with_image))
}

#[instrument(skip(state))]
async fn list_categories(State(state): State<AppState>) -> Result<Json<Vec<CategoryNode>>> {
    let categories = CategoryRepository::new(state.pool()).list_all().await?;
    Ok(Json(build_tree(&categories)))
}

#[instrument(skip(state, submission))]
async fn create_category(
    RequireStaff(_): RequireStaff,
    State(state): State<AppState>,
    submission: Submission<CategoryInput>,
) -> Result<(StatusCode, Json<CategoryNode>)> {
    let (input, image) = submission.first_image();
    input.validate().map_err(AppError::BadRequest)?;

    let repo = CategoryRepository::new(state.pool());
    if let Some(parent_id) = input.parent_id
        && !repo.exists(parent_id).await?
    {
        return Err(AppError::not_found(PARENT_NOT_FOUND));
    }

    let category = repo
        .create(input.name.trim(), input.parent_id, image.as_ref())
        .await?;
    tracing::info!(category_id = %category.id, "Category created");
    Ok((StatusCode::CREATED, Json(CategoryNode::leaf(&category))))
}

#[instrument(skip(state, input))]
async fn update_category(
    RequireStaff(_): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
    Json(input): Json<CategoryInput>,
) -> Result<Json<CategoryNode>> {
    apply_update(&state, id, input, None).await.map(Json)
}

#[instrument(skip(state, submission))]
async fn update_category_with_image(
    RequireStaff(_): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
    submission: Submission<CategoryInput>,
) -> Result<Json<CategoryNode>> {
    let (input, image) = submission.first_image();
    apply_update(&state, id, input, image).await.map(Json)
}

#[instrument(skip(state))]
async fn delete_category(
    RequireStaff(_): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
) -> Result<StatusCode> {
    if CategoryRepository::new(state.pool()).delete(id).await? {
        tracing::info!(category_id = %id, "Category deleted with its subtree");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found(CATEGORY_NOT_FOUND))
    }
}

/// Re-parenting under the category itself or one of its descendants would
/// detach the subtree from every root, so it is refused.
async fn apply_update(
    state: &AppState,
    id: CategoryId,
    input: CategoryInput,
    upload: Option<StoredImage>,
) -> Result<CategoryNode> {
    input.validate().map_err(AppError::BadRequest)?;

    let repo = CategoryRepository::new(state.pool());
    if let Some(parent_id) = input.parent_id {
        let categories = repo.list_all().await?;
        if !categories.iter().any(|c| c.id == parent_id) {
            return Err(AppError::not_found(PARENT_NOT_FOUND));
        }
        if is_within(&categories, id, parent_id) {
            return Err(AppError::bad_request(
                "A category cannot be moved under itself or its descendants",
            ));
        }
    }

    let change = ImageChange::resolve(input.remove_image, upload);
    let category = repo
        .update(id, input.name.trim(), input.parent_id, &change)
        .await
        .map_err(AppError::not_found_as(CATEGORY_NOT_FOUND))?;
    Ok(CategoryNode::leaf(&category))
}
