//! Review handlers. Reading is public; writing needs the author's token.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use tracing::instrument;

use strive_core::{ProductId, UserId};

use crate::db::products::ProductRepository;
use crate::db::reviews::ReviewRepository;
use crate::error::{AppError, Result};
use crate::middleware::auth::{RequireAuth, ensure_self_or_staff};
use crate::models::review::{Review, ReviewInput};
use crate::state::AppState;

/// Build the reviews router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(submit_review))
        .route("/product/{product_id}", get(list_product_reviews))
        .route("/product/{product_id}/rating", get(product_rating))
        .route("/user/{user_id}", get(list_user_reviews))
        .route(
            "/user/{user_id}/product/{product_id}",
            get(get_user_product_review),
        )
}

#[instrument(skip(state))]
async fn list_product_reviews(
    State(state): State<AppState>,
    Path(product_id): Path<ProductId>,
) -> Result<Json<Vec<Review>>> {
    let reviews = ReviewRepository::new(state.pool())
        .list_for_product(product_id)
        .await?;
    Ok(Json(reviews))
}

/// Average rating, `null` for a product nobody reviewed.
#[instrument(skip(state))]
async fn product_rating(
    State(state): State<AppState>,
    Path(product_id): Path<ProductId>,
) -> Result<Json<Option<f64>>> {
    let average = ReviewRepository::new(state.pool())
        .average_rating(product_id)
        .await?;
    Ok(Json(average))
}

#[instrument(skip(state, claims, input), fields(product_id = %input.product_id))]
async fn submit_review(
    RequireAuth(claims): RequireAuth,
    State(state): State<AppState>,
    Json(input): Json<ReviewInput>,
) -> Result<Json<Review>> {
    if claims.sub != input.user_id {
        return Err(AppError::Forbidden(
            "Reviews can only be written for your own account".to_string(),
        ));
    }
    input.validate().map_err(AppError::BadRequest)?;

    if !ProductRepository::new(state.pool())
        .exists(input.product_id)
        .await?
    {
        return Err(AppError::not_found("Product not found"));
    }

    let review = ReviewRepository::new(state.pool()).upsert(&input).await?;
    tracing::info!(review_id = %review.id, rating = review.rating, "Review saved");
    Ok(Json(review))
}

#[instrument(skip(state, claims))]
async fn list_user_reviews(
    RequireAuth(claims): RequireAuth,
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> Result<Json<Vec<Review>>> {
    ensure_self_or_staff(&claims, user_id)?;
    let reviews = ReviewRepository::new(state.pool())
        .list_for_user(user_id)
        .await?;
    Ok(Json(reviews))
}

#[instrument(skip(state, claims))]
async fn get_user_product_review(
    RequireAuth(claims): RequireAuth,
    State(state): State<AppState>,
    Path((user_id, product_id)): Path<(UserId, ProductId)>,
) -> Result<Json<Review>> {
    ensure_self_or_staff(&claims, user_id)?;
    ReviewRepository::new(state.pool())
        .get_for_user_product(user_id, product_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Review not found"))
}
