//! Product catalog handlers.
//!
//! Reads are public. Writes, image management and the featured list need a
//! staff token.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, put},
};
use tracing::instrument;

use strive_core::search::{Page, search};
use strive_core::{ProductId, ProductImageId, ProductStatus};

use super::uploads::Submission;
use crate::db::categories::CategoryRepository;
use crate::db::products::ProductRepository;
use crate::error::{AppError, Result};
use crate::middleware::auth::RequireStaff;
use crate::models::product::{CatalogQuery, FeaturedQuery, ProductInput, ProductView, StatusQuery};
use crate::state::AppState;

const PRODUCT_NOT_FOUND: &str = "Product not found";

/// Build the products router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/paginated", get(search_products))
        .route("/featured", get(list_featured))
        .route("/featured/reorder", put(reorder_featured))
        .route(
            "/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/{id}/with-images", put(update_product_with_images))
        .route("/{id}/status", put(set_status))
        .route("/{id}/featured", put(toggle_featured))
        .route("/{id}/images/reorder", put(reorder_images))
        .route("/{id}/images/{image_id}", delete(delete_image))
}

#[instrument(skip(state))]
async fn list_products(State(state): State<AppState>) -> Result<Json<Vec<ProductView>>> {
    Ok(Json(ProductRepository::new(state.pool()).list_views().await?))
}

#[instrument(skip(state))]
async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<ProductView>> {
    load_view(&state, id).await.map(Json)
}

/// Filter, sort and page the whole catalog in memory.
#[instrument(skip(state))]
async fn search_products(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> Result<Json<Page<ProductView>>> {
    let (filter, sort, request) = query.into_search().map_err(AppError::BadRequest)?;
    let products = ProductRepository::new(state.pool()).list_views().await?;
    Ok(Json(search(products, &filter, sort, request)))
}

#[instrument(skip(state))]
async fn list_featured(State(state): State<AppState>) -> Result<Json<Vec<ProductView>>> {
    Ok(Json(
        ProductRepository::new(state.pool()).featured_views().await?,
    ))
}

#[instrument(skip(state, submission))]
async fn create_product(
    RequireStaff(_): RequireStaff,
    State(state): State<AppState>,
    submission: Submission<ProductInput>,
) -> Result<(StatusCode, Json<ProductView>)> {
    let Submission {
        body: input,
        images,
    } = submission;
    check_input(&state, &input).await?;

    let id = ProductRepository::new(state.pool())
        .create(&input, &images)
        .await?;
    tracing::info!(product_id = %id, images = images.len(), "Product created");

    Ok((StatusCode::CREATED, Json(load_view(&state, id).await?)))
}

#[instrument(skip(state, input))]
async fn update_product(
    RequireStaff(_): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Json(input): Json<ProductInput>,
) -> Result<Json<ProductView>> {
    check_input(&state, &input).await?;
    ProductRepository::new(state.pool())
        .update(id, &input, &[])
        .await
        .map_err(AppError::not_found_as(PRODUCT_NOT_FOUND))?;
    load_view(&state, id).await.map(Json)
}

/// New images are appended after the existing ones.
#[instrument(skip(state, submission))]
async fn update_product_with_images(
    RequireStaff(_): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    submission: Submission<ProductInput>,
) -> Result<Json<ProductView>> {
    check_input(&state, &submission.body).await?;
    ProductRepository::new(state.pool())
        .update(id, &submission.body, &submission.images)
        .await
        .map_err(AppError::not_found_as(PRODUCT_NOT_FOUND))?;
    load_view(&state, id).await.map(Json)
}

#[instrument(skip(state))]
async fn delete_product(
    RequireStaff(_): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<StatusCode> {
    if ProductRepository::new(state.pool()).delete(id).await? {
        tracing::info!(product_id = %id, "Product deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found(PRODUCT_NOT_FOUND))
    }
}

#[instrument(skip(state))]
async fn delete_image(
    RequireStaff(_): RequireStaff,
    State(state): State<AppState>,
    Path((id, image_id)): Path<(ProductId, ProductImageId)>,
) -> Result<StatusCode> {
    if ProductRepository::new(state.pool())
        .delete_image(id, image_id)
        .await?
    {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("Image not found"))
    }
}

#[instrument(skip(state))]
async fn set_status(
    RequireStaff(_): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<ProductView>> {
    let status: ProductStatus = query
        .status
        .parse()
        .map_err(|e: strive_core::UnknownVariant| AppError::bad_request(e.to_string()))?;
    ProductRepository::new(state.pool())
        .set_status(id, status)
        .await
        .map_err(AppError::not_found_as(PRODUCT_NOT_FOUND))?;
    load_view(&state, id).await.map(Json)
}

#[instrument(skip(state, image_ids))]
async fn reorder_images(
    RequireStaff(_): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Json(image_ids): Json<Vec<ProductImageId>>,
) -> Result<Json<ProductView>> {
    let repo = ProductRepository::new(state.pool());
    if !repo.exists(id).await? {
        return Err(AppError::not_found(PRODUCT_NOT_FOUND));
    }
    repo.reorder_images(id, &image_ids).await?;
    load_view(&state, id).await.map(Json)
}

/// Remove the product from the featured list, or add it at the given
/// position (end of the list when absent).
#[instrument(skip(state))]
async fn toggle_featured(
    RequireStaff(_): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Query(query): Query<FeaturedQuery>,
) -> Result<Json<ProductView>> {
    let repo = ProductRepository::new(state.pool());
    if !repo.exists(id).await? {
        return Err(AppError::not_found(PRODUCT_NOT_FOUND));
    }
    let featured = repo.toggle_featured(id, query.display_order).await?;
    tracing::info!(product_id = %id, featured, "Featured flag toggled");
    load_view(&state, id).await.map(Json)
}

#[instrument(skip(state, product_ids))]
async fn reorder_featured(
    RequireStaff(_): RequireStaff,
    State(state): State<AppState>,
    Json(product_ids): Json<Vec<ProductId>>,
) -> Result<Json<Vec<ProductView>>> {
    let repo = ProductRepository::new(state.pool());
    repo.reorder_featured(&product_ids).await?;
    Ok(Json(repo.featured_views().await?))
}

async fn check_input(state: &AppState, input: &ProductInput) -> Result<()> {
    input.validate().map_err(AppError::BadRequest)?;
    if let Some(category_id) = input.category_id
        && !CategoryRepository::new(state.pool())
            .exists(category_id)
            .await?
    {
        return Err(AppError::not_found("Category not found"));
    }
    Ok(())
}

async fn load_view(state: &AppState, id: ProductId) -> Result<ProductView> {
    ProductRepository::new(state.pool())
        .get_view(id)
        .await?
        .ok_or_else(|| AppError::not_found(PRODUCT_NOT_FOUND))
}
