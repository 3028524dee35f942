//! Address book handlers. Customers manage their own addresses; staff may
//! manage anyone's.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
};
use tracing::instrument;

use strive_core::{AddressId, UserId};

use crate::db::addresses::AddressRepository;
use crate::error::{AppError, Result};
use crate::middleware::auth::{RequireAuth, ensure_self_or_staff};
use crate::models::address::{Address, AddressInput};
use crate::state::AppState;

const ADDRESS_NOT_FOUND: &str = "Address not found";

/// Build the addresses router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_address))
        .route("/user/{user_id}", get(list_addresses))
        .route("/{id}", put(update_address))
        .route("/{id}/user/{user_id}", delete(delete_address))
}

#[instrument(skip(state, claims))]
async fn list_addresses(
    RequireAuth(claims): RequireAuth,
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> Result<Json<Vec<Address>>> {
    ensure_self_or_staff(&claims, user_id)?;
    let addresses = AddressRepository::new(state.pool())
        .list_for_user(user_id)
        .await?;
    Ok(Json(addresses))
}

#[instrument(skip(state, claims, input), fields(user_id = %input.user_id))]
async fn create_address(
    RequireAuth(claims): RequireAuth,
    State(state): State<AppState>,
    Json(input): Json<AddressInput>,
) -> Result<(StatusCode, Json<Address>)> {
    ensure_self_or_staff(&claims, input.user_id)?;
    input.validate().map_err(AppError::BadRequest)?;

    let address = AddressRepository::new(state.pool()).create(&input).await?;
    Ok((StatusCode::CREATED, Json(address)))
}

#[instrument(skip(state, claims, input), fields(user_id = %input.user_id))]
async fn update_address(
    RequireAuth(claims): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<AddressId>,
    Json(input): Json<AddressInput>,
) -> Result<Json<Address>> {
    ensure_self_or_staff(&claims, input.user_id)?;
    input.validate().map_err(AppError::BadRequest)?;

    let address = AddressRepository::new(state.pool())
        .update(id, &input)
        .await
        .map_err(AppError::not_found_as(ADDRESS_NOT_FOUND))?;
    Ok(Json(address))
}

#[instrument(skip(state, claims))]
async fn delete_address(
    RequireAuth(claims): RequireAuth,
    State(state): State<AppState>,
    Path((id, user_id)): Path<(AddressId, UserId)>,
) -> Result<StatusCode> {
    ensure_self_or_staff(&claims, user_id)?;
    if AddressRepository::new(state.pool())
        .delete(id, user_id)
        .await?
    {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found(ADDRESS_NOT_FOUND))
    }
}
