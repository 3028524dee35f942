//! Order handlers.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, patch, post},
};
use tracing::instrument;

use strive_core::{OrderId, OrderStatus, UserId};

use super::MessageResponse;
use crate::db::orders::OrderRepository;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::auth::{RequireAuth, RequireStaff, ensure_self_or_staff};
use crate::models::order::{CreateOrder, Order, StatusChange};
use crate::services::orders::OrderService;
use crate::state::AppState;

const ORDER_NOT_FOUND: &str = "Order not found";

/// Build the orders router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders).post(create_order))
        .route("/user/{user_id}", get(list_user_orders))
        .route("/{order_id}", get(get_order))
        .route("/{order_id}/status", patch(update_status))
        .route("/{order_id}/resend-confirmation", post(resend_confirmation))
}

#[instrument(skip(state, claims, input), fields(user_id = %input.user_id))]
async fn create_order(
    RequireAuth(claims): RequireAuth,
    State(state): State<AppState>,
    Json(input): Json<CreateOrder>,
) -> Result<Json<Order>> {
    if claims.sub != input.user_id {
        return Err(AppError::Forbidden(
            "Orders can only be placed for your own account".to_string(),
        ));
    }

    let order = OrderService::new(state.pool(), state.mailer())
        .place(input)
        .await?;

    add_breadcrumb(
        "orders",
        "Order placed",
        Some(&[("order_id", &order.id.to_string())]),
    );
    Ok(Json(order))
}

#[instrument(skip(state))]
async fn list_orders(
    RequireStaff(_): RequireStaff,
    State(state): State<AppState>,
) -> Result<Json<Vec<Order>>> {
    Ok(Json(OrderRepository::new(state.pool()).list_all().await?))
}

#[instrument(skip(state, claims))]
async fn list_user_orders(
    RequireAuth(claims): RequireAuth,
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> Result<Json<Vec<Order>>> {
    ensure_self_or_staff(&claims, user_id)?;
    let orders = OrderRepository::new(state.pool())
        .list_for_user(user_id)
        .await?;
    Ok(Json(orders))
}

#[instrument(skip(state, claims))]
async fn get_order(
    RequireAuth(claims): RequireAuth,
    State(state): State<AppState>,
    Path(order_id): Path<OrderId>,
) -> Result<Json<Order>> {
    let order = load_order(&state, order_id).await?;
    ensure_self_or_staff(&claims, order.user_id)?;
    Ok(Json(order))
}

#[instrument(skip(state, change))]
async fn update_status(
    RequireStaff(_): RequireStaff,
    State(state): State<AppState>,
    Path(order_id): Path<OrderId>,
    Json(change): Json<StatusChange>,
) -> Result<Json<Order>> {
    let status: OrderStatus = change
        .status
        .parse()
        .map_err(|_| AppError::bad_request(format!("Invalid order status: {}", change.status)))?;

    let order = OrderService::new(state.pool(), state.mailer())
        .update_status(order_id, status)
        .await?;
    Ok(Json(order))
}

#[instrument(skip(state, claims))]
async fn resend_confirmation(
    RequireAuth(claims): RequireAuth,
    State(state): State<AppState>,
    Path(order_id): Path<OrderId>,
) -> Result<Json<MessageResponse>> {
    let order = load_order(&state, order_id).await?;
    ensure_self_or_staff(&claims, order.user_id)?;

    OrderService::new(state.pool(), state.mailer())
        .resend_confirmation(&order)
        .await
        .map_err(|e| match e {
            AppError::Email(_) => e,
            other => {
                tracing::error!(order_id = %order_id, error = %other, "Resending confirmation failed");
                AppError::Internal(other.to_string())
            }
        })?;

    Ok(Json(MessageResponse::new(
        "Confirmation email sent successfully",
    )))
}

async fn load_order(state: &AppState, order_id: OrderId) -> Result<Order> {
    OrderRepository::new(state.pool())
        .get_by_id(order_id)
        .await?
        .ok_or_else(|| AppError::not_found(ORDER_NOT_FOUND))
}
