//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! # Auth (public)
//! POST /api/auth/login | register | google-login | forgot-password | reset-password
//!
//! # Accounts
//! GET|POST        /api/users              GET|PUT|DELETE /api/users/{id}
//! GET             /api/users/by-email
//! GET|POST        /api/users/employees    GET|PUT|DELETE /api/users/employees/{id}
//! GET             /api/addresses/user/{userId}
//! POST            /api/addresses          PUT /api/addresses/{id}
//! DELETE          /api/addresses/{id}/user/{userId}
//! GET|PUT         /api/notification-preferences/user/{userId}
//!
//! # Catalog
//! GET|POST        /api/categories         PUT|DELETE /api/categories/{id}
//! PUT             /api/categories/{id}/with-image
//! GET|POST        /api/products           GET|PUT|DELETE /api/products/{id}
//! GET             /api/products/paginated | featured
//! PUT             /api/products/{id}/with-images | status | featured
//! PUT             /api/products/featured/reorder
//! PUT             /api/products/{productId}/images/reorder
//! DELETE          /api/products/{productId}/images/{imageId}
//! GET|POST        /api/reviews ...
//!
//! # Merchandising
//! GET|POST        /api/banners            GET|PUT|DELETE /api/banners/{id}
//! GET             /api/banners/active
//! PATCH           /api/banners/{id}/active | order
//! GET|POST        /api/featured-categories
//! DELETE          /api/featured-categories/{id}
//! PUT             /api/featured-categories/{id}/order
//!
//! # Orders and ledger
//! GET|POST        /api/orders             GET /api/orders/{orderId}
//! GET             /api/orders/user/{userId}
//! PATCH           /api/orders/{orderId}/status
//! POST            /api/orders/{orderId}/resend-confirmation
//! GET             /api/finances/overview | metrics | transactions
//! ```

pub mod addresses;
pub mod auth;
pub mod banners;
pub mod categories;
pub mod featured_categories;
pub mod finances;
pub mod notification_preferences;
pub mod orders;
pub mod products;
pub mod reviews;
pub mod uploads;
pub mod users;

use axum::Router;
use serde::Serialize;

use crate::state::AppState;

/// Body of responses that only carry a human-readable outcome.
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Build the complete API router.
pub fn routes() -> Router<AppState> {
    let api = Router::new()
        .nest("/auth", auth::router())
        .nest("/users", users::router())
        .nest("/addresses", addresses::router())
        .nest("/categories", categories::router())
        .nest("/products", products::router())
        .nest("/orders", orders::router())
        .nest("/reviews", reviews::router())
        .nest("/banners", banners::router())
        .nest("/featured-categories", featured_categories::router())
        .nest(
            "/notification-preferences",
            notification_preferences::router(),
        )
        .nest("/finances", finances::router());

    Router::new().nest("/api", api)
}
