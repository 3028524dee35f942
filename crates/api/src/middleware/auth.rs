//! Authentication extractors.
//!
//! Requests authenticate with `Authorization: Bearer <token>` where the token
//! was issued at login or registration. Handlers pick an extractor for the
//! minimum role they need and call [`ensure_self_or_staff`] for resources that
//! belong to one user.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use strive_core::{Role, UserId};

use crate::error::{AppError, set_sentry_user};
use crate::services::auth::Claims;
use crate::state::AppState;

const NOT_AUTHENTICATED: &str = "Authentication required";
const INVALID_TOKEN: &str = "Invalid or expired token";
const NOT_ALLOWED: &str = "You do not have permission to access this resource";

/// Extractor that requires any authenticated user.
///
/// # Example
///
/// ```rust,ignore
/// async fn my_orders(RequireAuth(claims): RequireAuth) -> impl IntoResponse {
///     format!("Hello, {}!", claims.email)
/// }
/// ```
pub struct RequireAuth(pub Claims);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| AppError::Unauthorized(NOT_AUTHENTICATED.to_string()))?;

        let claims = state.tokens().verify(token).map_err(|e| {
            tracing::debug!(error = %e, "Rejected bearer token");
            AppError::Unauthorized(INVALID_TOKEN.to_string())
        })?;

        set_sentry_user(&claims.sub, Some(&claims.email));
        Ok(Self(claims))
    }
}

/// Extractor that requires an ADMIN or MANAGER.
pub struct RequireStaff(pub Claims);

impl FromRequestParts<AppState> for RequireStaff {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireAuth(claims) = RequireAuth::from_request_parts(parts, state).await?;
        if !claims.is_staff() {
            return Err(AppError::Forbidden(NOT_ALLOWED.to_string()));
        }
        Ok(Self(claims))
    }
}

/// Extractor that requires an ADMIN.
pub struct RequireAdmin(pub Claims);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireAuth(claims) = RequireAuth::from_request_parts(parts, state).await?;
        if claims.role != Role::Admin {
            return Err(AppError::Forbidden(NOT_ALLOWED.to_string()));
        }
        Ok(Self(claims))
    }
}

/// Allow the owner of `user_id` and staff.
///
/// # Errors
///
/// Returns `AppError::Forbidden` for any other caller.
pub fn ensure_self_or_staff(claims: &Claims, user_id: UserId) -> Result<(), AppError> {
    if claims.sub == user_id || claims.is_staff() {
        Ok(())
    } else {
        Err(AppError::Forbidden(NOT_ALLOWED.to_string()))
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
