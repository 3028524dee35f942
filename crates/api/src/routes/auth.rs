//! Authentication route handlers.
//!
//! All endpoints are public. Successful login, registration and Google
//! sign-in return the account together with a bearer token.

use axum::{Json, Router, extract::State, routing::post};
use serde::Deserialize;
use tracing::{instrument, warn};

use super::MessageResponse;
use crate::error::{AppError, Result};
use crate::models::user::{AuthResponse, CreateUser, User};
use crate::services::auth::{AuthService, GoogleProfile, RESET_TOKEN_TTL_MINUTES};
use crate::state::AppState;

const RESET_REQUESTED: &str =
    "If the email exists in our system, you will receive a password reset link shortly.";
const RESET_DONE: &str =
    "Password has been successfully reset. You can now login with your new password.";

/// Build the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/register", post(register))
        .route("/google-login", post(google_login))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password", post(reset_password))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Registration body. Any role in it is ignored; new accounts are customers.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub country_code: Option<String>,
}

impl From<RegisterRequest> for CreateUser {
    fn from(req: RegisterRequest) -> Self {
        Self {
            email: req.email,
            password: req.password,
            first_name: req.first_name,
            last_name: req.last_name,
            phone: req.phone,
            country_code: req.country_code,
            role: None,
        }
    }
}

/// Profile forwarded by the storefront after Google authentication.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleLoginRequest {
    pub token_id: Option<String>,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

#[instrument(skip(state, req))]
async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    let auth = AuthService::new(state.pool(), state.tokens());
    let response = auth.login(&req.email, &req.password).await?;
    tracing::info!(user_id = %response.user_id, "User logged in");
    Ok(Json(response))
}

#[instrument(skip(state, req))]
async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>> {
    let auth = AuthService::new(state.pool(), state.tokens());
    let (user, response) = auth.register(&CreateUser::from(req)).await?;

    send_welcome(&state, &user).await;
    Ok(Json(response))
}

#[instrument(skip(state, req))]
async fn google_login(
    State(state): State<AppState>,
    Json(req): Json<GoogleLoginRequest>,
) -> Result<Json<AuthResponse>> {
    let profile = GoogleProfile {
        email: req.email,
        first_name: req.first_name,
        last_name: req.last_name,
    };

    let auth = AuthService::new(state.pool(), state.tokens());
    let sign_in = auth.google_login(&profile).await?;

    if sign_in.created {
        send_welcome(&state, &sign_in.user).await;
    }
    Ok(Json(sign_in.response))
}

#[instrument(skip(state, req))]
async fn forgot_password(
    State(state): State<AppState>,
    Json(req): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>> {
    let auth = AuthService::new(state.pool(), state.tokens());

    if let Some((user, reset)) = auth.request_password_reset(&req.email).await? {
        state
            .mailer()
            .send_password_reset(
                user.email.as_str(),
                &user.first_name,
                &reset.token,
                RESET_TOKEN_TTL_MINUTES,
            )
            .await
            .map_err(|e| {
                tracing::error!(user_id = %user.id, error = %e, "Failed to send password reset email");
                AppError::from(e)
            })?;
    }

    Ok(Json(MessageResponse::new(RESET_REQUESTED)))
}

#[instrument(skip(state, req))]
async fn reset_password(
    State(state): State<AppState>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>> {
    let auth = AuthService::new(state.pool(), state.tokens());
    auth.reset_password(&req.token, &req.new_password).await?;
    Ok(Json(MessageResponse::new(RESET_DONE)))
}

async fn send_welcome(state: &AppState, user: &User) {
    if let Err(e) = state
        .mailer()
        .send_welcome(user.email.as_str(), &user.first_name)
        .await
    {
        warn!(user_id = %user.id, error = %e, "Failed to send welcome email");
    }
}
