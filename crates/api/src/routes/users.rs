//! Account and employee management handlers.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use serde::Deserialize;
use tracing::instrument;

use strive_core::{Email, Role, UserId};

use crate::db::users::UserRepository;
use crate::error::{AppError, Result};
use crate::middleware::auth::{RequireAdmin, RequireAuth, RequireStaff, ensure_self_or_staff};
use crate::models::user::{CreateUser, EmployeeUpdate, User, UserUpdate};
use crate::services::auth::{AuthService, parse_email};
use crate::state::AppState;

const USER_NOT_FOUND: &str = "User not found";
const EMPLOYEE_NOT_FOUND: &str = "Employee not found";
const STAFF_ROLES: [Role; 2] = [Role::Admin, Role::Manager];

/// Build the users router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/by-email", get(get_user_by_email))
        .route("/employees", get(list_employees).post(create_employee))
        .route(
            "/employees/{id}",
            get(get_employee).put(update_employee).delete(delete_employee),
        )
        .route("/{id}", get(get_user).put(update_user).delete(delete_user))
}

#[derive(Debug, Deserialize)]
pub struct EmailQuery {
    pub email: String,
}

// =============================================================================
// Users
// =============================================================================

#[instrument(skip(state))]
async fn list_users(
    RequireStaff(_): RequireStaff,
    State(state): State<AppState>,
) -> Result<Json<Vec<User>>> {
    Ok(Json(UserRepository::new(state.pool()).list_all().await?))
}

#[instrument(skip(state, claims))]
async fn get_user(
    RequireAuth(claims): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<UserId>,
) -> Result<Json<User>> {
    ensure_self_or_staff(&claims, id)?;
    UserRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found(USER_NOT_FOUND))
}

#[instrument(skip(state, query))]
async fn get_user_by_email(
    RequireStaff(_): RequireStaff,
    State(state): State<AppState>,
    Query(query): Query<EmailQuery>,
) -> Result<Json<User>> {
    let email = Email::parse(&query.email).map_err(|_| AppError::not_found(USER_NOT_FOUND))?;
    UserRepository::new(state.pool())
        .get_by_email(&email)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found(USER_NOT_FOUND))
}

#[instrument(skip(state, input))]
async fn create_user(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<CreateUser>,
) -> Result<(StatusCode, Json<User>)> {
    let role = input.role.unwrap_or(Role::Customer);
    let user = AuthService::new(state.pool(), state.tokens())
        .create_account(&input, role)
        .await?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[instrument(skip(state, claims, update))]
async fn update_user(
    RequireAuth(claims): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<UserId>,
    Json(update): Json<UserUpdate>,
) -> Result<Json<User>> {
    ensure_self_or_staff(&claims, id)?;
    let changes = update.into_changes().map_err(AppError::BadRequest)?;

    let user = UserRepository::new(state.pool())
        .update_profile(id, &changes)
        .await
        .map_err(AppError::not_found_as(USER_NOT_FOUND))?;
    Ok(Json(user))
}

#[instrument(skip(state))]
async fn delete_user(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<UserId>,
) -> Result<StatusCode> {
    if UserRepository::new(state.pool()).delete(id).await? {
        tracing::info!(user_id = %id, "User deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found(USER_NOT_FOUND))
    }
}

// =============================================================================
// Employees
// =============================================================================

#[instrument(skip(state))]
async fn list_employees(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<User>>> {
    let users = UserRepository::new(state.pool())
        .list_by_roles(&STAFF_ROLES)
        .await?;
    Ok(Json(users))
}

#[instrument(skip(state))]
async fn get_employee(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<UserId>,
) -> Result<Json<User>> {
    UserRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .filter(|user| user.role.is_staff())
        .map(Json)
        .ok_or_else(|| AppError::not_found(EMPLOYEE_NOT_FOUND))
}

/// New employees are MANAGERs unless the body says otherwise.
#[instrument(skip(state, input))]
async fn create_employee(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<CreateUser>,
) -> Result<(StatusCode, Json<User>)> {
    let role = input.role.unwrap_or(Role::Manager);
    if !role.is_staff() {
        return Err(AppError::bad_request("Employee role must be ADMIN or MANAGER"));
    }
    let user = AuthService::new(state.pool(), state.tokens())
        .create_account(&input, role)
        .await?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[instrument(skip(state, update))]
async fn update_employee(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<UserId>,
    Json(update): Json<EmployeeUpdate>,
) -> Result<Json<User>> {
    update.validate().map_err(AppError::BadRequest)?;
    let email = update.email.as_deref().map(parse_email).transpose()?;
    let role = update
        .role
        .as_deref()
        .map(str::parse::<Role>)
        .transpose()
        .map_err(|e| AppError::bad_request(e.to_string()))?;

    let user = UserRepository::new(state.pool())
        .update_employee(
            id,
            update.first_name.as_deref(),
            update.last_name.as_deref(),
            email.as_ref(),
            role,
        )
        .await
        .map_err(AppError::not_found_as(EMPLOYEE_NOT_FOUND))?;

    tracing::info!(user_id = %id, role = %user.role, "Employee updated");
    Ok(Json(user))
}

#[instrument(skip(state))]
async fn delete_employee(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<UserId>,
) -> Result<StatusCode> {
    if UserRepository::new(state.pool()).delete(id).await? {
        tracing::info!(user_id = %id, "Employee deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found(EMPLOYEE_NOT_FOUND))
    }
}
