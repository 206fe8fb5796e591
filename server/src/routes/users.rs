//! User administration routes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use domain::model::User;
use domain::permissions::Role;
use serde::Deserialize;
use uuid::Uuid;

use super::auth::AuthUser;
use super::{ApiError, ApiJson};
use crate::services::users::{self, NewUser, UserError, UserPermissions, UserUpdate};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct RoleBody {
    pub role: Role,
}

#[derive(Deserialize)]
pub struct StatusBody {
    pub is_active: bool,
}

pub(crate) fn user_error_to_status(err: &UserError) -> StatusCode {
    match err {
        UserError::NotFound(_) => StatusCode::NOT_FOUND,
        UserError::Conflict(_) => StatusCode::CONFLICT,
        UserError::Invalid(_) => StatusCode::BAD_REQUEST,
        UserError::Denied(_) => StatusCode::FORBIDDEN,
        UserError::Hash(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        Self::from_service(user_error_to_status(&err), &err)
    }
}

/// `GET /api/users` — list all users.
pub async fn list_users(State(state): State<AppState>, auth: AuthUser) -> Result<Json<Vec<User>>, ApiError> {
    Ok(Json(users::list_users(&state, &auth.user).await?))
}

/// `GET /api/users/sales-reps` — active users who can carry quotes.
pub async fn list_sales_reps(State(state): State<AppState>, auth: AuthUser) -> Result<Json<Vec<User>>, ApiError> {
    Ok(Json(users::list_sales_reps(&state, &auth.user).await?))
}

/// `GET /api/users/:id`
pub async fn get_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<User>, ApiError> {
    Ok(Json(users::get_user(&state, &auth.user, user_id).await?))
}

/// `POST /api/users` — create a user with an initial password.
pub async fn create_user(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(body): ApiJson<NewUser>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let user = users::create_user(&state, &auth.user, body).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// `PUT /api/users/:id` — profile, password and permission overrides.
pub async fn update_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<Uuid>,
    ApiJson(body): ApiJson<UserUpdate>,
) -> Result<Json<User>, ApiError> {
    Ok(Json(users::update_user(&state, &auth.user, user_id, body).await?))
}

/// `PUT /api/users/:id/role`
pub async fn set_role(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<Uuid>,
    ApiJson(body): ApiJson<RoleBody>,
) -> Result<Json<User>, ApiError> {
    Ok(Json(users::set_role(&state, &auth.user, user_id, body.role).await?))
}

/// `PUT /api/users/:id/status` — activate or deactivate.
pub async fn set_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<Uuid>,
    ApiJson(body): ApiJson<StatusBody>,
) -> Result<Json<User>, ApiError> {
    Ok(Json(users::set_status(&state, &auth.user, user_id, body.is_active).await?))
}

/// `GET /api/users/:id/permissions` — template, overrides and effective set.
pub async fn user_permissions(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserPermissions>, ApiError> {
    Ok(Json(users::user_permissions(&state, &auth.user, user_id).await?))
}

/// `DELETE /api/users/:id`
pub async fn delete_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    users::delete_user(&state, &auth.user, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[path = "users_test.rs"]
mod tests;
