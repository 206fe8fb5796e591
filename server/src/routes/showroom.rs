//! Showroom visit routes.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use domain::model::ShowroomVisit;
use uuid::Uuid;

use super::auth::AuthUser;
use super::{ApiError, ApiJson};
use crate::services::showroom::{self, NewVisit, ShowroomError, VisitFilter, VisitUpdate};
use crate::state::AppState;

pub(crate) fn showroom_error_to_status(err: &ShowroomError) -> StatusCode {
    match err {
        ShowroomError::NotFound(_) => StatusCode::NOT_FOUND,
        ShowroomError::Invalid(_) => StatusCode::BAD_REQUEST,
        ShowroomError::Closed(_) => StatusCode::CONFLICT,
        ShowroomError::Denied(_) => StatusCode::FORBIDDEN,
    }
}

impl From<ShowroomError> for ApiError {
    fn from(err: ShowroomError) -> Self {
        Self::from_service(showroom_error_to_status(&err), &err)
    }
}

/// `GET /api/showroom-visits` — optional `status` and `assigned_to`.
pub async fn list_visits(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(filter): Query<VisitFilter>,
) -> Result<Json<Vec<ShowroomVisit>>, ApiError> {
    Ok(Json(showroom::list_visits(&state, &auth.user, &filter).await?))
}

/// `POST /api/showroom-visits`
pub async fn create_visit(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(body): ApiJson<NewVisit>,
) -> Result<(StatusCode, Json<ShowroomVisit>), ApiError> {
    let visit = showroom::create_visit(&state, &auth.user, body).await?;
    Ok((StatusCode::CREATED, Json(visit)))
}

/// `PATCH /api/showroom-visits/:id`
pub async fn update_visit(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(visit_id): Path<Uuid>,
    ApiJson(body): ApiJson<VisitUpdate>,
) -> Result<Json<ShowroomVisit>, ApiError> {
    Ok(Json(showroom::update_visit(&state, &auth.user, visit_id, body).await?))
}

/// `DELETE /api/showroom-visits/:id`
pub async fn delete_visit(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(visit_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    showroom::delete_visit(&state, &auth.user, visit_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
