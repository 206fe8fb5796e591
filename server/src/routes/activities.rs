//! Audit trail route.

use axum::extract::{Query, State};
use axum::response::Json;
use domain::model::Activity;

use super::ApiError;
use super::auth::AuthUser;
use crate::services::activity::{self, ActivityFilter};
use crate::state::AppState;

/// `GET /api/activities` — optional `entity_type`, `entity_id`, `limit`.
pub async fn list_activities(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(filter): Query<ActivityFilter>,
) -> Result<Json<Vec<Activity>>, ApiError> {
    Ok(Json(activity::list_activities(&state, &auth.user, &filter).await?))
}
