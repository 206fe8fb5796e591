//! Administrator routes: health and maintenance.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;

use super::auth::AuthUser;
use super::{ApiError, ApiJson};
use crate::services::admin::{self, AdminError, HealthReport, MaintenanceReport, MaintenanceRequest};
use crate::state::AppState;

pub(crate) fn admin_error_to_status(err: &AdminError) -> StatusCode {
    match err {
        AdminError::Denied(_) => StatusCode::FORBIDDEN,
        AdminError::Quote(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<AdminError> for ApiError {
    fn from(err: AdminError) -> Self {
        Self::from_service(admin_error_to_status(&err), &err)
    }
}

/// `GET /api/admin/health` — uptime, sessions and record counts.
pub async fn health(State(state): State<AppState>, auth: AuthUser) -> Result<Json<HealthReport>, ApiError> {
    Ok(Json(admin::health(&state, &auth.user).await?))
}

/// `POST /api/admin/maintenance` — `{"action": "expire_stale_quotes" | "recalculate_totals" | "purge_sessions"}`.
pub async fn maintenance(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(body): ApiJson<MaintenanceRequest>,
) -> Result<Json<MaintenanceReport>, ApiError> {
    Ok(Json(admin::run_maintenance(&state, &auth.user, body.action).await?))
}
