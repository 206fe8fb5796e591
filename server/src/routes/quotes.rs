//! Quote routes.
//!
//! Bodies never carry totals; the service reprices every write.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use domain::model::Quote;
use domain::pipeline::{PipelineStage, QuoteStatus};
use serde::Deserialize;
use uuid::Uuid;

use super::auth::AuthUser;
use super::{ApiError, ApiJson};
use crate::services::quotes::{
    self, LineItemInput, NewQuote, PreviewRequest, QuoteError, QuoteFilter, QuotePreview, QuoteUpdate,
};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct StageBody {
    pub stage: PipelineStage,
}

#[derive(Deserialize)]
pub struct StatusBody {
    pub status: QuoteStatus,
}

#[derive(Deserialize)]
pub struct SalesRepBody {
    pub sales_rep_id: Option<Uuid>,
}

#[derive(Default, Deserialize)]
#[serde(default)]
pub struct DecisionBody {
    pub notes: Option<String>,
}

pub(crate) fn quote_error_to_status(err: &QuoteError) -> StatusCode {
    match err {
        QuoteError::NotFound(_) | QuoteError::LineItemNotFound(_) => StatusCode::NOT_FOUND,
        QuoteError::ClientNotFound(_)
        | QuoteError::ProductNotFound(_)
        | QuoteError::SlabNotFound(_)
        | QuoteError::Invalid(_)
        | QuoteError::Pricing(_) => StatusCode::BAD_REQUEST,
        QuoteError::Locked(_) | QuoteError::Transition(_) => StatusCode::CONFLICT,
        QuoteError::Denied(_) => StatusCode::FORBIDDEN,
    }
}

impl From<QuoteError> for ApiError {
    fn from(err: QuoteError) -> Self {
        Self::from_service(quote_error_to_status(&err), &err)
    }
}

/// `GET /api/quotes` — optional `stage`, `status`, `client_id`,
/// `sales_rep_id`, `search`.
pub async fn list_quotes(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(filter): Query<QuoteFilter>,
) -> Result<Json<Vec<Quote>>, ApiError> {
    Ok(Json(quotes::list_quotes(&state, &auth.user, &filter).await?))
}

/// `GET /api/quotes/:id`
pub async fn get_quote(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(quote_id): Path<Uuid>,
) -> Result<Json<Quote>, ApiError> {
    Ok(Json(quotes::get_quote(&state, &auth.user, quote_id).await?))
}

/// `POST /api/quotes`
pub async fn create_quote(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(body): ApiJson<NewQuote>,
) -> Result<(StatusCode, Json<Quote>), ApiError> {
    let quote = quotes::create_quote(&state, &auth.user, body).await?;
    Ok((StatusCode::CREATED, Json(quote)))
}

/// `POST /api/quotes/preview` — price lines without saving.
pub async fn preview_quote(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(body): ApiJson<PreviewRequest>,
) -> Result<Json<QuotePreview>, ApiError> {
    Ok(Json(quotes::preview_quote(&state, &auth.user, &body).await?))
}

/// `PUT /api/quotes/:id`
pub async fn update_quote(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(quote_id): Path<Uuid>,
    ApiJson(body): ApiJson<QuoteUpdate>,
) -> Result<Json<Quote>, ApiError> {
    Ok(Json(quotes::update_quote(&state, &auth.user, quote_id, body).await?))
}

/// `DELETE /api/quotes/:id`
pub async fn delete_quote(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(quote_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    quotes::delete_quote(&state, &auth.user, quote_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/quotes/:id/line-items`
pub async fn add_line_item(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(quote_id): Path<Uuid>,
    ApiJson(body): ApiJson<LineItemInput>,
) -> Result<Json<Quote>, ApiError> {
    Ok(Json(quotes::add_line_item(&state, &auth.user, quote_id, body).await?))
}

/// `DELETE /api/quotes/:id/line-items/:item_id`
pub async fn remove_line_item(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((quote_id, item_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Quote>, ApiError> {
    Ok(Json(quotes::remove_line_item(&state, &auth.user, quote_id, item_id).await?))
}

/// `PATCH /api/quotes/:id/stage`
pub async fn set_stage(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(quote_id): Path<Uuid>,
    ApiJson(body): ApiJson<StageBody>,
) -> Result<Json<Quote>, ApiError> {
    Ok(Json(quotes::set_stage(&state, &auth.user, quote_id, body.stage).await?))
}

/// `PATCH /api/quotes/:id/status`
pub async fn set_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(quote_id): Path<Uuid>,
    ApiJson(body): ApiJson<StatusBody>,
) -> Result<Json<Quote>, ApiError> {
    Ok(Json(quotes::set_status(&state, &auth.user, quote_id, body.status).await?))
}

/// `PATCH /api/quotes/:id/sales-rep` — `null` unassigns.
pub async fn set_sales_rep(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(quote_id): Path<Uuid>,
    ApiJson(body): ApiJson<SalesRepBody>,
) -> Result<Json<Quote>, ApiError> {
    Ok(Json(quotes::set_sales_rep(&state, &auth.user, quote_id, body.sales_rep_id).await?))
}

/// `POST /api/quotes/:id/approve`
pub async fn approve_quote(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(quote_id): Path<Uuid>,
    body: Option<ApiJson<DecisionBody>>,
) -> Result<Json<Quote>, ApiError> {
    let notes = body.and_then(|ApiJson(b)| b.notes);
    Ok(Json(quotes::approve_quote(&state, &auth.user, quote_id, notes).await?))
}

/// `POST /api/quotes/:id/reject`
pub async fn reject_quote(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(quote_id): Path<Uuid>,
    body: Option<ApiJson<DecisionBody>>,
) -> Result<Json<Quote>, ApiError> {
    let notes = body.and_then(|ApiJson(b)| b.notes);
    Ok(Json(quotes::reject_quote(&state, &auth.user, quote_id, notes).await?))
}

#[cfg(test)]
#[path = "quotes_test.rs"]
mod tests;
