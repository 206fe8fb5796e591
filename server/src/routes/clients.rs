//! Client account routes.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use domain::model::{Client, Quote};
use uuid::Uuid;

use super::auth::AuthUser;
use super::{ApiError, ApiJson};
use crate::services::clients::{self, ClientError, ClientFilter, ClientUpdate, NewClient};
use crate::state::AppState;

pub(crate) fn client_error_to_status(err: &ClientError) -> StatusCode {
    match err {
        ClientError::NotFound(_) => StatusCode::NOT_FOUND,
        ClientError::Invalid(_) => StatusCode::BAD_REQUEST,
        ClientError::Conflict(_) => StatusCode::CONFLICT,
        ClientError::Denied(_) => StatusCode::FORBIDDEN,
    }
}

impl From<ClientError> for ApiError {
    fn from(err: ClientError) -> Self {
        Self::from_service(client_error_to_status(&err), &err)
    }
}

/// `GET /api/clients` — optional `search` and `sales_rep_id`.
pub async fn list_clients(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(filter): Query<ClientFilter>,
) -> Result<Json<Vec<Client>>, ApiError> {
    Ok(Json(clients::list_clients(&state, &auth.user, &filter).await?))
}

/// `GET /api/clients/:id`
pub async fn get_client(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(client_id): Path<Uuid>,
) -> Result<Json<Client>, ApiError> {
    Ok(Json(clients::get_client(&state, &auth.user, client_id).await?))
}

/// `POST /api/clients`
pub async fn create_client(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(body): ApiJson<NewClient>,
) -> Result<(StatusCode, Json<Client>), ApiError> {
    let client = clients::create_client(&state, &auth.user, body).await?;
    Ok((StatusCode::CREATED, Json(client)))
}

/// `PUT /api/clients/:id`
pub async fn update_client(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(client_id): Path<Uuid>,
    ApiJson(body): ApiJson<ClientUpdate>,
) -> Result<Json<Client>, ApiError> {
    Ok(Json(clients::update_client(&state, &auth.user, client_id, body).await?))
}

/// `DELETE /api/clients/:id` — refused while quotes reference the client.
pub async fn delete_client(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(client_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    clients::delete_client(&state, &auth.user, client_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/clients/:id/quotes`
pub async fn client_quotes(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(client_id): Path<Uuid>,
) -> Result<Json<Vec<Quote>>, ApiError> {
    Ok(Json(clients::client_quotes(&state, &auth.user, client_id).await?))
}
