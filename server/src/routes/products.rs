//! Product, slab and inventory routes.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use domain::inventory::{ProductFilter, SlabStatus};
use domain::model::{Product, Slab};
use serde::Deserialize;
use uuid::Uuid;

use super::auth::AuthUser;
use super::{ApiError, ApiJson};
use crate::services::inventory::{
    self, DeleteOutcome, InventoryError, InventorySummary, NewProduct, NewSlab, ProductDetail, ProductUpdate,
};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SlabStatusBody {
    pub status: SlabStatus,
}

pub(crate) fn inventory_error_to_status(err: &InventoryError) -> StatusCode {
    match err {
        InventoryError::NotFound(_) | InventoryError::SlabNotFound(_) => StatusCode::NOT_FOUND,
        InventoryError::Conflict(_) | InventoryError::Transition { .. } => StatusCode::CONFLICT,
        InventoryError::Invalid(_) => StatusCode::BAD_REQUEST,
        InventoryError::Denied(_) => StatusCode::FORBIDDEN,
    }
}

impl From<InventoryError> for ApiError {
    fn from(err: InventoryError) -> Self {
        Self::from_service(inventory_error_to_status(&err), &err)
    }
}

/// `GET /api/products` — filtered catalog listing.
pub async fn list_products(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(filter): Query<ProductFilter>,
) -> Result<Json<Vec<Product>>, ApiError> {
    Ok(Json(inventory::list_products(&state, &auth.user, &filter).await?))
}

/// `GET /api/products/:id` — product plus its slab roll-up.
pub async fn get_product(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(product_id): Path<Uuid>,
) -> Result<Json<ProductDetail>, ApiError> {
    Ok(Json(inventory::get_product(&state, &auth.user, product_id).await?))
}

/// `POST /api/products`
pub async fn create_product(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(body): ApiJson<NewProduct>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    let product = inventory::create_product(&state, &auth.user, body).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// `PUT /api/products/:id`
pub async fn update_product(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(product_id): Path<Uuid>,
    ApiJson(body): ApiJson<ProductUpdate>,
) -> Result<Json<Product>, ApiError> {
    Ok(Json(inventory::update_product(&state, &auth.user, product_id, body).await?))
}

/// `DELETE /api/products/:id` — deletes, or deactivates when quotes use it.
pub async fn delete_product(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(product_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let outcome: DeleteOutcome = inventory::delete_product(&state, &auth.user, product_id).await?;
    Ok(Json(serde_json::json!({ "result": outcome })))
}

/// `GET /api/products/:id/slabs`
pub async fn list_slabs(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(product_id): Path<Uuid>,
) -> Result<Json<Vec<Slab>>, ApiError> {
    Ok(Json(inventory::list_slabs(&state, &auth.user, product_id).await?))
}

/// `POST /api/products/:id/slabs`
pub async fn add_slab(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(product_id): Path<Uuid>,
    ApiJson(body): ApiJson<NewSlab>,
) -> Result<(StatusCode, Json<Slab>), ApiError> {
    let slab = inventory::add_slab(&state, &auth.user, product_id, body).await?;
    Ok((StatusCode::CREATED, Json(slab)))
}

/// `PATCH /api/slabs/:id/status` — hold, release or sell a slab.
pub async fn set_slab_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(slab_id): Path<Uuid>,
    ApiJson(body): ApiJson<SlabStatusBody>,
) -> Result<Json<Slab>, ApiError> {
    Ok(Json(inventory::set_slab_status(&state, &auth.user, slab_id, body.status).await?))
}

/// `GET /api/inventory/summary`
pub async fn inventory_summary(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<InventorySummary>, ApiError> {
    Ok(Json(inventory::inventory_summary(&state, &auth.user).await?))
}

#[cfg(test)]
#[path = "products_test.rs"]
mod tests;
