//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! Binds every REST endpoint under `/api` onto a single Axum router. Handlers
//! translate HTTP into service calls; services own permissions and business
//! rules. Any failure leaves the service as a typed error and is rendered
//! here as `{"error": "<message>"}` with a matching status code.

pub mod activities;
pub mod admin;
pub mod auth;
pub mod clients;
pub mod dashboard;
pub mod products;
pub mod quotes;
pub mod showroom;
pub mod users;

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, OptionalFromRequest, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{delete, get, patch, post, put};
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::services::session::PermissionDenied;
use crate::state::AppState;

// =============================================================================
// ERRORS
// =============================================================================

/// Error response body: `{"error": "<message>"}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into() }
    }

    /// Wrap a service error. Server-side failures are logged and their detail
    /// is not echoed to the caller.
    pub(crate) fn from_service(status: StatusCode, err: &dyn std::error::Error) -> Self {
        if status.is_server_error() {
            tracing::error!(error = %err, "request failed");
            return Self::new(status, "internal server error");
        }
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(serde_json::json!({ "error": self.message }))).into_response()
    }
}

impl From<PermissionDenied> for ApiError {
    fn from(err: PermissionDenied) -> Self {
        Self::from_service(StatusCode::FORBIDDEN, &err)
    }
}

/// JSON body extractor whose rejection uses the API error shape.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match <Json<T> as FromRequest<S>>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(ApiError::new(rejection.status(), rejection.body_text())),
        }
    }
}

/// Bodies that may be omitted entirely, e.g. approval notes.
impl<S, T> OptionalFromRequest<S> for ApiJson<T>
where
    Json<T>: OptionalFromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Option<Self>, Self::Rejection> {
        match <Json<T> as OptionalFromRequest<S>>::from_request(req, state).await {
            Ok(value) => Ok(value.map(|Json(v)| Self(v))),
            Err(rejection) => Err(ApiError::new(rejection.status(), rejection.body_text())),
        }
    }
}

// =============================================================================
// ROUTER
// =============================================================================

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/me", get(auth::me))
        .route("/api/users", get(users::list_users).post(users::create_user))
        .route("/api/users/sales-reps", get(users::list_sales_reps))
        .route(
            "/api/users/{id}",
            get(users::get_user).put(users::update_user).delete(users::delete_user),
        )
        .route("/api/users/{id}/role", put(users::set_role))
        .route("/api/users/{id}/status", put(users::set_status))
        .route("/api/users/{id}/permissions", get(users::user_permissions))
        .route("/api/products", get(products::list_products).post(products::create_product))
        .route(
            "/api/products/{id}",
            get(products::get_product)
                .put(products::update_product)
                .delete(products::delete_product),
        )
        .route(
            "/api/products/{id}/slabs",
            get(products::list_slabs).post(products::add_slab),
        )
        .route("/api/slabs/{id}/status", patch(products::set_slab_status))
        .route("/api/inventory/summary", get(products::inventory_summary))
        .route("/api/clients", get(clients::list_clients).post(clients::create_client))
        .route(
            "/api/clients/{id}",
            get(clients::get_client)
                .put(clients::update_client)
                .delete(clients::delete_client),
        )
        .route("/api/clients/{id}/quotes", get(clients::client_quotes))
        .route("/api/quotes", get(quotes::list_quotes).post(quotes::create_quote))
        .route("/api/quotes/preview", post(quotes::preview_quote))
        .route(
            "/api/quotes/{id}",
            get(quotes::get_quote)
                .put(quotes::update_quote)
                .delete(quotes::delete_quote),
        )
        .route("/api/quotes/{id}/line-items", post(quotes::add_line_item))
        .route("/api/quotes/{id}/line-items/{item_id}", delete(quotes::remove_line_item))
        .route("/api/quotes/{id}/stage", patch(quotes::set_stage))
        .route("/api/quotes/{id}/status", patch(quotes::set_status))
        .route("/api/quotes/{id}/sales-rep", patch(quotes::set_sales_rep))
        .route("/api/quotes/{id}/approve", post(quotes::approve_quote))
        .route("/api/quotes/{id}/reject", post(quotes::reject_quote))
        .route(
            "/api/showroom-visits",
            get(showroom::list_visits).post(showroom::create_visit),
        )
        .route(
            "/api/showroom-visits/{id}",
            patch(showroom::update_visit).delete(showroom::delete_visit),
        )
        .route("/api/activities", get(activities::list_activities))
        .route("/api/dashboard/stats", get(dashboard::stats))
        .route("/api/dashboard/recent-quotes", get(dashboard::recent_quotes))
        .route("/api/dashboard/top-clients", get(dashboard::top_clients))
        .route("/api/dashboard/top-products", get(dashboard::top_products))
        .route("/api/dashboard/rep-performance", get(dashboard::rep_performance))
        .route("/api/dashboard/inventory-by-category", get(dashboard::inventory_by_category))
        .route("/api/sales-dashboard/stats", get(dashboard::sales_dashboard))
        .route("/api/reports/sales-funnel", get(dashboard::sales_funnel))
        .route("/api/reports/revenue-trends", get(dashboard::revenue_trends))
        .route("/api/reports/profit-margins", get(dashboard::profit_margins))
        .route("/api/admin/health", get(admin::health))
        .route("/api/admin/maintenance", post(admin::maintenance))
        .route("/healthz", get(healthz))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
