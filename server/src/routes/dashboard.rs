//! Dashboard widgets, the per-rep sales dashboard and management reports.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use domain::analytics::{
    CategoryMargin, ClientRevenue, DashboardStats, MonthlyRevenue, ProductRevenue, RepPerformance, StageCount,
};
use domain::inventory::CategoryInventory;

use super::ApiError;
use super::auth::AuthUser;
use crate::services::reports::{self, LimitQuery, RecentQuote, ReportError, SalesDashboard, TrendQuery};
use crate::state::AppState;

pub(crate) fn report_error_to_status(err: &ReportError) -> StatusCode {
    match err {
        ReportError::Invalid(_) => StatusCode::BAD_REQUEST,
        ReportError::Denied(_) => StatusCode::FORBIDDEN,
    }
}

impl From<ReportError> for ApiError {
    fn from(err: ReportError) -> Self {
        Self::from_service(report_error_to_status(&err), &err)
    }
}

// =============================================================================
// DASHBOARD
// =============================================================================

/// `GET /api/dashboard/stats`
pub async fn stats(State(state): State<AppState>, auth: AuthUser) -> Result<Json<DashboardStats>, ApiError> {
    Ok(Json(reports::dashboard_stats(&state, &auth.user).await?))
}

/// `GET /api/dashboard/recent-quotes?limit=`
pub async fn recent_quotes(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<RecentQuote>>, ApiError> {
    Ok(Json(reports::recent_quotes(&state, &auth.user, query).await?))
}

/// `GET /api/dashboard/top-clients?limit=`
pub async fn top_clients(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<ClientRevenue>>, ApiError> {
    Ok(Json(reports::top_clients(&state, &auth.user, query).await?))
}

/// `GET /api/dashboard/top-products?limit=`
pub async fn top_products(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<ProductRevenue>>, ApiError> {
    Ok(Json(reports::top_products(&state, &auth.user, query).await?))
}

/// `GET /api/dashboard/rep-performance`
pub async fn rep_performance(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<RepPerformance>>, ApiError> {
    Ok(Json(reports::rep_performance(&state, &auth.user).await?))
}

/// `GET /api/dashboard/inventory-by-category`
pub async fn inventory_by_category(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<CategoryInventory>>, ApiError> {
    Ok(Json(reports::inventory_categories(&state, &auth.user).await?))
}

/// `GET /api/sales-dashboard/stats` — the caller's own pipeline.
pub async fn sales_dashboard(State(state): State<AppState>, auth: AuthUser) -> Result<Json<SalesDashboard>, ApiError> {
    Ok(Json(reports::sales_dashboard(&state, &auth.user).await?))
}

// =============================================================================
// REPORTS
// =============================================================================

/// `GET /api/reports/sales-funnel`
pub async fn sales_funnel(State(state): State<AppState>, auth: AuthUser) -> Result<Json<Vec<StageCount>>, ApiError> {
    Ok(Json(reports::sales_funnel(&state, &auth.user).await?))
}

/// `GET /api/reports/revenue-trends?months=`
pub async fn revenue_trends(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<TrendQuery>,
) -> Result<Json<Vec<MonthlyRevenue>>, ApiError> {
    Ok(Json(reports::revenue_trends(&state, &auth.user, query).await?))
}

/// `GET /api/reports/profit-margins`
pub async fn profit_margins(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<CategoryMargin>>, ApiError> {
    Ok(Json(reports::profit_margins(&state, &auth.user).await?))
}
