//! Dashboard widgets and management reports.
//!
//! Every figure is computed from the quotes the caller may see, so a sales
//! rep's dashboard only ever reflects their own book. The folds themselves
//! live in `domain::analytics`.

use std::collections::HashMap;

use domain::analytics::{
    self, CategoryMargin, ClientRevenue, DashboardStats, MonthlyRevenue, ProductRevenue, RepPerformance, StageCount,
};
use domain::inventory::{CategoryInventory, inventory_by_category};
use domain::model::{Client, Product, Quote, User};
use domain::money::Money;
use domain::permissions::{Action, Module, Scope};
use domain::pipeline::{PipelineStage, QuoteStatus};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::session::{PermissionDenied, SessionUser};
use crate::state::{AppState, Store};

const DEFAULT_LIMIT: usize = 5;
const MAX_LIMIT: usize = 50;
const DEFAULT_MONTHS: u32 = 12;
const MAX_MONTHS: u32 = 36;

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("{0}")]
    Invalid(String),
    #[error(transparent)]
    Denied(#[from] PermissionDenied),
}

/// `?limit=` for ranked widgets.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

impl LimitQuery {
    fn resolve(self) -> usize {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }
}

/// `?months=` for the revenue trend.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct TrendQuery {
    pub months: Option<u32>,
}

/// One row of the recent-quotes widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecentQuote {
    pub id: Uuid,
    pub quote_number: String,
    pub client_name: String,
    pub project_name: String,
    pub total: Money,
    pub status: QuoteStatus,
    pub pipeline_stage: PipelineStage,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// The caller's own pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SalesDashboard {
    #[serde(flatten)]
    pub stats: DashboardStats,
    pub awaiting_approval: usize,
    pub recent_quotes: Vec<RecentQuote>,
}

// =============================================================================
// HELPERS
// =============================================================================

fn scoped_quotes(store: &Store, actor: &SessionUser) -> Vec<Quote> {
    let own_only = actor.scope() == Scope::Own;
    store
        .quotes
        .values()
        .filter(|q| !own_only || q.is_owned_by(actor.id))
        .cloned()
        .collect()
}

fn scoped_clients(store: &Store, actor: &SessionUser) -> Vec<Client> {
    let own_only = actor.scope() == Scope::Own;
    store
        .clients
        .values()
        .filter(|c| !own_only || c.sales_rep_id == Some(actor.id) || c.created_by == Some(actor.id))
        .cloned()
        .collect()
}

fn active_products(store: &Store) -> Vec<Product> {
    store.products.values().filter(|p| p.is_active).cloned().collect()
}

fn recent(store: &Store, mut quotes: Vec<Quote>, limit: usize) -> Vec<RecentQuote> {
    quotes.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.quote_number.cmp(&a.quote_number)));
    let names: HashMap<Uuid, &str> = store.clients.values().map(|c| (c.id, c.name.as_str())).collect();
    quotes
        .into_iter()
        .take(limit)
        .map(|q| RecentQuote {
            id: q.id,
            client_name: names.get(&q.client_id).copied().unwrap_or("Unknown client").to_owned(),
            quote_number: q.quote_number,
            project_name: q.project_name,
            total: q.totals.total,
            status: q.status,
            pipeline_stage: q.pipeline_stage,
            created_at: q.created_at,
        })
        .collect()
}

// =============================================================================
// DASHBOARD
// =============================================================================

/// # Errors
///
/// Returns [`ReportError::Denied`] without `dashboard:view`.
pub async fn dashboard_stats(state: &AppState, actor: &SessionUser) -> Result<DashboardStats, ReportError> {
    actor.require(Module::Dashboard, Action::View)?;
    let store = state.store.read().await;
    let quotes = scoped_quotes(&store, actor);
    let clients = scoped_clients(&store, actor);
    let products = store.products.values().filter(|p| p.is_active).count();
    Ok(analytics::dashboard_stats(&quotes, products, clients.len()))
}

/// # Errors
///
/// Returns [`ReportError::Denied`] without `dashboard:view` and `quotes:view`.
pub async fn recent_quotes(
    state: &AppState,
    actor: &SessionUser,
    query: LimitQuery,
) -> Result<Vec<RecentQuote>, ReportError> {
    actor.require(Module::Dashboard, Action::View)?;
    actor.require(Module::Quotes, Action::View)?;
    let store = state.store.read().await;
    let quotes = scoped_quotes(&store, actor);
    Ok(recent(&store, quotes, query.resolve()))
}

/// # Errors
///
/// Returns [`ReportError::Denied`] without `dashboard:view`.
pub async fn top_clients(
    state: &AppState,
    actor: &SessionUser,
    query: LimitQuery,
) -> Result<Vec<ClientRevenue>, ReportError> {
    actor.require(Module::Dashboard, Action::View)?;
    let store = state.store.read().await;
    let quotes = scoped_quotes(&store, actor);
    let clients = scoped_clients(&store, actor);
    Ok(analytics::top_clients(&quotes, &clients, query.resolve()))
}

/// # Errors
///
/// Returns [`ReportError::Denied`] without `dashboard:view`.
pub async fn top_products(
    state: &AppState,
    actor: &SessionUser,
    query: LimitQuery,
) -> Result<Vec<ProductRevenue>, ReportError> {
    actor.require(Module::Dashboard, Action::View)?;
    let store = state.store.read().await;
    let quotes = scoped_quotes(&store, actor);
    let products: Vec<Product> = store.products.values().cloned().collect();
    Ok(analytics::top_products(&quotes, &products, query.resolve()))
}

/// Sales reps only get their own row.
///
/// # Errors
///
/// Returns [`ReportError::Denied`] without `dashboard:view`.
pub async fn rep_performance(state: &AppState, actor: &SessionUser) -> Result<Vec<RepPerformance>, ReportError> {
    actor.require(Module::Dashboard, Action::View)?;
    let store = state.store.read().await;
    let quotes = scoped_quotes(&store, actor);
    let own_only = actor.scope() == Scope::Own;
    let users: Vec<User> = store
        .users
        .values()
        .map(|r| &r.user)
        .filter(|u| !own_only || u.id == actor.id)
        .cloned()
        .collect();
    Ok(analytics::rep_performance(&quotes, &users))
}

/// # Errors
///
/// Returns [`ReportError::Denied`] without `inventory:view`.
pub async fn inventory_categories(
    state: &AppState,
    actor: &SessionUser,
) -> Result<Vec<CategoryInventory>, ReportError> {
    actor.require(Module::Inventory, Action::View)?;
    let store = state.store.read().await;
    Ok(inventory_by_category(&active_products(&store)))
}

/// Stats over quotes the caller created or carries, whatever their role.
///
/// # Errors
///
/// Returns [`ReportError::Denied`] without `dashboard:view`.
pub async fn sales_dashboard(state: &AppState, actor: &SessionUser) -> Result<SalesDashboard, ReportError> {
    actor.require(Module::Dashboard, Action::View)?;
    let store = state.store.read().await;
    let mine: Vec<Quote> = store.quotes.values().filter(|q| q.is_owned_by(actor.id)).cloned().collect();
    let my_clients = store
        .clients
        .values()
        .filter(|c| c.sales_rep_id == Some(actor.id) || c.created_by == Some(actor.id))
        .count();
    let products = store.products.values().filter(|p| p.is_active).count();
    Ok(SalesDashboard {
        stats: analytics::dashboard_stats(&mine, products, my_clients),
        awaiting_approval: mine.iter().filter(|q| q.status == QuoteStatus::Pending).count(),
        recent_quotes: recent(&store, mine, DEFAULT_LIMIT),
    })
}

// =============================================================================
// REPORTS
// =============================================================================

/// # Errors
///
/// Returns [`ReportError::Denied`] without `reports:view`.
pub async fn sales_funnel(state: &AppState, actor: &SessionUser) -> Result<Vec<StageCount>, ReportError> {
    actor.require(Module::Reports, Action::View)?;
    let store = state.store.read().await;
    Ok(analytics::sales_funnel(&scoped_quotes(&store, actor)))
}

/// # Errors
///
/// Returns [`ReportError::Invalid`] for a window outside 1 to 36 months, or
/// [`ReportError::Denied`] without `reports:view`.
pub async fn revenue_trends(
    state: &AppState,
    actor: &SessionUser,
    query: TrendQuery,
) -> Result<Vec<MonthlyRevenue>, ReportError> {
    actor.require(Module::Reports, Action::View)?;
    let months = query.months.unwrap_or(DEFAULT_MONTHS);
    if !(1..=MAX_MONTHS).contains(&months) {
        return Err(ReportError::Invalid(format!("months must be between 1 and {MAX_MONTHS}")));
    }
    let store = state.store.read().await;
    Ok(analytics::revenue_trend(&scoped_quotes(&store, actor), months, OffsetDateTime::now_utc()))
}

/// # Errors
///
/// Returns [`ReportError::Denied`] without `reports:view`.
pub async fn profit_margins(state: &AppState, actor: &SessionUser) -> Result<Vec<CategoryMargin>, ReportError> {
    actor.require(Module::Reports, Action::View)?;
    let store = state.store.read().await;
    let products: Vec<Product> = store.products.values().cloned().collect();
    Ok(analytics::margin_by_category(&scoped_quotes(&store, actor), &products))
}

#[cfg(test)]
#[path = "reports_test.rs"]
mod tests;
