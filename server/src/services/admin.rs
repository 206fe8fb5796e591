//! Health and maintenance actions for administrators.

use domain::model::EntityKind;
use domain::permissions::{Action, Module};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::activity;
use super::quotes::{self, QuoteError};
use super::session::{self, PermissionDenied, SessionUser};
use crate::state::AppState;

#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    #[error(transparent)]
    Quote(#[from] QuoteError),
    #[error(transparent)]
    Denied(#[from] PermissionDenied),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordCounts {
    pub users: usize,
    pub clients: usize,
    pub products: usize,
    pub slabs: usize,
    pub quotes: usize,
    pub showroom_visits: usize,
    pub activities: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_secs: u64,
    pub active_sessions: usize,
    pub records: RecordCounts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaintenanceAction {
    ExpireStaleQuotes,
    RecalculateTotals,
    PurgeSessions,
}

impl MaintenanceAction {
    fn as_str(self) -> &'static str {
        match self {
            Self::ExpireStaleQuotes => "expire_stale_quotes",
            Self::RecalculateTotals => "recalculate_totals",
            Self::PurgeSessions => "purge_sessions",
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct MaintenanceRequest {
    pub action: MaintenanceAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MaintenanceReport {
    pub action: MaintenanceAction,
    /// Records touched by the action.
    pub affected: usize,
}

/// # Errors
///
/// Returns [`AdminError::Denied`] without `system:view`.
pub async fn health(state: &AppState, actor: &SessionUser) -> Result<HealthReport, AdminError> {
    actor.require(Module::System, Action::View)?;
    let active_sessions = state.sessions.read().await.len();
    let store = state.store.read().await;
    Ok(HealthReport {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: state.started_at.elapsed().as_secs(),
        active_sessions,
        records: RecordCounts {
            users: store.users.len(),
            clients: store.clients.len(),
            products: store.products.len(),
            slabs: store.slabs.len(),
            quotes: store.quotes.len(),
            showroom_visits: store.visits.len(),
            activities: store.activities.len(),
        },
    })
}

/// Run one maintenance action and record it in the audit trail.
///
/// # Errors
///
/// Returns [`AdminError::Denied`] without `system:edit`, or the underlying
/// quote error when repricing fails.
pub async fn run_maintenance(
    state: &AppState,
    actor: &SessionUser,
    action: MaintenanceAction,
) -> Result<MaintenanceReport, AdminError> {
    actor.require(Module::System, Action::Edit)?;
    let affected = match action {
        MaintenanceAction::ExpireStaleQuotes => {
            let mut store = state.store.write().await;
            quotes::expire_stale(&mut store, OffsetDateTime::now_utc()).len()
        }
        MaintenanceAction::RecalculateTotals => {
            let mut store = state.store.write().await;
            quotes::recalculate_all(&mut store, state.config.pricing.processing_fee_rate)?
        }
        MaintenanceAction::PurgeSessions => {
            let sessions = session::purge_expired_sessions(state).await;
            sessions + state.login_throttle.purge_expired()
        }
    };

    let mut store = state.store.write().await;
    activity::record(
        &mut store,
        Some(actor.id),
        EntityKind::System,
        None,
        action.as_str(),
        format!("Maintenance {} touched {affected} record(s)", action.as_str()),
    );
    tracing::info!(action = action.as_str(), affected, actor = %actor.id, "maintenance action complete");
    Ok(MaintenanceReport { action, affected })
}

#[cfg(test)]
#[path = "admin_test.rs"]
mod tests;
