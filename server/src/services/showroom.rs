//! Showroom visit requests.
//!
//! Sales reps see visits assigned to them plus unassigned requests, and may
//! only claim a visit for themselves. Completed and cancelled visits are
//! closed.

use domain::model::{EntityKind, ShowroomVisit, VisitStatus};
use domain::permissions::{Action, Module, Scope};
use serde::Deserialize;
use time::OffsetDateTime;
use uuid::Uuid;

use super::activity;
use super::session::{PermissionDenied, SessionUser};
use crate::state::{AppState, Store};

#[derive(Debug, thiserror::Error)]
pub enum ShowroomError {
    #[error("showroom visit not found: {0}")]
    NotFound(Uuid),
    #[error("{0}")]
    Invalid(String),
    #[error("visit is {0} and can no longer change")]
    Closed(VisitStatus),
    #[error(transparent)]
    Denied(#[from] PermissionDenied),
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewVisit {
    pub client_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub preferred_date: OffsetDateTime,
    pub assigned_to: Option<Uuid>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VisitUpdate {
    pub status: Option<VisitStatus>,
    pub assigned_to: Option<Uuid>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub preferred_date: Option<OffsetDateTime>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VisitFilter {
    pub status: Option<VisitStatus>,
    pub assigned_to: Option<Uuid>,
}

fn is_closed(status: VisitStatus) -> bool {
    matches!(status, VisitStatus::Completed | VisitStatus::Cancelled)
}

fn visible(actor: &SessionUser, visit: &ShowroomVisit) -> bool {
    actor.scope() == Scope::All || visit.assigned_to.is_none_or(|id| id == actor.id)
}

fn check_assignee(store: &Store, actor: &SessionUser, assignee: Uuid) -> Result<(), ShowroomError> {
    if actor.scope() == Scope::Own && assignee != actor.id {
        return Err(ShowroomError::Invalid("sales reps can only claim visits for themselves".into()));
    }
    match store.users.get(&assignee) {
        Some(r) if r.user.is_active => Ok(()),
        _ => Err(ShowroomError::Invalid(format!("unknown or inactive user: {assignee}"))),
    }
}

/// Visits ordered by preferred date, soonest first.
///
/// # Errors
///
/// Returns [`ShowroomError::Denied`] without `showroom:view`.
pub async fn list_visits(
    state: &AppState,
    actor: &SessionUser,
    filter: &VisitFilter,
) -> Result<Vec<ShowroomVisit>, ShowroomError> {
    actor.require(Module::Showroom, Action::View)?;
    let store = state.store.read().await;
    let mut visits: Vec<ShowroomVisit> = store
        .visits
        .values()
        .filter(|v| visible(actor, v))
        .filter(|v| filter.status.is_none_or(|s| s == v.status))
        .filter(|v| filter.assigned_to.is_none_or(|id| v.assigned_to == Some(id)))
        .cloned()
        .collect();
    visits.sort_by_key(|v| v.preferred_date);
    Ok(visits)
}

/// # Errors
///
/// Returns [`ShowroomError::Invalid`] for a blank name or missing contact
/// details, or [`ShowroomError::Denied`].
pub async fn create_visit(
    state: &AppState,
    actor: &SessionUser,
    input: NewVisit,
) -> Result<ShowroomVisit, ShowroomError> {
    actor.require(Module::Showroom, Action::Create)?;
    let client_name = input.client_name.trim().to_owned();
    if client_name.is_empty() {
        return Err(ShowroomError::Invalid("client name is required".into()));
    }
    let blank = |v: &Option<String>| v.as_deref().is_none_or(|s| s.trim().is_empty());
    if blank(&input.email) && blank(&input.phone) {
        return Err(ShowroomError::Invalid("an email or phone number is required".into()));
    }

    let mut store = state.store.write().await;
    if let Some(assignee) = input.assigned_to {
        check_assignee(&store, actor, assignee)?;
    }
    let visit = ShowroomVisit {
        id: Uuid::new_v4(),
        client_name,
        email: input.email,
        phone: input.phone,
        preferred_date: input.preferred_date,
        status: if input.assigned_to.is_some() { VisitStatus::Scheduled } else { VisitStatus::Pending },
        assigned_to: input.assigned_to,
        notes: input.notes,
        created_at: OffsetDateTime::now_utc(),
    };
    store.visits.insert(visit.id, visit.clone());
    activity::record(
        &mut store,
        Some(actor.id),
        EntityKind::ShowroomVisit,
        Some(visit.id),
        "created",
        format!("Showroom visit requested for {}", visit.client_name),
    );
    Ok(visit)
}

/// Partial update. Assigning a pending visit schedules it.
///
/// # Errors
///
/// Returns [`ShowroomError::NotFound`], [`ShowroomError::Closed`],
/// [`ShowroomError::Invalid`] or [`ShowroomError::Denied`].
pub async fn update_visit(
    state: &AppState,
    actor: &SessionUser,
    visit_id: Uuid,
    update: VisitUpdate,
) -> Result<ShowroomVisit, ShowroomError> {
    actor.require(Module::Showroom, Action::Edit)?;
    let mut store = state.store.write().await;
    if let Some(assignee) = update.assigned_to {
        check_assignee(&store, actor, assignee)?;
    }
    let visit = store
        .visits
        .get_mut(&visit_id)
        .filter(|v| visible(actor, v))
        .ok_or(ShowroomError::NotFound(visit_id))?;
    if is_closed(visit.status) {
        return Err(ShowroomError::Closed(visit.status));
    }

    if let Some(assignee) = update.assigned_to {
        visit.assigned_to = Some(assignee);
        if visit.status == VisitStatus::Pending {
            visit.status = VisitStatus::Scheduled;
        }
    }
    if let Some(status) = update.status {
        visit.status = status;
    }
    if let Some(date) = update.preferred_date {
        visit.preferred_date = date;
    }
    for (slot, value) in
        [(&mut visit.email, update.email), (&mut visit.phone, update.phone), (&mut visit.notes, update.notes)]
    {
        if value.is_some() {
            *slot = value;
        }
    }
    let visit = visit.clone();
    activity::record(
        &mut store,
        Some(actor.id),
        EntityKind::ShowroomVisit,
        Some(visit_id),
        "updated",
        format!("Showroom visit for {} is {}", visit.client_name, visit.status),
    );
    Ok(visit)
}

/// # Errors
///
/// Returns [`ShowroomError::NotFound`] or [`ShowroomError::Denied`].
pub async fn delete_visit(state: &AppState, actor: &SessionUser, visit_id: Uuid) -> Result<(), ShowroomError> {
    actor.require(Module::Showroom, Action::Delete)?;
    let mut store = state.store.write().await;
    let visit = store.visits.remove(&visit_id).ok_or(ShowroomError::NotFound(visit_id))?;
    activity::record(
        &mut store,
        Some(actor.id),
        EntityKind::ShowroomVisit,
        Some(visit_id),
        "deleted",
        format!("Removed showroom visit for {}", visit.client_name),
    );
    Ok(())
}

#[cfg(test)]
#[path = "showroom_test.rs"]
mod tests;
