//! Audit trail.
//!
//! Services append an entry while they still hold the store write guard, so
//! the activity and the change it describes are never observed apart.

use domain::model::{Activity, EntityKind};
use domain::permissions::{Action, Module, Scope};
use serde::Deserialize;
use time::OffsetDateTime;
use uuid::Uuid;

use super::session::{PermissionDenied, SessionUser};
use crate::state::{AppState, Store};

const DEFAULT_LIMIT: usize = 50;
const MAX_LIMIT: usize = 500;
/// Retained entries. The oldest are dropped first.
pub const MAX_ACTIVITIES: usize = 10_000;

/// Append an activity entry, evicting the oldest past [`MAX_ACTIVITIES`].
pub fn record(
    store: &mut Store,
    actor_id: Option<Uuid>,
    entity_type: EntityKind,
    entity_id: Option<Uuid>,
    action: &str,
    description: impl Into<String>,
) {
    let activity = Activity {
        id: Uuid::new_v4(),
        actor_id,
        entity_type,
        entity_id,
        action: action.to_owned(),
        description: description.into(),
        created_at: OffsetDateTime::now_utc(),
    };
    tracing::debug!(
        entity_type = ?activity.entity_type,
        entity_id = ?activity.entity_id,
        action = %activity.action,
        "activity recorded"
    );
    store.activities.push_back(activity);
    while store.activities.len() > MAX_ACTIVITIES {
        store.activities.pop_front();
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ActivityFilter {
    pub entity_type: Option<EntityKind>,
    pub entity_id: Option<Uuid>,
    pub limit: Option<usize>,
}

/// Newest-first activity list. Sales reps only see their own entries.
///
/// # Errors
///
/// Returns [`PermissionDenied`] without `dashboard:view`.
pub async fn list_activities(
    state: &AppState,
    actor: &SessionUser,
    filter: &ActivityFilter,
) -> Result<Vec<Activity>, PermissionDenied> {
    actor.require(Module::Dashboard, Action::View)?;
    let limit = filter.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let own_only = actor.scope() == Scope::Own;

    let store = state.store.read().await;
    Ok(store
        .activities
        .iter()
        .rev()
        .filter(|a| !own_only || a.actor_id == Some(actor.id))
        .filter(|a| filter.entity_type.is_none_or(|t| a.entity_type == t))
        .filter(|a| filter.entity_id.is_none_or(|id| a.entity_id == Some(id)))
        .take(limit)
        .cloned()
        .collect())
}

#[cfg(test)]
#[path = "activity_test.rs"]
mod tests;
