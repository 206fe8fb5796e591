//! Session management and the authenticated caller.
//!
//! ARCHITECTURE
//! ============
//! Sessions are random 32-byte hex tokens mapped to a user id and an expiry.
//! Validation re-reads the user on every request, so a role change or a
//! deactivation takes effect on the caller's next call without logging them
//! out.

use std::fmt::Write;

use domain::permissions::{Action, Module, PermissionSet, Role, Scope, effective_permissions, record_scope};
use rand::Rng;
use serde::Serialize;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::state::{AppState, Session};

pub(crate) fn bytes_to_hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(s, "{b:02x}");
    }
    s
}

/// Generate a cryptographically random 32-byte hex token.
#[must_use]
pub fn generate_token() -> String {
    let bytes: [u8; 32] = rand::rng().random();
    bytes_to_hex(&bytes)
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("permission denied: {module}:{action}")]
pub struct PermissionDenied {
    pub module: Module,
    pub action: Action,
}

/// The user behind a valid session, with permissions resolved.
#[derive(Debug, Clone, Serialize)]
pub struct SessionUser {
    pub id: Uuid,
    pub username: String,
    pub display_name: String,
    pub email: String,
    pub role: Role,
    pub permissions: PermissionSet,
}

impl SessionUser {
    #[must_use]
    pub fn can(&self, module: Module, action: Action) -> bool {
        self.permissions.allows(module, action)
    }

    /// # Errors
    ///
    /// Returns [`PermissionDenied`] when the caller lacks `module:action`.
    pub fn require(&self, module: Module, action: Action) -> Result<(), PermissionDenied> {
        if self.can(module, action) { Ok(()) } else { Err(PermissionDenied { module, action }) }
    }

    #[must_use]
    pub fn scope(&self) -> Scope {
        record_scope(self.role)
    }
}

/// Create a session for the given user, returning the token.
pub async fn create_session(state: &AppState, user_id: Uuid) -> String {
    let token = generate_token();
    let expires_at = OffsetDateTime::now_utc() + Duration::seconds(state.config.session_ttl_secs);
    state
        .sessions
        .write()
        .await
        .insert(token.clone(), Session { user_id, expires_at });
    token
}

/// Validate a session token and return the associated active user.
///
/// Expired sessions are removed as they are found.
pub async fn validate_session(state: &AppState, token: &str) -> Option<SessionUser> {
    let now = OffsetDateTime::now_utc();
    let session = state.sessions.read().await.get(token).cloned()?;
    if session.expires_at <= now {
        state.sessions.write().await.remove(token);
        return None;
    }

    let store = state.store.read().await;
    let record = store.users.get(&session.user_id)?;
    if !record.user.is_active {
        return None;
    }
    let user = &record.user;
    Some(SessionUser {
        id: user.id,
        username: user.username.clone(),
        display_name: user.display_name(),
        email: user.email.clone(),
        role: user.role,
        permissions: effective_permissions(user.role, &user.permissions),
    })
}

/// Delete a session by token.
pub async fn delete_session(state: &AppState, token: &str) {
    state.sessions.write().await.remove(token);
}

/// Drop every session belonging to `user_id`. Returns how many were removed.
pub async fn delete_user_sessions(state: &AppState, user_id: Uuid) -> usize {
    let mut sessions = state.sessions.write().await;
    let before = sessions.len();
    sessions.retain(|_, s| s.user_id != user_id);
    before - sessions.len()
}

/// Drop expired sessions. Returns how many were removed.
pub async fn purge_expired_sessions(state: &AppState) -> usize {
    let now = OffsetDateTime::now_utc();
    let mut sessions = state.sessions.write().await;
    let before = sessions.len();
    sessions.retain(|_, s| s.expires_at > now);
    before - sessions.len()
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
