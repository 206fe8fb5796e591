//! User administration.
//!
//! Admins manage accounts through the `users` module permissions. Every
//! user may read and edit their own profile fields, but nobody can change
//! their own role, status or permission overrides, so the last admin cannot
//! lock themselves out.

use domain::model::{EntityKind, User};
use domain::permissions::{
    Action, Module, Permission, PermissionOverrides, Role, RoleTemplate, effective_permissions,
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::activity;
use super::auth::{HashError, hash_password};
use super::session::{self, PermissionDenied, SessionUser};
use crate::state::{AppState, UserRecord};

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error("user not found: {0}")]
    NotFound(Uuid),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Invalid(String),
    #[error(transparent)]
    Denied(#[from] PermissionDenied),
    #[error("password hashing failed: {0}")]
    Hash(#[from] HashError),
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub role: Role,
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UserUpdate {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub password: Option<String>,
    pub permissions: Option<PermissionOverrides>,
}

/// Role template, overrides and the resulting effective permissions.
#[derive(Debug, Clone, Serialize)]
pub struct UserPermissions {
    pub user_id: Uuid,
    pub role: Role,
    pub template: Vec<Permission>,
    pub overrides: PermissionOverrides,
    pub effective: Vec<Permission>,
    pub visible_modules: Vec<Module>,
}

pub(crate) fn validate_password(password: &str) -> Result<(), UserError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(UserError::Invalid(format!("password must be at least {MIN_PASSWORD_LEN} characters")));
    }
    Ok(())
}

pub(crate) fn validate_email(email: &str) -> Result<(), UserError> {
    let trimmed = email.trim();
    match trimmed.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(UserError::Invalid(format!("invalid email: {trimmed}"))),
    }
}

/// Edit access to `target`: self, or `users:edit`.
fn require_self_or(actor: &SessionUser, target: Uuid, action: Action) -> Result<(), UserError> {
    if actor.id == target {
        return Ok(());
    }
    actor.require(Module::Users, action)?;
    Ok(())
}

fn forbid_self(actor: &SessionUser, target: Uuid, what: &str) -> Result<(), UserError> {
    if actor.id == target {
        return Err(UserError::Invalid(format!("cannot change your own {what}")));
    }
    Ok(())
}

// =============================================================================
// QUERIES
// =============================================================================

/// All users, sorted by username.
///
/// # Errors
///
/// Returns [`UserError::Denied`] without `users:view`.
pub async fn list_users(state: &AppState, actor: &SessionUser) -> Result<Vec<User>, UserError> {
    actor.require(Module::Users, Action::View)?;
    let store = state.store.read().await;
    let mut users: Vec<User> = store.users.values().map(|r| r.user.clone()).collect();
    users.sort_by(|a, b| a.username.cmp(&b.username));
    Ok(users)
}

/// # Errors
///
/// Returns [`UserError::NotFound`] or [`UserError::Denied`].
pub async fn get_user(state: &AppState, actor: &SessionUser, user_id: Uuid) -> Result<User, UserError> {
    require_self_or(actor, user_id, Action::View)?;
    let store = state.store.read().await;
    store
        .users
        .get(&user_id)
        .map(|r| r.user.clone())
        .ok_or(UserError::NotFound(user_id))
}

/// Active users who can carry quotes, for assignment pickers.
///
/// # Errors
///
/// Returns [`UserError::Denied`] without `quotes:view`.
pub async fn list_sales_reps(state: &AppState, actor: &SessionUser) -> Result<Vec<User>, UserError> {
    actor.require(Module::Quotes, Action::View)?;
    let store = state.store.read().await;
    let mut reps: Vec<User> = store
        .users
        .values()
        .filter(|r| r.user.is_active && r.user.role.is_sales())
        .map(|r| r.user.clone())
        .collect();
    reps.sort_by_key(User::display_name);
    Ok(reps)
}

/// # Errors
///
/// Returns [`UserError::NotFound`] or [`UserError::Denied`].
pub async fn user_permissions(
    state: &AppState,
    actor: &SessionUser,
    user_id: Uuid,
) -> Result<UserPermissions, UserError> {
    let user = get_user(state, actor, user_id).await?;
    let effective = effective_permissions(user.role, &user.permissions);
    Ok(UserPermissions {
        user_id,
        role: user.role,
        template: RoleTemplate::for_role(user.role).permissions.to_permissions(),
        overrides: user.permissions,
        effective: effective.to_permissions(),
        visible_modules: effective.visible_modules(),
    })
}

// =============================================================================
// MUTATIONS
// =============================================================================

/// # Errors
///
/// Returns [`UserError::Invalid`] for bad input, [`UserError::Conflict`] for a
/// taken username or email, or [`UserError::Denied`] without `users:create`.
pub async fn create_user(state: &AppState, actor: &SessionUser, input: NewUser) -> Result<User, UserError> {
    actor.require(Module::Users, Action::Create)?;
    let username = input.username.trim().to_owned();
    if username.is_empty() {
        return Err(UserError::Invalid("username is required".into()));
    }
    validate_email(&input.email)?;
    validate_password(&input.password)?;
    let password_hash = hash_password(&input.password)?;

    let mut store = state.store.write().await;
    if store.find_user_by_username(&username).is_some() {
        return Err(UserError::Conflict(format!("username already taken: {username}")));
    }
    let email = input.email.trim().to_owned();
    if store.users.values().any(|r| r.user.email.eq_ignore_ascii_case(&email)) {
        return Err(UserError::Conflict(format!("email already registered: {email}")));
    }

    let user = User {
        id: Uuid::new_v4(),
        username,
        email,
        first_name: input.first_name.trim().to_owned(),
        last_name: input.last_name.trim().to_owned(),
        role: input.role,
        is_active: true,
        permissions: PermissionOverrides::default(),
        last_login: None,
        created_at: OffsetDateTime::now_utc(),
    };
    store
        .users
        .insert(user.id, UserRecord { user: user.clone(), password_hash });
    activity::record(
        &mut store,
        Some(actor.id),
        EntityKind::User,
        Some(user.id),
        "created",
        format!("Created user {} ({})", user.username, user.role),
    );
    tracing::info!(user_id = %user.id, role = %user.role, "user created");
    Ok(user)
}

/// Profile update. Permission overrides need `users:edit` and may not target
/// the caller.
///
/// # Errors
///
/// Returns [`UserError::NotFound`], [`UserError::Invalid`],
/// [`UserError::Conflict`] or [`UserError::Denied`].
pub async fn update_user(
    state: &AppState,
    actor: &SessionUser,
    user_id: Uuid,
    update: UserUpdate,
) -> Result<User, UserError> {
    require_self_or(actor, user_id, Action::Edit)?;
    if update.permissions.is_some() {
        actor.require(Module::Users, Action::Edit)?;
        forbid_self(actor, user_id, "permissions")?;
    }
    if let Some(email) = &update.email {
        validate_email(email)?;
    }
    if let Some(password) = &update.password {
        validate_password(password)?;
    }
    let password_hash = update.password.as_deref().map(hash_password).transpose()?;

    let mut store = state.store.write().await;
    if let Some(email) = &update.email {
        let taken = store
            .users
            .values()
            .any(|r| r.user.id != user_id && r.user.email.eq_ignore_ascii_case(email.trim()));
        if taken {
            return Err(UserError::Conflict(format!("email already registered: {}", email.trim())));
        }
    }
    let record = store.users.get_mut(&user_id).ok_or(UserError::NotFound(user_id))?;
    if let Some(email) = update.email {
        record.user.email = email.trim().to_owned();
    }
    if let Some(first) = update.first_name {
        record.user.first_name = first.trim().to_owned();
    }
    if let Some(last) = update.last_name {
        record.user.last_name = last.trim().to_owned();
    }
    if let Some(hash) = password_hash {
        record.password_hash = hash;
    }
    if let Some(overrides) = update.permissions {
        record.user.permissions = overrides;
    }
    let user = record.user.clone();
    activity::record(
        &mut store,
        Some(actor.id),
        EntityKind::User,
        Some(user_id),
        "updated",
        format!("Updated user {}", user.username),
    );
    Ok(user)
}

/// # Errors
///
/// Returns [`UserError::NotFound`], [`UserError::Invalid`] when targeting the
/// caller, or [`UserError::Denied`] without `users:edit`.
pub async fn set_role(state: &AppState, actor: &SessionUser, user_id: Uuid, role: Role) -> Result<User, UserError> {
    actor.require(Module::Users, Action::Edit)?;
    forbid_self(actor, user_id, "role")?;

    let mut store = state.store.write().await;
    let record = store.users.get_mut(&user_id).ok_or(UserError::NotFound(user_id))?;
    let previous = record.user.role;
    record.user.role = role;
    let user = record.user.clone();
    activity::record(
        &mut store,
        Some(actor.id),
        EntityKind::User,
        Some(user_id),
        "role_changed",
        format!("Changed {} from {previous} to {role}", user.username),
    );
    tracing::info!(user_id = %user_id, from = %previous, to = %role, "user role changed");
    Ok(user)
}

/// Activate or deactivate an account. Deactivation ends its sessions.
///
/// # Errors
///
/// Returns [`UserError::NotFound`], [`UserError::Invalid`] when targeting the
/// caller, or [`UserError::Denied`] without `users:edit`.
pub async fn set_status(
    state: &AppState,
    actor: &SessionUser,
    user_id: Uuid,
    is_active: bool,
) -> Result<User, UserError> {
    actor.require(Module::Users, Action::Edit)?;
    forbid_self(actor, user_id, "status")?;

    let user = {
        let mut store = state.store.write().await;
        let record = store.users.get_mut(&user_id).ok_or(UserError::NotFound(user_id))?;
        record.user.is_active = is_active;
        let user = record.user.clone();
        let action = if is_active { "activated" } else { "deactivated" };
        activity::record(
            &mut store,
            Some(actor.id),
            EntityKind::User,
            Some(user_id),
            action,
            format!("{} {}", if is_active { "Activated" } else { "Deactivated" }, user.username),
        );
        user
    };
    if !is_active {
        let dropped = session::delete_user_sessions(state, user_id).await;
        tracing::info!(user_id = %user_id, sessions = dropped, "user deactivated");
    }
    Ok(user)
}

/// # Errors
///
/// Returns [`UserError::NotFound`], [`UserError::Invalid`] when targeting the
/// caller, or [`UserError::Denied`] without `users:delete`.
pub async fn delete_user(state: &AppState, actor: &SessionUser, user_id: Uuid) -> Result<(), UserError> {
    actor.require(Module::Users, Action::Delete)?;
    if actor.id == user_id {
        return Err(UserError::Invalid("cannot delete your own account".into()));
    }

    {
        let mut store = state.store.write().await;
        let record = store.users.remove(&user_id).ok_or(UserError::NotFound(user_id))?;
        activity::record(
            &mut store,
            Some(actor.id),
            EntityKind::User,
            Some(user_id),
            "deleted",
            format!("Deleted user {}", record.user.username),
        );
    }
    session::delete_user_sessions(state, user_id).await;
    tracing::info!(user_id = %user_id, "user deleted");
    Ok(())
}

#[cfg(test)]
#[path = "users_test.rs"]
mod tests;
