//! Password login.
//!
//! Passwords are stored as argon2id PHC strings. Failed attempts feed the
//! login throttle; a locked account is refused before the password is even
//! checked.

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use serde::Serialize;
use time::OffsetDateTime;

use super::session::{self, SessionUser};
use crate::rate_limit::ThrottleError;
use crate::state::AppState;

pub use argon2::password_hash::Error as HashError;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("account is inactive")]
    Inactive,
    #[error(transparent)]
    Throttled(#[from] ThrottleError),
}

/// Hash `password` under a fresh random salt.
///
/// # Errors
///
/// Returns [`HashError`] when argon2 refuses the input.
pub fn hash_password(password: &str) -> Result<String, HashError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Check `password` against a stored PHC string. Unparseable hashes never match.
#[must_use]
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored) else {
        return false;
    };
    Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok()
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginOutcome {
    pub token: String,
    pub user: SessionUser,
}

/// Verify credentials and open a session.
///
/// # Errors
///
/// Returns [`AuthError::Throttled`] while the account is locked out,
/// [`AuthError::InvalidCredentials`] for an unknown user or wrong password,
/// and [`AuthError::Inactive`] for a deactivated account.
pub async fn login(state: &AppState, username: &str, password: &str) -> Result<LoginOutcome, AuthError> {
    if let Err(e) = state.login_throttle.check(username) {
        tracing::warn!(%username, error = %e, "login refused: account locked");
        return Err(e.into());
    }

    let user_id = {
        let mut store = state.store.write().await;
        let matched = store
            .find_user_by_username(username)
            .filter(|r| verify_password(password, &r.password_hash))
            .map(|r| (r.user.id, r.user.is_active));

        match matched {
            None => {
                drop(store);
                if state.login_throttle.record_failure(username) {
                    tracing::warn!(%username, "account locked after repeated login failures");
                } else {
                    tracing::warn!(%username, "failed login attempt");
                }
                return Err(AuthError::InvalidCredentials);
            }
            Some((_, false)) => return Err(AuthError::Inactive),
            Some((id, true)) => {
                if let Some(record) = store.users.get_mut(&id) {
                    record.user.last_login = Some(OffsetDateTime::now_utc());
                }
                id
            }
        }
    };

    state.login_throttle.record_success(username);
    let token = session::create_session(state, user_id).await;
    let user = session::validate_session(state, &token)
        .await
        .ok_or(AuthError::Inactive)?;
    tracing::info!(user_id = %user.id, role = %user.role, "user logged in");
    Ok(LoginOutcome { token, user })
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
