//! Auth routes: password login, logout, current user.

use axum::extract::{FromRef, State};
use axum::http::StatusCode;
use axum::http::header::AUTHORIZATION;
use axum::response::{IntoResponse, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use time::Duration;

use super::{ApiError, ApiJson};
use crate::services::auth::{self as auth_svc, AuthError, LoginOutcome};
use crate::services::session;
use crate::state::AppState;

pub(crate) const COOKIE_NAME: &str = "session_token";

// =============================================================================
// AUTH EXTRACTOR
// =============================================================================

/// Authenticated user extracted from the session cookie or a bearer token.
/// Use as a handler parameter to require authentication.
pub struct AuthUser {
    pub user: session::SessionUser,
    pub token: String,
}

fn bearer_token(parts: &axum::http::request::Parts) -> Option<String> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ").or_else(|| value.strip_prefix("bearer "))?;
    Some(token.trim().to_owned())
}

impl<S> axum::extract::FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut axum::http::request::Parts, state: &S) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar
            .get(COOKIE_NAME)
            .map(|c| c.value().to_owned())
            .filter(|t| !t.is_empty())
            .or_else(|| bearer_token(parts))
            .unwrap_or_default();
        if token.is_empty() {
            return Err(ApiError::new(StatusCode::UNAUTHORIZED, "authentication required"));
        }

        let app_state = AppState::from_ref(state);
        let user = session::validate_session(&app_state, &token)
            .await
            .ok_or_else(|| ApiError::new(StatusCode::UNAUTHORIZED, "session expired or invalid"))?;

        Ok(Self { user, token })
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

#[derive(Deserialize)]
pub struct LoginBody {
    pub username: String,
    pub password: String,
}

pub(crate) fn auth_error_to_status(err: &AuthError) -> StatusCode {
    match err {
        AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        AuthError::Inactive => StatusCode::FORBIDDEN,
        AuthError::Throttled(_) => StatusCode::TOO_MANY_REQUESTS,
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        Self::from_service(auth_error_to_status(&err), &err)
    }
}

fn session_cookie(value: String, max_age: Duration, secure: bool) -> Cookie<'static> {
    Cookie::build((COOKIE_NAME, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(max_age)
        .build()
}

/// `POST /api/auth/login` — verify credentials, set the session cookie and
/// return the token for non-browser clients.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(body): ApiJson<LoginBody>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome: LoginOutcome = auth_svc::login(&state, &body.username, &body.password).await?;
    let cookie = session_cookie(
        outcome.token.clone(),
        Duration::seconds(state.config.session_ttl_secs),
        state.config.cookie_secure,
    );
    Ok((jar.add(cookie), Json(outcome)))
}

/// `GET /api/auth/me` — return current user.
pub async fn me(auth: AuthUser) -> Json<session::SessionUser> {
    Json(auth.user)
}

/// `POST /api/auth/logout` — delete session, clear cookie.
pub async fn logout(State(state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    session::delete_session(&state, &auth.token).await;
    let jar = CookieJar::new().add(session_cookie(String::new(), Duration::ZERO, state.config.cookie_secure));
    (jar, StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
