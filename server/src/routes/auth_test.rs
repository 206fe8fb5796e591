use super::*;
use crate::rate_limit::ThrottleError;

fn parts_with(header: Option<&str>) -> axum::http::request::Parts {
    let mut builder = axum::http::Request::builder().uri("/api/auth/me");
    if let Some(value) = header {
        builder = builder.header(AUTHORIZATION, value);
    }
    builder.body(()).unwrap().into_parts().0
}

#[test]
fn auth_errors_map_to_statuses() {
    assert_eq!(auth_error_to_status(&AuthError::InvalidCredentials), StatusCode::UNAUTHORIZED);
    assert_eq!(auth_error_to_status(&AuthError::Inactive), StatusCode::FORBIDDEN);
    let throttled = AuthError::Throttled(ThrottleError::LockedOut { retry_after_secs: 30 });
    assert_eq!(auth_error_to_status(&throttled), StatusCode::TOO_MANY_REQUESTS);
}

#[test]
fn bearer_token_is_read_from_authorization_header() {
    assert_eq!(bearer_token(&parts_with(Some("Bearer abc123"))).as_deref(), Some("abc123"));
    assert_eq!(bearer_token(&parts_with(Some("bearer  abc123 "))).as_deref(), Some("abc123"));
    assert_eq!(bearer_token(&parts_with(Some("Basic dXNlcg=="))), None);
    assert_eq!(bearer_token(&parts_with(None)), None);
}

#[test]
fn logout_cookie_expires_immediately() {
    let cookie = session_cookie(String::new(), Duration::ZERO, true);
    assert_eq!(cookie.name(), COOKIE_NAME);
    assert_eq!(cookie.max_age(), Some(Duration::ZERO));
    assert_eq!(cookie.secure(), Some(true));
    assert_eq!(cookie.http_only(), Some(true));
}
