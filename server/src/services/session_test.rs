use super::*;
use crate::state::test_helpers;

// =============================================================================
// bytes_to_hex / generate_token
// =============================================================================

#[test]
fn bytes_to_hex_empty() {
    assert_eq!(bytes_to_hex(&[]), "");
}

#[test]
fn bytes_to_hex_leading_zero() {
    assert_eq!(bytes_to_hex(&[0x0a]), "0a");
}

#[test]
fn bytes_to_hex_multi_byte() {
    assert_eq!(bytes_to_hex(&[0xde, 0xad, 0xbe, 0xef]), "deadbeef");
}

#[test]
fn generate_token_is_64_hex_chars() {
    let token = generate_token();
    assert_eq!(token.len(), 64);
    assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn generate_token_two_calls_differ() {
    assert_ne!(generate_token(), generate_token());
}

// =============================================================================
// SESSIONS
// =============================================================================

#[tokio::test]
async fn session_round_trip() {
    let state = test_helpers::test_app_state();
    let user = test_helpers::seed_user(&state, "lead", Role::SalesLeader).await;

    let token = create_session(&state, user.id).await;
    let actor = validate_session(&state, &token).await.unwrap();
    assert_eq!(actor.id, user.id);
    assert_eq!(actor.role, Role::SalesLeader);
    assert!(actor.can(Module::Quotes, Action::Approve));
    assert_eq!(actor.scope(), Scope::All);

    delete_session(&state, &token).await;
    assert!(validate_session(&state, &token).await.is_none());
}

#[tokio::test]
async fn unknown_token_is_rejected() {
    let state = test_helpers::test_app_state();
    assert!(validate_session(&state, "nope").await.is_none());
}

#[tokio::test]
async fn expired_session_is_rejected_and_removed() {
    let state = test_helpers::test_app_state();
    let user = test_helpers::seed_user(&state, "rep", Role::SalesRep).await;
    state.sessions.write().await.insert(
        "stale".into(),
        Session { user_id: user.id, expires_at: OffsetDateTime::now_utc() - Duration::minutes(1) },
    );

    assert!(validate_session(&state, "stale").await.is_none());
    assert!(state.sessions.read().await.is_empty());
}

#[tokio::test]
async fn deactivated_user_loses_access() {
    let state = test_helpers::test_app_state();
    let (actor, token) = test_helpers::seed_session(&state, "rep", Role::SalesRep).await;
    state.store.write().await.users.get_mut(&actor.id).unwrap().user.is_active = false;
    assert!(validate_session(&state, &token).await.is_none());
}

#[tokio::test]
async fn role_change_applies_to_live_session() {
    let state = test_helpers::test_app_state();
    let (actor, token) = test_helpers::seed_session(&state, "rep", Role::SalesRep).await;
    assert!(actor.require(Module::Users, Action::View).is_err());

    state.store.write().await.users.get_mut(&actor.id).unwrap().user.role = Role::Admin;
    let refreshed = validate_session(&state, &token).await.unwrap();
    assert!(refreshed.require(Module::Users, Action::View).is_ok());
}

#[tokio::test]
async fn purge_only_removes_expired() {
    let state = test_helpers::test_app_state();
    let (actor, _token) = test_helpers::seed_session(&state, "rep", Role::SalesRep).await;
    state.sessions.write().await.insert(
        "stale".into(),
        Session { user_id: actor.id, expires_at: OffsetDateTime::now_utc() - Duration::minutes(1) },
    );

    assert_eq!(purge_expired_sessions(&state).await, 1);
    assert_eq!(state.sessions.read().await.len(), 1);
    assert_eq!(delete_user_sessions(&state, actor.id).await, 1);
}

#[test]
fn permission_denied_names_the_permission() {
    let err = PermissionDenied { module: Module::Users, action: Action::Delete };
    assert_eq!(err.to_string(), "permission denied: users:delete");
}
