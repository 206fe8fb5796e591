use super::*;
use domain::permissions::Role;

#[test]
fn quote_numbers_count_per_year() {
    let mut store = Store::new();
    assert_eq!(store.next_quote_number(2025), "Q-2025-0001");
    assert_eq!(store.next_quote_number(2025), "Q-2025-0002");
    assert_eq!(store.next_quote_number(2026), "Q-2026-0001");
}

#[tokio::test]
async fn find_user_by_username_ignores_case() {
    let state = test_helpers::test_app_state();
    let user = test_helpers::seed_user(&state, "mgarcia", Role::SalesRep).await;

    let store = state.store.read().await;
    assert_eq!(store.find_user_by_username(" MGarcia ").map(|r| r.user.id), Some(user.id));
    assert!(store.find_user_by_username("nobody").is_none());
}

#[tokio::test]
async fn new_state_starts_empty() {
    let state = test_helpers::test_app_state();
    assert!(state.sessions.read().await.is_empty());
    let store = state.store.read().await;
    assert!(store.quotes.is_empty());
    assert!(store.activities.is_empty());
}
