use super::*;
use crate::state::{Session, test_helpers};
use domain::permissions::Role;
use rust_decimal::Decimal;
use time::Duration;

#[tokio::test]
async fn health_counts_records_for_admins_only() {
    let state = test_helpers::test_app_state();
    let (admin, _) = test_helpers::seed_session(&state, "admin", Role::Admin).await;
    let (leader, _) = test_helpers::seed_session(&state, "leader", Role::SalesLeader).await;
    test_helpers::seed_product(&state, "Calacatta", Decimal::new(50, 0)).await;

    let report = health(&state, &admin).await.unwrap();
    assert_eq!(report.status, "ok");
    assert_eq!(report.records.users, 2);
    assert_eq!(report.records.products, 1);
    assert_eq!(report.active_sessions, 2);

    assert!(matches!(health(&state, &leader).await, Err(AdminError::Denied(_))));
}

#[tokio::test]
async fn purge_sessions_drops_expired_tokens() {
    let state = test_helpers::test_app_state();
    let (admin, token) = test_helpers::seed_session(&state, "admin", Role::Admin).await;
    state.sessions.write().await.insert(
        "stale".into(),
        Session { user_id: admin.id, expires_at: OffsetDateTime::now_utc() - Duration::minutes(1) },
    );

    let report = run_maintenance(&state, &admin, MaintenanceAction::PurgeSessions).await.unwrap();
    assert_eq!(report.affected, 1);
    let sessions = state.sessions.read().await;
    assert!(sessions.contains_key(&token));
    assert!(!sessions.contains_key("stale"));
}

#[tokio::test]
async fn expire_action_is_audited() {
    let state = test_helpers::test_app_state();
    let (admin, _) = test_helpers::seed_session(&state, "admin", Role::Admin).await;
    let client = test_helpers::seed_client(&state, "Dana Reyes", None).await;
    let product = test_helpers::seed_product(&state, "Calacatta", Decimal::new(50, 0)).await;
    let quote = quotes::create_quote(&state, &admin, test_helpers::quote_input(client.id, product.id, Decimal::ONE))
        .await
        .unwrap();
    state.store.write().await.quotes.get_mut(&quote.id).unwrap().valid_until =
        OffsetDateTime::now_utc() - Duration::days(3);

    let report = run_maintenance(&state, &admin, MaintenanceAction::ExpireStaleQuotes).await.unwrap();
    assert_eq!(report, MaintenanceReport { action: MaintenanceAction::ExpireStaleQuotes, affected: 1 });

    let store = state.store.read().await;
    let last = store.activities.back().unwrap();
    assert_eq!(last.entity_type, EntityKind::System);
    assert_eq!(last.action, "expire_stale_quotes");
}

#[tokio::test]
async fn maintenance_needs_system_edit() {
    let state = test_helpers::test_app_state();
    let (stock, _) = test_helpers::seed_session(&state, "stock", Role::InventorySpecialist).await;
    let result = run_maintenance(&state, &stock, MaintenanceAction::RecalculateTotals).await;
    assert!(matches!(result, Err(AdminError::Denied(_))));
}

#[test]
fn actions_parse_from_snake_case() {
    let request: MaintenanceRequest = serde_json::from_str(r#"{"action":"recalculate_totals"}"#).unwrap();
    assert_eq!(request.action, MaintenanceAction::RecalculateTotals);
    assert!(serde_json::from_str::<MaintenanceRequest>(r#"{"action":"drop_tables"}"#).is_err());
}
