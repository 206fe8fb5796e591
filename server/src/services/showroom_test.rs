use super::*;
use crate::state::test_helpers;
use domain::permissions::Role;
use time::Duration;

fn request(name: &str, days_out: i64) -> NewVisit {
    NewVisit {
        client_name: name.into(),
        email: Some("visitor@example.com".into()),
        phone: None,
        preferred_date: OffsetDateTime::now_utc() + Duration::days(days_out),
        assigned_to: None,
        notes: None,
    }
}

#[tokio::test]
async fn create_requires_contact_details() {
    let state = test_helpers::test_app_state();
    let (rep, _) = test_helpers::seed_session(&state, "rep", Role::SalesRep).await;

    let visit = create_visit(&state, &rep, request("Dana Reyes", 2)).await.unwrap();
    assert_eq!(visit.status, VisitStatus::Pending);

    let anonymous = NewVisit { email: None, phone: Some("  ".into()), ..request("Sam Ortiz", 2) };
    assert!(matches!(create_visit(&state, &rep, anonymous).await, Err(ShowroomError::Invalid(_))));
}

#[tokio::test]
async fn reps_claim_visits_for_themselves_only() {
    let state = test_helpers::test_app_state();
    let (rep, _) = test_helpers::seed_session(&state, "rep", Role::SalesRep).await;
    let (leader, _) = test_helpers::seed_session(&state, "leader", Role::SalesLeader).await;
    let visit = create_visit(&state, &leader, request("Dana Reyes", 1)).await.unwrap();

    let steal = VisitUpdate { assigned_to: Some(leader.id), ..VisitUpdate::default() };
    assert!(matches!(update_visit(&state, &rep, visit.id, steal).await, Err(ShowroomError::Invalid(_))));

    let claim = VisitUpdate { assigned_to: Some(rep.id), ..VisitUpdate::default() };
    let claimed = update_visit(&state, &rep, visit.id, claim).await.unwrap();
    assert_eq!(claimed.assigned_to, Some(rep.id));
    assert_eq!(claimed.status, VisitStatus::Scheduled);
}

#[tokio::test]
async fn reps_do_not_see_visits_assigned_elsewhere() {
    let state = test_helpers::test_app_state();
    let (rep, _) = test_helpers::seed_session(&state, "rep", Role::SalesRep).await;
    let (leader, _) = test_helpers::seed_session(&state, "leader", Role::SalesLeader).await;

    create_visit(&state, &leader, request("Later", 5)).await.unwrap();
    let assigned = NewVisit { assigned_to: Some(leader.id), ..request("Leader's", 1) };
    let theirs = create_visit(&state, &leader, assigned).await.unwrap();

    let visible = list_visits(&state, &rep, &VisitFilter::default()).await.unwrap();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].client_name, "Later");

    let all = list_visits(&state, &leader, &VisitFilter::default()).await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].id, theirs.id, "soonest first");

    let update = VisitUpdate { notes: Some("x".into()), ..VisitUpdate::default() };
    assert!(matches!(update_visit(&state, &rep, theirs.id, update).await, Err(ShowroomError::NotFound(_))));
}

#[tokio::test]
async fn completed_visits_are_closed() {
    let state = test_helpers::test_app_state();
    let (leader, _) = test_helpers::seed_session(&state, "leader", Role::SalesLeader).await;
    let visit = create_visit(&state, &leader, request("Dana Reyes", 1)).await.unwrap();

    let done = VisitUpdate { status: Some(VisitStatus::Completed), ..VisitUpdate::default() };
    update_visit(&state, &leader, visit.id, done).await.unwrap();

    let reopen = VisitUpdate { status: Some(VisitStatus::Scheduled), ..VisitUpdate::default() };
    let err = update_visit(&state, &leader, visit.id, reopen).await.unwrap_err();
    assert_eq!(err.to_string(), "visit is completed and can no longer change");
}

#[tokio::test]
async fn delete_needs_permission_and_records_activity() {
    let state = test_helpers::test_app_state();
    let (rep, _) = test_helpers::seed_session(&state, "rep", Role::SalesRep).await;
    let (leader, _) = test_helpers::seed_session(&state, "leader", Role::SalesLeader).await;
    let visit = create_visit(&state, &rep, request("Dana Reyes", 1)).await.unwrap();

    assert!(matches!(delete_visit(&state, &rep, visit.id).await, Err(ShowroomError::Denied(_))));
    delete_visit(&state, &leader, visit.id).await.unwrap();

    let store = state.store.read().await;
    assert!(store.visits.is_empty());
    assert_eq!(store.activities.back().map(|a| a.action.as_str()), Some("deleted"));
}
