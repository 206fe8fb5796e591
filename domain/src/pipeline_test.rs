use super::*;
use time::macros::datetime;

#[test]
fn stage_serializes_with_display_labels() {
    assert_eq!(serde_json::to_string(&PipelineStage::AtRisk).unwrap(), r#""At Risk""#);
    assert_eq!(serde_json::to_string(&PipelineStage::Won).unwrap(), r#""Won""#);
    let legacy: PipelineStage = serde_json::from_str(r#""In-Flight""#).unwrap();
    assert_eq!(legacy, PipelineStage::Active);
}

#[test]
fn stage_parsing_is_forgiving() {
    assert_eq!("at risk".parse::<PipelineStage>().unwrap(), PipelineStage::AtRisk);
    assert_eq!("AT_RISK".parse::<PipelineStage>().unwrap(), PipelineStage::AtRisk);
    assert_eq!("in-flight".parse::<PipelineStage>().unwrap(), PipelineStage::Active);
    assert!(matches!("lost".parse::<PipelineStage>(), Err(TransitionError::UnknownStage(_))));
}

#[test]
fn open_stages_move_freely() {
    for from in [PipelineStage::Active, PipelineStage::AtRisk, PipelineStage::Actioned] {
        for to in PipelineStage::ALL {
            assert!(from.can_transition_to(to), "{from} -> {to} should be allowed");
        }
    }
}

#[test]
fn closed_only_reopens_to_active() {
    assert_eq!(PipelineStage::Closed.transition(PipelineStage::Active), Ok(PipelineStage::Active));
    assert_eq!(
        PipelineStage::Closed.transition(PipelineStage::Won),
        Err(TransitionError::Stage { from: PipelineStage::Closed, to: PipelineStage::Won })
    );
}

#[test]
fn won_is_terminal() {
    assert!(PipelineStage::Won.can_transition_to(PipelineStage::Won));
    for to in [PipelineStage::Active, PipelineStage::AtRisk, PipelineStage::Actioned, PipelineStage::Closed] {
        assert!(!PipelineStage::Won.can_transition_to(to));
    }
}

#[test]
fn status_approval_flow() {
    assert!(QuoteStatus::Draft.can_transition_to(QuoteStatus::Pending));
    assert!(QuoteStatus::Pending.can_transition_to(QuoteStatus::Approved));
    assert!(QuoteStatus::Pending.can_transition_to(QuoteStatus::Rejected));
    assert!(QuoteStatus::Approved.can_transition_to(QuoteStatus::Sent));
    assert!(!QuoteStatus::Pending.can_transition_to(QuoteStatus::Sent));
    assert!(!QuoteStatus::Approved.can_transition_to(QuoteStatus::Draft));
}

#[test]
fn rejected_only_returns_to_draft() {
    assert!(QuoteStatus::Rejected.can_transition_to(QuoteStatus::Draft));
    assert!(!QuoteStatus::Rejected.can_transition_to(QuoteStatus::Expired));
    assert!(!QuoteStatus::Rejected.can_transition_to(QuoteStatus::Approved));
}

#[test]
fn expired_is_reachable_from_live_statuses_and_terminal() {
    for from in [QuoteStatus::Draft, QuoteStatus::Pending, QuoteStatus::Approved, QuoteStatus::Sent] {
        assert!(from.can_transition_to(QuoteStatus::Expired));
    }
    assert_eq!(
        QuoteStatus::Expired.transition(QuoteStatus::Approved),
        Err(TransitionError::Status { from: QuoteStatus::Expired, to: QuoteStatus::Approved })
    );
}

#[test]
fn status_round_trips_lowercase() {
    assert_eq!(serde_json::to_string(&QuoteStatus::Pending).unwrap(), r#""pending""#);
    assert_eq!("SENT".parse::<QuoteStatus>().unwrap(), QuoteStatus::Sent);
    assert!("archived".parse::<QuoteStatus>().is_err());
}

#[test]
fn expiry_depends_on_date_and_status() {
    let valid_until = datetime!(2025-06-30 23:59 UTC);
    let before = datetime!(2025-06-15 12:00 UTC);
    let after = datetime!(2025-07-01 00:00 UTC);
    assert!(!is_expired(valid_until, before, QuoteStatus::Approved));
    assert!(is_expired(valid_until, after, QuoteStatus::Approved));
    assert!(is_expired(valid_until, after, QuoteStatus::Sent));
    assert!(!is_expired(valid_until, after, QuoteStatus::Rejected));
    assert!(!is_expired(valid_until, after, QuoteStatus::Expired));
}

#[test]
fn large_rep_quotes_need_approval() {
    let threshold = Decimal::new(10_000, 0);
    assert_eq!(initial_status(Decimal::new(10_000, 0), threshold, Role::SalesRep), QuoteStatus::Pending);
    assert_eq!(initial_status(Decimal::new(9_999_99, 2), threshold, Role::SalesRep), QuoteStatus::Approved);
    assert_eq!(initial_status(Decimal::new(50_000, 0), threshold, Role::SalesLeader), QuoteStatus::Approved);
    assert_eq!(initial_status(Decimal::new(50_000, 0), threshold, Role::Admin), QuoteStatus::Approved);
}
