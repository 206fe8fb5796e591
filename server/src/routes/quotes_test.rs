use super::*;
use domain::pricing::PricingError;
use rust_decimal::Decimal;

#[test]
fn quote_errors_map_to_statuses() {
    let cases = [
        (QuoteError::NotFound(Uuid::nil()), StatusCode::NOT_FOUND),
        (QuoteError::LineItemNotFound(Uuid::nil()), StatusCode::NOT_FOUND),
        (QuoteError::ProductNotFound(Uuid::nil()), StatusCode::BAD_REQUEST),
        (QuoteError::Pricing(PricingError::NegativeQuantity(Decimal::NEGATIVE_ONE)), StatusCode::BAD_REQUEST),
        (QuoteError::Locked(QuoteStatus::Expired), StatusCode::CONFLICT),
    ];
    for (err, status) in cases {
        assert_eq!(quote_error_to_status(&err), status, "{err}");
    }
}

#[test]
fn stage_body_accepts_display_labels() {
    let body: StageBody = serde_json::from_str(r#"{"stage":"At Risk"}"#).unwrap();
    assert_eq!(body.stage, PipelineStage::AtRisk);
    let body: StageBody = serde_json::from_str(r#"{"stage":"In-Flight"}"#).unwrap();
    assert_eq!(body.stage, PipelineStage::Active);
}

#[test]
fn sales_rep_body_allows_unassigning() {
    let body: SalesRepBody = serde_json::from_str(r#"{"sales_rep_id":null}"#).unwrap();
    assert_eq!(body.sales_rep_id, None);
}

#[test]
fn locked_message_names_the_status() {
    let err: ApiError = QuoteError::Locked(QuoteStatus::Rejected).into();
    assert_eq!(err.message, "quote is rejected and can no longer be edited");
}
