use super::*;
use axum::http::Uri;
use domain::inventory::InventoryStage;
use rust_decimal::Decimal;

#[test]
fn inventory_errors_map_to_statuses() {
    assert_eq!(inventory_error_to_status(&InventoryError::NotFound(Uuid::nil())), StatusCode::NOT_FOUND);
    assert_eq!(inventory_error_to_status(&InventoryError::SlabNotFound(Uuid::nil())), StatusCode::NOT_FOUND);
    assert_eq!(inventory_error_to_status(&InventoryError::Conflict("dup".into())), StatusCode::CONFLICT);
    let sold = InventoryError::Transition { from: SlabStatus::Sold, to: SlabStatus::Available };
    assert_eq!(inventory_error_to_status(&sold), StatusCode::CONFLICT);
    assert_eq!(inventory_error_to_status(&InventoryError::Invalid("bad".into())), StatusCode::BAD_REQUEST);
}

#[test]
fn product_filter_parses_from_query_string() {
    let uri: Uri = "/api/products?category=quartz&min_price=40.50&stage=Active&include_inactive=true"
        .parse()
        .unwrap();
    let Query(filter) = Query::<ProductFilter>::try_from_uri(&uri).unwrap();
    assert_eq!(filter.category.as_deref(), Some("quartz"));
    assert_eq!(filter.min_price, Some(Decimal::new(4_050, 2)));
    assert_eq!(filter.stage, Some(InventoryStage::Active));
    assert!(filter.include_inactive);
    assert_eq!(filter.search, None);
}

#[test]
fn slab_status_body_uses_display_names() {
    let body: SlabStatusBody = serde_json::from_str(r#"{"status":"On Hold"}"#).unwrap();
    assert_eq!(body.status, SlabStatus::OnHold);
}
