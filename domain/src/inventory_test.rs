use std::str::FromStr;

use super::*;
use time::macros::datetime;
use uuid::Uuid;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).expect("decimal literal")
}

fn product(name: &str, category: &str, price: &str, stock: i64) -> Product {
    Product {
        id: Uuid::new_v4(),
        bundle_id: format!("B-{}", name.to_uppercase().replace(' ', "-")),
        name: name.into(),
        description: None,
        supplier: "Arizona Tile".into(),
        category: category.into(),
        grade: "premium".into(),
        thickness: "3cm".into(),
        finish: "Polished".into(),
        price: dec(price),
        wholesale_price: None,
        stock_quantity: stock,
        unit: "sqft".into(),
        location: None,
        stage: InventoryStage::Active,
        slab_length: Some(dec("126")),
        slab_width: Some(dec("63")),
        is_active: true,
        created_at: datetime!(2025-01-01 0:00 UTC),
    }
}

fn slab(product: &Product, status: SlabStatus, dims: Option<(&str, &str)>) -> Slab {
    Slab {
        id: Uuid::new_v4(),
        product_id: product.id,
        bundle_id: product.bundle_id.clone(),
        slab_number: "1".into(),
        length: dims.map(|(l, _)| dec(l)),
        width: dims.map(|(_, w)| dec(w)),
        status,
        location: None,
        notes: None,
        created_at: datetime!(2025-01-01 0:00 UTC),
    }
}

#[test]
fn empty_filter_matches_active_products() {
    let mut p = product("Calacatta Gold", "marble", "85", 10);
    assert!(ProductFilter::default().matches(&p));
    p.is_active = false;
    assert!(!ProductFilter::default().matches(&p));
    let filter = ProductFilter { include_inactive: true, ..ProductFilter::default() };
    assert!(filter.matches(&p));
}

#[test]
fn search_is_case_insensitive_across_fields() {
    let p = product("Calacatta Gold", "marble", "85", 10);
    for needle in ["calacatta", "B-CALACATTA", "arizona"] {
        let filter = ProductFilter { search: Some(needle.into()), ..ProductFilter::default() };
        assert!(filter.matches(&p), "search {needle:?} should match");
    }
    let filter = ProductFilter { search: Some("quartzite".into()), ..ProductFilter::default() };
    assert!(!filter.matches(&p));
}

#[test]
fn attribute_and_price_filters() {
    let p = product("Absolute Black", "granite", "45.50", 4);
    let category = ProductFilter { category: Some("GRANITE".into()), ..ProductFilter::default() };
    assert!(category.matches(&p));
    let wrong = ProductFilter { category: Some("quartz".into()), ..ProductFilter::default() };
    assert!(!wrong.matches(&p));
    let band = ProductFilter { min_price: Some(dec("40")), max_price: Some(dec("50")), ..ProductFilter::default() };
    assert!(band.matches(&p));
    let too_cheap = ProductFilter { max_price: Some(dec("45")), ..ProductFilter::default() };
    assert!(!too_cheap.matches(&p));
    let held = ProductFilter { stage: Some(InventoryStage::Hold), ..ProductFilter::default() };
    assert!(!held.matches(&p));
}

#[test]
fn bundle_summary_counts_and_area() {
    let p = product("Taj Mahal", "quartz", "95", 3);
    let slabs = vec![
        slab(&p, SlabStatus::Available, None),
        slab(&p, SlabStatus::Available, Some(("120", "60"))),
        slab(&p, SlabStatus::OnHold, None),
        slab(&p, SlabStatus::Sold, None),
    ];
    let summary = BundleSummary::from_slabs(&p, &slabs);
    assert_eq!(summary.total_slabs, 4);
    assert_eq!(summary.available, 2);
    assert_eq!(summary.on_hold, 1);
    assert_eq!(summary.sold, 1);
    // 55.13 (nominal 126x63) + 50.00 (120x60)
    assert_eq!(summary.available_sqft, dec("105.13"));
}

#[test]
fn bundle_summary_ignores_other_products() {
    let a = product("A", "quartz", "10", 1);
    let b = product("B", "quartz", "10", 1);
    let summary = BundleSummary::from_slabs(&a, &[slab(&b, SlabStatus::Available, None)]);
    assert_eq!(summary.total_slabs, 0);
    assert_eq!(summary.available_sqft, Decimal::ZERO);
}

#[test]
fn sold_slabs_stay_sold() {
    assert!(SlabStatus::Available.can_transition_to(SlabStatus::OnHold));
    assert!(SlabStatus::OnHold.can_transition_to(SlabStatus::Available));
    assert!(SlabStatus::OnHold.can_transition_to(SlabStatus::Sold));
    assert!(!SlabStatus::Sold.can_transition_to(SlabStatus::Available));
}

#[test]
fn category_rollup_sums_stock_value() {
    let products = vec![
        product("A", "granite", "10.00", 5),
        product("B", "granite", "2.50", 4),
        product("C", "marble", "100", 1),
    ];
    let rollup = inventory_by_category(&products);
    assert_eq!(rollup.len(), 2);
    assert_eq!(rollup[0].category, "granite");
    assert_eq!(rollup[0].products, 2);
    assert_eq!(rollup[0].stock_quantity, 9);
    assert_eq!(rollup[0].stock_value, dec("60.00"));
    assert_eq!(rollup[1].category, "marble");
}

#[test]
fn slab_status_uses_display_label() {
    assert_eq!(serde_json::to_string(&SlabStatus::OnHold).unwrap(), r#""On Hold""#);
}

#[test]
fn category_rollup_saturates_on_absurd_stock() {
    let products = vec![
        product("A", "granite", "79228162514264337593543950335", i64::MAX),
        product("B", "granite", "1", 1),
    ];
    let rollup = inventory_by_category(&products);
    assert_eq!(rollup[0].stock_quantity, i64::MAX);
    assert_eq!(rollup[0].stock_value, Decimal::MAX);
}
