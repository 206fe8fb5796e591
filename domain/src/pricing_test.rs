use super::*;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).expect("decimal literal")
}

fn line(quantity: &str, unit_price: &str) -> LineInput {
    LineInput { quantity: dec(quantity), unit_price: dec(unit_price) }
}

#[test]
fn default_policy_matches_published_rates() {
    let policy = PricingPolicy::default();
    assert_eq!(policy.tax_rate, dec("0.085"));
    assert_eq!(policy.processing_fee_rate, dec("0.035"));
}

#[test]
fn policy_rejects_out_of_range_rates() {
    assert_eq!(PricingPolicy::new(dec("1.5"), dec("0.035")), Err(PricingError::InvalidRate(dec("1.5"))));
    assert!(PricingPolicy::new(dec("0.085"), dec("-0.01")).is_err());
    assert!(PricingPolicy::new(Decimal::ZERO, Decimal::ONE).is_ok());
}

#[test]
fn line_total_rounds_to_cents() {
    assert_eq!(line_total(dec("52.17"), dec("45.99")).unwrap(), dec("2399.30"));
    assert_eq!(line_total(Decimal::ZERO, dec("10")).unwrap(), Decimal::ZERO);
}

#[test]
fn line_total_rejects_negatives() {
    assert_eq!(line_total(dec("-1"), dec("10")), Err(PricingError::NegativeQuantity(dec("-1"))));
    assert_eq!(line_total(dec("1"), dec("-10")), Err(PricingError::NegativePrice(dec("-10"))));
}

#[test]
fn slab_area_converts_inches_to_square_feet() {
    // 126" x 63" jumbo quartz slab.
    assert_eq!(slab_area_sqft(dec("126"), dec("63")).unwrap(), dec("55.13"));
    assert_eq!(slab_area_sqft(dec("144"), dec("12")).unwrap(), dec("12"));
}

#[test]
fn slab_area_rejects_non_positive_dimensions() {
    assert_eq!(slab_area_sqft(Decimal::ZERO, dec("63")), Err(PricingError::InvalidDimension(Decimal::ZERO)));
    assert!(slab_area_sqft(dec("126"), dec("-1")).is_err());
}

#[test]
fn totals_without_processing_fee() {
    let totals = compute_totals(&[line("2", "500"), line("10.5", "12")], false, PricingPolicy::default()).unwrap();
    assert_eq!(totals.subtotal, dec("1126.00"));
    assert_eq!(totals.processing_fee, Decimal::ZERO);
    assert_eq!(totals.tax_amount, dec("95.71"));
    assert_eq!(totals.total, dec("1221.71"));
    assert!(totals.verify());
}

#[test]
fn totals_with_processing_fee_do_not_tax_the_fee() {
    let totals = compute_totals(&[line("1", "1000")], true, PricingPolicy::default()).unwrap();
    assert_eq!(totals.subtotal, dec("1000"));
    assert_eq!(totals.processing_fee, dec("35.00"));
    assert_eq!(totals.tax_amount, dec("85.00"));
    assert_eq!(totals.total, dec("1120.00"));
}

#[test]
fn empty_quote_is_all_zero() {
    let totals = compute_totals(&[], true, PricingPolicy::default()).unwrap();
    assert_eq!(totals, QuoteTotals::default());
    assert!(totals.verify());
}

#[test]
fn custom_tax_rate_override() {
    let policy = PricingPolicy::default().with_tax_rate(dec("0.0725")).unwrap();
    let totals = compute_totals(&[line("3", "99.99")], false, policy).unwrap();
    assert_eq!(totals.subtotal, dec("299.97"));
    assert_eq!(totals.tax_amount, dec("21.75"));
    assert_eq!(totals.total, dec("321.72"));
}

#[test]
fn invalid_line_fails_the_whole_quote() {
    let result = compute_totals(&[line("1", "10"), line("-2", "10")], false, PricingPolicy::default());
    assert_eq!(result, Err(PricingError::NegativeQuantity(dec("-2"))));
}

#[test]
fn verify_detects_tampered_total() {
    let mut totals = compute_totals(&[line("1", "10")], false, PricingPolicy::default()).unwrap();
    totals.total += dec("0.01");
    assert!(!totals.verify());
}

#[test]
fn oversized_inputs_are_refused_instead_of_overflowing() {
    let huge = Decimal::MAX;
    assert_eq!(
        line_total(huge, dec("2")),
        Err(PricingError::TooLarge { field: "quantity", value: huge, max: MAX_QUANTITY })
    );
    assert!(matches!(line_total(dec("1"), huge), Err(PricingError::TooLarge { field: "unit price", .. })));
    assert!(matches!(slab_area_sqft(huge, dec("63")), Err(PricingError::TooLarge { .. })));

    let lines = [line("1", "10"), line("79228162514264337593543950335", "2")];
    let result = compute_totals(&lines, true, PricingPolicy::default());
    assert!(matches!(result, Err(PricingError::TooLarge { field: "quantity", .. })));
}

#[test]
fn largest_accepted_line_still_prices() {
    let lines = [LineInput { quantity: MAX_QUANTITY, unit_price: MAX_UNIT_PRICE }];
    let totals = compute_totals(&lines, true, PricingPolicy::default()).unwrap();
    assert_eq!(totals.subtotal, dec("1000000000000"));
    assert!(totals.verify());
    assert_eq!(slab_area_sqft(MAX_DIMENSION_IN, MAX_DIMENSION_IN).unwrap(), dec("6944.44"));
}
