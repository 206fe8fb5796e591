use super::*;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).expect("decimal literal")
}

#[test]
fn round_money_uses_midpoint_away_from_zero() {
    assert_eq!(round_money(dec("2.345")), dec("2.35"));
    assert_eq!(round_money(dec("2.344")), dec("2.34"));
    assert_eq!(round_money(dec("-2.345")), dec("-2.35"));
}

#[test]
fn round_rate_keeps_four_places() {
    assert_eq!(round_rate(dec("0.08505")), dec("0.0851"));
    assert_eq!(round_rate(dec("0.085")), dec("0.0850"));
}

#[test]
fn parse_money_accepts_dollar_sign_and_commas() {
    assert_eq!(parse_money("$1,250.00").unwrap(), dec("1250.00"));
    assert_eq!(parse_money("  99.9 ").unwrap(), dec("99.90"));
    assert_eq!(parse_money("0").unwrap(), Decimal::ZERO);
}

#[test]
fn parse_money_rejects_bad_input() {
    assert_eq!(parse_money("   "), Err(MoneyError::Empty));
    assert!(matches!(parse_money("12.3.4"), Err(MoneyError::Invalid(_))));
    assert!(matches!(parse_money("-5"), Err(MoneyError::Negative(_))));
}

#[test]
fn format_money_groups_thousands() {
    assert_eq!(format_money(dec("1234.5")), "$1,234.50");
    assert_eq!(format_money(dec("1234567.891")), "$1,234,567.89");
    assert_eq!(format_money(dec("12")), "$12.00");
    assert_eq!(format_money(dec("-950")), "-$950.00");
    assert_eq!(format_money(Decimal::ZERO), "$0.00");
}

#[test]
fn safe_ratio_handles_zero_denominator() {
    assert_eq!(safe_ratio(dec("5"), Decimal::ZERO), Decimal::ZERO);
    assert_eq!(safe_ratio(dec("1"), dec("4")), dec("0.25"));
}
