use super::*;

// Env mutation requires unsafe in edition 2024. Each test uses its own keys
// so parallel runs do not interfere.

#[test]
fn env_parse_reads_valid_value() {
    unsafe { std::env::set_var("STONECRM_TEST_PARSE_OK", " 42 ") };
    assert_eq!(env_parse("STONECRM_TEST_PARSE_OK", 7_u32), 42);
    unsafe { std::env::remove_var("STONECRM_TEST_PARSE_OK") };
}

#[test]
fn env_parse_falls_back_on_garbage() {
    unsafe { std::env::set_var("STONECRM_TEST_PARSE_BAD", "forty-two") };
    assert_eq!(env_parse("STONECRM_TEST_PARSE_BAD", 7_u32), 7);
    unsafe { std::env::remove_var("STONECRM_TEST_PARSE_BAD") };
}

#[test]
fn env_parse_missing_uses_default() {
    assert_eq!(env_parse("STONECRM_TEST_PARSE_MISSING", 3_i64), 3);
}

#[test]
fn env_parse_decimal() {
    unsafe { std::env::set_var("STONECRM_TEST_PARSE_DEC", "0.0725") };
    assert_eq!(env_parse("STONECRM_TEST_PARSE_DEC", Decimal::ZERO), Decimal::new(725, 4));
    unsafe { std::env::remove_var("STONECRM_TEST_PARSE_DEC") };
}

#[test]
fn env_bool_accepts_common_spellings() {
    for (raw, expected) in [("1", Some(true)), ("YES", Some(true)), ("off", Some(false)), ("maybe", None)] {
        unsafe { std::env::set_var("STONECRM_TEST_BOOL", raw) };
        assert_eq!(env_bool("STONECRM_TEST_BOOL"), expected, "{raw}");
    }
    unsafe { std::env::remove_var("STONECRM_TEST_BOOL") };
    assert_eq!(env_bool("STONECRM_TEST_BOOL"), None);
}

#[test]
fn default_config_uses_house_rates() {
    let config = AppConfig::default();
    assert_eq!(config.pricing.tax_rate, DEFAULT_TAX_RATE);
    assert_eq!(config.pricing.processing_fee_rate, DEFAULT_PROCESSING_FEE_RATE);
    assert_eq!(config.approval_threshold, Decimal::new(10_000, 0));
    assert_eq!(config.quote_valid_days, 30);
    assert!(!config.cookie_secure);
}

#[test]
fn env_parse_falls_back_on_blank() {
    unsafe { std::env::set_var("STONECRM_TEST_PARSE_BLANK", "   ") };
    assert_eq!(env_parse("STONECRM_TEST_PARSE_BLANK", 9_u64), 9);
    unsafe { std::env::remove_var("STONECRM_TEST_PARSE_BLANK") };
}
