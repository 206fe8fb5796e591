//! Runtime configuration.
//!
//! DESIGN
//! ======
//! Every knob is an environment variable with a working default, so the
//! service boots with no configuration at all. Malformed values fall back to
//! the default with a warning rather than refusing to start.

use std::path::PathBuf;
use std::str::FromStr;

use domain::money::Money;
use domain::pricing::{DEFAULT_PROCESSING_FEE_RATE, DEFAULT_TAX_RATE, PricingPolicy};
use rust_decimal::Decimal;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_APPROVAL_THRESHOLD: Money = Decimal::from_parts(10_000, 0, 0, false, 0);
const DEFAULT_QUOTE_VALID_DAYS: i64 = 30;
const DEFAULT_SESSION_TTL_SECS: i64 = 60 * 60 * 12;
const DEFAULT_LOGIN_MAX_FAILURES: usize = 5;
const DEFAULT_LOGIN_LOCKOUT_SECS: u64 = 15 * 60;

pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: FromStr + Copy,
{
    let Ok(raw) = std::env::var(key) else {
        return default;
    };
    raw.trim().parse::<T>().unwrap_or_else(|_| {
        tracing::warn!(key, value = %raw, "invalid value, using default");
        default
    })
}

pub(crate) fn env_bool(key: &str) -> Option<bool> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => {
            tracing::warn!(key, value = %raw, "invalid boolean, ignoring");
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub port: u16,
    /// YAML file loaded into the store at startup.
    pub seed_file: Option<PathBuf>,
    pub pricing: PricingPolicy,
    /// Sales-rep quotes at or above this total start out pending approval.
    pub approval_threshold: Money,
    pub quote_valid_days: i64,
    pub session_ttl_secs: i64,
    pub login_max_failures: usize,
    pub login_lockout_secs: u64,
    pub cookie_secure: bool,
}

impl AppConfig {
    #[must_use]
    pub fn from_env() -> Self {
        let tax_rate = env_parse("TAX_RATE", DEFAULT_TAX_RATE);
        let fee_rate = env_parse("PROCESSING_FEE_RATE", DEFAULT_PROCESSING_FEE_RATE);
        let pricing = PricingPolicy::new(tax_rate, fee_rate).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "invalid pricing rates, using defaults");
            PricingPolicy::default()
        });

        let approval_threshold = env_parse("APPROVAL_THRESHOLD", DEFAULT_APPROVAL_THRESHOLD);

        Self {
            port: env_parse("PORT", DEFAULT_PORT),
            seed_file: std::env::var("SEED_FILE").ok().filter(|s| !s.trim().is_empty()).map(PathBuf::from),
            pricing,
            approval_threshold: if approval_threshold.is_sign_negative() {
                tracing::warn!(%approval_threshold, "negative APPROVAL_THRESHOLD, using default");
                DEFAULT_APPROVAL_THRESHOLD
            } else {
                approval_threshold
            },
            quote_valid_days: env_parse("QUOTE_VALID_DAYS", DEFAULT_QUOTE_VALID_DAYS).max(1),
            session_ttl_secs: env_parse("SESSION_TTL_SECS", DEFAULT_SESSION_TTL_SECS).max(60),
            login_max_failures: env_parse("LOGIN_MAX_FAILURES", DEFAULT_LOGIN_MAX_FAILURES).max(1),
            login_lockout_secs: env_parse("LOGIN_LOCKOUT_SECS", DEFAULT_LOGIN_LOCKOUT_SECS),
            cookie_secure: env_bool("COOKIE_SECURE").unwrap_or(false),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            seed_file: None,
            pricing: PricingPolicy::default(),
            approval_threshold: DEFAULT_APPROVAL_THRESHOLD,
            quote_valid_days: DEFAULT_QUOTE_VALID_DAYS,
            session_ttl_secs: DEFAULT_SESSION_TTL_SECS,
            login_max_failures: DEFAULT_LOGIN_MAX_FAILURES,
            login_lockout_secs: DEFAULT_LOGIN_LOCKOUT_SECS,
            cookie_secure: false,
        }
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
