//! Runtime configuration
//!
//! Every setting can be overridden from the environment:
//!
//! | Env var | Default | Meaning |
//! |---------|---------|---------|
//! | ZEN_WITHDRAWAL_FEE_PERCENT | 8 | withdrawal fee, percent of the gross amount |
//! | ZEN_TRANSITION_POLICY | permissive | `permissive` or `strict` order transitions |
//! | ZEN_STATS_TTL_SECS | 30 | wallet stats cache TTL |
//! | ZEN_HTTP_PORT | 4000 | `serve` listen port |
//! | ZEN_CURRENCY | INR | currency assigned to new wallets |
//!
//! The log filter (`ZEN_LEDGER_LOG`) is read by [`crate::logging`].
//!
//! Unparseable values fall back to the default with a warning.

use crate::core::withdrawal::DEFAULT_FEE_PERCENT;
use crate::types::TransitionPolicy;
use rust_decimal::Decimal;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

pub const FEE_PERCENT_VAR: &str = "ZEN_WITHDRAWAL_FEE_PERCENT";
pub const POLICY_VAR: &str = "ZEN_TRANSITION_POLICY";
pub const STATS_TTL_VAR: &str = "ZEN_STATS_TTL_SECS";
pub const HTTP_PORT_VAR: &str = "ZEN_HTTP_PORT";
pub const CURRENCY_VAR: &str = "ZEN_CURRENCY";

#[derive(Debug, Clone, PartialEq)]
pub struct LedgerConfig {
    /// Withdrawal fee, percent of the gross amount
    pub fee_percent: Decimal,
    pub transition_policy: TransitionPolicy,
    pub stats_ttl: Duration,
    pub http_port: u16,
    /// Currency of lazily created wallets
    pub currency: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            fee_percent: DEFAULT_FEE_PERCENT,
            transition_policy: TransitionPolicy::Permissive,
            stats_ttl: Duration::from_secs(30),
            http_port: 4000,
            currency: "INR".to_string(),
        }
    }
}

impl LedgerConfig {
    /// Load from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let fee_percent = parse_or(&lookup, FEE_PERCENT_VAR, defaults.fee_percent);
        let fee_percent = if fee_percent.is_sign_negative() || fee_percent > Decimal::ONE_HUNDRED {
            warn!(%fee_percent, "withdrawal fee must be between 0 and 100, using default");
            defaults.fee_percent
        } else {
            fee_percent
        };

        let currency = lookup(CURRENCY_VAR)
            .map(|value| value.trim().to_uppercase())
            .filter(|value| !value.is_empty())
            .unwrap_or(defaults.currency);

        Self {
            fee_percent,
            transition_policy: parse_or(&lookup, POLICY_VAR, defaults.transition_policy),
            stats_ttl: Duration::from_secs(parse_or(
                &lookup,
                STATS_TTL_VAR,
                defaults.stats_ttl.as_secs(),
            )),
            http_port: parse_or(&lookup, HTTP_PORT_VAR, defaults.http_port),
            currency,
        }
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Display,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(e) => {
                warn!(key, value = %raw, error = %e, %default, "invalid config value, using default");
                default
            }
        },
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = LedgerConfig::from_lookup(lookup(&[]));
        assert_eq!(config, LedgerConfig::default());
        assert_eq!(config.fee_percent, Decimal::from(8));
    }

    #[test]
    fn test_overrides_are_applied() {
        let config = LedgerConfig::from_lookup(lookup(&[
            (FEE_PERCENT_VAR, "2.5"),
            (POLICY_VAR, "strict"),
            (STATS_TTL_VAR, "5"),
            (HTTP_PORT_VAR, "8080"),
            (CURRENCY_VAR, "usd"),
        ]));

        assert_eq!(config.fee_percent, Decimal::new(25, 1));
        assert_eq!(config.transition_policy, TransitionPolicy::Strict);
        assert_eq!(config.stats_ttl, Duration::from_secs(5));
        assert_eq!(config.http_port, 8080);
        assert_eq!(config.currency, "USD");
    }

    #[rstest]
    #[case(FEE_PERCENT_VAR, "eight")]
    #[case(FEE_PERCENT_VAR, "-1")]
    #[case(FEE_PERCENT_VAR, "150")]
    #[case(POLICY_VAR, "lenient")]
    #[case(STATS_TTL_VAR, "-3")]
    #[case(HTTP_PORT_VAR, "70000")]
    #[case(CURRENCY_VAR, "  ")]
    fn test_invalid_values_fall_back(#[case] key: &str, #[case] value: &str) {
        let config = LedgerConfig::from_lookup(lookup(&[(key, value)]));
        assert_eq!(config, LedgerConfig::default());
    }
}
