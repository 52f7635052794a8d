//! Wallet-related types
//!
//! A wallet is the cached running total of a user's ledger. Its balance is
//! only ever changed by the wallet store, inside the same critical section
//! that appends the matching ledger entry.

use super::ids::{Minor, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Per-user wallet state
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Wallet {
    /// Owner of the wallet (one wallet per user)
    pub user_id: UserId,

    /// Spendable balance in minor units
    ///
    /// Never negative after a committed mutation.
    pub balance: Minor,

    /// ISO currency code
    pub currency: String,

    /// Whether the user asked for automatic top-ups
    pub auto_recharge_enabled: bool,

    /// Amount to top up by when auto-recharge fires
    pub auto_recharge_amount: Minor,

    /// Balance below which auto-recharge should fire
    pub min_auto_recharge_threshold: Minor,

    /// Number of committed mutations
    pub version: u64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Wallet {
    /// Create a new wallet with zero balance and auto-recharge disabled
    pub fn new(user_id: UserId, currency: &str) -> Self {
        let now = Utc::now();
        Wallet {
            user_id,
            balance: 0,
            currency: currency.to_string(),
            auto_recharge_enabled: false,
            auto_recharge_amount: 0,
            min_auto_recharge_threshold: 0,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether auto-recharge is enabled and the balance sits below the threshold
    pub fn needs_recharge(&self) -> bool {
        self.auto_recharge_enabled && self.balance < self.min_auto_recharge_threshold
    }
}

/// Auto-recharge settings submitted by the wallet owner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoRechargeSettings {
    pub enabled: bool,
    #[serde(default)]
    pub amount: Minor,
    #[serde(default)]
    pub threshold: Minor,
}

/// Render minor units as major units with two decimals (10000 -> "100.00")
pub fn format_minor(amount: Minor) -> String {
    format!("{:.2}", Decimal::new(amount, 2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_new_wallet_is_empty() {
        let wallet = Wallet::new(1, "INR");

        assert_eq!(wallet.user_id, 1);
        assert_eq!(wallet.balance, 0);
        assert_eq!(wallet.currency, "INR");
        assert_eq!(wallet.version, 0);
        assert!(!wallet.auto_recharge_enabled);
    }

    #[rstest]
    #[case::disabled(false, 100, 500, false)]
    #[case::below_threshold(true, 100, 500, true)]
    #[case::at_threshold(true, 500, 500, false)]
    fn test_needs_recharge(
        #[case] enabled: bool,
        #[case] balance: Minor,
        #[case] threshold: Minor,
        #[case] expected: bool,
    ) {
        let mut wallet = Wallet::new(1, "INR");
        wallet.auto_recharge_enabled = enabled;
        wallet.balance = balance;
        wallet.min_auto_recharge_threshold = threshold;

        assert_eq!(wallet.needs_recharge(), expected);
    }

    #[rstest]
    #[case(15000, "150.00")]
    #[case(5, "0.05")]
    #[case(0, "0.00")]
    #[case(123456, "1234.56")]
    fn test_format_minor(#[case] amount: Minor, #[case] expected: &str) {
        assert_eq!(format_minor(amount), expected);
    }
}
