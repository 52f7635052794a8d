//! Ledger entry types
//!
//! A `WalletTransaction` is written exactly once per balance mutation and is
//! never updated or deleted afterwards.

use super::ids::{Minor, TransactionId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Direction of a balance change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    /// Adds funds to the wallet
    Credit,

    /// Removes funds from the wallet; requires sufficient balance
    Debit,
}

impl EntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::Credit => "credit",
            EntryType::Debit => "debit",
        }
    }
}

impl std::str::FromStr for EntryType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "credit" => Ok(EntryType::Credit),
            "debit" => Ok(EntryType::Debit),
            other => Err(format!("Invalid entry type '{}'", other)),
        }
    }
}

/// Immutable ledger entry
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletTransaction {
    /// Ledger-assigned sequential identifier
    pub id: TransactionId,

    pub user_id: UserId,

    /// Positive amount in minor units
    pub amount: Minor,

    #[serde(rename = "type")]
    pub entry_type: EntryType,

    /// Free-text reason or category (e.g. "order_payment", "promo")
    pub reason: String,

    /// Loose back-reference to the order or withdrawal that caused the entry
    pub reference_id: Option<String>,

    pub balance_before: Minor,
    pub balance_after: Minor,

    /// Arbitrary JSON context (admin id, source, ...)
    pub metadata: Value,

    pub created_at: DateTime<Utc>,
}

impl WalletTransaction {
    /// Amount with the sign of its effect on the balance
    pub fn signed_amount(&self) -> Minor {
        match self.entry_type {
            EntryType::Credit => self.amount,
            EntryType::Debit => -self.amount,
        }
    }
}

/// Parameters of a single wallet mutation
///
/// Built with [`EntryRequest::new`] and the chained setters, then handed to
/// the wallet store's `credit`/`debit`.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryRequest {
    pub user_id: UserId,
    pub amount: Minor,
    pub reason: String,
    pub reference_id: Option<String>,
    pub metadata: Value,
}

impl EntryRequest {
    pub fn new(user_id: UserId, amount: Minor, reason: impl Into<String>) -> Self {
        EntryRequest {
            user_id,
            amount,
            reason: reason.into(),
            reference_id: None,
            metadata: Value::Null,
        }
    }

    pub fn reference(mut self, reference_id: impl Into<String>) -> Self {
        self.reference_id = Some(reference_id.into());
        self
    }

    pub fn maybe_reference(mut self, reference_id: Option<String>) -> Self {
        self.reference_id = reference_id;
        self
    }

    pub fn metadata(mut self, metadata: Value) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Page selection for ledger listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Pagination {
    #[serde(default = "Pagination::default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
}

impl Pagination {
    pub const DEFAULT_LIMIT: usize = 50;
    pub const MAX_LIMIT: usize = 500;

    pub fn new(limit: usize, offset: usize) -> Self {
        Pagination { limit, offset }
    }

    fn default_limit() -> usize {
        Self::DEFAULT_LIMIT
    }

    /// Limit clamped into 1..=MAX_LIMIT
    pub fn effective_limit(&self) -> usize {
        self.limit.clamp(1, Self::MAX_LIMIT)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Pagination::new(Self::DEFAULT_LIMIT, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("credit", EntryType::Credit)]
    #[case("DEBIT", EntryType::Debit)]
    #[case(" debit ", EntryType::Debit)]
    fn test_entry_type_parsing(#[case] input: &str, #[case] expected: EntryType) {
        assert_eq!(input.parse::<EntryType>().unwrap(), expected);
    }

    #[test]
    fn test_entry_type_rejects_unknown() {
        assert!("refund".parse::<EntryType>().is_err());
    }

    #[rstest]
    #[case::zero(0, 1)]
    #[case::normal(20, 20)]
    #[case::over_cap(10_000, Pagination::MAX_LIMIT)]
    fn test_effective_limit(#[case] limit: usize, #[case] expected: usize) {
        assert_eq!(Pagination::new(limit, 0).effective_limit(), expected);
    }

    #[test]
    fn test_entry_request_builder() {
        let request = EntryRequest::new(3, 500, "promo")
            .reference("order:9")
            .metadata(serde_json::json!({"source": "admin"}));

        assert_eq!(request.user_id, 3);
        assert_eq!(request.amount, 500);
        assert_eq!(request.reason, "promo");
        assert_eq!(request.reference_id.as_deref(), Some("order:9"));
        assert_eq!(request.metadata["source"], "admin");
    }
}
