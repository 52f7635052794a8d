//! Withdrawal request types
//!
//! Requests use reservation-by-debit: the gross amount leaves the wallet when
//! the request is created, and is credited back if the request ends up
//! rejected or failed.

use super::error::LedgerError;
use super::ids::{Minor, PayoutMethodId, TransactionId, UserId, WithdrawalId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Payout pipeline status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WithdrawalStatus {
    Pending,
    Processing,
    Approved,
    Rejected,
    Paid,
    Failed,
}

impl WithdrawalStatus {
    pub const ALL: [WithdrawalStatus; 6] = [
        WithdrawalStatus::Pending,
        WithdrawalStatus::Processing,
        WithdrawalStatus::Approved,
        WithdrawalStatus::Rejected,
        WithdrawalStatus::Paid,
        WithdrawalStatus::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WithdrawalStatus::Pending => "pending",
            WithdrawalStatus::Processing => "processing",
            WithdrawalStatus::Approved => "approved",
            WithdrawalStatus::Rejected => "rejected",
            WithdrawalStatus::Paid => "paid",
            WithdrawalStatus::Failed => "failed",
        }
    }

    /// Records in these states can no longer change
    pub fn is_terminal(&self) -> bool {
        matches!(self, WithdrawalStatus::Rejected | WithdrawalStatus::Paid)
    }

    /// Entering these states returns the reserved funds to the wallet
    pub fn returns_funds(&self) -> bool {
        matches!(self, WithdrawalStatus::Rejected | WithdrawalStatus::Failed)
    }

    /// Entering these states stamps `processed_at`
    pub fn is_processed(&self) -> bool {
        !matches!(self, WithdrawalStatus::Pending | WithdrawalStatus::Processing)
    }

    fn pipeline_index(&self) -> Option<usize> {
        match self {
            WithdrawalStatus::Pending => Some(0),
            WithdrawalStatus::Processing => Some(1),
            WithdrawalStatus::Approved => Some(2),
            WithdrawalStatus::Paid => Some(3),
            WithdrawalStatus::Rejected | WithdrawalStatus::Failed => None,
        }
    }

    /// Whether a non-terminal request in `self` may move to `next`
    pub fn allows(&self, next: WithdrawalStatus) -> bool {
        if *self == next {
            return true;
        }

        match (self, next) {
            (WithdrawalStatus::Failed, WithdrawalStatus::Rejected) => true,
            (WithdrawalStatus::Failed, _) => false,
            (_, WithdrawalStatus::Rejected | WithdrawalStatus::Failed) => true,
            (from, to) => match (from.pipeline_index(), to.pipeline_index()) {
                (Some(from), Some(to)) => to > from,
                _ => false,
            },
        }
    }
}

impl fmt::Display for WithdrawalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WithdrawalStatus {
    type Err = LedgerError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == trimmed)
            .ok_or_else(|| LedgerError::invalid_status("withdrawal", value))
    }
}

/// Payout request against a user's wallet
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalRequest {
    pub id: WithdrawalId,
    pub user_id: UserId,
    pub payout_method_id: PayoutMethodId,

    /// Gross amount, debited from the wallet at creation
    pub amount: Minor,

    /// Deducted from the payout, never debited from the wallet separately
    pub fee_amount: Minor,

    pub status: WithdrawalStatus,
    pub admin_note: Option<String>,
    pub user_note: Option<String>,

    /// Payout provider transaction reference
    pub tx_ref: Option<String>,

    /// Ledger entry that reserved the funds
    pub debit_transaction_id: TransactionId,

    /// Ledger entry that returned the funds, once rejected or failed
    pub reversal_transaction_id: Option<TransactionId>,

    pub requested_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

impl WithdrawalRequest {
    /// Amount actually sent to the payout destination
    pub fn net_payout(&self) -> Minor {
        self.amount - self.fee_amount
    }

    /// Ledger `reference_id` used for this request's debit and reversal
    pub fn reference(&self) -> String {
        withdrawal_reference(self.id)
    }
}

pub fn withdrawal_reference(id: WithdrawalId) -> String {
    format!("withdrawal:{}", id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(WithdrawalStatus::Rejected, true)]
    #[case(WithdrawalStatus::Paid, true)]
    #[case(WithdrawalStatus::Failed, false)]
    #[case(WithdrawalStatus::Pending, false)]
    fn test_terminal_states(#[case] status: WithdrawalStatus, #[case] expected: bool) {
        assert_eq!(status.is_terminal(), expected);
    }

    #[rstest]
    #[case::forward(WithdrawalStatus::Pending, WithdrawalStatus::Processing, true)]
    #[case::skip_forward(WithdrawalStatus::Pending, WithdrawalStatus::Paid, true)]
    #[case::backwards(WithdrawalStatus::Approved, WithdrawalStatus::Pending, false)]
    #[case::reject_pending(WithdrawalStatus::Pending, WithdrawalStatus::Rejected, true)]
    #[case::fail_approved(WithdrawalStatus::Approved, WithdrawalStatus::Failed, true)]
    #[case::failed_to_rejected(WithdrawalStatus::Failed, WithdrawalStatus::Rejected, true)]
    #[case::failed_to_paid(WithdrawalStatus::Failed, WithdrawalStatus::Paid, false)]
    #[case::failed_again(WithdrawalStatus::Failed, WithdrawalStatus::Failed, true)]
    #[case::same(WithdrawalStatus::Processing, WithdrawalStatus::Processing, true)]
    fn test_transition_table(
        #[case] from: WithdrawalStatus,
        #[case] to: WithdrawalStatus,
        #[case] expected: bool,
    ) {
        assert_eq!(from.allows(to), expected);
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!(
            "paid".parse::<WithdrawalStatus>().unwrap(),
            WithdrawalStatus::Paid
        );
        assert!(matches!(
            "cancelled".parse::<WithdrawalStatus>(),
            Err(LedgerError::InvalidStatus { .. })
        ));
    }
}
