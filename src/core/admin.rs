//! Privileged manual wallet adjustments
//!
//! Support staff can credit or debit a wallet outside the order and
//! withdrawal flows. Adjustments go through the same wallet store contract as
//! every other mutation; the admin's id and a `source` marker are written into
//! the ledger entry's metadata.

use crate::core::wallet_store::WalletStore;
use crate::types::{
    format_minor, Actor, EntryRequest, EntryType, LedgerError, Minor, UserId, WalletTransaction,
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

/// Committed adjustment
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Adjustment {
    pub transaction: WalletTransaction,
    pub balance_after: Minor,
    /// Major units, two decimals (e.g. `150.00`)
    pub balance_after_formatted: String,
}

#[derive(Debug)]
pub struct AdminAdjuster {
    wallets: Arc<WalletStore>,
}

impl AdminAdjuster {
    pub fn new(wallets: Arc<WalletStore>) -> Self {
        Self { wallets }
    }

    /// Manually credit or debit a user's wallet
    ///
    /// # Returns
    ///
    /// * `Ok(Adjustment)` - committed entry and the resulting balance
    /// * `Err(LedgerError::Forbidden)` - caller is not an admin
    /// * `Err(LedgerError::InvalidAmount)` - amount is zero or negative
    /// * `Err(LedgerError::MissingReason)` - reason is blank
    /// * `Err(LedgerError::InsufficientFunds)` - debit exceeds the balance
    pub fn adjust(
        &self,
        actor: &Actor,
        user_id: UserId,
        amount: Minor,
        entry_type: EntryType,
        reason: &str,
        reference_id: Option<&str>,
    ) -> Result<Adjustment, LedgerError> {
        if !actor.is_admin() {
            return Err(LedgerError::forbidden(actor.id, "adjust wallets"));
        }
        if amount <= 0 {
            return Err(LedgerError::invalid_amount(amount, "adjustment"));
        }
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(LedgerError::missing_reason(user_id));
        }

        let request = EntryRequest::new(user_id, amount, reason)
            .maybe_reference(reference_id.map(str::to_string))
            .metadata(json!({ "adjustedBy": actor.id, "source": "admin" }));
        let transaction = self.wallets.post(entry_type, &request)?;

        info!(
            user_id,
            admin_id = actor.id,
            entry_type = entry_type.as_str(),
            amount,
            balance_after = transaction.balance_after,
            reason,
            "wallet adjusted"
        );

        Ok(Adjustment {
            balance_after: transaction.balance_after,
            balance_after_formatted: format_minor(transaction.balance_after),
            transaction,
        })
    }
}
