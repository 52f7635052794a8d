//! Append-only transaction ledger
//!
//! This module provides the `TransactionLedger`, the audit trail and source of
//! truth for historical balances. Every wallet mutation appends exactly one
//! entry; entries are never updated or removed.
//!
//! # Design
//!
//! Entries are kept per user in a `DashMap<UserId, Vec<WalletTransaction>>`,
//! in commit order. Appends are only performed by the wallet store while it
//! holds the owning wallet's entry lock, so the per-user vector order is the
//! order in which balances changed.
//!
//! # Reconciliation
//!
//! For every user, the signed sum of all entries must equal the wallet
//! balance, and each entry's `balance_before` must equal the previous entry's
//! `balance_after` (the first entry starts from zero).

use crate::types::{
    EntryRequest, EntryType, Minor, Pagination, TransactionId, UserId, WalletTransaction,
};
use chrono::Utc;
use dashmap::DashMap;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Result of checking a user's ledger against their wallet
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reconciliation {
    pub user_id: UserId,
    pub entries: usize,
    /// Signed sum of all ledger entries
    pub ledger_sum: Minor,
    pub wallet_balance: Minor,
    /// Every entry starts where the previous one ended
    pub chain_intact: bool,
    pub balanced: bool,
}

/// Append-only, per-user ledger of wallet mutations
#[derive(Debug)]
pub struct TransactionLedger {
    /// Entries by owner, oldest first
    entries: DashMap<UserId, Vec<WalletTransaction>>,

    /// Next identifier to hand out
    next_id: AtomicU64,
}

impl TransactionLedger {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Append one entry for a mutation that is being committed
    ///
    /// Only the wallet store calls this, with the wallet's entry lock held,
    /// so the entry and the new balance become visible together.
    pub(crate) fn append(
        &self,
        entry_type: EntryType,
        request: &EntryRequest,
        balance_before: Minor,
        balance_after: Minor,
    ) -> WalletTransaction {
        let transaction = WalletTransaction {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            user_id: request.user_id,
            amount: request.amount,
            entry_type,
            reason: request.reason.clone(),
            reference_id: request.reference_id.clone(),
            balance_before,
            balance_after,
            metadata: request.metadata.clone(),
            created_at: Utc::now(),
        };

        debug_assert_eq!(
            transaction.balance_before + transaction.signed_amount(),
            transaction.balance_after
        );

        self.entries
            .entry(request.user_id)
            .or_default()
            .push(transaction.clone());

        transaction
    }

    /// Page through a user's entries, newest first
    pub fn list_for_user(&self, user_id: UserId, pagination: Pagination) -> Vec<WalletTransaction> {
        self.entries
            .get(&user_id)
            .map(|entries| {
                entries
                    .iter()
                    .rev()
                    .skip(pagination.offset)
                    .take(pagination.effective_limit())
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// All of a user's entries, oldest first
    pub fn history(&self, user_id: UserId) -> Vec<WalletTransaction> {
        self.entries
            .get(&user_id)
            .map(|entries| entries.value().clone())
            .unwrap_or_default()
    }

    /// Every entry in the ledger, ordered by user then commit order
    pub fn all_entries(&self) -> Vec<WalletTransaction> {
        let mut users: Vec<UserId> = self.entries.iter().map(|entry| *entry.key()).collect();
        users.sort_unstable();

        users
            .into_iter()
            .flat_map(|user_id| self.history(user_id))
            .collect()
    }

    /// Entries sharing a loose back-reference (an order or withdrawal), oldest first
    pub fn find_by_reference(&self, reference_id: &str) -> Vec<WalletTransaction> {
        let mut found: Vec<WalletTransaction> = self
            .entries
            .iter()
            .flat_map(|entry| {
                entry
                    .value()
                    .iter()
                    .filter(|tx| tx.reference_id.as_deref() == Some(reference_id))
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .collect();
        found.sort_by_key(|tx| tx.id);
        found
    }

    pub fn get(&self, user_id: UserId, transaction_id: TransactionId) -> Option<WalletTransaction> {
        self.entries.get(&user_id).and_then(|entries| {
            entries
                .iter()
                .find(|tx| tx.id == transaction_id)
                .cloned()
        })
    }

    pub fn entry_count(&self, user_id: UserId) -> usize {
        self.entries
            .get(&user_id)
            .map(|entries| entries.len())
            .unwrap_or(0)
    }

    /// Check a user's entries against the balance the wallet reports
    ///
    /// The wallet store calls this with the wallet's lock held so the balance
    /// and the entries are read from the same committed state.
    pub fn reconcile(&self, user_id: UserId, wallet_balance: Minor) -> Reconciliation {
        let (entries, ledger_sum, chain_intact) = match self.entries.get(&user_id) {
            Some(entries) => {
                let mut expected_before = 0;
                let mut chain_intact = true;
                let mut sum: Minor = 0;
                for tx in entries.iter() {
                    if tx.balance_before != expected_before
                        || tx.balance_before + tx.signed_amount() != tx.balance_after
                    {
                        chain_intact = false;
                    }
                    expected_before = tx.balance_after;
                    sum += tx.signed_amount();
                }
                (entries.len(), sum, chain_intact)
            }
            None => (0, 0, true),
        };

        Reconciliation {
            user_id,
            entries,
            ledger_sum,
            wallet_balance,
            chain_intact,
            balanced: chain_intact && ledger_sum == wallet_balance,
        }
    }
}

impl Default for TransactionLedger {
    fn default() -> Self {
        Self::new()
    }
}
