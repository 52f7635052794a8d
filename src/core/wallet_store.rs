//! Thread-safe wallet store
//!
//! This module provides the `WalletStore`, the only component allowed to
//! change a wallet balance. Every credit and debit is validated, written to
//! the ledger and applied to the wallet inside one critical section.
//!
//! # Design
//!
//! Wallets live in a `DashMap<UserId, Wallet>`. A mutation takes the wallet's
//! entry lock, reads the balance, validates the request against it, appends
//! the ledger entry and writes the new balance before the lock is released.
//! Two concurrent debits against the same wallet therefore serialize: the
//! second one validates against the balance the first one committed.
//!
//! # Lock Ordering
//!
//! wallet entry → ledger entry. The ledger never reaches back into the store,
//! and callers (order desk, withdrawal desk) take their own record lock before
//! calling in, never after.

use crate::core::ledger::{Reconciliation, TransactionLedger};
use crate::types::{
    AutoRechargeSettings, EntryRequest, EntryType, LedgerError, Minor, UserId, Wallet,
    WalletTransaction,
};
use chrono::Utc;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;

/// Thread-safe wallet balances backed by the transaction ledger
#[derive(Debug)]
pub struct WalletStore {
    /// Wallets by owner
    wallets: DashMap<UserId, Wallet>,

    /// Shared audit trail; appended in the same critical section as the balance
    ledger: Arc<TransactionLedger>,

    /// Currency assigned to lazily created wallets
    currency: String,
}

impl WalletStore {
    pub fn new(ledger: Arc<TransactionLedger>, currency: &str) -> Self {
        Self {
            wallets: DashMap::new(),
            ledger,
            currency: currency.to_string(),
        }
    }

    pub fn ledger(&self) -> &Arc<TransactionLedger> {
        &self.ledger
    }

    /// Create a wallet once, seeding it with an opening balance
    ///
    /// An existing wallet is returned unchanged. A non-zero opening balance is
    /// written as an `opening_balance` credit so the ledger reconciles from
    /// its first entry.
    pub fn open(&self, user_id: UserId, opening_balance: Minor) -> Result<Wallet, LedgerError> {
        if opening_balance < 0 {
            return Err(LedgerError::invalid_amount(opening_balance, "open wallet"));
        }

        let mut created = false;
        let mut entry = self.wallets.entry(user_id).or_insert_with(|| {
            created = true;
            Wallet::new(user_id, &self.currency)
        });

        if created && opening_balance > 0 {
            let request = EntryRequest::new(user_id, opening_balance, "opening_balance");
            self.apply_locked(entry.value_mut(), EntryType::Credit, &request)?;
        }

        Ok(entry.value().clone())
    }

    /// Add funds to a wallet, creating it on first use
    pub fn credit(
        &self,
        user_id: UserId,
        amount: Minor,
        reason: &str,
        reference_id: Option<&str>,
    ) -> Result<WalletTransaction, LedgerError> {
        let request = EntryRequest::new(user_id, amount, reason)
            .maybe_reference(reference_id.map(str::to_string));
        self.post(EntryType::Credit, &request)
    }

    /// Remove funds from a wallet, failing if the balance cannot cover it
    pub fn debit(
        &self,
        user_id: UserId,
        amount: Minor,
        reason: &str,
        reference_id: Option<&str>,
    ) -> Result<WalletTransaction, LedgerError> {
        let request = EntryRequest::new(user_id, amount, reason)
            .maybe_reference(reference_id.map(str::to_string));
        self.post(EntryType::Debit, &request)
    }

    /// Apply a fully specified mutation
    ///
    /// # Returns
    ///
    /// * `Ok(WalletTransaction)` - the committed ledger entry (carries `balance_after`)
    /// * `Err(LedgerError::InvalidAmount)` - amount is zero or negative
    /// * `Err(LedgerError::InsufficientFunds)` - debit exceeds the balance
    /// * `Err(LedgerError::NotFound)` - debit against a user with no wallet
    /// * `Err(LedgerError::ArithmeticOverflow)` - credit would overflow the balance
    ///
    /// On error neither the wallet nor the ledger changes.
    pub fn post(
        &self,
        entry_type: EntryType,
        request: &EntryRequest,
    ) -> Result<WalletTransaction, LedgerError> {
        if request.amount <= 0 {
            return Err(LedgerError::invalid_amount(
                request.amount,
                entry_type.as_str(),
            ));
        }

        match entry_type {
            EntryType::Credit => {
                let mut entry = self
                    .wallets
                    .entry(request.user_id)
                    .or_insert_with(|| Wallet::new(request.user_id, &self.currency));
                self.apply_locked(entry.value_mut(), entry_type, request)
            }
            EntryType::Debit => {
                let mut entry = self
                    .wallets
                    .get_mut(&request.user_id)
                    .ok_or_else(|| LedgerError::not_found("wallet", request.user_id))?;
                self.apply_locked(entry.value_mut(), entry_type, request)
            }
        }
    }

    /// Validate, append and apply; the caller holds the wallet's entry lock
    fn apply_locked(
        &self,
        wallet: &mut Wallet,
        entry_type: EntryType,
        request: &EntryRequest,
    ) -> Result<WalletTransaction, LedgerError> {
        let balance_before = wallet.balance;
        let balance_after = match entry_type {
            EntryType::Credit => balance_before
                .checked_add(request.amount)
                .ok_or_else(|| LedgerError::arithmetic_overflow("credit", wallet.user_id))?,
            EntryType::Debit => {
                if balance_before < request.amount {
                    return Err(LedgerError::insufficient_funds(
                        wallet.user_id,
                        balance_before,
                        request.amount,
                    ));
                }
                balance_before - request.amount
            }
        };

        let transaction = self
            .ledger
            .append(entry_type, request, balance_before, balance_after);

        wallet.balance = balance_after;
        wallet.version += 1;
        wallet.updated_at = transaction.created_at;

        debug!(
            user_id = wallet.user_id,
            transaction_id = transaction.id,
            entry_type = entry_type.as_str(),
            amount = request.amount,
            balance_after,
            reason = %request.reason,
            "wallet mutation committed"
        );

        Ok(transaction)
    }

    /// Current balance (read-only projection of the wallet)
    pub fn get_balance(&self, user_id: UserId) -> Result<Minor, LedgerError> {
        self.wallets
            .get(&user_id)
            .map(|wallet| wallet.balance)
            .ok_or_else(|| LedgerError::not_found("wallet", user_id))
    }

    /// Snapshot of a wallet
    pub fn wallet(&self, user_id: UserId) -> Result<Wallet, LedgerError> {
        self.wallets
            .get(&user_id)
            .map(|wallet| wallet.value().clone())
            .ok_or_else(|| LedgerError::not_found("wallet", user_id))
    }

    /// Snapshot of every wallet, sorted by owner
    pub fn all_wallets(&self) -> Vec<Wallet> {
        let mut wallets: Vec<Wallet> = self
            .wallets
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        wallets.sort_by_key(|wallet| wallet.user_id);
        wallets
    }

    /// Store auto-recharge settings, creating the wallet on first use
    pub fn update_auto_recharge(
        &self,
        user_id: UserId,
        settings: AutoRechargeSettings,
    ) -> Result<Wallet, LedgerError> {
        if settings.enabled && settings.amount <= 0 {
            return Err(LedgerError::invalid_amount(settings.amount, "auto-recharge"));
        }
        if settings.threshold < 0 {
            return Err(LedgerError::invalid_amount(
                settings.threshold,
                "auto-recharge threshold",
            ));
        }

        let mut entry = self
            .wallets
            .entry(user_id)
            .or_insert_with(|| Wallet::new(user_id, &self.currency));
        let wallet = entry.value_mut();
        wallet.auto_recharge_enabled = settings.enabled;
        wallet.auto_recharge_amount = settings.amount;
        wallet.min_auto_recharge_threshold = settings.threshold;
        wallet.updated_at = Utc::now();

        Ok(wallet.clone())
    }

    /// Whether the wallet has auto-recharge on and sits below its threshold
    pub fn needs_recharge(&self, user_id: UserId) -> Result<bool, LedgerError> {
        self.wallets
            .get(&user_id)
            .map(|wallet| wallet.needs_recharge())
            .ok_or_else(|| LedgerError::not_found("wallet", user_id))
    }

    /// Check the ledger against the wallet balance
    ///
    /// The wallet's read lock is held while the ledger is summed, so no
    /// mutation can land between the two reads.
    pub fn reconcile(&self, user_id: UserId) -> Result<Reconciliation, LedgerError> {
        let wallet = self
            .wallets
            .get(&user_id)
            .ok_or_else(|| LedgerError::not_found("wallet", user_id))?;
        Ok(self.ledger.reconcile(user_id, wallet.balance))
    }
}
