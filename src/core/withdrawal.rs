//! Withdrawal workflow
//!
//! This module provides the `WithdrawalDesk`, which reserves wallet funds
//! against payout requests and tracks each request through the approval
//! pipeline.
//!
//! # Design
//!
//! Creation debits the gross amount immediately (reservation-by-debit). The
//! fee is informational: it reduces the payout, never the wallet. Entering
//! `rejected` or `failed` credits the gross amount back once; the reversal id
//! is stored on the request so a second terminal move finds it and skips the
//! credit.
//!
//! Creation holds the id's vacant slot across the wallet debit and status
//! updates hold the request's entry lock across the wallet credit (lock
//! order: request → wallet → ledger). A request that finds its id taken
//! never touches the wallet.

use crate::core::wallet_store::WalletStore;
use crate::types::{
    EntryRequest, EntryType, LedgerError, Minor, PayoutMethodId, UserId, WalletTransaction,
    WithdrawalId, WithdrawalRequest, WithdrawalStatus,
};
use crate::types::withdrawal::withdrawal_reference;
use chrono::Utc;
use dashmap::{DashMap, Entry};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Deserialize;
use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Default withdrawal fee, percent of the gross amount
pub const DEFAULT_FEE_PERCENT: Decimal = Decimal::from_parts(8, 0, 0, false, 0);

/// Optional filters for [`WithdrawalDesk::list`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalFilter {
    pub status: Option<WithdrawalStatus>,
    pub user_id: Option<UserId>,
}

/// Result of a successful `update_status`
#[derive(Debug, Clone, PartialEq)]
pub struct StatusChange {
    pub request: WithdrawalRequest,
    pub previous: WithdrawalStatus,
    /// Credit that returned the reserved funds, if this update issued one
    pub reversal: Option<WalletTransaction>,
}

#[derive(Debug)]
pub struct WithdrawalDesk {
    requests: DashMap<WithdrawalId, WithdrawalRequest>,
    wallets: Arc<WalletStore>,
    fee_percent: Decimal,
    next_id: AtomicU64,
}

impl WithdrawalDesk {
    pub fn new(wallets: Arc<WalletStore>, fee_percent: Decimal) -> Self {
        Self {
            requests: DashMap::new(),
            wallets,
            fee_percent,
            next_id: AtomicU64::new(1),
        }
    }

    pub fn fee_percent(&self) -> Decimal {
        self.fee_percent
    }

    /// Fee for a gross amount, rounded half away from zero to whole minor units
    pub fn compute_fee(&self, amount: Minor) -> Result<Minor, LedgerError> {
        let fee = Decimal::from(amount)
            .checked_mul(self.fee_percent)
            .and_then(|gross| gross.checked_div(Decimal::ONE_HUNDRED))
            .map(|fee| fee.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
            .and_then(|fee| fee.to_i64());

        fee.ok_or_else(|| LedgerError::arithmetic_overflow("withdrawal fee", 0))
    }

    /// Create a request with the next free id
    pub fn request(
        &self,
        user_id: UserId,
        payout_method_id: PayoutMethodId,
        amount: Minor,
        user_note: Option<&str>,
    ) -> Result<WithdrawalRequest, LedgerError> {
        loop {
            let id = self.next_id.fetch_add(1, Ordering::Relaxed);
            match self.request_with_id(id, user_id, payout_method_id, amount, user_note) {
                Err(LedgerError::Duplicate { .. }) => continue,
                other => return other,
            }
        }
    }

    /// Create a request under a caller-chosen id
    ///
    /// # Returns
    ///
    /// * `Ok(WithdrawalRequest)` - request in `pending`, funds debited
    /// * `Err(LedgerError::InvalidAmount)` - amount is zero or negative
    /// * `Err(LedgerError::InsufficientFunds)` - wallet cannot cover the amount
    /// * `Err(LedgerError::NotFound)` - user has no wallet
    /// * `Err(LedgerError::Duplicate)` - id already in use
    pub fn request_with_id(
        &self,
        id: WithdrawalId,
        user_id: UserId,
        payout_method_id: PayoutMethodId,
        amount: Minor,
        user_note: Option<&str>,
    ) -> Result<WithdrawalRequest, LedgerError> {
        if amount <= 0 {
            return Err(LedgerError::invalid_amount(amount, "withdrawal"));
        }
        let fee_amount = self.compute_fee(amount)?;

        // The vacant slot stays locked until the debit has posted
        let slot = match self.requests.entry(id) {
            Entry::Occupied(_) => return Err(LedgerError::duplicate("withdrawal", id)),
            Entry::Vacant(slot) => slot,
        };
        self.next_id.fetch_max(id.saturating_add(1), Ordering::Relaxed);

        let debit = self.wallets.post(
            EntryType::Debit,
            &EntryRequest::new(user_id, amount, "withdrawal")
                .reference(withdrawal_reference(id))
                .metadata(json!({ "withdrawalId": id, "payoutMethodId": payout_method_id })),
        )?;

        let request = slot
            .insert(WithdrawalRequest {
                id,
                user_id,
                payout_method_id,
                amount,
                fee_amount,
                status: WithdrawalStatus::Pending,
                admin_note: None,
                user_note: user_note.map(str::to_string),
                tx_ref: None,
                debit_transaction_id: debit.id,
                reversal_transaction_id: None,
                requested_at: debit.created_at,
                processed_at: None,
            })
            .value()
            .clone();

        info!(
            withdrawal_id = id,
            user_id,
            amount,
            fee_amount,
            balance_after = debit.balance_after,
            "withdrawal requested"
        );
        Ok(request)
    }

    /// Move a request through the payout pipeline
    ///
    /// # Returns
    ///
    /// * `Ok(StatusChange)` - updated request, previous status, any reversal credit
    /// * `Err(LedgerError::InvalidStatus)` - `new_status` is not an enumerated value
    /// * `Err(LedgerError::NotFound)` - no such request
    /// * `Err(LedgerError::Immutable)` - request is `paid` or `rejected`
    /// * `Err(LedgerError::InvalidTransition)` - move not in the pipeline
    pub fn update_status(
        &self,
        id: WithdrawalId,
        new_status: &str,
        admin_note: Option<&str>,
        tx_ref: Option<&str>,
    ) -> Result<StatusChange, LedgerError> {
        let target: WithdrawalStatus = new_status.parse()?;

        let mut entry = self
            .requests
            .get_mut(&id)
            .ok_or_else(|| LedgerError::not_found("withdrawal", id))?;
        let request = entry.value_mut();
        let previous = request.status;

        if previous.is_terminal() {
            return Err(LedgerError::immutable("withdrawal", id, previous.as_str()));
        }
        if !previous.allows(target) {
            return Err(LedgerError::invalid_transition(
                "withdrawal",
                id,
                previous.as_str(),
                target.as_str(),
            ));
        }

        let reversal = if target.returns_funds() && request.reversal_transaction_id.is_none() {
            let credit = self.wallets.post(
                EntryType::Credit,
                &EntryRequest::new(request.user_id, request.amount, "withdrawal_reversal")
                    .reference(request.reference())
                    .metadata(json!({ "withdrawalId": id, "status": target.as_str() })),
            )?;
            request.reversal_transaction_id = Some(credit.id);
            Some(credit)
        } else {
            None
        };

        apply_notes(request, admin_note, tx_ref);
        if target != previous {
            request.status = target;
            if target.is_processed() {
                request.processed_at = Some(Utc::now());
            }
        }

        info!(
            withdrawal_id = id,
            user_id = request.user_id,
            from = previous.as_str(),
            to = target.as_str(),
            reversed = reversal.is_some(),
            "withdrawal status changed"
        );

        Ok(StatusChange {
            request: request.clone(),
            previous,
            reversal,
        })
    }

    /// Update notes on a request without moving it
    pub fn annotate(
        &self,
        id: WithdrawalId,
        admin_note: Option<&str>,
        tx_ref: Option<&str>,
    ) -> Result<WithdrawalRequest, LedgerError> {
        let mut entry = self
            .requests
            .get_mut(&id)
            .ok_or_else(|| LedgerError::not_found("withdrawal", id))?;
        let request = entry.value_mut();

        if request.status.is_terminal() {
            return Err(LedgerError::immutable("withdrawal", id, request.status.as_str()));
        }

        apply_notes(request, admin_note, tx_ref);
        debug!(withdrawal_id = id, "withdrawal annotated");
        Ok(request.clone())
    }

    pub fn get(&self, id: WithdrawalId) -> Result<WithdrawalRequest, LedgerError> {
        self.requests
            .get(&id)
            .map(|request| request.value().clone())
            .ok_or_else(|| LedgerError::not_found("withdrawal", id))
    }

    /// Requests matching `filter`, newest first
    pub fn list(&self, filter: WithdrawalFilter) -> Vec<WithdrawalRequest> {
        let mut requests: Vec<WithdrawalRequest> = self
            .requests
            .iter()
            .filter(|entry| filter.status.is_none_or(|status| entry.status == status))
            .filter(|entry| filter.user_id.is_none_or(|user| entry.user_id == user))
            .map(|entry| entry.value().clone())
            .collect();
        requests.sort_by(|a, b| {
            b.requested_at
                .cmp(&a.requested_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        requests
    }

    pub fn list_for_user(&self, user_id: UserId) -> Vec<WithdrawalRequest> {
        self.list(WithdrawalFilter {
            status: None,
            user_id: Some(user_id),
        })
    }

    /// Count and gross total of requests still awaiting payout
    pub fn open_totals(&self) -> (usize, Minor) {
        self.requests
            .iter()
            .filter(|entry| {
                matches!(
                    entry.status,
                    WithdrawalStatus::Pending | WithdrawalStatus::Processing | WithdrawalStatus::Approved
                )
            })
            .fold((0, 0), |(count, total), entry| {
                (count + 1, total.saturating_add(entry.amount))
            })
    }
}

fn apply_notes(request: &mut WithdrawalRequest, admin_note: Option<&str>, tx_ref: Option<&str>) {
    if let Some(note) = admin_note {
        request.admin_note = Some(note.to_string());
    }
    if let Some(tx_ref) = tx_ref {
        request.tx_ref = Some(tx_ref.to_string());
    }
}
