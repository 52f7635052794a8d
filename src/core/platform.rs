//! Wallet platform facade
//!
//! This module provides the `WalletPlatform`, which wires the wallet store,
//! ledger, order desk, withdrawal desk and admin adjuster together and runs
//! the cross-component follow-ups that none of them own:
//!
//! - notifications, dispatched after the primary mutation has committed
//! - payment retries for parked orders whenever a wallet receives funds
//! - invalidation of the cached wallet stats
//!
//! # Architecture
//!
//! ```text
//! WalletPlatform
//!     ├── Arc<TransactionLedger>   (append-only audit trail)
//!     ├── Arc<WalletStore>         (balances, sole writer of the ledger)
//!     ├── Arc<OrderDesk>           (zen_status machine, charges and refunds)
//!     ├── Arc<WithdrawalDesk>      (payout pipeline, reservation-by-debit)
//!     ├── Arc<AdminAdjuster>       (privileged manual adjustments)
//!     ├── Arc<dyn Notifier>        (fire-and-forget delivery)
//!     └── Arc<TtlCache<WalletStats>>
//! ```
//!
//! # Thread Safety
//!
//! The platform is cheap to clone and every clone shares the same state, so
//! it can be handed to HTTP handlers and replay tasks alike.

use crate::config::LedgerConfig;
use crate::core::admin::{AdminAdjuster, Adjustment};
use crate::core::cache::{SystemClock, TtlCache};
use crate::core::ledger::{Reconciliation, TransactionLedger};
use crate::core::notify::{dispatch, LogNotifier, Notification};
use crate::core::order_machine::{OrderDesk, PaymentOutcome, TransitionOutcome};
use crate::core::traits::{Clock, Notifier};
use crate::core::wallet_store::WalletStore;
use crate::core::withdrawal::{StatusChange, WithdrawalDesk};
use crate::types::{
    Actor, AutoRechargeSettings, CommandKind, EntryType, JournalCommand, LedgerError, Minor,
    Order, OrderId, PayoutMethodId, UserId, Wallet, WalletTransaction, WithdrawalId,
    WithdrawalRequest, ZenStatus,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// Platform-wide wallet figures for the admin dashboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletStats {
    pub wallets: usize,
    pub total_balance: Minor,
    /// Requests in pending, processing or approved
    pub pending_withdrawals: usize,
    pub pending_withdrawal_amount: Minor,
    pub orders_awaiting_wallet: usize,
}

/// Final state of one wallet, as written by the replay report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletReport {
    pub user_id: UserId,
    pub balance: Minor,
    pub currency: String,
    pub transactions: usize,
    pub reconciled: bool,
}

#[derive(Debug, Clone)]
pub struct WalletPlatform {
    ledger: Arc<TransactionLedger>,
    wallets: Arc<WalletStore>,
    orders: Arc<OrderDesk>,
    withdrawals: Arc<WithdrawalDesk>,
    admin: Arc<AdminAdjuster>,
    notifier: Arc<dyn Notifier>,
    stats: Arc<TtlCache<WalletStats>>,
}

impl WalletPlatform {
    /// Platform with the logging notifier and the system clock
    pub fn new(config: &LedgerConfig) -> Self {
        Self::with_collaborators(config, Arc::new(LogNotifier), Arc::new(SystemClock))
    }

    pub fn with_collaborators(
        config: &LedgerConfig,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let ledger = Arc::new(TransactionLedger::new());
        let wallets = Arc::new(WalletStore::new(Arc::clone(&ledger), &config.currency));
        let ttl = chrono::Duration::from_std(config.stats_ttl)
            .unwrap_or_else(|_| chrono::Duration::seconds(30));

        Self {
            orders: Arc::new(OrderDesk::new(
                Arc::clone(&wallets),
                config.transition_policy,
            )),
            withdrawals: Arc::new(WithdrawalDesk::new(
                Arc::clone(&wallets),
                config.fee_percent,
            )),
            admin: Arc::new(AdminAdjuster::new(Arc::clone(&wallets))),
            stats: Arc::new(TtlCache::new(clock, ttl)),
            notifier,
            ledger,
            wallets,
        }
    }

    pub fn ledger(&self) -> &TransactionLedger {
        &self.ledger
    }

    pub fn wallets(&self) -> &WalletStore {
        &self.wallets
    }

    pub fn orders(&self) -> &OrderDesk {
        &self.orders
    }

    pub fn withdrawals(&self) -> &WithdrawalDesk {
        &self.withdrawals
    }

    pub fn open_wallet(&self, user_id: UserId, opening_balance: Minor) -> Result<Wallet, LedgerError> {
        let wallet = self.wallets.open(user_id, opening_balance)?;
        self.stats.invalidate();
        Ok(wallet)
    }

    pub fn credit(
        &self,
        user_id: UserId,
        amount: Minor,
        reason: &str,
        reference_id: Option<&str>,
    ) -> Result<WalletTransaction, LedgerError> {
        let transaction = self.wallets.credit(user_id, amount, reason, reference_id)?;
        self.funds_arrived(user_id);
        Ok(transaction)
    }

    pub fn debit(
        &self,
        user_id: UserId,
        amount: Minor,
        reason: &str,
        reference_id: Option<&str>,
    ) -> Result<WalletTransaction, LedgerError> {
        let transaction = self.wallets.debit(user_id, amount, reason, reference_id)?;
        self.stats.invalidate();
        Ok(transaction)
    }

    pub fn update_settings(
        &self,
        user_id: UserId,
        settings: AutoRechargeSettings,
    ) -> Result<Wallet, LedgerError> {
        self.wallets.update_auto_recharge(user_id, settings)
    }

    pub fn reconcile(&self, user_id: UserId) -> Result<Reconciliation, LedgerError> {
        self.wallets.reconcile(user_id)
    }

    pub fn adjust(
        &self,
        actor: &Actor,
        user_id: UserId,
        amount: Minor,
        entry_type: EntryType,
        reason: &str,
        reference_id: Option<&str>,
    ) -> Result<Adjustment, LedgerError> {
        let adjustment = self
            .admin
            .adjust(actor, user_id, amount, entry_type, reason, reference_id)?;

        dispatch(
            self.notifier.as_ref(),
            Notification::WalletAdjusted {
                user_id,
                amount: adjustment.transaction.signed_amount(),
                balance_after: adjustment.balance_after,
                reason: adjustment.transaction.reason.clone(),
            },
        );
        match entry_type {
            EntryType::Credit => self.funds_arrived(user_id),
            EntryType::Debit => self.stats.invalidate(),
        }
        Ok(adjustment)
    }

    pub fn register_order(&self, order: Order) -> Result<Order, LedgerError> {
        self.orders.register(order)
    }

    pub fn pay_order(&self, order_id: OrderId, actor: &Actor) -> Result<PaymentOutcome, LedgerError> {
        let outcome = self.orders.process_payment(order_id, actor)?;
        self.stats.invalidate();
        Ok(outcome)
    }

    pub fn transition_order(
        &self,
        order_id: OrderId,
        new_status: &str,
        actor: &Actor,
        note: Option<&str>,
    ) -> Result<TransitionOutcome, LedgerError> {
        let outcome = self.orders.transition(order_id, new_status, actor, note)?;

        if outcome.previous != outcome.order.zen_status {
            dispatch(
                self.notifier.as_ref(),
                Notification::OrderStatusChanged {
                    user_id: outcome.order.user_id,
                    order_id,
                    from: outcome.previous,
                    to: outcome.order.zen_status,
                },
            );
        }
        match outcome.wallet_entry.as_ref().map(|entry| entry.entry_type) {
            Some(EntryType::Credit) => self.funds_arrived(outcome.order.user_id),
            _ => self.stats.invalidate(),
        }
        Ok(outcome)
    }

    pub fn request_withdrawal(
        &self,
        user_id: UserId,
        payout_method_id: PayoutMethodId,
        amount: Minor,
        user_note: Option<&str>,
    ) -> Result<WithdrawalRequest, LedgerError> {
        let request = self
            .withdrawals
            .request(user_id, payout_method_id, amount, user_note)?;
        self.withdrawal_requested(&request);
        Ok(request)
    }

    pub fn request_withdrawal_with_id(
        &self,
        id: WithdrawalId,
        user_id: UserId,
        payout_method_id: PayoutMethodId,
        amount: Minor,
        user_note: Option<&str>,
    ) -> Result<WithdrawalRequest, LedgerError> {
        let request =
            self.withdrawals
                .request_with_id(id, user_id, payout_method_id, amount, user_note)?;
        self.withdrawal_requested(&request);
        Ok(request)
    }

    fn withdrawal_requested(&self, request: &WithdrawalRequest) {
        dispatch(
            self.notifier.as_ref(),
            Notification::WithdrawalRequested {
                user_id: request.user_id,
                withdrawal_id: request.id,
                amount: request.amount,
            },
        );
        self.stats.invalidate();
    }

    pub fn update_withdrawal(
        &self,
        id: WithdrawalId,
        new_status: &str,
        admin_note: Option<&str>,
        tx_ref: Option<&str>,
    ) -> Result<StatusChange, LedgerError> {
        let change = self
            .withdrawals
            .update_status(id, new_status, admin_note, tx_ref)?;

        if change.previous != change.request.status {
            dispatch(
                self.notifier.as_ref(),
                Notification::WithdrawalStatusChanged {
                    user_id: change.request.user_id,
                    withdrawal_id: id,
                    from: change.previous,
                    to: change.request.status,
                },
            );
        }
        if change.reversal.is_some() {
            self.funds_arrived(change.request.user_id);
        } else {
            self.stats.invalidate();
        }
        Ok(change)
    }

    pub fn annotate_withdrawal(
        &self,
        id: WithdrawalId,
        admin_note: Option<&str>,
        tx_ref: Option<&str>,
    ) -> Result<WithdrawalRequest, LedgerError> {
        self.withdrawals.annotate(id, admin_note, tx_ref)
    }

    /// Cached platform totals, recomputed once the TTL lapses
    pub fn stats(&self) -> WalletStats {
        self.stats.get_or_compute(|| {
            let wallets = self.wallets.all_wallets();
            let (pending_withdrawals, pending_withdrawal_amount) = self.withdrawals.open_totals();
            WalletStats {
                wallets: wallets.len(),
                total_balance: wallets
                    .iter()
                    .fold(0, |total: Minor, wallet| total.saturating_add(wallet.balance)),
                pending_withdrawals,
                pending_withdrawal_amount,
                orders_awaiting_wallet: self.orders.count_by_status(ZenStatus::AwaitingWallet),
            }
        })
    }

    /// Final state of every wallet, sorted by owner
    pub fn wallet_report(&self) -> Vec<WalletReport> {
        self.wallets
            .all_wallets()
            .into_iter()
            .map(|wallet| {
                let reconciliation = self.ledger.reconcile(wallet.user_id, wallet.balance);
                WalletReport {
                    user_id: wallet.user_id,
                    balance: wallet.balance,
                    currency: wallet.currency,
                    transactions: reconciliation.entries,
                    reconciled: reconciliation.balanced,
                }
            })
            .collect()
    }

    /// Apply one journal command
    ///
    /// Order and withdrawal commands must name the record's owner; a command
    /// that points at another user's record is rejected as `NotFound` so that
    /// per-user replay partitions never touch each other's records.
    pub fn process_command(&self, command: &JournalCommand) -> Result<(), LedgerError> {
        let user = command.user;

        match &command.kind {
            CommandKind::Open { opening_balance } => {
                self.open_wallet(user, *opening_balance)?;
            }
            CommandKind::Credit {
                amount,
                reason,
                reference,
            } => {
                self.credit(user, *amount, reason, reference.as_deref())?;
            }
            CommandKind::Debit {
                amount,
                reason,
                reference,
            } => {
                self.debit(user, *amount, reason, reference.as_deref())?;
            }
            CommandKind::Adjust {
                entry_type,
                amount,
                reason,
                reference,
                admin,
            } => {
                self.adjust(
                    &Actor::admin(*admin),
                    user,
                    *amount,
                    *entry_type,
                    reason,
                    reference.as_deref(),
                )?;
            }
            CommandKind::RegisterOrder {
                order_id,
                landed_cost,
                store,
            } => {
                let order = self.register_order(Order::new(*order_id, user, store.as_str(), *landed_cost))?;
                if order.user_id != user {
                    return Err(LedgerError::duplicate("order", *order_id));
                }
            }
            CommandKind::PayOrder { order_id } => {
                self.owned_order(user, *order_id)?;
                let outcome = self.pay_order(*order_id, &Actor::system())?;
                debug!(order_id, status = %outcome.order().zen_status, "journal payment processed");
            }
            CommandKind::OrderStatus {
                order_id,
                status,
                note,
                admin,
            } => {
                self.owned_order(user, *order_id)?;
                self.transition_order(*order_id, status, &Actor::admin(*admin), note.as_deref())?;
            }
            CommandKind::Withdraw {
                withdrawal_id,
                amount,
                payout_method_id,
                user_note,
            } => {
                self.request_withdrawal_with_id(
                    *withdrawal_id,
                    user,
                    *payout_method_id,
                    *amount,
                    user_note.as_deref(),
                )?;
            }
            CommandKind::WithdrawalStatus {
                withdrawal_id,
                status,
                admin_note,
                tx_ref,
            } => {
                if self.withdrawals.get(*withdrawal_id)?.user_id != user {
                    return Err(LedgerError::not_found("withdrawal", *withdrawal_id));
                }
                self.update_withdrawal(
                    *withdrawal_id,
                    status,
                    admin_note.as_deref(),
                    tx_ref.as_deref(),
                )?;
            }
        }

        Ok(())
    }

    fn owned_order(&self, user: UserId, order_id: OrderId) -> Result<(), LedgerError> {
        if self.orders.get(order_id)?.user_id != user {
            return Err(LedgerError::not_found("order", order_id));
        }
        Ok(())
    }

    /// A wallet received money: parked orders may now be payable
    fn funds_arrived(&self, user_id: UserId) {
        let outcomes = self.orders.retry_awaiting(user_id, &Actor::system());
        for outcome in &outcomes {
            if let PaymentOutcome::Paid { order, .. } = outcome {
                debug!(order_id = order.id, user_id, "parked order paid after top-up");
            }
        }
        self.stats.invalidate();
    }
}
