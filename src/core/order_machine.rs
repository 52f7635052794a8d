//! Internal order status machine
//!
//! This module provides the `OrderDesk`, which owns every order's
//! `zen_status` and drives the wallet charge and refund tied to it.
//!
//! # Design
//!
//! Orders live in a `DashMap<OrderId, Order>`. A transition holds the order's
//! entry lock from validation until the note is appended, so two transitions
//! on one order serialize while different orders proceed in parallel. Wallet
//! calls are made with the order lock held (lock order: order → wallet →
//! ledger); if the wallet call fails, the order is left untouched.
//!
//! # Wallet Effects
//!
//! - Entering a status that requires payment on an unpaid order debits the
//!   landed cost with `reference_id = "order:<id>"`.
//! - Entering `returned`, `failed` or `rto_delivered` on a paid order credits
//!   the landed cost back, once.

use crate::core::wallet_store::WalletStore;
use crate::types::{
    Actor, EntryRequest, EntryType, InternalNote, LedgerError, Minor, Order, OrderId,
    TransitionPolicy, UserId, WalletCharge, WalletTransaction, ZenStatus,
};
use chrono::Utc;
use dashmap::DashMap;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};

/// Result of a successful `transition`
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionOutcome {
    pub order: Order,
    pub previous: ZenStatus,
    /// Charge or refund written as a side effect, if any
    pub wallet_entry: Option<WalletTransaction>,
}

/// Result of attempting to pay an order from the wallet
#[derive(Debug, Clone, PartialEq)]
pub enum PaymentOutcome {
    /// Landed cost debited (or nothing to debit); order is ready for fulfillment
    Paid {
        order: Order,
        entry: Option<WalletTransaction>,
    },
    /// Wallet could not cover the landed cost; order parked in `awaiting_wallet`
    Parked {
        order: Order,
        balance: Minor,
        required: Minor,
    },
    /// The order had already been paid
    AlreadyPaid { order: Order },
}

impl PaymentOutcome {
    pub fn order(&self) -> &Order {
        match self {
            PaymentOutcome::Paid { order, .. }
            | PaymentOutcome::Parked { order, .. }
            | PaymentOutcome::AlreadyPaid { order } => order,
        }
    }
}

/// Owner of order fulfillment state
#[derive(Debug)]
pub struct OrderDesk {
    orders: DashMap<OrderId, Order>,
    wallets: Arc<WalletStore>,
    policy: TransitionPolicy,
}

impl OrderDesk {
    pub fn new(wallets: Arc<WalletStore>, policy: TransitionPolicy) -> Self {
        Self {
            orders: DashMap::new(),
            wallets,
            policy,
        }
    }

    pub fn policy(&self) -> TransitionPolicy {
        self.policy
    }

    /// Insert a freshly synced order
    ///
    /// Registering an id that already exists returns the stored order
    /// unchanged; storefront re-syncs go through [`OrderDesk::sync_upstream`].
    pub fn register(&self, order: Order) -> Result<Order, LedgerError> {
        if order.landed_cost < 0 {
            return Err(LedgerError::invalid_amount(order.landed_cost, "order landed cost"));
        }

        let id = order.id;
        let stored = self.orders.entry(id).or_insert(order);
        debug!(order_id = id, user_id = stored.user_id, "order registered");
        Ok(stored.value().clone())
    }

    pub fn get(&self, order_id: OrderId) -> Result<Order, LedgerError> {
        self.orders
            .get(&order_id)
            .map(|order| order.value().clone())
            .ok_or_else(|| LedgerError::not_found("order", order_id))
    }

    /// Mirror storefront status fields; `zen_status` is never touched
    pub fn sync_upstream(
        &self,
        order_id: OrderId,
        financial_status: Option<String>,
        fulfillment_status: Option<String>,
    ) -> Result<Order, LedgerError> {
        let mut entry = self
            .orders
            .get_mut(&order_id)
            .ok_or_else(|| LedgerError::not_found("order", order_id))?;
        let order = entry.value_mut();

        if financial_status.is_some() {
            order.financial_status = financial_status;
        }
        if fulfillment_status.is_some() {
            order.fulfillment_status = fulfillment_status;
        }
        order.updated_at = Utc::now();

        Ok(order.clone())
    }

    /// Move an order to a new internal status
    ///
    /// # Returns
    ///
    /// * `Ok(TransitionOutcome)` - new order state plus any wallet entry written
    /// * `Err(LedgerError::InvalidStatus)` - `new_status` is not an enumerated value
    /// * `Err(LedgerError::NotFound)` - no such order
    /// * `Err(LedgerError::Immutable)` - strict policy and the order is terminal
    /// * `Err(LedgerError::InvalidTransition)` - strict policy disallows the move
    /// * `Err(LedgerError::InsufficientFunds)` - the required charge could not be covered
    ///
    /// On any error the order is unchanged.
    pub fn transition(
        &self,
        order_id: OrderId,
        new_status: &str,
        actor: &Actor,
        note: Option<&str>,
    ) -> Result<TransitionOutcome, LedgerError> {
        let target: ZenStatus = new_status.parse()?;
        self.transition_to(order_id, target, actor, note)
    }

    pub fn transition_to(
        &self,
        order_id: OrderId,
        target: ZenStatus,
        actor: &Actor,
        note: Option<&str>,
    ) -> Result<TransitionOutcome, LedgerError> {
        let mut entry = self
            .orders
            .get_mut(&order_id)
            .ok_or_else(|| LedgerError::not_found("order", order_id))?;
        let order = entry.value_mut();
        let previous = order.zen_status;

        if self.policy == TransitionPolicy::Strict {
            if previous.is_terminal() {
                return Err(LedgerError::immutable("order", order_id, previous.as_str()));
            }
            if !previous.strictly_allows(target) {
                return Err(LedgerError::invalid_transition(
                    "order",
                    order_id,
                    previous.as_str(),
                    target.as_str(),
                ));
            }
        }

        let wallet_entry = self.settle_wallet(order, target)?;

        order.zen_status = target;
        append_note(order, status_note(previous, target, note), actor);

        info!(
            order_id,
            user_id = order.user_id,
            from = previous.as_str(),
            to = target.as_str(),
            actor = actor.id,
            "order status changed"
        );

        Ok(TransitionOutcome {
            order: order.clone(),
            previous,
            wallet_entry,
        })
    }

    /// Charge or refund the landed cost as required by the target status
    fn settle_wallet(
        &self,
        order: &mut Order,
        target: ZenStatus,
    ) -> Result<Option<WalletTransaction>, LedgerError> {
        let state = order.wallet_charge;
        match state {
            WalletCharge::Uncharged | WalletCharge::Refunded { .. }
                if target.requires_charge() && order.landed_cost > 0 =>
            {
                let charge = self.charge(order)?;
                Ok(Some(charge))
            }
            WalletCharge::Charged { transaction_id } if target.refunds_charge() => {
                let request = EntryRequest::new(order.user_id, order.landed_cost, "order_refund")
                    .reference(order.reference())
                    .metadata(json!({ "orderId": order.id, "status": target.as_str() }));
                let refund = self.wallets.post(EntryType::Credit, &request)?;
                order.wallet_charge = WalletCharge::Refunded {
                    charge_id: transaction_id,
                    refund_id: refund.id,
                };
                Ok(Some(refund))
            }
            _ => Ok(None),
        }
    }

    fn charge(&self, order: &mut Order) -> Result<WalletTransaction, LedgerError> {
        let request = EntryRequest::new(order.user_id, order.landed_cost, "order_payment")
            .reference(order.reference())
            .metadata(json!({ "orderId": order.id }));
        let charge = self.wallets.post(EntryType::Debit, &request)?;
        order.wallet_charge = WalletCharge::Charged {
            transaction_id: charge.id,
        };
        Ok(charge)
    }

    /// Pay an order's landed cost from the wallet
    ///
    /// Only orders in `shopify` or `awaiting_wallet` can be paid. When the
    /// wallet cannot cover the cost the order is parked in `awaiting_wallet`
    /// and the outcome says so; that is not an error. An order in one of
    /// those statuses that is already charged moves on to
    /// `ready_for_fulfillment` without a new debit.
    pub fn process_payment(
        &self,
        order_id: OrderId,
        actor: &Actor,
    ) -> Result<PaymentOutcome, LedgerError> {
        let mut entry = self
            .orders
            .get_mut(&order_id)
            .ok_or_else(|| LedgerError::not_found("order", order_id))?;
        let order = entry.value_mut();
        let previous = order.zen_status;

        if matches!(order.wallet_charge, WalletCharge::Charged { .. }) {
            if matches!(previous, ZenStatus::Shopify | ZenStatus::AwaitingWallet) {
                // Charged earlier and moved back by hand; release without a second debit
                order.zen_status = ZenStatus::ReadyForFulfillment;
                append_note(
                    order,
                    status_note(previous, ZenStatus::ReadyForFulfillment, Some("already charged")),
                    actor,
                );
                info!(order_id, user_id = order.user_id, "charged order released");
                return Ok(PaymentOutcome::Paid {
                    order: order.clone(),
                    entry: None,
                });
            }
            return Ok(PaymentOutcome::AlreadyPaid {
                order: order.clone(),
            });
        }

        if !matches!(previous, ZenStatus::Shopify | ZenStatus::AwaitingWallet) {
            return Err(LedgerError::invalid_transition(
                "order",
                order_id,
                previous.as_str(),
                ZenStatus::ReadyForFulfillment.as_str(),
            ));
        }

        let charge = if order.landed_cost > 0 {
            match self.charge(order) {
                Ok(charge) => Some(charge),
                Err(LedgerError::InsufficientFunds { balance, .. }) => {
                    return Ok(self.park(order, previous, balance, actor));
                }
                Err(LedgerError::NotFound { .. }) => {
                    return Ok(self.park(order, previous, 0, actor));
                }
                Err(e) => return Err(e),
            }
        } else {
            None
        };

        order.zen_status = ZenStatus::ReadyForFulfillment;
        append_note(
            order,
            status_note(previous, ZenStatus::ReadyForFulfillment, Some("wallet charged")),
            actor,
        );
        info!(
            order_id,
            user_id = order.user_id,
            amount = order.landed_cost,
            "order paid from wallet"
        );

        Ok(PaymentOutcome::Paid {
            order: order.clone(),
            entry: charge,
        })
    }

    fn park(&self, order: &mut Order, previous: ZenStatus, balance: Minor, actor: &Actor) -> PaymentOutcome {
        if previous != ZenStatus::AwaitingWallet {
            order.zen_status = ZenStatus::AwaitingWallet;
            append_note(
                order,
                status_note(previous, ZenStatus::AwaitingWallet, Some("insufficient wallet balance")),
                actor,
            );
        }
        info!(
            order_id = order.id,
            user_id = order.user_id,
            balance,
            required = order.landed_cost,
            "order parked awaiting wallet funds"
        );

        PaymentOutcome::Parked {
            order: order.clone(),
            balance,
            required: order.landed_cost,
        }
    }

    /// Re-attempt payment of a user's parked orders, oldest first
    ///
    /// Stops at the first order the wallet still cannot cover. Orders that
    /// already carry a charge are not waiting on funds and are skipped.
    pub fn retry_awaiting(&self, user_id: UserId, actor: &Actor) -> Vec<PaymentOutcome> {
        let mut parked: Vec<(chrono::DateTime<Utc>, OrderId)> = self
            .orders
            .iter()
            .filter(|entry| {
                entry.user_id == user_id
                    && entry.zen_status == ZenStatus::AwaitingWallet
                    && !matches!(entry.wallet_charge, WalletCharge::Charged { .. })
            })
            .map(|entry| (entry.created_at, entry.id))
            .collect();
        parked.sort();

        let mut outcomes = Vec::new();
        for (_, order_id) in parked {
            match self.process_payment(order_id, actor) {
                Ok(outcome) => {
                    let stop = matches!(outcome, PaymentOutcome::Parked { .. });
                    outcomes.push(outcome);
                    if stop {
                        break;
                    }
                }
                Err(e) => debug!(order_id, error = %e, "parked order skipped"),
            }
        }
        outcomes
    }

    /// Orders currently in `status`, by id
    pub fn list_by_status(&self, status: ZenStatus) -> Vec<Order> {
        let mut orders: Vec<Order> = self
            .orders
            .iter()
            .filter(|entry| entry.zen_status == status)
            .map(|entry| entry.value().clone())
            .collect();
        orders.sort_by_key(|order| order.id);
        orders
    }

    pub fn list_for_user(&self, user_id: UserId) -> Vec<Order> {
        let mut orders: Vec<Order> = self
            .orders
            .iter()
            .filter(|entry| entry.user_id == user_id)
            .map(|entry| entry.value().clone())
            .collect();
        orders.sort_by_key(|order| order.id);
        orders
    }

    pub fn count_by_status(&self, status: ZenStatus) -> usize {
        self.orders
            .iter()
            .filter(|entry| entry.zen_status == status)
            .count()
    }
}

fn status_note(from: ZenStatus, to: ZenStatus, note: Option<&str>) -> String {
    match note.map(str::trim).filter(|note| !note.is_empty()) {
        Some(note) => format!("Status changed from {} to {}: {}", from, to, note),
        None => format!("Status changed from {} to {}", from, to),
    }
}

fn append_note(order: &mut Order, note: String, actor: &Actor) {
    let now = Utc::now();
    order.internal_notes.push(InternalNote {
        note,
        created_by: actor.id,
        created_at: now,
    });
    order.updated_at = now;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ledger::TransactionLedger;
    use rstest::rstest;

    fn desk(policy: TransitionPolicy) -> (OrderDesk, Arc<WalletStore>) {
        let wallets = Arc::new(WalletStore::new(Arc::new(TransactionLedger::new()), "INR"));
        (OrderDesk::new(Arc::clone(&wallets), policy), wallets)
    }

    fn admin() -> Actor {
        Actor::admin(900)
    }

    #[test]
    fn test_bogus_status_leaves_order_unchanged() {
        let (desk, _) = desk(TransitionPolicy::Permissive);
        desk.register(Order::new(1, 10, "store", 2000)).unwrap();

        let result = desk.transition(1, "bogus_status", &admin(), None);

        assert!(matches!(result, Err(LedgerError::InvalidStatus { .. })));
        let order = desk.get(1).unwrap();
        assert_eq!(order.zen_status, ZenStatus::Shopify);
        assert!(order.internal_notes.is_empty());
    }

    #[test]
    fn test_transition_appends_note_with_actor() {
        let (desk, _) = desk(TransitionPolicy::Permissive);
        desk.register(Order::new(1, 10, "store", 0)).unwrap();

        let outcome = desk
            .transition(1, "sourcing", &admin(), Some("picked supplier"))
            .unwrap();

        assert_eq!(outcome.previous, ZenStatus::Shopify);
        assert_eq!(outcome.order.zen_status, ZenStatus::Sourcing);
        let note = &outcome.order.internal_notes[0];
        assert_eq!(note.note, "Status changed from shopify to sourcing: picked supplier");
        assert_eq!(note.created_by, 900);
    }

    #[test]
    fn test_transition_unknown_order_is_not_found() {
        let (desk, _) = desk(TransitionPolicy::Permissive);
        let result = desk.transition(404, "packing", &admin(), None);
        assert_eq!(result.unwrap_err(), LedgerError::not_found("order", 404));
    }

    #[test]
    fn test_entering_fulfillment_debits_landed_cost_once() {
        let (desk, wallets) = desk(TransitionPolicy::Permissive);
        wallets.open(10, 10000).unwrap();
        desk.register(Order::new(1, 10, "store", 2500)).unwrap();

        let outcome = desk.transition(1, "sourcing", &admin(), None).unwrap();
        let charge = outcome.wallet_entry.unwrap();
        assert_eq!(charge.entry_type, EntryType::Debit);
        assert_eq!(charge.reference_id.as_deref(), Some("order:1"));
        assert_eq!(wallets.get_balance(10).unwrap(), 7500);

        let next = desk.transition(1, "packing", &admin(), None).unwrap();
        assert!(next.wallet_entry.is_none());
        assert_eq!(wallets.get_balance(10).unwrap(), 7500);
    }

    #[test]
    fn test_unaffordable_transition_fails_without_change() {
        let (desk, wallets) = desk(TransitionPolicy::Permissive);
        wallets.open(10, 1000).unwrap();
        desk.register(Order::new(1, 10, "store", 2500)).unwrap();

        let result = desk.transition(1, "sourcing", &admin(), None);

        assert!(matches!(result, Err(LedgerError::InsufficientFunds { .. })));
        let order = desk.get(1).unwrap();
        assert_eq!(order.zen_status, ZenStatus::Shopify);
        assert_eq!(order.wallet_charge, WalletCharge::Uncharged);
        assert_eq!(wallets.get_balance(10).unwrap(), 1000);
    }

    #[rstest]
    #[case("returned")]
    #[case("failed")]
    #[case("rto_delivered")]
    fn test_refund_on_terminal_failure_is_idempotent(#[case] terminal: &str) {
        let (desk, wallets) = desk(TransitionPolicy::Permissive);
        wallets.open(10, 10000).unwrap();
        desk.register(Order::new(1, 10, "store", 2500)).unwrap();
        desk.transition(1, "shipped", &admin(), None).unwrap();
        assert_eq!(wallets.get_balance(10).unwrap(), 7500);

        let refund = desk.transition(1, terminal, &admin(), None).unwrap();
        assert_eq!(refund.wallet_entry.unwrap().entry_type, EntryType::Credit);
        assert_eq!(wallets.get_balance(10).unwrap(), 10000);

        let again = desk.transition(1, terminal, &admin(), None).unwrap();
        assert!(again.wallet_entry.is_none());
        assert_eq!(wallets.get_balance(10).unwrap(), 10000);
        assert!(wallets.reconcile(10).unwrap().balanced);
    }

    #[test]
    fn test_failing_unpaid_order_writes_no_refund() {
        let (desk, wallets) = desk(TransitionPolicy::Permissive);
        wallets.open(10, 100).unwrap();
        desk.register(Order::new(1, 10, "store", 2500)).unwrap();

        let outcome = desk.transition(1, "failed", &admin(), None).unwrap();

        assert!(outcome.wallet_entry.is_none());
        assert_eq!(wallets.ledger().entry_count(10), 1);
    }

    #[test]
    fn test_permissive_policy_allows_arbitrary_jumps() {
        let (desk, _) = desk(TransitionPolicy::Permissive);
        desk.register(Order::new(1, 10, "store", 0)).unwrap();

        desk.transition(1, "delivered", &admin(), None).unwrap();
        let outcome = desk.transition(1, "packing", &admin(), None).unwrap();

        assert_eq!(outcome.order.zen_status, ZenStatus::Packing);
    }

    #[test]
    fn test_strict_policy_rejects_skips_and_freezes_terminals() {
        let (desk, _) = desk(TransitionPolicy::Strict);
        desk.register(Order::new(1, 10, "store", 0)).unwrap();

        let skip = desk.transition(1, "shipped", &admin(), None);
        assert!(matches!(skip, Err(LedgerError::InvalidTransition { .. })));

        desk.transition(1, "failed", &admin(), None).unwrap();
        let frozen = desk.transition(1, "sourcing", &admin(), None);
        assert_eq!(
            frozen.unwrap_err(),
            LedgerError::immutable("order", 1, "failed")
        );
    }

    #[test]
    fn test_sync_upstream_never_touches_zen_status() {
        let (desk, _) = desk(TransitionPolicy::Permissive);
        desk.register(Order::new(1, 10, "store", 0)).unwrap();
        desk.transition(1, "packing", &admin(), None).unwrap();

        let order = desk
            .sync_upstream(1, Some("paid".to_string()), Some("fulfilled".to_string()))
            .unwrap();

        assert_eq!(order.zen_status, ZenStatus::Packing);
        assert_eq!(order.financial_status.as_deref(), Some("paid"));
        assert_eq!(order.fulfillment_status.as_deref(), Some("fulfilled"));
    }

    #[test]
    fn test_process_payment_parks_then_pays_after_credit() {
        let (desk, wallets) = desk(TransitionPolicy::Strict);
        wallets.open(10, 1000).unwrap();
        desk.register(Order::new(1, 10, "store", 2500)).unwrap();
        desk.register(Order::new(2, 10, "store", 2000)).unwrap();

        let first = desk.process_payment(1, &Actor::system()).unwrap();
        assert!(matches!(first, PaymentOutcome::Parked { balance: 1000, required: 2500, .. }));
        assert_eq!(first.order().zen_status, ZenStatus::AwaitingWallet);
        desk.process_payment(2, &Actor::system()).unwrap();

        wallets.credit(10, 2000, "top-up", None).unwrap();
        let outcomes = desk.retry_awaiting(10, &Actor::system());

        assert_eq!(outcomes.len(), 2);
        assert!(matches!(outcomes[0], PaymentOutcome::Paid { .. }));
        assert!(matches!(outcomes[1], PaymentOutcome::Parked { .. }));
        assert_eq!(desk.get(1).unwrap().zen_status, ZenStatus::ReadyForFulfillment);
        assert_eq!(desk.get(2).unwrap().zen_status, ZenStatus::AwaitingWallet);
        assert_eq!(wallets.get_balance(10).unwrap(), 500);
    }

    #[test]
    fn test_process_payment_twice_is_already_paid() {
        let (desk, wallets) = desk(TransitionPolicy::Permissive);
        wallets.open(10, 5000).unwrap();
        desk.register(Order::new(1, 10, "store", 2500)).unwrap();

        desk.process_payment(1, &Actor::system()).unwrap();
        let again = desk.process_payment(1, &Actor::system()).unwrap();

        assert!(matches!(again, PaymentOutcome::AlreadyPaid { .. }));
        assert_eq!(wallets.get_balance(10).unwrap(), 2500);
    }

    #[test]
    fn test_charged_order_moved_back_to_awaiting_wallet_is_released() {
        let (desk, wallets) = desk(TransitionPolicy::Permissive);
        wallets.open(10, 5000).unwrap();
        desk.register(Order::new(1, 10, "store", 2500)).unwrap();
        desk.transition(1, "sourcing", &admin(), None).unwrap();
        desk.transition(1, "awaiting_wallet", &admin(), None).unwrap();
        let charge = desk.get(1).unwrap().wallet_charge;

        // A top-up no longer picks it up
        wallets.credit(10, 100, "top-up", None).unwrap();
        assert!(desk.retry_awaiting(10, &Actor::system()).is_empty());

        let outcome = desk.process_payment(1, &Actor::system()).unwrap();

        assert!(matches!(outcome, PaymentOutcome::Paid { entry: None, .. }));
        let order = desk.get(1).unwrap();
        assert_eq!(order.zen_status, ZenStatus::ReadyForFulfillment);
        assert_eq!(order.wallet_charge, charge);
        assert_eq!(
            order.internal_notes.last().unwrap().note,
            "Status changed from awaiting_wallet to ready_for_fulfillment: already charged"
        );
        assert_eq!(desk.count_by_status(ZenStatus::AwaitingWallet), 0);
        assert_eq!(wallets.get_balance(10).unwrap(), 2600);
    }

    #[test]
    fn test_concurrent_transitions_charge_once() {
        use std::thread;

        let (desk, wallets) = desk(TransitionPolicy::Permissive);
        let desk = Arc::new(desk);
        wallets.open(10, 10000).unwrap();
        desk.register(Order::new(1, 10, "store", 2500)).unwrap();

        let mut handles = vec![];
        for status in ["sourcing", "packing", "ready_for_dispatch", "dispatched"] {
            let desk = Arc::clone(&desk);
            handles.push(thread::spawn(move || {
                desk.transition(1, status, &Actor::admin(1), None).unwrap();
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(wallets.get_balance(10).unwrap(), 7500);
        assert_eq!(desk.get(1).unwrap().internal_notes.len(), 4);
        assert!(wallets.reconcile(10).unwrap().balanced);
    }
}
