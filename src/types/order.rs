//! Order types and the internal fulfillment status (`zen_status`)
//!
//! An order carries two disjoint status families: the storefront-reported
//! `financial_status`/`fulfillment_status` strings, mirrored read-only, and
//! the internally owned [`ZenStatus`]. Storefront syncs never touch the
//! internal one.

use super::error::LedgerError;
use super::ids::{Minor, OrderId, TransactionId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Internal fulfillment status of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZenStatus {
    /// Just synced from the storefront, nothing done internally yet
    Shopify,
    /// Parked until the wallet can cover the landed cost
    AwaitingWallet,
    ReadyForFulfillment,
    Sourcing,
    Packing,
    ReadyForDispatch,
    Dispatched,
    Shipped,
    OutForDelivery,
    Delivered,
    RtoInitiated,
    RtoDelivered,
    Returned,
    Failed,
}

impl ZenStatus {
    /// Every enumerated status
    pub const ALL: [ZenStatus; 14] = [
        ZenStatus::Shopify,
        ZenStatus::AwaitingWallet,
        ZenStatus::ReadyForFulfillment,
        ZenStatus::Sourcing,
        ZenStatus::Packing,
        ZenStatus::ReadyForDispatch,
        ZenStatus::Dispatched,
        ZenStatus::Shipped,
        ZenStatus::OutForDelivery,
        ZenStatus::Delivered,
        ZenStatus::RtoInitiated,
        ZenStatus::RtoDelivered,
        ZenStatus::Returned,
        ZenStatus::Failed,
    ];

    /// The linear fulfillment sequence, in order
    pub const MAIN_LINE: [ZenStatus; 10] = [
        ZenStatus::Shopify,
        ZenStatus::AwaitingWallet,
        ZenStatus::ReadyForFulfillment,
        ZenStatus::Sourcing,
        ZenStatus::Packing,
        ZenStatus::ReadyForDispatch,
        ZenStatus::Dispatched,
        ZenStatus::Shipped,
        ZenStatus::OutForDelivery,
        ZenStatus::Delivered,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ZenStatus::Shopify => "shopify",
            ZenStatus::AwaitingWallet => "awaiting_wallet",
            ZenStatus::ReadyForFulfillment => "ready_for_fulfillment",
            ZenStatus::Sourcing => "sourcing",
            ZenStatus::Packing => "packing",
            ZenStatus::ReadyForDispatch => "ready_for_dispatch",
            ZenStatus::Dispatched => "dispatched",
            ZenStatus::Shipped => "shipped",
            ZenStatus::OutForDelivery => "out_for_delivery",
            ZenStatus::Delivered => "delivered",
            ZenStatus::RtoInitiated => "rto_initiated",
            ZenStatus::RtoDelivered => "rto_delivered",
            ZenStatus::Returned => "returned",
            ZenStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ZenStatus::Delivered | ZenStatus::RtoDelivered | ZenStatus::Returned | ZenStatus::Failed
        )
    }

    fn main_line_index(&self) -> Option<usize> {
        Self::MAIN_LINE.iter().position(|status| status == self)
    }

    /// Entering this status requires the landed cost to have been paid from the wallet
    pub fn requires_charge(&self) -> bool {
        match self {
            ZenStatus::RtoInitiated => true,
            other => other
                .main_line_index()
                .is_some_and(|index| index >= 2),
        }
    }

    /// Entering this status returns the landed cost to the wallet
    pub fn refunds_charge(&self) -> bool {
        matches!(
            self,
            ZenStatus::Returned | ZenStatus::Failed | ZenStatus::RtoDelivered
        )
    }

    /// Whether the strict transition table allows moving from `self` to `next`
    ///
    /// Terminal sources are rejected by the caller with `Immutable` before
    /// this is consulted.
    pub fn strictly_allows(&self, next: ZenStatus) -> bool {
        if *self == next || next == ZenStatus::Failed {
            return true;
        }

        match (self, next) {
            (ZenStatus::Shopify, ZenStatus::ReadyForFulfillment) => true,
            (
                ZenStatus::Dispatched | ZenStatus::Shipped | ZenStatus::OutForDelivery,
                ZenStatus::RtoInitiated,
            ) => true,
            (ZenStatus::RtoInitiated, ZenStatus::RtoDelivered) => true,
            (ZenStatus::Shipped | ZenStatus::OutForDelivery, ZenStatus::Returned) => true,
            (from, to) => match (from.main_line_index(), to.main_line_index()) {
                (Some(from), Some(to)) => to == from + 1,
                _ => false,
            },
        }
    }
}

impl fmt::Display for ZenStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ZenStatus {
    type Err = LedgerError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == trimmed)
            .ok_or_else(|| LedgerError::invalid_status("order", value))
    }
}

/// How strictly `transition` validates the requested move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransitionPolicy {
    /// Any enumerated status is accepted from any state (support corrections)
    #[default]
    Permissive,
    /// Only moves listed by [`ZenStatus::strictly_allows`]; terminal states are frozen
    Strict,
}

impl fmt::Display for TransitionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransitionPolicy::Permissive => f.write_str("permissive"),
            TransitionPolicy::Strict => f.write_str("strict"),
        }
    }
}

impl FromStr for TransitionPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "permissive" => Ok(TransitionPolicy::Permissive),
            "strict" => Ok(TransitionPolicy::Strict),
            other => Err(format!("Invalid transition policy '{}'", other)),
        }
    }
}

/// Wallet payment state of an order's landed cost
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "state")]
pub enum WalletCharge {
    Uncharged,
    #[serde(rename_all = "camelCase")]
    Charged { transaction_id: TransactionId },
    #[serde(rename_all = "camelCase")]
    Refunded {
        charge_id: TransactionId,
        refund_id: TransactionId,
    },
}

/// Note appended on every internal status change
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalNote {
    pub note: String,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
}

/// Order subset relevant to wallet charging and fulfillment tracking
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub store_connection_id: String,

    /// Storefront-reported payment status, mirrored read-only
    pub financial_status: Option<String>,
    /// Storefront-reported fulfillment status, mirrored read-only
    pub fulfillment_status: Option<String>,

    pub zen_status: ZenStatus,

    /// Amount debited from the wallet to fulfil the order
    pub landed_cost: Minor,
    pub wallet_charge: WalletCharge,

    /// Append-only
    pub internal_notes: Vec<InternalNote>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Create a freshly synced order in the `shopify` state
    pub fn new(
        id: OrderId,
        user_id: UserId,
        store_connection_id: impl Into<String>,
        landed_cost: Minor,
    ) -> Self {
        let now = Utc::now();
        Order {
            id,
            user_id,
            store_connection_id: store_connection_id.into(),
            financial_status: None,
            fulfillment_status: None,
            zen_status: ZenStatus::Shopify,
            landed_cost,
            wallet_charge: WalletCharge::Uncharged,
            internal_notes: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Ledger `reference_id` used for this order's charge and refund
    pub fn reference(&self) -> String {
        order_reference(self.id)
    }
}

pub fn order_reference(id: OrderId) -> String {
    format!("order:{}", id)
}
