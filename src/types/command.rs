//! Journal commands
//!
//! A journal is a replayable sequence of wallet, order and withdrawal
//! operations. Each command belongs to exactly one user, so commands for
//! different users can be replayed concurrently.

use super::ids::{Minor, OrderId, PayoutMethodId, UserId, WithdrawalId};
use super::transaction::EntryType;

#[derive(Debug, Clone, PartialEq)]
pub struct JournalCommand {
    /// Wallet owner the command acts on
    pub user: UserId,
    pub kind: CommandKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CommandKind {
    Open {
        opening_balance: Minor,
    },
    Credit {
        amount: Minor,
        reason: String,
        reference: Option<String>,
    },
    Debit {
        amount: Minor,
        reason: String,
        reference: Option<String>,
    },
    Adjust {
        entry_type: EntryType,
        amount: Minor,
        reason: String,
        reference: Option<String>,
        admin: UserId,
    },
    RegisterOrder {
        order_id: OrderId,
        landed_cost: Minor,
        store: String,
    },
    PayOrder {
        order_id: OrderId,
    },
    OrderStatus {
        order_id: OrderId,
        status: String,
        note: Option<String>,
        admin: UserId,
    },
    Withdraw {
        withdrawal_id: WithdrawalId,
        amount: Minor,
        payout_method_id: PayoutMethodId,
        user_note: Option<String>,
    },
    WithdrawalStatus {
        withdrawal_id: WithdrawalId,
        status: String,
        admin_note: Option<String>,
        tx_ref: Option<String>,
    },
}

impl CommandKind {
    pub fn name(&self) -> &'static str {
        match self {
            CommandKind::Open { .. } => "open",
            CommandKind::Credit { .. } => "credit",
            CommandKind::Debit { .. } => "debit",
            CommandKind::Adjust {
                entry_type: EntryType::Credit,
                ..
            } => "adjust_credit",
            CommandKind::Adjust {
                entry_type: EntryType::Debit,
                ..
            } => "adjust_debit",
            CommandKind::RegisterOrder { .. } => "order",
            CommandKind::PayOrder { .. } => "pay_order",
            CommandKind::OrderStatus { .. } => "order_status",
            CommandKind::Withdraw { .. } => "withdraw",
            CommandKind::WithdrawalStatus { .. } => "withdrawal_status",
        }
    }
}
