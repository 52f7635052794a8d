//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `ids`: Identifier and money aliases
//! - `wallet`: Wallet state and auto-recharge settings
//! - `transaction`: Ledger entries and mutation requests
//! - `order`: Orders and the internal fulfillment status
//! - `withdrawal`: Withdrawal requests and their status pipeline
//! - `actor`: Caller identity
//! - `command`: Replayable journal commands
//! - `error`: Error types for the wallet ledger

pub mod actor;
pub mod command;
pub mod error;
pub mod ids;
pub mod order;
pub mod transaction;
pub mod wallet;
pub mod withdrawal;

pub use actor::{Actor, Role};
pub use command::{CommandKind, JournalCommand};
pub use error::LedgerError;
pub use ids::{Minor, OrderId, PayoutMethodId, TransactionId, UserId, WithdrawalId};
pub use order::{InternalNote, Order, TransitionPolicy, WalletCharge, ZenStatus};
pub use transaction::{EntryRequest, EntryType, Pagination, WalletTransaction};
pub use wallet::{format_minor, AutoRechargeSettings, Wallet};
pub use withdrawal::{WithdrawalRequest, WithdrawalStatus};
