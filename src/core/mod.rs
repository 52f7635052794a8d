//! Core business logic module
//!
//! This module contains the wallet ledger components:
//! - `ledger` - Append-only transaction ledger and reconciliation
//! - `wallet_store` - Atomic credit/debit against per-user wallets
//! - `order_machine` - Internal order status machine with wallet charges and refunds
//! - `withdrawal` - Withdrawal requests and the payout pipeline
//! - `admin` - Privileged manual adjustments
//! - `notify` - Fire-and-forget notifications
//! - `cache` - TTL cache and clocks
//! - `traits` - Trait seams for notifiers and clocks
//! - `platform` - Facade wiring the components together
//! - `batch_processor` - Per-user partitioned journal replay
//! - `journal_claims` - Ownership of the ids a journal creates

pub mod admin;
pub mod batch_processor;
pub mod cache;
pub mod journal_claims;
pub mod ledger;
pub mod notify;
pub mod order_machine;
pub mod platform;
pub mod traits;
pub mod wallet_store;
pub mod withdrawal;

pub use admin::{AdminAdjuster, Adjustment};
pub use batch_processor::{BatchProcessor, ProcessingResult};
pub use cache::{ManualClock, SystemClock, TtlCache};
pub use journal_claims::JournalClaims;
pub use ledger::{Reconciliation, TransactionLedger};
pub use notify::{LogNotifier, Notification, NotifyError};
pub use order_machine::{OrderDesk, PaymentOutcome, TransitionOutcome};
pub use platform::{WalletPlatform, WalletReport, WalletStats};
pub use traits::{Clock, Notifier};
pub use wallet_store::WalletStore;
pub use withdrawal::{StatusChange, WithdrawalDesk, WithdrawalFilter};
