//! Zen Ledger Library
//! # Overview
//!
//! This library provides the wallet ledger of a dropshipping operations platform:
//! per-user wallet balances backed by an append-only transaction ledger, an
//! internal order status machine that charges and refunds wallets, a
//! withdrawal workflow that reserves funds at request time, and privileged
//! manual adjustments.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (Wallet, WalletTransaction, Order, WithdrawalRequest, etc.)
//! - [`config`] - Environment configuration with CLI overrides
//! - [`logging`] - tracing subscriber setup
//! - [`cli`] - CLI arguments parsing
//! - [`core`] - Business logic components:
//!   - [`core::wallet_store`] - Atomic credit/debit and the sole ledger writer
//!   - [`core::ledger`] - Append-only audit trail and reconciliation
//!   - [`core::order_machine`] - Order status machine, charges and refunds
//!   - [`core::withdrawal`] - Withdrawal requests and payout pipeline
//!   - [`core::admin`] - Admin adjustments
//!   - [`core::platform`] - Facade with notifications and cached stats
//! - [`io`] - CSV command journal reading and report writing
//! - [`strategy`] - Sync and async journal replay
//! - [`http`] - axum router exposing the wallet API
//!
//! # Money
//!
//! Amounts are integers in minor currency units (paise for INR). Balances
//! never go negative, and every committed mutation appends exactly one ledger
//! entry whose `balance_after` equals the wallet balance it produced.
//!
//! # Withdrawal Lifecycle
//!
//! - **pending**: funds are debited from the wallet at request time
//! - **processing / approved**: payout in progress
//! - **paid**: terminal, funds left the platform
//! - **rejected / failed**: funds are credited back exactly once

// Module declarations
pub mod cli;
pub mod config;
pub mod core;
pub mod http;
pub mod io;
pub mod logging;
pub mod strategy;
pub mod types;

pub use config::LedgerConfig;
pub use core::{OrderDesk, WalletPlatform, WalletStore, WithdrawalDesk};
pub use io::{write_ledger_csv, write_wallets_csv};
pub use types::{
    Actor, LedgerError, Minor, Order, UserId, Wallet, WalletTransaction, WithdrawalRequest,
    WithdrawalStatus, ZenStatus,
};
