//! Error types for the wallet ledger
//!
//! This module defines every error the ledger, order status machine and
//! withdrawal workflow can surface. All of them are local, synchronous
//! validation failures: none are retried, and none leave partial state behind.
//!
//! # Error Categories
//!
//! - **Amount Errors**: non-positive amounts, insufficient funds, overflow
//! - **Status Errors**: unknown status values, disallowed transitions, terminal records
//! - **Lookup Errors**: missing or duplicate wallet, order or withdrawal
//! - **Caller Errors**: missing adjustment reason, non-admin caller
//! - **Journal Errors**: I/O and CSV parsing failures during replay

use super::ids::{Minor, UserId};
use thiserror::Error;

/// Main error type for the wallet ledger
///
/// Each variant carries enough context to produce a useful message for the
/// caller and a structured log line.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    /// Amount was zero or negative
    #[error("Invalid amount {amount} for {operation}: amount must be a positive number of minor units")]
    InvalidAmount {
        /// The rejected amount
        amount: Minor,
        /// Operation that received the amount
        operation: String,
    },

    /// A debit would drive the balance below zero
    ///
    /// The wallet and the ledger are left untouched.
    #[error("Insufficient funds for user {user}: balance {balance}, requested {requested}")]
    InsufficientFunds {
        /// Owner of the wallet
        user: UserId,
        /// Balance at the moment the debit was validated
        balance: Minor,
        /// Requested debit amount
        requested: Minor,
    },

    /// Status string is not one of the enumerated values
    #[error("Invalid {kind} status '{value}'")]
    InvalidStatus {
        /// Which state machine rejected the value ("order" or "withdrawal")
        kind: String,
        /// The rejected value
        value: String,
    },

    /// Status is valid but the move is not allowed from the current state
    #[error("Transition of {kind} {id} from {from} to {to} is not allowed")]
    InvalidTransition {
        /// Which state machine rejected the move
        kind: String,
        /// Record identifier
        id: u64,
        /// Current status
        from: String,
        /// Requested status
        to: String,
    },

    /// The record is in a terminal state and cannot change
    #[error("{kind} {id} is {status} and can no longer be modified")]
    Immutable {
        /// Record kind
        kind: String,
        /// Record identifier
        id: u64,
        /// Terminal status the record is in
        status: String,
    },

    /// Wallet, order or withdrawal does not exist
    #[error("{kind} {id} not found")]
    NotFound {
        /// Record kind
        kind: String,
        /// Record identifier
        id: u64,
    },

    /// A record with this identifier already exists
    #[error("{kind} {id} already exists")]
    Duplicate {
        /// Record kind
        kind: String,
        /// Record identifier
        id: u64,
    },

    /// Administrative adjustment submitted without a reason
    #[error("Adjustment for user {user} requires a non-blank reason")]
    MissingReason {
        /// Target wallet owner
        user: UserId,
    },

    /// Caller lacks the privilege required for the operation
    #[error("User {actor} is not allowed to {operation}")]
    Forbidden {
        /// Caller identifier
        actor: UserId,
        /// Operation that was attempted
        operation: String,
    },

    /// Balance arithmetic would overflow
    #[error("Arithmetic overflow in {operation} for user {user}")]
    ArithmeticOverflow {
        /// Operation that would overflow
        operation: String,
        /// Wallet owner
        user: UserId,
    },

    /// I/O error while reading a journal or writing a report
    #[error("I/O error: {message}")]
    IoError {
        /// Description of the I/O error
        message: String,
    },

    /// Malformed journal record
    #[error("CSV parse error{}: {message}", line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    ParseError {
        /// Line number where the error occurred (if available)
        line: Option<u64>,
        /// Description of the parsing error
        message: String,
    },
}

impl From<std::io::Error> for LedgerError {
    fn from(error: std::io::Error) -> Self {
        LedgerError::IoError {
            message: error.to_string(),
        }
    }
}

impl From<csv::Error> for LedgerError {
    fn from(error: csv::Error) -> Self {
        let line = error.position().map(|pos| pos.line());

        LedgerError::ParseError {
            line,
            message: error.to_string(),
        }
    }
}

// Helper functions for creating common errors

impl LedgerError {
    /// Create an InvalidAmount error
    pub fn invalid_amount(amount: Minor, operation: &str) -> Self {
        LedgerError::InvalidAmount {
            amount,
            operation: operation.to_string(),
        }
    }

    /// Create an InsufficientFunds error
    pub fn insufficient_funds(user: UserId, balance: Minor, requested: Minor) -> Self {
        LedgerError::InsufficientFunds {
            user,
            balance,
            requested,
        }
    }

    /// Create an InvalidStatus error
    pub fn invalid_status(kind: &str, value: &str) -> Self {
        LedgerError::InvalidStatus {
            kind: kind.to_string(),
            value: value.to_string(),
        }
    }

    /// Create an InvalidTransition error
    pub fn invalid_transition(kind: &str, id: u64, from: &str, to: &str) -> Self {
        LedgerError::InvalidTransition {
            kind: kind.to_string(),
            id,
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    /// Create an Immutable error
    pub fn immutable(kind: &str, id: u64, status: &str) -> Self {
        LedgerError::Immutable {
            kind: kind.to_string(),
            id,
            status: status.to_string(),
        }
    }

    /// Create a NotFound error
    pub fn not_found(kind: &str, id: u64) -> Self {
        LedgerError::NotFound {
            kind: kind.to_string(),
            id,
        }
    }

    /// Create a Duplicate error
    pub fn duplicate(kind: &str, id: u64) -> Self {
        LedgerError::Duplicate {
            kind: kind.to_string(),
            id,
        }
    }

    /// Create a MissingReason error
    pub fn missing_reason(user: UserId) -> Self {
        LedgerError::MissingReason { user }
    }

    /// Create a Forbidden error
    pub fn forbidden(actor: UserId, operation: &str) -> Self {
        LedgerError::Forbidden {
            actor,
            operation: operation.to_string(),
        }
    }

    /// Create an ArithmeticOverflow error
    pub fn arithmetic_overflow(operation: &str, user: UserId) -> Self {
        LedgerError::ArithmeticOverflow {
            operation: operation.to_string(),
            user,
        }
    }
}
