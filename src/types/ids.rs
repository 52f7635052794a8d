//! Identifier and money aliases shared by every record type

/// Wallet owner identifier
pub type UserId = u64;

/// Ledger entry identifier, assigned sequentially by the ledger
pub type TransactionId = u64;

/// Order identifier
pub type OrderId = u64;

/// Withdrawal request identifier
pub type WithdrawalId = u64;

/// Payout destination (bank account, UPI handle, crypto address) identifier
pub type PayoutMethodId = u64;

/// Money in minor currency units (paise, cents)
///
/// Signed so that invalid negative input can be represented and rejected;
/// committed balances and entry amounts are never negative.
pub type Minor = i64;
