//! CSV format handling for journal commands and replay reports
//!
//! This module centralizes all CSV format concerns, providing:
//! - CsvCommand structure for deserialization
//! - Conversion from CSV rows to journal commands
//! - Wallet and ledger report serialization
//!
//! All functions are pure (no I/O) for easy testing.
//!
//! # Journal Columns
//!
//! `op,user,id,amount,status,reason,reference,actor`
//!
//! | op | id | amount | status | reason | reference | actor |
//! |----|----|--------|--------|--------|-----------|-------|
//! | open | | opening balance | | | | |
//! | credit / debit | | amount | | reason | reference | |
//! | adjust_credit / adjust_debit | | amount | | reason | reference | admin |
//! | order | order | landed cost | | | store | |
//! | pay_order | order | | | | | |
//! | order_status | order | | status | note | | admin |
//! | withdraw | withdrawal | amount | | user note | payout method | |
//! | withdrawal_status | withdrawal | | status | admin note | tx ref | |
//!
//! Amounts are integers in minor units.

use crate::core::platform::WalletReport;
use crate::types::{
    format_minor, CommandKind, EntryType, JournalCommand, LedgerError, Minor, UserId,
    WalletTransaction,
};
use serde::Deserialize;
use std::io::Write;

/// Store recorded for journal orders that do not name one
pub const DEFAULT_STORE: &str = "journal";

/// CSV row structure for deserialization
///
/// Every column but `op` and `user` is optional; which ones are required
/// depends on the operation.
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
pub struct CsvCommand {
    pub op: String,
    pub user: UserId,
    pub id: Option<u64>,
    pub amount: Option<String>,
    pub status: Option<String>,
    pub reason: Option<String>,
    pub reference: Option<String>,
    pub actor: Option<UserId>,
}

/// Convert a CsvCommand to a JournalCommand
///
/// # Returns
///
/// * `Ok(JournalCommand)` - Successfully converted command
/// * `Err(String)` - Unknown operation, missing required column or malformed amount
pub fn convert_csv_command(row: CsvCommand) -> Result<JournalCommand, String> {
    let op = row.op.trim().to_lowercase();
    let reason = non_blank(row.reason.clone());
    let reference = non_blank(row.reference.clone());

    let kind = match op.as_str() {
        "open" => CommandKind::Open {
            opening_balance: parse_amount(&row)?.unwrap_or(0),
        },
        "credit" => CommandKind::Credit {
            amount: required_amount(&row)?,
            reason: reason.unwrap_or_else(|| "credit".to_string()),
            reference,
        },
        "debit" => CommandKind::Debit {
            amount: required_amount(&row)?,
            reason: reason.unwrap_or_else(|| "debit".to_string()),
            reference,
        },
        "adjust_credit" | "adjust_debit" => CommandKind::Adjust {
            entry_type: if op == "adjust_credit" {
                EntryType::Credit
            } else {
                EntryType::Debit
            },
            amount: required_amount(&row)?,
            reason: reason.unwrap_or_default(),
            reference,
            admin: required_actor(&row)?,
        },
        "order" => CommandKind::RegisterOrder {
            order_id: required_id(&row)?,
            landed_cost: required_amount(&row)?,
            store: reference.unwrap_or_else(|| DEFAULT_STORE.to_string()),
        },
        "pay_order" => CommandKind::PayOrder {
            order_id: required_id(&row)?,
        },
        "order_status" => CommandKind::OrderStatus {
            order_id: required_id(&row)?,
            status: required_status(&row)?,
            note: reason,
            admin: required_actor(&row)?,
        },
        "withdraw" => {
            let payout = reference
                .ok_or_else(|| missing(&row, "a payout method in the reference column"))?;
            CommandKind::Withdraw {
                withdrawal_id: required_id(&row)?,
                amount: required_amount(&row)?,
                payout_method_id: payout.parse().map_err(|_| {
                    format!("Invalid payout method '{}' for user {}", payout, row.user)
                })?,
                user_note: reason,
            }
        }
        "withdrawal_status" => CommandKind::WithdrawalStatus {
            withdrawal_id: required_id(&row)?,
            status: required_status(&row)?,
            admin_note: reason,
            tx_ref: reference,
        },
        _ => {
            return Err(format!(
                "Invalid operation: '{}' for user {}",
                row.op, row.user
            ))
        }
    };

    Ok(JournalCommand {
        user: row.user,
        kind,
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn missing(row: &CsvCommand, what: &str) -> String {
    format!("{} for user {} requires {}", row.op, row.user, what)
}

fn parse_amount(row: &CsvCommand) -> Result<Option<Minor>, String> {
    match non_blank(row.amount.clone()) {
        Some(raw) => raw
            .parse::<Minor>()
            .map(Some)
            .map_err(|_| format!("Invalid amount '{}' for user {}", raw, row.user)),
        None => Ok(None),
    }
}

fn required_amount(row: &CsvCommand) -> Result<Minor, String> {
    parse_amount(row)?.ok_or_else(|| missing(row, "an amount"))
}

fn required_id(row: &CsvCommand) -> Result<u64, String> {
    row.id.ok_or_else(|| missing(row, "an id"))
}

fn required_actor(row: &CsvCommand) -> Result<UserId, String> {
    row.actor.ok_or_else(|| missing(row, "an actor"))
}

fn required_status(row: &CsvCommand) -> Result<String, String> {
    non_blank(row.status.clone()).ok_or_else(|| missing(row, "a status"))
}

/// Write the final wallet snapshot
///
/// Columns: user, balance, currency, transactions, reconciled. Rows are sorted
/// by user; balances are major units with two decimals.
pub fn write_wallets_csv(wallets: &[WalletReport], output: &mut dyn Write) -> Result<(), LedgerError> {
    let mut writer = csv::Writer::from_writer(output);
    writer.write_record(["user", "balance", "currency", "transactions", "reconciled"])?;

    let mut sorted = wallets.to_vec();
    sorted.sort_by_key(|wallet| wallet.user_id);

    for wallet in sorted {
        writer.write_record(&[
            wallet.user_id.to_string(),
            format_minor(wallet.balance),
            wallet.currency,
            wallet.transactions.to_string(),
            wallet.reconciled.to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// Write every ledger entry
///
/// Columns: id, user, type, amount, balance_before, balance_after, reason,
/// reference. Amounts stay in minor units.
pub fn write_ledger_csv(
    entries: &[WalletTransaction],
    output: &mut dyn Write,
) -> Result<(), LedgerError> {
    let mut writer = csv::Writer::from_writer(output);
    writer.write_record([
        "id",
        "user",
        "type",
        "amount",
        "balance_before",
        "balance_after",
        "reason",
        "reference",
    ])?;

    for entry in entries {
        writer.write_record(&[
            entry.id.to_string(),
            entry.user_id.to_string(),
            entry.entry_type.as_str().to_string(),
            entry.amount.to_string(),
            entry.balance_before.to_string(),
            entry.balance_after.to_string(),
            entry.reason.clone(),
            entry.reference_id.clone().unwrap_or_default(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}
