//! Benchmark suite for comparing replay strategies
//!
//! This benchmark compares the performance of the synchronous and
//! asynchronous replay strategies using the divan benchmarking framework.
//!
//! # Running Benchmarks
//!
//! ```bash
//! cargo bench
//! ```
//!
//! # Generated Journals
//!
//! Journals are generated into temp files before timing starts. Each one
//! spreads its commands over 100 users and mixes:
//! - Wallet openings, credits and debits
//! - Order registration and payment
//! - Withdrawal requests and rejections

use std::io::Write;
use tempfile::NamedTempFile;
use zen_ledger::cli::{ReportKind, StrategyType};
use zen_ledger::config::LedgerConfig;
use zen_ledger::strategy::{create_strategy, BatchConfig};

const USERS: u64 = 100;

fn main() {
    divan::main();
}

/// Write a journal of roughly `commands` rows
fn generate_journal(commands: u64) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    writeln!(file, "op,user,id,amount,status,reason,reference,actor").expect("write failed");

    for user in 1..=USERS {
        writeln!(file, "open,{},,1000000,,,,", user).expect("write failed");
    }

    let mut order_id = 0u64;
    let mut withdrawal_id = 0u64;
    for i in 0..commands.saturating_sub(USERS) {
        let user = i % USERS + 1;
        let row = match i % 8 {
            0 | 1 => format!("credit,{},,{},,topup,,", user, 100 + i % 900),
            2 => format!("debit,{},,{},,,,", user, 50 + i % 400),
            3 => {
                order_id += 1;
                format!("order,{},{},{},,,,", user, order_id, 200 + i % 500)
            }
            // Pay and review as the owner from the previous row
            4 => format!("pay_order,{},{},,,,,", (i - 1) % USERS + 1, order_id),
            5 => {
                withdrawal_id += 1;
                format!("withdraw,{},{},{},,,7,", user, withdrawal_id, 1000 + i % 2000)
            }
            6 => format!(
                "withdrawal_status,{},{},,rejected,bench,,",
                (i - 1) % USERS + 1,
                withdrawal_id
            ),
            _ => format!("adjust_credit,{},,25,,promo,,900", user),
        };
        writeln!(file, "{}", row).expect("write failed");
    }

    file.flush().expect("Failed to flush temp file");
    file
}

/// Synchronous replay
#[divan::bench(args = [1_000, 10_000, 100_000])]
fn sync_strategy(bencher: divan::Bencher, commands: u64) {
    let journal = generate_journal(commands);
    let strategy = create_strategy(
        StrategyType::Sync,
        LedgerConfig::default(),
        ReportKind::Wallets,
        None,
    );

    bencher.bench_local(|| {
        let mut output = Vec::new();
        strategy
            .process(journal.path(), &mut output)
            .expect("Processing failed");
    });
}

/// Asynchronous batch replay with default batch settings
#[divan::bench(args = [1_000, 10_000, 100_000])]
fn async_strategy(bencher: divan::Bencher, commands: u64) {
    let journal = generate_journal(commands);
    let strategy = create_strategy(
        StrategyType::Async,
        LedgerConfig::default(),
        ReportKind::Wallets,
        Some(BatchConfig::default()),
    );

    bencher.bench_local(|| {
        let mut output = Vec::new();
        strategy
            .process(journal.path(), &mut output)
            .expect("Processing failed");
    });
}
