//! Replay strategy module
//!
//! This module defines the Strategy pattern for complete journal replay
//! pipelines, covering both CSV parsing and command processing. This allows
//! different implementations (synchronous, asynchronous batch) to be selected
//! at runtime.

use crate::cli::{ReportKind, StrategyType};
use crate::config::LedgerConfig;
use crate::core::platform::WalletPlatform;
use crate::io::csv_format::{write_ledger_csv, write_wallets_csv};
use crate::types::{JournalCommand, LedgerError};
use std::io::Write;
use std::path::Path;
use tracing::warn;

pub mod r#async;
pub mod sync;

pub use self::r#async::{AsyncProcessingStrategy, BatchConfig};
pub use sync::SyncProcessingStrategy;

/// Complete replay pipeline: read a journal, apply it, write a report
pub trait ProcessingStrategy: Send + Sync {
    /// Replay the journal at `input_path` and write the report to `output`
    ///
    /// # Returns
    ///
    /// * `Ok(WalletPlatform)` - the replayed state, after the report was written
    /// * `Err(LedgerError)` - fatal error (file not found, I/O failure)
    ///
    /// Individual rows that fail to parse or are rejected by the ledger are
    /// logged and skipped; they never fail the replay.
    fn process(
        &self,
        input_path: &Path,
        output: &mut dyn Write,
    ) -> Result<WalletPlatform, LedgerError>;
}

/// Select a strategy implementation at runtime
///
/// `batch` is ignored by the sync strategy.
pub fn create_strategy(
    strategy_type: StrategyType,
    config: LedgerConfig,
    report: ReportKind,
    batch: Option<BatchConfig>,
) -> Box<dyn ProcessingStrategy> {
    match strategy_type {
        StrategyType::Sync => Box::new(SyncProcessingStrategy::new(config, report)),
        StrategyType::Async => Box::new(AsyncProcessingStrategy::new(
            config,
            report,
            batch.unwrap_or_default(),
        )),
    }
}

/// Write the selected report for a replayed platform
pub fn write_report(
    platform: &WalletPlatform,
    report: ReportKind,
    output: &mut dyn Write,
) -> Result<(), LedgerError> {
    match report {
        ReportKind::Wallets => write_wallets_csv(&platform.wallet_report(), output),
        ReportKind::Ledger => write_ledger_csv(&platform.ledger().all_entries(), output),
    }
}

pub(crate) fn log_rejected(command: &JournalCommand, error: &LedgerError) {
    warn!(
        user_id = command.user,
        op = command.kind.name(),
        error = %error,
        "journal command rejected"
    );
}
