//! Synchronous replay strategy
//!
//! Single-threaded implementation of the ProcessingStrategy trait. Commands
//! are streamed from the `SyncReader` one at a time and applied to a fresh
//! `WalletPlatform` in journal order.
//!
//! # Design
//!
//! The strategy only orchestrates, delegating:
//! - CSV parsing to `SyncReader` (iterator interface)
//! - Journal id ownership to `JournalClaims`
//! - Command processing to `WalletPlatform` (business logic)
//! - Report output to `strategy::write_report` (format handling)

use crate::cli::ReportKind;
use crate::config::LedgerConfig;
use crate::core::journal_claims::JournalClaims;
use crate::core::platform::WalletPlatform;
use crate::io::sync_reader::SyncReader;
use crate::strategy::{log_rejected, write_report, ProcessingStrategy};
use crate::types::LedgerError;
use std::io::Write;
use std::path::Path;
use tracing::{info, warn};

/// Synchronous replay strategy
///
/// ```no_run
/// use zen_ledger::cli::ReportKind;
/// use zen_ledger::config::LedgerConfig;
/// use zen_ledger::strategy::{ProcessingStrategy, SyncProcessingStrategy};
/// use std::path::Path;
///
/// let strategy = SyncProcessingStrategy::new(LedgerConfig::default(), ReportKind::Wallets);
/// strategy
///     .process(Path::new("journal.csv"), &mut std::io::stdout())
///     .expect("replay failed");
/// ```
#[derive(Debug, Clone)]
pub struct SyncProcessingStrategy {
    config: LedgerConfig,
    report: ReportKind,
}

impl SyncProcessingStrategy {
    pub fn new(config: LedgerConfig, report: ReportKind) -> Self {
        Self { config, report }
    }
}

impl ProcessingStrategy for SyncProcessingStrategy {
    fn process(
        &self,
        input_path: &Path,
        output: &mut dyn Write,
    ) -> Result<WalletPlatform, LedgerError> {
        let platform = WalletPlatform::new(&self.config);
        let reader = SyncReader::new(input_path).map_err(|message| LedgerError::IoError { message })?;

        let mut claims = JournalClaims::new();
        let mut applied = 0usize;
        let mut rejected = 0usize;
        for row in reader {
            match row {
                Ok(command) => match claims
                    .admit(&command)
                    .and_then(|()| platform.process_command(&command))
                {
                    Ok(()) => applied += 1,
                    Err(e) => {
                        rejected += 1;
                        log_rejected(&command, &e);
                    }
                },
                Err(e) => {
                    rejected += 1;
                    warn!(error = %e, "journal row skipped");
                }
            }
        }
        info!(applied, rejected, strategy = "sync", "journal replayed");

        write_report(&platform, self.report, output)?;
        Ok(platform)
    }
}
