//! Asynchronous batch replay strategy
//!
//! Multi-threaded implementation of the ProcessingStrategy trait. The journal
//! is read in batches; each batch is partitioned by user and the partitions
//! run concurrently on a tokio multi-threaded runtime.
//!
//! # Architecture
//!
//! ```text
//! AsyncProcessingStrategy
//!     ├── BatchConfig (batch_size, max_concurrent_batches)
//!     ├── AsyncReader (batch CSV reading)
//!     ├── BatchProcessor (user partitioning + tasks)
//!     └── WalletPlatform (DashMap-backed shared state)
//! ```
//!
//! # Ordering
//!
//! Batches are processed one after another, so a user's commands keep their
//! journal order even when they span several batches. Within a batch only
//! commands of different users run concurrently. `JournalClaims` refuses
//! rows that name another user's order or withdrawal id before the batch is
//! partitioned, so every admitted command touches only its own user's wallet
//! and records and the final state matches the sync strategy.
//!
//! Ledger entry ids come from one global counter, so in the ledger report
//! they are unique but their assignment across users follows scheduling.

use crate::cli::ReportKind;
use crate::config::LedgerConfig;
use crate::core::batch_processor::BatchProcessor;
use crate::core::journal_claims::JournalClaims;
use crate::core::platform::WalletPlatform;
use crate::io::async_reader::AsyncReader;
use crate::strategy::{log_rejected, write_report, ProcessingStrategy};
use crate::types::LedgerError;
use std::io::Write;
use std::path::Path;
use tracing::{info, warn};

/// Configuration for batch processing
#[derive(Clone, Debug, PartialEq)]
pub struct BatchConfig {
    /// Number of commands per batch
    pub batch_size: usize,
    /// Worker threads for the replay runtime
    pub max_concurrent_batches: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            max_concurrent_batches: num_cpus::get(),
        }
    }
}

impl BatchConfig {
    /// Zero values fall back to the defaults with a warning
    pub fn new(batch_size: usize, max_concurrent_batches: usize) -> Self {
        let default = Self::default();

        let batch_size = if batch_size == 0 {
            warn!(batch_size, default = default.batch_size, "invalid batch size, using default");
            default.batch_size
        } else {
            batch_size
        };

        let max_concurrent_batches = if max_concurrent_batches == 0 {
            warn!(
                max_concurrent_batches,
                default = default.max_concurrent_batches,
                "invalid concurrency, using default"
            );
            default.max_concurrent_batches
        } else {
            max_concurrent_batches
        };

        Self {
            batch_size,
            max_concurrent_batches,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AsyncProcessingStrategy {
    config: LedgerConfig,
    report: ReportKind,
    batch: BatchConfig,
}

impl AsyncProcessingStrategy {
    pub fn new(config: LedgerConfig, report: ReportKind, batch: BatchConfig) -> Self {
        Self {
            config,
            report,
            batch,
        }
    }
}

impl ProcessingStrategy for AsyncProcessingStrategy {
    fn process(
        &self,
        input_path: &Path,
        output: &mut dyn Write,
    ) -> Result<WalletPlatform, LedgerError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.batch.max_concurrent_batches)
            .build()?;

        let platform = WalletPlatform::new(&self.config);
        let processor = BatchProcessor::new(platform.clone());

        runtime.block_on(async {
            let file = tokio::fs::File::open(input_path)
                .await
                .map_err(|e| LedgerError::IoError {
                    message: format!("Failed to open file '{}': {}", input_path.display(), e),
                })?;

            // csv-async reads through the futures traits
            let compat_file = tokio_util::compat::TokioAsyncReadCompatExt::compat(file);
            let mut reader = AsyncReader::new(compat_file);

            let mut claims = JournalClaims::new();
            let mut applied = 0usize;
            let mut rejected = 0usize;
            loop {
                let batch = reader.read_batch(self.batch.batch_size).await;
                if batch.is_empty() {
                    break;
                }

                // Claims are taken in journal order, before partitioning
                let mut admitted = Vec::with_capacity(batch.len());
                for command in batch {
                    match claims.admit(&command) {
                        Ok(()) => admitted.push(command),
                        Err(e) => {
                            rejected += 1;
                            log_rejected(&command, &e);
                        }
                    }
                }

                // Finish this batch before reading the next to keep per-user order
                for outcome in processor.process_batch(admitted).await {
                    match &outcome.result {
                        Ok(()) => applied += 1,
                        Err(e) => {
                            rejected += 1;
                            log_rejected(&outcome.command, e);
                        }
                    }
                }
            }
            info!(applied, rejected, strategy = "async", "journal replayed");

            Ok::<(), LedgerError>(())
        })?;

        write_report(&platform, self.report, output)?;
        Ok(platform)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn create_temp_csv(rows: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        write!(file, "op,user,id,amount,status,reason,reference,actor\n{}", rows)
            .expect("Failed to write to temp file");
        file.flush().expect("Failed to flush temp file");
        file
    }

    fn strategy(batch_size: usize) -> AsyncProcessingStrategy {
        AsyncProcessingStrategy::new(
            LedgerConfig::default(),
            ReportKind::Wallets,
            BatchConfig::new(batch_size, 4),
        )
    }

    #[test]
    fn test_async_strategy_maintains_ordering_across_batches() {
        // Batch size 2 forces user 1's commands across three batches
        let file = create_temp_csv(
            "credit,1,,10000,,,,\n\
             credit,2,,5000,,,,\n\
             debit,1,,3000,,,,\n\
             credit,2,,2500,,,,\n\
             debit,1,,7000,,,,\n\
             debit,1,,1,,,,\n",
        );
        let mut output = Vec::new();

        strategy(2).process(file.path(), &mut output).unwrap();

        assert_eq!(
            String::from_utf8(output).unwrap(),
            "user,balance,currency,transactions,reconciled\n\
             1,0.00,INR,3,true\n\
             2,75.00,INR,2,true\n"
        );
    }

    #[test]
    fn test_async_strategy_replays_orders_and_withdrawals() {
        let file = create_temp_csv(
            "open,1,,3000,,,,\n\
             open,2,,500,,,,\n\
             order,1,10,2500,,,,\n\
             order,2,20,800,,,,\n\
             pay_order,1,10,,,,,\n\
             pay_order,2,20,,,,,\n\
             withdraw,2,1,400,,,9,\n\
             credit,2,,1000,,,,\n\
             order_status,1,10,,failed,lost,,900\n",
        );
        let mut output = Vec::new();

        let platform = strategy(3).process(file.path(), &mut output).unwrap();

        // User 1: 3000 - 2500 + 2500 refund; user 2: 500 - 400 + 1000 - 800 parked order paid
        assert_eq!(platform.wallets().get_balance(1).unwrap(), 3000);
        assert_eq!(platform.wallets().get_balance(2).unwrap(), 300);
        assert_eq!(platform.orders().count_by_status(crate::types::ZenStatus::AwaitingWallet), 0);
    }

    #[test]
    fn test_async_strategy_handles_missing_file() {
        let mut output = Vec::new();
        let result = strategy(10).process(Path::new("nonexistent.csv"), &mut output);
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Failed to open file"));
    }

    #[test]
    fn test_batch_config_zero_values_fall_back() {
        let config = BatchConfig::new(0, 0);
        assert_eq!(config, BatchConfig::default());
    }
}
