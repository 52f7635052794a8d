//! Batch processing with user-based partitioning for async journal replay
//!
//! This module provides the `BatchProcessor` struct, which replays batches of
//! journal commands concurrently while keeping each user's commands in order.
//!
//! # Design
//!
//! Every journal command acts on one user's wallet and records, so a batch is
//! partitioned by user and each partition runs as its own tokio task. Commands
//! for different users proceed in parallel; commands for one user run
//! sequentially in journal order.
//!
//! # Architecture
//!
//! ```text
//! BatchProcessor
//!     └── WalletPlatform  (cloneable, shared state)
//! ```

use std::collections::HashMap;

use crate::core::platform::WalletPlatform;
use crate::types::{JournalCommand, LedgerError, UserId};
use tracing::error;

/// Outcome of replaying a single command
#[derive(Debug, Clone)]
pub struct ProcessingResult {
    pub command: JournalCommand,
    pub result: Result<(), LedgerError>,
}

/// Batch processor with user-based partitioning
#[derive(Debug, Clone)]
pub struct BatchProcessor {
    platform: WalletPlatform,
}

impl BatchProcessor {
    pub fn new(platform: WalletPlatform) -> Self {
        Self { platform }
    }

    /// Split a batch into per-user sub-batches, preserving order within each user
    pub fn partition_by_user(
        &self,
        batch: Vec<JournalCommand>,
    ) -> HashMap<UserId, Vec<JournalCommand>> {
        let mut user_batches: HashMap<UserId, Vec<JournalCommand>> = HashMap::new();

        for command in batch {
            user_batches.entry(command.user).or_default().push(command);
        }

        user_batches
    }

    /// Replay one user's commands sequentially
    ///
    /// Failures are captured in the results and do not stop the sequence.
    pub async fn process_user_commands(&self, commands: Vec<JournalCommand>) -> Vec<ProcessingResult> {
        let mut results = Vec::with_capacity(commands.len());

        for command in commands {
            let result = self.platform.process_command(&command);
            results.push(ProcessingResult { command, result });
        }

        results
    }

    /// Replay a batch, one tokio task per user
    ///
    /// Results are grouped by user; the order between users is unspecified.
    pub async fn process_batch(&self, batch: Vec<JournalCommand>) -> Vec<ProcessingResult> {
        let user_batches = self.partition_by_user(batch);

        let mut tasks = Vec::with_capacity(user_batches.len());
        for (_user, commands) in user_batches {
            let processor = self.clone();
            tasks.push(tokio::spawn(async move {
                processor.process_user_commands(commands).await
            }));
        }

        let mut results = Vec::new();
        for task in tasks {
            match task.await {
                Ok(user_results) => results.extend(user_results),
                Err(e) => error!(error = %e, "replay task panicked"),
            }
        }

        results
    }
}
