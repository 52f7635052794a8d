//! Asynchronous CSV reader with batch interface
//!
//! Provides a streaming interface over journal commands from a CSV source,
//! read in batches for the async replay strategy.
//!
//! # Architecture
//!
//! ```text
//! CSV source → AsyncReader → Batches of JournalCommands
//!                  ↓
//!           csv_format module
//!           (CsvCommand, convert_csv_command)
//! ```

use crate::io::csv_format::{convert_csv_command, CsvCommand};
use crate::types::JournalCommand;
use csv_async::AsyncReaderBuilder;
use futures::io::AsyncRead;
use futures::stream::StreamExt;
use tracing::warn;

/// Asynchronous journal reader
pub struct AsyncReader<R: AsyncRead + Unpin> {
    csv_reader: csv_async::AsyncDeserializer<R>,
}

impl<R: AsyncRead + Unpin + Send + 'static> AsyncReader<R> {
    pub fn new(reader: R) -> Self {
        let csv_reader = AsyncReaderBuilder::new()
            .flexible(true)
            .trim(csv_async::Trim::All)
            .create_deserializer(reader);

        Self { csv_reader }
    }

    /// Read up to `batch_size` commands
    ///
    /// Invalid rows are logged and skipped. An empty batch means the end of
    /// the journal was reached.
    pub async fn read_batch(&mut self, batch_size: usize) -> Vec<JournalCommand> {
        let mut batch = Vec::with_capacity(batch_size);
        let mut rows = self.csv_reader.deserialize::<CsvCommand>();

        while batch.len() < batch_size {
            match rows.next().await {
                Some(Ok(row)) => match convert_csv_command(row) {
                    Ok(command) => batch.push(command),
                    Err(e) => warn!(error = %e, "journal row skipped"),
                },
                Some(Err(e)) => warn!(error = %e, "journal row could not be parsed"),
                None => break,
            }
        }

        batch
    }
}
