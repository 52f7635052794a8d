//! Synchronous CSV reader with iterator interface
//!
//! Provides a streaming iterator over journal commands from a CSV file.
//! Delegates CSV format concerns to the csv_format module.
//!
//! # Iterator Interface
//!
//! SyncReader implements the Iterator trait, yielding
//! `Result<JournalCommand, String>` for each CSV row:
//!
//! ```no_run
//! use zen_ledger::io::sync_reader::SyncReader;
//! use std::path::Path;
//!
//! let reader = SyncReader::new(Path::new("journal.csv")).unwrap();
//! for result in reader {
//!     match result {
//!         Ok(command) => println!("Replaying: {:?}", command),
//!         Err(e) => eprintln!("Error: {}", e),
//!     }
//! }
//! ```
//!
//! # Error Handling
//!
//! - Fatal errors (file not found) are returned from `new()`
//! - Individual row errors are yielded as Err variants, with the line number
//!
//! Rows are read one at a time; the file is never loaded whole.

use crate::io::csv_format::{convert_csv_command, CsvCommand};
use crate::types::JournalCommand;
use csv::{ReaderBuilder, Trim};
use std::fs::File;
use std::path::Path;

#[derive(Debug)]
pub struct SyncReader {
    reader: csv::Reader<File>,
    line_num: usize,
}

impl SyncReader {
    /// Open a journal for streaming iteration
    ///
    /// The reader trims whitespace from all fields and accepts rows with
    /// trailing columns omitted.
    pub fn new(path: &Path) -> Result<Self, String> {
        let file = File::open(path)
            .map_err(|e| format!("Failed to open file '{}': {}", path.display(), e))?;

        let reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .buffer_capacity(8 * 1024)
            .from_reader(file);

        Ok(Self {
            reader,
            line_num: 0,
        })
    }
}

impl Iterator for SyncReader {
    type Item = Result<JournalCommand, String>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut deserializer = self.reader.deserialize::<CsvCommand>();
        let row = deserializer.next()?;
        self.line_num += 1;

        // +1 for the header row
        let line = self.line_num + 1;
        Some(match row {
            Ok(row) => convert_csv_command(row).map_err(|e| format!("Line {}: {}", line, e)),
            Err(e) => Err(format!("Line {}: CSV parse error: {}", line, e)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CommandKind;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HEADER: &str = "op,user,id,amount,status,reason,reference,actor\n";

    fn create_temp_csv(rows: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(HEADER.as_bytes())
            .and_then(|_| file.write_all(rows.as_bytes()))
            .expect("Failed to write to temp file");
        file.flush().expect("Failed to flush temp file");
        file
    }

    #[test]
    fn test_sync_reader_fails_on_missing_file() {
        let result = SyncReader::new(Path::new("nonexistent.csv"));
        assert!(result.unwrap_err().contains("Failed to open file"));
    }

    #[test]
    fn test_sync_reader_iterates_commands_in_order() {
        let file = create_temp_csv(
            "open,1,,10000,,,,\n\
             withdraw,1,5,12000,,rent,77,\n\
             withdrawal_status,1,5,,rejected,kyc,,\n",
        );

        let commands: Vec<_> = SyncReader::new(file.path())
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(commands.len(), 3);
        assert_eq!(commands[0].kind, CommandKind::Open { opening_balance: 10000 });
        assert!(matches!(commands[1].kind, CommandKind::Withdraw { withdrawal_id: 5, .. }));
        assert!(matches!(commands[2].kind, CommandKind::WithdrawalStatus { .. }));
    }

    #[test]
    fn test_sync_reader_accepts_short_rows_and_whitespace() {
        let file = create_temp_csv("  credit , 2 , , 500 \npay_order,2,9\n");

        let commands: Vec<_> = SyncReader::new(file.path())
            .unwrap()
            .filter_map(Result::ok)
            .collect();

        assert_eq!(commands.len(), 2);
        assert_eq!(commands[0].user, 2);
        assert_eq!(commands[1].kind, CommandKind::PayOrder { order_id: 9 });
    }

    #[test]
    fn test_sync_reader_reports_line_and_continues() {
        let file = create_temp_csv(
            "credit,1,,100,,,,\n\
             credit,2,,ten,,,,\n\
             bogus,3,,,,,,\n\
             credit,x,,5,,,,\n\
             debit,1,,50,,,,\n",
        );

        let records: Vec<_> = SyncReader::new(file.path()).unwrap().collect();

        assert_eq!(records.len(), 5);
        assert!(records[0].is_ok());
        let bad_amount = records[1].as_ref().unwrap_err();
        assert!(bad_amount.contains("Line 3"));
        assert!(bad_amount.contains("Invalid amount"));
        assert!(records[2].as_ref().unwrap_err().contains("Invalid operation"));
        assert!(records[3].as_ref().unwrap_err().contains("CSV parse error"));
        assert!(records[4].is_ok());
    }

    #[test]
    fn test_sync_reader_handles_empty_journal() {
        let file = create_temp_csv("");
        assert_eq!(SyncReader::new(file.path()).unwrap().count(), 0);
    }
}
