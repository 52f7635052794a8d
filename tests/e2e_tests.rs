//! End-to-end integration tests
//!
//! These tests validate the complete journal replay pipeline using
//! predefined CSV test fixtures. Each test:
//! 1. Reads input.csv from a fixture directory
//! 2. Replays all commands through the wallet platform
//! 3. Generates the wallet report CSV
//! 4. Compares actual output with expected.csv
//!
//! Test fixtures are located in tests/fixtures/ and cover:
//! - Wallet basics (open, lazy credit, debit on a missing wallet)
//! - Insufficient funds
//! - Withdrawal reservation, reversal and terminal states
//! - Order charges, refunds and parked payments
//! - Admin adjustments
//! - Malformed rows and commands against other users' records
//! - Order and withdrawal ids named by more than one user
//!
//! Each test is run twice: once with the synchronous strategy and once with the async strategy.

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use std::fs;
    use std::io::Write;
    use std::path::Path;
    use tempfile::NamedTempFile;
    use zen_ledger::cli::{ReportKind, StrategyType};
    use zen_ledger::config::LedgerConfig;
    use zen_ledger::strategy::{create_strategy, BatchConfig};

    /// Run a test fixture by replaying input.csv and comparing with expected.csv
    ///
    /// # Panics
    ///
    /// Panics if:
    /// - Input or expected files cannot be read
    /// - Output doesn't match expected
    fn run_test_fixture(fixture_name: &str, strategy_type: StrategyType, batch_size: usize) {
        let fixture_dir = format!("tests/fixtures/{}", fixture_name);
        let input_path = format!("{}/input.csv", fixture_dir);
        let expected_path = format!("{}/expected.csv", fixture_dir);

        assert!(
            Path::new(&input_path).exists(),
            "Input file not found: {}",
            input_path
        );
        assert!(
            Path::new(&expected_path).exists(),
            "Expected file not found: {}",
            expected_path
        );

        let strategy = create_strategy(
            strategy_type,
            LedgerConfig::default(),
            ReportKind::Wallets,
            Some(BatchConfig::new(batch_size, 4)),
        );

        let mut temp_output = NamedTempFile::new().expect("Failed to create temp file");

        strategy
            .process(Path::new(&input_path), &mut temp_output)
            .unwrap_or_else(|e| panic!("Failed to replay journal: {}", e));

        temp_output.flush().expect("Failed to flush temp file");

        let actual_output = fs::read_to_string(temp_output.path())
            .unwrap_or_else(|e| panic!("Failed to read temp output file: {}", e));

        let expected_output = fs::read_to_string(&expected_path)
            .unwrap_or_else(|e| panic!("Failed to read expected file {}: {}", expected_path, e));

        assert_eq!(
            actual_output, expected_output,
            "\n\nOutput mismatch for fixture: {} (strategy: {:?}, batch size: {})\n\nActual output:\n{}\n\nExpected output:\n{}\n",
            fixture_name, strategy_type, batch_size, actual_output, expected_output
        );
    }

    /// End-to-end test for all fixtures with both replay strategies
    #[rstest]
    #[case("wallet_basics")]
    #[case("insufficient_funds")]
    #[case("withdrawal_flow")]
    #[case("order_lifecycle")]
    #[case("parked_orders")]
    #[case("admin_adjustments")]
    #[case("malformed_data")]
    #[case("multiple_users")]
    #[case("shared_ids")]
    fn test_fixtures(
        #[case] fixture: &str,
        #[values(StrategyType::Sync, StrategyType::Async)] strategy: StrategyType,
    ) {
        run_test_fixture(fixture, strategy, 1000);
    }

    /// Tiny batches split every user's commands across many batches
    #[rstest]
    #[case("withdrawal_flow")]
    #[case("parked_orders")]
    #[case("multiple_users")]
    #[case("shared_ids")]
    fn test_fixtures_with_small_batches(#[case] fixture: &str, #[values(1, 3)] batch_size: usize) {
        run_test_fixture(fixture, StrategyType::Async, batch_size);
    }

    fn ledger_report(fixture_name: &str, strategy_type: StrategyType, batch_size: usize) -> String {
        let strategy = create_strategy(
            strategy_type,
            LedgerConfig::default(),
            ReportKind::Ledger,
            Some(BatchConfig::new(batch_size, 4)),
        );
        let input_path = format!("tests/fixtures/{}/input.csv", fixture_name);
        let mut output = Vec::new();

        strategy
            .process(Path::new(&input_path), &mut output)
            .unwrap_or_else(|e| panic!("Failed to replay journal: {}", e));

        String::from_utf8(output).expect("report is not UTF-8")
    }

    /// Ledger rows match between strategies except for the entry id, which is
    /// only guaranteed unique
    #[rstest]
    #[case("withdrawal_flow")]
    #[case("order_lifecycle")]
    #[case("multiple_users")]
    #[case("shared_ids")]
    fn test_ledger_report_matches_across_strategies(
        #[case] fixture: &str,
        #[values(1, 1000)] batch_size: usize,
    ) {
        let split = |report: &str| -> (Vec<u64>, Vec<String>) {
            report
                .lines()
                .skip(1)
                .map(|line| {
                    let (id, rest) = line.split_once(',').expect("row without columns");
                    (id.parse::<u64>().expect("non-numeric id"), rest.to_string())
                })
                .unzip()
        };

        let (sync_ids, sync_rows) = split(&ledger_report(fixture, StrategyType::Sync, batch_size));
        let (async_ids, async_rows) = split(&ledger_report(fixture, StrategyType::Async, batch_size));

        assert_eq!(sync_rows, async_rows, "ledger rows differ for {}", fixture);

        let mut unique = async_ids.clone();
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(unique.len(), async_ids.len());
        assert_eq!(sync_ids.len(), async_ids.len());
    }
}
