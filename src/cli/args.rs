use crate::config::LedgerConfig;
use crate::strategy::BatchConfig;
use crate::types::TransitionPolicy;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Wallet ledger with order status tracking and withdrawals
#[derive(Parser, Debug)]
#[command(name = "zen-ledger")]
#[command(about = "Wallet ledger with order status tracking and withdrawals", long_about = None)]
pub struct CliArgs {
    /// Default log filter when ZEN_LEDGER_LOG is unset
    #[arg(long = "log-level", value_name = "FILTER", default_value = "info", global = true)]
    pub log_level: String,

    /// Order transition policy, overriding ZEN_TRANSITION_POLICY
    #[arg(long = "policy", value_name = "POLICY", global = true)]
    pub policy: Option<TransitionPolicy>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Replay a CSV command journal and print the resulting report
    Replay(ReplayArgs),
    /// Serve the wallet HTTP API
    Serve(ServeArgs),
}

#[derive(clap::Args, Debug)]
pub struct ReplayArgs {
    /// Input CSV file path containing journal commands
    #[arg(value_name = "INPUT", help = "Path to the journal CSV file")]
    pub input_file: PathBuf,

    #[arg(
        long = "strategy",
        value_name = "STRATEGY",
        default_value = "async",
        help = "Replay strategy: 'sync' for sequential or 'async' for per-user parallel batches"
    )]
    pub strategy: StrategyType,

    /// Number of commands per batch (async mode only)
    #[arg(
        long = "batch-size",
        value_name = "SIZE",
        help = "Number of commands per batch (default: 1000)"
    )]
    pub batch_size: Option<usize>,

    /// Worker threads (async mode only)
    #[arg(
        long = "max-concurrent",
        value_name = "COUNT",
        help = "Worker threads for batch replay (default: CPU cores)"
    )]
    pub max_concurrent_batches: Option<usize>,

    #[arg(long = "report", value_name = "REPORT", default_value = "wallets")]
    pub report: ReportKind,
}

#[derive(clap::Args, Debug)]
pub struct ServeArgs {
    /// Listen port, overriding ZEN_HTTP_PORT
    #[arg(long = "port", value_name = "PORT")]
    pub port: Option<u16>,
}

/// Available replay strategies
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StrategyType {
    Sync,
    Async,
}

/// Report written after a replay
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportKind {
    /// One row per wallet: balance, entry count, reconciliation
    Wallets,
    /// Every ledger entry
    Ledger,
}

impl CliArgs {
    /// Apply command-line overrides on top of the environment configuration
    pub fn apply_to(&self, mut config: LedgerConfig) -> LedgerConfig {
        if let Some(policy) = self.policy {
            config.transition_policy = policy;
        }
        if let Command::Serve(ServeArgs { port: Some(port) }) = &self.command {
            config.http_port = *port;
        }
        config
    }
}

impl ReplayArgs {
    /// Create a BatchConfig from CLI arguments, defaulting what is unset
    pub fn to_batch_config(&self) -> BatchConfig {
        if self.batch_size.is_some() || self.max_concurrent_batches.is_some() {
            let default = BatchConfig::default();
            BatchConfig::new(
                self.batch_size.unwrap_or(default.batch_size),
                self.max_concurrent_batches
                    .unwrap_or(default.max_concurrent_batches),
            )
        } else {
            BatchConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn replay(args: &[&str]) -> ReplayArgs {
        match CliArgs::try_parse_from(args).unwrap().command {
            Command::Replay(replay) => replay,
            other => panic!("expected replay, got {:?}", other),
        }
    }

    #[rstest]
    #[case::default_strategy(&["zen-ledger", "replay", "journal.csv"], StrategyType::Async)]
    #[case::explicit_sync(&["zen-ledger", "replay", "--strategy", "sync", "journal.csv"], StrategyType::Sync)]
    #[case::explicit_async(&["zen-ledger", "replay", "--strategy", "async", "journal.csv"], StrategyType::Async)]
    fn test_strategy_parsing(#[case] args: &[&str], #[case] expected: StrategyType) {
        assert_eq!(replay(args).strategy, expected);
    }

    #[rstest]
    #[case::default_report(&["zen-ledger", "replay", "journal.csv"], ReportKind::Wallets)]
    #[case::ledger_report(&["zen-ledger", "replay", "--report", "ledger", "journal.csv"], ReportKind::Ledger)]
    fn test_report_parsing(#[case] args: &[&str], #[case] expected: ReportKind) {
        assert_eq!(replay(args).report, expected);
    }

    #[rstest]
    #[case::all_defaults(&["zen-ledger", "replay", "j.csv"], 1000, num_cpus::get())]
    #[case::custom_batch_size(&["zen-ledger", "replay", "--batch-size", "2000", "j.csv"], 2000, num_cpus::get())]
    #[case::custom_max_concurrent(&["zen-ledger", "replay", "--max-concurrent", "8", "j.csv"], 1000, 8)]
    #[case::zero_batch_size(&["zen-ledger", "replay", "--batch-size", "0", "j.csv"], 1000, num_cpus::get())]
    fn test_batch_config_conversion(
        #[case] args: &[&str],
        #[case] expected_batch_size: usize,
        #[case] expected_max_concurrent: usize,
    ) {
        let config = replay(args).to_batch_config();

        assert_eq!(config.batch_size, expected_batch_size);
        assert_eq!(config.max_concurrent_batches, expected_max_concurrent);
    }

    #[test]
    fn test_overrides_apply_to_config() {
        let args =
            CliArgs::try_parse_from(["zen-ledger", "--policy", "strict", "serve", "--port", "9000"])
                .unwrap();

        let config = args.apply_to(LedgerConfig::default());

        assert_eq!(config.transition_policy, TransitionPolicy::Strict);
        assert_eq!(config.http_port, 9000);
    }

    #[test]
    fn test_no_overrides_keep_config() {
        let args = CliArgs::try_parse_from(["zen-ledger", "serve"]).unwrap();
        assert_eq!(args.apply_to(LedgerConfig::default()), LedgerConfig::default());
    }

    #[rstest]
    #[case::missing_command(&["zen-ledger"])]
    #[case::missing_input(&["zen-ledger", "replay"])]
    #[case::invalid_strategy(&["zen-ledger", "replay", "--strategy", "invalid", "j.csv"])]
    #[case::invalid_policy(&["zen-ledger", "--policy", "lenient", "serve"])]
    #[case::invalid_port(&["zen-ledger", "serve", "--port", "99999"])]
    fn test_parsing_errors(#[case] args: &[&str]) {
        assert!(CliArgs::try_parse_from(args).is_err());
    }
}
