//! Zen Ledger CLI
//!
//! Replays command journals and serves the wallet HTTP API.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- replay journal.csv > wallets.csv
//! cargo run -- replay --strategy sync journal.csv > wallets.csv
//! cargo run -- replay --strategy async --batch-size 2000 --max-concurrent 8 journal.csv
//! cargo run -- replay --report ledger journal.csv > ledger.csv
//! cargo run -- --policy strict serve --port 4000
//! ```
//!
//! Logs go to stderr; set `ZEN_LEDGER_LOG` (e.g. `zen_ledger=debug`) to
//! override `--log-level`.
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (file not found, file not readable, port unavailable, etc.)

use std::process;
use tracing::error;
use zen_ledger::cli::{self, Command};
use zen_ledger::config::LedgerConfig;
use zen_ledger::core::WalletPlatform;
use zen_ledger::types::LedgerError;
use zen_ledger::{http, logging, strategy};

fn main() {
    let args = cli::parse_args();
    logging::init_logging(&args.log_level);

    let config = args.apply_to(LedgerConfig::from_env());

    if let Err(e) = run(&args.command, config) {
        error!(error = %e, "zen-ledger failed");
        process::exit(1);
    }
}

fn run(command: &Command, config: LedgerConfig) -> Result<(), LedgerError> {
    match command {
        Command::Replay(replay) => {
            let batch = matches!(replay.strategy, cli::StrategyType::Async)
                .then(|| replay.to_batch_config());
            let strategy = strategy::create_strategy(replay.strategy, config, replay.report, batch);

            // Report goes to stdout
            let mut output = std::io::stdout();
            strategy.process(&replay.input_file, &mut output)?;
            Ok(())
        }
        Command::Serve(_) => {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            let platform = WalletPlatform::new(&config);
            runtime.block_on(http::serve(platform, config.http_port))
        }
    }
}
