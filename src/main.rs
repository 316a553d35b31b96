//! Concurrent Ledger CLI
//!
//! Opens a set of accounts, runs a deterministic ring of transfers against
//! them with the selected execution strategy, and writes the final account
//! summary as CSV.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- > accounts.csv
//! cargo run -- --mode direct --accounts 50 --operations 100000
//! cargo run -- --mode pooled --workers 8 --queue-capacity 256 --no-audit -o accounts.csv
//! cargo run -- --history history.csv
//! ```
//!
//! Logs go to stderr; set `RUST_LOG` to change verbosity.
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (invalid configuration, output not writable, etc.)

use concurrent_ledger::cli::{self, CliArgs};
use concurrent_ledger::strategy::{self, ring_transfers};
use concurrent_ledger::{
    logging, write_accounts_csv, write_history_csv, LedgerError, LedgerRegistry,
};
use std::fs::File;
use std::io::{self, Write};
use std::process;
use std::sync::Arc;
use tracing::{error, info};

fn main() {
    let args = cli::parse_args();
    logging::init(args.json_logs);

    if let Err(e) = run(&args) {
        error!(error = %e, "Ledger run failed");
        process::exit(1);
    }
}

fn run(args: &CliArgs) -> Result<(), LedgerError> {
    let config = args.to_ledger_config();
    config.validate()?;

    let registry = Arc::new(LedgerRegistry::new(config));
    let accounts = (0..args.accounts)
        .map(|i| registry.create_account(&format!("Holder {}", i + 1), args.initial_balance))
        .collect::<Result<Vec<_>, _>>()?;

    let operations = ring_transfers(&accounts, args.operations, args.amount);
    let strategy = strategy::create_strategy(args.mode, args.thread_count());
    let report = strategy.run(&registry, operations)?;

    let stats = registry.statistics();
    info!(
        mode = ?args.mode,
        operations = report.operations,
        succeeded = report.succeeded,
        failed = report.failed,
        elapsed_ms = report.elapsed.as_millis() as u64,
        throughput = report.throughput(),
        success_rate = stats.success_rate(),
        total_balance = %registry.total_balance(),
        "Run complete"
    );

    let summaries = registry.list_accounts();
    match &args.output {
        Some(path) => write_accounts_csv(&summaries, &mut File::create(path)?)?,
        None => write_accounts_csv(&summaries, &mut io::stdout().lock())?,
    }

    if let Some(path) = &args.history {
        let records: Vec<_> = accounts
            .iter()
            .map(|number| registry.history(number))
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .flatten()
            .collect();
        let mut file = File::create(path)?;
        write_history_csv(&records, &mut file)?;
        file.flush()?;
    }

    Ok(())
}
