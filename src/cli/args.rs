use crate::config::LedgerConfig;
use clap::{Parser, ValueEnum};
use rust_decimal::Decimal;
use std::path::PathBuf;

/// Run a concurrent transfer workload against an in-memory ledger
#[derive(Parser, Debug)]
#[command(name = "concurrent-ledger")]
#[command(about = "Run a concurrent transfer workload against an in-memory ledger", long_about = None)]
pub struct CliArgs {
    /// Execution strategy for the workload
    #[arg(
        long = "mode",
        value_name = "MODE",
        default_value = "pooled",
        help = "Execution strategy: 'direct' for caller threads or 'pooled' for the worker pool"
    )]
    pub mode: StrategyType,

    /// Number of accounts to open
    #[arg(long = "accounts", value_name = "COUNT", default_value_t = 10)]
    pub accounts: usize,

    /// Opening balance of every account
    #[arg(long = "initial-balance", value_name = "AMOUNT", default_value = "1000")]
    pub initial_balance: Decimal,

    /// Number of transfers to run
    #[arg(long = "operations", value_name = "COUNT", default_value_t = 10_000)]
    pub operations: usize,

    /// Amount moved by each transfer
    #[arg(long = "amount", value_name = "AMOUNT", default_value = "1")]
    pub amount: Decimal,

    /// Worker threads (pooled mode) or caller threads (direct mode)
    #[arg(
        long = "workers",
        value_name = "COUNT",
        help = "Number of worker threads (default: CPU cores)"
    )]
    pub workers: Option<usize>,

    /// Capacity of the dispatcher work queue
    #[arg(long = "queue-capacity", value_name = "SIZE")]
    pub queue_capacity: Option<usize>,

    /// Disable per-operation audit logging
    #[arg(long = "no-audit")]
    pub no_audit: bool,

    /// Write the account summary here instead of stdout
    #[arg(long = "output", short = 'o', value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Also write every account's transaction history to this file
    #[arg(long = "history", value_name = "FILE")]
    pub history: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long = "json-logs")]
    pub json_logs: bool,
}

/// Available execution strategies
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StrategyType {
    Direct,
    Pooled,
}

impl CliArgs {
    /// Build a LedgerConfig from the environment overlaid with CLI arguments
    ///
    /// The account limit is raised to fit `--accounts` if needed. Zero sizes
    /// fall back to defaults.
    pub fn to_ledger_config(&self) -> LedgerConfig {
        let base = LedgerConfig::from_env();

        let mut config = LedgerConfig::new(
            base.max_accounts.max(self.accounts),
            self.workers.unwrap_or(base.worker_count),
            self.queue_capacity.unwrap_or(base.queue_capacity),
        );
        config.audit_enabled = base.audit_enabled && !self.no_audit;
        config.max_initial_balance = config.max_initial_balance.max(self.initial_balance);
        config
    }

    /// Thread count for the selected strategy
    pub fn thread_count(&self) -> usize {
        self.to_ledger_config().worker_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::default_mode(&["program"], StrategyType::Pooled)]
    #[case::direct(&["program", "--mode", "direct"], StrategyType::Direct)]
    #[case::pooled(&["program", "--mode", "pooled"], StrategyType::Pooled)]
    fn test_mode_parsing(#[case] args: &[&str], #[case] expected: StrategyType) {
        let parsed = CliArgs::try_parse_from(args).unwrap();
        assert_eq!(parsed.mode, expected);
    }

    #[test]
    fn test_workload_defaults() {
        let parsed = CliArgs::try_parse_from(["program"]).unwrap();
        assert_eq!(parsed.accounts, 10);
        assert_eq!(parsed.operations, 10_000);
        assert_eq!(parsed.initial_balance, Decimal::from(1000));
        assert_eq!(parsed.amount, Decimal::ONE);
        assert!(!parsed.no_audit);
        assert!(parsed.output.is_none());
    }

    #[rstest]
    #[case::custom_workers(&["program", "--workers", "3"], 3, 1000)]
    #[case::custom_capacity(&["program", "--queue-capacity", "16"], num_cpus::get(), 16)]
    #[case::zero_workers(&["program", "--workers", "0"], num_cpus::get(), 1000)]
    #[case::zero_capacity(&["program", "--queue-capacity", "0"], num_cpus::get(), 1000)]
    fn test_ledger_config_conversion(
        #[case] args: &[&str],
        #[case] expected_workers: usize,
        #[case] expected_capacity: usize,
    ) {
        let parsed = CliArgs::try_parse_from(args).unwrap();
        let config = parsed.to_ledger_config();

        assert_eq!(config.worker_count, expected_workers);
        assert_eq!(config.queue_capacity, expected_capacity);
    }

    #[test]
    fn test_config_fits_requested_workload() {
        let parsed = CliArgs::try_parse_from([
            "program",
            "--accounts",
            "5000",
            "--initial-balance",
            "2000000",
            "--no-audit",
        ])
        .unwrap();
        let config = parsed.to_ledger_config();

        assert_eq!(config.max_accounts, 5000);
        assert_eq!(config.max_initial_balance, Decimal::from(2_000_000));
        assert!(!config.audit_enabled);
    }

    #[rstest]
    #[case::invalid_mode(&["program", "--mode", "invalid"])]
    #[case::invalid_amount(&["program", "--amount", "lots"])]
    #[case::negative_accounts(&["program", "--accounts", "-1"])]
    fn test_parsing_errors(#[case] args: &[&str]) {
        assert!(CliArgs::try_parse_from(args).is_err());
    }
}
