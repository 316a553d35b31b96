//! End-to-end integration tests
//!
//! These tests run the complete pipeline the driver binary uses:
//! 1. Open accounts in a registry
//! 2. Generate a ring of transfers
//! 3. Run them with an execution strategy
//! 4. Write the account summary CSV and compare it with the expected output
//!
//! The binary itself is also exercised end to end, writing to a temporary
//! file. Each pipeline test is run with both execution strategies.

#[cfg(test)]
mod tests {
    use concurrent_ledger::cli::StrategyType;
    use concurrent_ledger::strategy::{create_strategy, ring_transfers};
    use concurrent_ledger::{write_accounts_csv, write_history_csv, LedgerConfig, LedgerRegistry};
    use rstest::rstest;
    use rust_decimal::Decimal;
    use std::fs;
    use std::io::Write;
    use std::process::Command;
    use std::sync::Arc;
    use tempfile::{NamedTempFile, TempDir};

    /// Run a ring workload and return the account summary CSV
    ///
    /// # Arguments
    ///
    /// * `accounts` - Number of accounts to open
    /// * `balance` - Opening balance of each account
    /// * `operations` - Number of ring transfers
    /// * `amount` - Amount per transfer
    /// * `strategy_type` - Execution strategy to use
    fn run_pipeline(
        accounts: usize,
        balance: i64,
        operations: usize,
        amount: i64,
        strategy_type: StrategyType,
    ) -> String {
        let registry = Arc::new(LedgerRegistry::new(
            LedgerConfig::new(accounts.max(1), 4, 64).with_audit(false),
        ));
        let numbers: Vec<_> = (0..accounts)
            .map(|i| {
                registry
                    .create_account(&format!("Holder {}", i + 1), Decimal::from(balance))
                    .unwrap()
            })
            .collect();

        let ops = ring_transfers(&numbers, operations, Decimal::from(amount));
        create_strategy(strategy_type, 4)
            .run(&registry, ops)
            .unwrap_or_else(|e| panic!("Failed to run workload: {}", e));

        let mut temp_output = NamedTempFile::new().expect("Failed to create temp file");
        write_accounts_csv(&registry.list_accounts(), &mut temp_output)
            .unwrap_or_else(|e| panic!("Failed to write accounts: {}", e));
        temp_output.flush().expect("Failed to flush temp file");

        fs::read_to_string(temp_output.path())
            .unwrap_or_else(|e| panic!("Failed to read temp output file: {}", e))
    }

    /// Ring transfers come in forward/back pairs, so an even count returns
    /// every account to its opening balance.
    #[rstest]
    #[case::two_accounts(
        2, 100, 200, 1,
        "number,holder,balance,transactions,active\n\
         ACC00000001,Holder 1,100.00,201,true\n\
         ACC00000002,Holder 2,100.00,201,true\n"
    )]
    #[case::three_accounts(
        3, 50, 6, 5,
        "number,holder,balance,transactions,active\n\
         ACC00000001,Holder 1,50.00,5,true\n\
         ACC00000002,Holder 2,50.00,5,true\n\
         ACC00000003,Holder 3,50.00,5,true\n"
    )]
    #[case::single_account_deposits(
        1, 0, 10, 2,
        "number,holder,balance,transactions,active\n\
         ACC00000001,Holder 1,20.00,10,true\n"
    )]
    #[case::no_accounts(0, 0, 10, 1, "number,holder,balance,transactions,active\n")]
    fn test_pipeline_output(
        #[case] accounts: usize,
        #[case] balance: i64,
        #[case] operations: usize,
        #[case] amount: i64,
        #[case] expected: &str,
        #[values(StrategyType::Direct, StrategyType::Pooled)] strategy: StrategyType,
    ) {
        let actual = run_pipeline(accounts, balance, operations, amount, strategy);
        assert_eq!(
            actual, expected,
            "\n\nOutput mismatch (strategy: {:?})\n\nActual output:\n{}\n\nExpected output:\n{}\n",
            strategy, actual, expected
        );
    }

    #[test]
    fn test_history_csv_lists_both_transfer_legs() {
        let registry = LedgerRegistry::new(LedgerConfig::default().with_audit(false));
        let a = registry.create_account("A", Decimal::from(10)).unwrap();
        let b = registry.create_account("B", Decimal::ZERO).unwrap();
        let receipt = registry.transfer(&a, &b, Decimal::from(4), "gift").unwrap();

        let mut records = registry.history(&a).unwrap();
        records.extend(registry.history(&b).unwrap());
        let mut output = Vec::new();
        write_history_csv(&records, &mut output).unwrap();
        let text = String::from_utf8(output).unwrap();

        let legs = text
            .lines()
            .filter(|line| line.starts_with(&receipt.transaction_id.to_string()))
            .count();
        assert_eq!(legs, 2);
    }

    #[rstest]
    fn test_binary_writes_account_summary(#[values("direct", "pooled")] mode: &str) {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let output = dir.path().join("accounts.csv");
        let history = dir.path().join("history.csv");

        let status = Command::new(env!("CARGO_BIN_EXE_concurrent-ledger"))
            .args(["--mode", mode])
            .args(["--accounts", "4", "--initial-balance", "25"])
            .args(["--operations", "400", "--amount", "1"])
            .args(["--workers", "2", "--queue-capacity", "16", "--no-audit"])
            .arg("--output")
            .arg(&output)
            .arg("--history")
            .arg(&history)
            .env("RUST_LOG", "warn")
            .status()
            .expect("Failed to run binary");
        assert!(status.success());

        let summary = fs::read_to_string(&output).expect("Failed to read summary");
        let mut lines = summary.lines();
        assert_eq!(lines.next(), Some("number,holder,balance,transactions,active"));
        let balances: Decimal = lines
            .map(|line| line.split(',').nth(2).unwrap().parse::<Decimal>().unwrap())
            .sum();
        assert_eq!(balances, Decimal::from(100));

        let history = fs::read_to_string(&history).expect("Failed to read history");
        // 4 initial deposits plus two legs per transfer.
        assert_eq!(history.lines().count(), 1 + 4 + 2 * 400);
    }

    #[test]
    fn test_binary_rejects_invalid_arguments() {
        let status = Command::new(env!("CARGO_BIN_EXE_concurrent-ledger"))
            .args(["--mode", "sideways"])
            .status()
            .expect("Failed to run binary");
        assert!(!status.success());
    }
}
