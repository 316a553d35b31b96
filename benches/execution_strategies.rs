//! Benchmark suite for comparing execution strategies
//!
//! This benchmark compares running a ring of transfers on caller threads
//! against running it through the dispatcher's work queue and worker pool,
//! using the divan benchmarking framework.
//!
//! # Running Benchmarks
//!
//! ```bash
//! cargo bench
//! ```

use concurrent_ledger::cli::StrategyType;
use concurrent_ledger::strategy::{create_strategy, ring_transfers};
use concurrent_ledger::{LedgerConfig, LedgerOperation, LedgerRegistry};
use rust_decimal::Decimal;
use std::sync::Arc;

fn main() {
    divan::main();
}

const ACCOUNTS: usize = 16;
const THREADS: usize = 4;

/// Fresh registry plus a ring workload of `operations` transfers
fn setup(operations: usize) -> (Arc<LedgerRegistry>, Vec<LedgerOperation>) {
    let config = LedgerConfig::new(ACCOUNTS, THREADS, 256).with_audit(false);
    let registry = Arc::new(LedgerRegistry::new(config));
    let numbers: Vec<_> = (0..ACCOUNTS)
        .map(|i| {
            registry
                .create_account(&format!("Bench {}", i), Decimal::from(10_000))
                .expect("Failed to create account")
        })
        .collect();
    let ops = ring_transfers(&numbers, operations, Decimal::ONE);
    (registry, ops)
}

#[divan::bench(args = [1_000, 10_000, 100_000])]
fn direct_strategy(bencher: divan::Bencher, operations: usize) {
    let strategy = create_strategy(StrategyType::Direct, THREADS);
    bencher
        .with_inputs(|| setup(operations))
        .bench_values(|(registry, ops)| strategy.run(&registry, ops).expect("Run failed"));
}

#[divan::bench(args = [1_000, 10_000, 100_000])]
fn pooled_strategy(bencher: divan::Bencher, operations: usize) {
    let strategy = create_strategy(StrategyType::Pooled, THREADS);
    bencher
        .with_inputs(|| setup(operations))
        .bench_values(|(registry, ops)| strategy.run(&registry, ops).expect("Run failed"));
}

/// Single-account contention: every thread hits the same lock
#[divan::bench(args = [1_000, 10_000])]
fn direct_single_account_deposits(bencher: divan::Bencher, operations: usize) {
    let strategy = create_strategy(StrategyType::Direct, THREADS);
    bencher
        .with_inputs(|| {
            let registry = Arc::new(LedgerRegistry::new(LedgerConfig::default().with_audit(false)));
            let number = registry
                .create_account("Hot", Decimal::ZERO)
                .expect("Failed to create account");
            let ops = (0..operations)
                .map(|_| LedgerOperation::deposit(number.clone(), Decimal::ONE, ""))
                .collect::<Vec<_>>();
            (registry, ops)
        })
        .bench_values(|(registry, ops)| strategy.run(&registry, ops).expect("Run failed"));
}
