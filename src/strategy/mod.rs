//! Execution strategy module
//!
//! This module defines the Strategy pattern for running a batch of ledger
//! operations against a registry. The driver binary and the benchmarks pick
//! one at runtime:
//! - `direct` - caller-owned threads invoke the registry synchronously
//! - `pooled` - operations go through the dispatcher's work queue and pool

use crate::cli::StrategyType;
use crate::core::LedgerRegistry;
use crate::types::{LedgerError, LedgerOperation};
use std::sync::Arc;
use std::time::Duration;

pub mod direct;
pub mod pooled;
pub mod workload;

pub use direct::DirectStrategy;
pub use pooled::PooledStrategy;
pub use workload::ring_transfers;

/// Outcome counts of one strategy run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunReport {
    /// Operations handed to the strategy
    pub operations: usize,
    /// Operations that committed
    pub succeeded: usize,
    /// Operations that failed or were abandoned
    pub failed: usize,
    /// Wall-clock time of the run
    pub elapsed: Duration,
}

impl RunReport {
    /// Operations per second, 0.0 for an instantaneous run
    pub fn throughput(&self) -> f64 {
        let seconds = self.elapsed.as_secs_f64();
        if seconds == 0.0 {
            return 0.0;
        }
        self.operations as f64 / seconds
    }
}

/// Execution strategy trait for running ledger operations
///
/// Implementations decide which threads execute the operations; every
/// operation still goes through [`LedgerRegistry::execute`].
pub trait ExecutionStrategy: Send + Sync {
    /// Run every operation in `operations` against `registry`
    ///
    /// # Returns
    ///
    /// * `Ok(RunReport)` once every operation has completed or been abandoned
    ///
    /// # Errors
    ///
    /// Individual operation failures are counted, not returned. An error is
    /// returned only if the strategy itself cannot run (e.g. threads cannot be
    /// spawned).
    fn run(
        &self,
        registry: &Arc<LedgerRegistry>,
        operations: Vec<LedgerOperation>,
    ) -> Result<RunReport, LedgerError>;
}

/// Create an execution strategy
///
/// # Arguments
///
/// * `strategy_type` - Which strategy to build
/// * `threads` - Thread count for the direct strategy (the pooled strategy
///   sizes its pool from the registry configuration)
pub fn create_strategy(strategy_type: StrategyType, threads: usize) -> Box<dyn ExecutionStrategy> {
    match strategy_type {
        StrategyType::Direct => Box::new(DirectStrategy::new(threads)),
        StrategyType::Pooled => Box::new(PooledStrategy),
    }
}
