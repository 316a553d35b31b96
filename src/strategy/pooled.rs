//! Pooled execution strategy
//!
//! Every operation is submitted to a [`LedgerDispatcher`], so it travels
//! through the bounded work queue and the worker pool before reaching the
//! registry. The pool is sized from the registry configuration.

use crate::core::LedgerRegistry;
use crate::dispatch::LedgerDispatcher;
use crate::strategy::{ExecutionStrategy, RunReport};
use crate::types::{LedgerError, LedgerOperation, TransactionType};
use std::sync::Arc;
use std::time::Instant;

/// Run operations through the dispatcher
#[derive(Debug, Clone, Copy, Default)]
pub struct PooledStrategy;

/// Deposits first, so later debits are less likely to bounce.
fn priority_of(operation: &LedgerOperation) -> i32 {
    match operation.tx_type() {
        TransactionType::Deposit => 1,
        TransactionType::Withdraw | TransactionType::Transfer => 0,
    }
}

impl ExecutionStrategy for PooledStrategy {
    fn run(
        &self,
        registry: &Arc<LedgerRegistry>,
        operations: Vec<LedgerOperation>,
    ) -> Result<RunReport, LedgerError> {
        let total = operations.len();
        let started = Instant::now();

        let dispatcher = LedgerDispatcher::new(Arc::clone(registry));
        dispatcher.start()?;

        let mut handles = Vec::with_capacity(total);
        for operation in operations {
            let priority = priority_of(&operation);
            handles.push(dispatcher.submit(operation, priority)?);
        }

        let succeeded = handles
            .into_iter()
            .map(|handle| handle.wait())
            .filter(Result::is_ok)
            .count();

        dispatcher.stop();

        Ok(RunReport {
            operations: total,
            succeeded,
            failed: total - succeeded,
            elapsed: started.elapsed(),
        })
    }
}
