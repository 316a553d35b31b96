//! Direct execution strategy
//!
//! Operations are dealt round-robin to a fixed number of scoped threads, each
//! calling the registry synchronously. Nothing is queued: contention happens
//! only on the registry and account locks.
//!
//! A lane that panics fails the whole run with `ExecutionPanicked`, since
//! how many of its operations were applied is unknown.

use crate::core::LedgerRegistry;
use crate::strategy::{ExecutionStrategy, RunReport};
use crate::types::{LedgerError, LedgerOperation};
use std::sync::Arc;
use std::thread;
use std::time::Instant;
use tracing::error;

/// Run operations on caller-owned threads
#[derive(Debug, Clone, Copy)]
pub struct DirectStrategy {
    threads: usize,
}

impl DirectStrategy {
    /// Create a strategy using `threads` threads (at least one)
    pub fn new(threads: usize) -> Self {
        Self {
            threads: threads.max(1),
        }
    }
}

impl ExecutionStrategy for DirectStrategy {
    fn run(
        &self,
        registry: &Arc<LedgerRegistry>,
        operations: Vec<LedgerOperation>,
    ) -> Result<RunReport, LedgerError> {
        let total = operations.len();
        let started = Instant::now();

        let mut lanes: Vec<Vec<LedgerOperation>> = vec![Vec::new(); self.threads];
        for (index, operation) in operations.into_iter().enumerate() {
            lanes[index % self.threads].push(operation);
        }

        let succeeded = thread::scope(|scope| {
            let handles: Vec<_> = lanes
                .iter()
                .map(|lane| {
                    scope.spawn(move || {
                        lane.iter()
                            .filter(|operation| registry.execute(operation).is_ok())
                            .count()
                    })
                })
                .collect();

            let mut succeeded = 0;
            let mut panicked = None;
            for (lane, handle) in handles.into_iter().enumerate() {
                match handle.join() {
                    Ok(count) => succeeded += count,
                    Err(payload) => {
                        let message = payload
                            .downcast_ref::<&str>()
                            .map(|s| s.to_string())
                            .or_else(|| payload.downcast_ref::<String>().cloned())
                            .unwrap_or_else(|| "unknown panic".to_string());
                        error!(lane, panic = %message, "Execution lane panicked");
                        panicked.get_or_insert(message);
                    }
                }
            }

            match panicked {
                Some(message) => Err(LedgerError::ExecutionPanicked { message }),
                None => Ok(succeeded),
            }
        })?;

        Ok(RunReport {
            operations: total,
            succeeded,
            failed: total - succeeded,
            elapsed: started.elapsed(),
        })
    }
}
