//! Asynchronous execution path for the registry
//!
//! `LedgerDispatcher` accepts ledger operations from any thread and runs them
//! on a worker pool, handing each caller an [`OperationHandle`] for the result.
//!
//! # Architecture
//!
//! ```text
//! submit() ──> WorkQueue (bounded FIFO) ──> pump thread ──> WorkerPool (priority)
//!                                                               │
//!                          OperationHandle <── oneshot ── registry.execute()
//! ```
//!
//! The pool holds at most one queued task per worker, so the pump only takes
//! an operation off the work queue once the pool has room for it. Producers
//! therefore block once `queue_capacity` operations are waiting in the queue.
//! Among the tasks the pool holds, higher priorities run first. Every
//! operation still passes through
//! [`LedgerRegistry::execute`], so counters and audit events are identical to
//! the synchronous path.

use super::work_queue::WorkQueue;
use super::worker_pool::WorkerPool;
use crate::core::LedgerRegistry;
use crate::types::{LedgerError, LedgerOperation, Receipt};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::thread::{self, JoinHandle};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

type Outcome = Result<Receipt, LedgerError>;

/// An operation waiting in the work queue
struct QueuedOperation {
    operation: LedgerOperation,
    priority: i32,
    enqueued_at: DateTime<Utc>,
    reply: oneshot::Sender<Outcome>,
}

/// Pending result of a dispatched operation
///
/// Resolves to `OperationAbandoned` if the dispatcher stopped before the
/// operation ran. Can be waited on from a plain thread or awaited.
#[derive(Debug)]
pub struct OperationHandle {
    receiver: oneshot::Receiver<Outcome>,
}

impl OperationHandle {
    /// Block the current thread until the operation completes
    ///
    /// Must not be called from within an async runtime; `.await` the handle
    /// there instead.
    pub fn wait(self) -> Outcome {
        self.receiver
            .blocking_recv()
            .unwrap_or_else(|_| Err(LedgerError::OperationAbandoned))
    }
}

impl Future for OperationHandle {
    type Output = Outcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|received| received.unwrap_or_else(|_| Err(LedgerError::OperationAbandoned)))
    }
}

/// Runs registry operations on a worker pool
pub struct LedgerDispatcher {
    registry: Arc<LedgerRegistry>,
    queue: Arc<WorkQueue<QueuedOperation>>,
    pool: Arc<WorkerPool>,
    pump: Mutex<Option<JoinHandle<usize>>>,
}

impl std::fmt::Debug for LedgerDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerDispatcher")
            .field("pending", &self.queue.len())
            .field("pool", &self.pool)
            .finish_non_exhaustive()
    }
}

impl LedgerDispatcher {
    /// Create a stopped dispatcher sized from the registry's configuration
    pub fn new(registry: Arc<LedgerRegistry>) -> Self {
        let config = registry.config();
        let queue = Arc::new(WorkQueue::new(config.queue_capacity));
        queue.close();
        let pool = Arc::new(WorkerPool::with_capacity(
            config.worker_count,
            config.worker_count,
        ));

        LedgerDispatcher {
            registry,
            queue,
            pool,
            pump: Mutex::new(None),
        }
    }

    /// The registry operations are executed against
    pub fn registry(&self) -> &Arc<LedgerRegistry> {
        &self.registry
    }

    /// The underlying worker pool, for inspecting its counters
    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    pub fn is_running(&self) -> bool {
        self.pump.lock().is_some()
    }

    /// Operations accepted but not yet handed to the pool
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Start the pool and the pump thread
    ///
    /// Does nothing if already running.
    ///
    /// # Errors
    ///
    /// Returns `IoError` if a thread cannot be spawned.
    pub fn start(&self) -> Result<(), LedgerError> {
        let mut pump = self.pump.lock();
        if pump.is_some() {
            return Ok(());
        }

        self.pool.start()?;
        self.queue.reopen();

        let queue = Arc::clone(&self.queue);
        let pool = Arc::clone(&self.pool);
        let registry = Arc::clone(&self.registry);
        let spawned = thread::Builder::new()
            .name("ledger-dispatch".to_string())
            .spawn(move || pump_loop(&queue, &pool, &registry));

        match spawned {
            Ok(handle) => {
                *pump = Some(handle);
                info!("Ledger dispatcher started");
                Ok(())
            }
            Err(e) => {
                self.queue.close();
                self.pool.stop();
                Err(e.into())
            }
        }
    }

    /// Queue an operation for execution
    ///
    /// Blocks while the work queue is full, which lasts until the pool has
    /// room for the oldest queued operation. Higher `priority` values are
    /// executed first once they reach the pool.
    ///
    /// # Errors
    ///
    /// Returns `PoolNotRunning` if the dispatcher has not been started or has
    /// been stopped.
    pub fn submit(
        &self,
        operation: LedgerOperation,
        priority: i32,
    ) -> Result<OperationHandle, LedgerError> {
        let (reply, receiver) = oneshot::channel();
        let queued = QueuedOperation {
            operation,
            priority,
            enqueued_at: Utc::now(),
            reply,
        };

        self.queue
            .enqueue(queued)
            .map_err(|_| LedgerError::PoolNotRunning)?;

        Ok(OperationHandle { receiver })
    }

    /// Stop accepting operations and shut the pool down
    ///
    /// Operations already executing finish; everything still queued is
    /// abandoned and its handle resolves to `OperationAbandoned`.
    ///
    /// # Returns
    ///
    /// The number of abandoned operations.
    pub fn stop(&self) -> usize {
        let Some(pump) = self.pump.lock().take() else {
            return 0;
        };

        let mut abandoned = self.pool.stop();
        self.queue.close();
        match pump.join() {
            Ok(dropped) => abandoned += dropped,
            Err(_) => warn!("Dispatch thread terminated abnormally"),
        }

        if abandoned > 0 {
            warn!(abandoned, "Ledger dispatcher stopped with pending operations");
        }
        info!("Ledger dispatcher stopped");
        abandoned
    }
}

impl Drop for LedgerDispatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Move operations from the queue into the pool until the queue closes
///
/// `pool.submit` blocks while the pool is full, holding the next operation
/// back in the queue. Returns how many operations the pool refused because it had stopped.
fn pump_loop(
    queue: &WorkQueue<QueuedOperation>,
    pool: &WorkerPool,
    registry: &Arc<LedgerRegistry>,
) -> usize {
    let mut refused = 0;

    while let Some(queued) = queue.dequeue() {
        let QueuedOperation {
            operation,
            priority,
            enqueued_at,
            reply,
        } = queued;

        let waited = Utc::now().signed_duration_since(enqueued_at);
        debug!(
            operation = %operation,
            priority,
            queued_ms = waited.num_milliseconds(),
            "Dispatching operation"
        );

        let description = operation.to_string();
        let registry = Arc::clone(registry);
        let task = move || {
            let outcome = registry.execute(&operation);
            let failure = outcome.as_ref().err().cloned();
            // The caller may have dropped its handle.
            let _ = reply.send(outcome);
            failure.map_or(Ok(()), Err)
        };

        if pool.submit(&description, priority, task).is_err() {
            refused += 1;
        }
    }

    refused
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LedgerConfig;
    use rust_decimal::Decimal;

    fn wait_until(condition: impl Fn() -> bool) {
        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
        while !condition() {
            assert!(std::time::Instant::now() < deadline, "condition not reached in time");
            thread::sleep(std::time::Duration::from_millis(5));
        }
    }

    fn setup(workers: usize) -> (Arc<LedgerRegistry>, LedgerDispatcher) {
        let registry = Arc::new(LedgerRegistry::new(LedgerConfig::new(100, workers, 64)));
        let dispatcher = LedgerDispatcher::new(Arc::clone(&registry));
        (registry, dispatcher)
    }

    #[test]
    fn test_submit_before_start_is_rejected() {
        let (registry, dispatcher) = setup(2);
        let a = registry.create_account("A", Decimal::ZERO).unwrap();

        let result = dispatcher.submit(LedgerOperation::deposit(a, Decimal::ONE, ""), 0);

        assert!(matches!(result, Err(LedgerError::PoolNotRunning)));
        assert!(!dispatcher.is_running());
    }

    #[test]
    fn test_dispatched_operations_complete() {
        let (registry, dispatcher) = setup(4);
        let a = registry.create_account("A", Decimal::from(100)).unwrap();
        let b = registry.create_account("B", Decimal::ZERO).unwrap();
        dispatcher.start().unwrap();

        let handles: Vec<_> = (0..50)
            .map(|_| {
                dispatcher
                    .submit(
                        LedgerOperation::transfer(a.clone(), b.clone(), Decimal::ONE, "batch"),
                        0,
                    )
                    .unwrap()
            })
            .collect();

        for handle in handles {
            assert!(handle.wait().is_ok());
        }

        assert_eq!(registry.balance(&a).unwrap(), Decimal::from(50));
        assert_eq!(registry.balance(&b).unwrap(), Decimal::from(50));
        assert_eq!(registry.statistics().successful_operations, 50);
        assert_eq!(dispatcher.stop(), 0);
    }

    #[test]
    fn test_failed_operation_reaches_handle() {
        let (registry, dispatcher) = setup(1);
        let a = registry.create_account("A", Decimal::ONE).unwrap();
        dispatcher.start().unwrap();

        let handle = dispatcher
            .submit(LedgerOperation::withdraw(a, Decimal::TEN, ""), 0)
            .unwrap();

        assert!(matches!(
            handle.wait(),
            Err(LedgerError::InsufficientFunds { .. })
        ));
        assert_eq!(registry.statistics().failed_operations, 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_handle_can_be_awaited() {
        let (registry, dispatcher) = setup(2);
        let a = registry.create_account("A", Decimal::ZERO).unwrap();
        dispatcher.start().unwrap();

        let receipt = dispatcher
            .submit(LedgerOperation::deposit(a.clone(), Decimal::from(7), ""), 0)
            .unwrap()
            .await
            .unwrap();

        assert_eq!(receipt.balance, Decimal::from(7));
        assert_eq!(registry.balance(&a).unwrap(), Decimal::from(7));
    }

    #[test]
    fn test_full_dispatcher_blocks_submitter() {
        let registry = Arc::new(LedgerRegistry::new(LedgerConfig::new(10, 1, 2)));
        let a = registry.create_account("A", Decimal::ZERO).unwrap();
        let dispatcher = Arc::new(LedgerDispatcher::new(Arc::clone(&registry)));
        dispatcher.start().unwrap();

        let (release, gate) = std::sync::mpsc::channel::<()>();
        dispatcher
            .pool()
            .submit("blocker", 0, move || {
                let _ = gate.recv();
                Ok(())
            })
            .unwrap();
        wait_until(|| dispatcher.pool().active_workers() == 1);

        let producer = thread::spawn({
            let dispatcher = Arc::clone(&dispatcher);
            let a = a.clone();
            move || {
                (0..1000)
                    .map(|_| {
                        dispatcher
                            .submit(LedgerOperation::deposit(a.clone(), Decimal::ONE, ""), 0)
                            .unwrap()
                    })
                    .collect::<Vec<_>>()
            }
        });

        // One task in the pool, one held by the pump, two in the queue.
        wait_until(|| dispatcher.pending() == 2 && dispatcher.pool().queued_tasks() == 1);
        thread::sleep(std::time::Duration::from_millis(100));
        assert!(!producer.is_finished());
        assert_eq!(dispatcher.pending(), 2);
        assert_eq!(dispatcher.pool().queued_tasks(), 1);

        release.send(()).unwrap();
        let handles = producer.join().unwrap();
        for handle in handles {
            assert!(handle.wait().is_ok());
        }
        assert_eq!(registry.balance(&a).unwrap(), Decimal::from(1000));
    }

    #[test]
    fn test_stop_rejects_further_submissions_and_restart_works() {
        let (registry, dispatcher) = setup(2);
        let a = registry.create_account("A", Decimal::ZERO).unwrap();
        dispatcher.start().unwrap();
        dispatcher.stop();

        assert!(matches!(
            dispatcher.submit(LedgerOperation::deposit(a.clone(), Decimal::ONE, ""), 0),
            Err(LedgerError::PoolNotRunning)
        ));

        dispatcher.start().unwrap();
        let handle = dispatcher
            .submit(LedgerOperation::deposit(a.clone(), Decimal::ONE, ""), 0)
            .unwrap();
        assert!(handle.wait().is_ok());
        assert_eq!(registry.balance(&a).unwrap(), Decimal::ONE);
    }
}
