//! Concurrent execution module
//!
//! - `work_queue` - Bounded blocking FIFO hand-off buffer
//! - `worker_pool` - Fixed set of threads with priority dispatch
//! - `dispatcher` - The registry's asynchronous execution path built on both

pub mod dispatcher;
pub mod work_queue;
pub mod worker_pool;

pub use dispatcher::{LedgerDispatcher, OperationHandle};
pub use work_queue::WorkQueue;
pub use worker_pool::{PoolLifecycle, WorkerPool};
