//! Fixed-size worker pool with priority dispatch
//!
//! This module provides `WorkerPool`, a set of OS threads executing submitted
//! tasks highest priority first.
//!
//! # Lifecycle
//!
//! ```text
//! Created ──start──> Running ──stop──> Stopped
//!                       ^                 │
//!                       └──────start──────┘
//! ```
//!
//! Tasks are only accepted while Running. `stop` abandons whatever is still
//! queued, lets in-flight tasks finish and joins every worker before it
//! returns.
//!
//! # Capacity
//!
//! A pool built with [`WorkerPool::with_capacity`] holds at most that many
//! queued tasks; `submit` blocks while the pool is full. [`WorkerPool::new`]
//! places no limit on the queue.
//!
//! # Failure containment
//!
//! A task returning `Err` is logged with `warn!`; a task that panics is caught
//! and logged with `error!`. Neither reaches the submitter and the worker
//! carries on with the next task.

use crate::types::LedgerError;
use parking_lot::{Condvar, Mutex};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info, warn};

type Job = Box<dyn FnOnce() -> Result<(), LedgerError> + Send + 'static>;

/// Pool lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolLifecycle {
    Created,
    Running,
    Stopped,
}

struct PrioritizedTask {
    priority: i32,
    sequence: u64,
    description: String,
    job: Job,
}

// Max-heap on priority; among equal priorities the earlier submission wins.
impl Ord for PrioritizedTask {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl PartialOrd for PrioritizedTask {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for PrioritizedTask {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PrioritizedTask {}

struct PoolState {
    lifecycle: PoolLifecycle,
    tasks: BinaryHeap<PrioritizedTask>,
    next_sequence: u64,
}

struct PoolShared {
    state: Mutex<PoolState>,
    available: Condvar,
    space: Condvar,
    active: AtomicUsize,
    completed: AtomicUsize,
    failed: AtomicUsize,
}

/// Fixed set of worker threads
pub struct WorkerPool {
    shared: Arc<PoolShared>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    size: usize,
    capacity: usize,
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("size", &self.size)
            .field("capacity", &self.capacity)
            .field("lifecycle", &self.lifecycle())
            .field("queued", &self.queued_tasks())
            .finish()
    }
}

impl WorkerPool {
    /// Create a pool of `size` workers in the Created state
    ///
    /// A size of zero is raised to one. No thread is spawned until `start`.
    /// The task queue is unbounded.
    pub fn new(size: usize) -> Self {
        Self::with_capacity(size, usize::MAX)
    }

    /// Create a pool of `size` workers queueing at most `capacity` tasks
    ///
    /// Once `capacity` tasks are waiting, `submit` blocks until a worker takes
    /// one. A capacity of zero is raised to one.
    pub fn with_capacity(size: usize, capacity: usize) -> Self {
        WorkerPool {
            shared: Arc::new(PoolShared {
                state: Mutex::new(PoolState {
                    lifecycle: PoolLifecycle::Created,
                    tasks: BinaryHeap::new(),
                    next_sequence: 0,
                }),
                available: Condvar::new(),
                space: Condvar::new(),
                active: AtomicUsize::new(0),
                completed: AtomicUsize::new(0),
                failed: AtomicUsize::new(0),
            }),
            workers: Mutex::new(Vec::new()),
            size: size.max(1),
            capacity: capacity.max(1),
        }
    }

    /// Spawn the workers and begin accepting tasks
    ///
    /// Does nothing if the pool is already running.
    ///
    /// # Errors
    ///
    /// Returns `IoError` if a worker thread cannot be spawned. Workers that
    /// did start are stopped again before returning.
    pub fn start(&self) -> Result<(), LedgerError> {
        let mut workers = self.workers.lock();
        {
            let mut state = self.shared.state.lock();
            if state.lifecycle == PoolLifecycle::Running {
                return Ok(());
            }
            state.lifecycle = PoolLifecycle::Running;
        }

        for index in 0..self.size {
            let shared = Arc::clone(&self.shared);
            let spawned = thread::Builder::new()
                .name(format!("ledger-worker-{}", index))
                .spawn(move || worker_loop(&shared));

            match spawned {
                Ok(handle) => workers.push(handle),
                Err(e) => {
                    drop(workers);
                    self.stop();
                    return Err(e.into());
                }
            }
        }

        info!(workers = self.size, "Worker pool started");
        Ok(())
    }

    /// Stop accepting tasks, abandon queued ones and join every worker
    ///
    /// Tasks already executing run to completion before this returns.
    ///
    /// # Returns
    ///
    /// The number of queued tasks that were dropped without running. Zero if
    /// the pool was not running.
    pub fn stop(&self) -> usize {
        let mut workers = self.workers.lock();
        let abandoned = {
            let mut state = self.shared.state.lock();
            if state.lifecycle != PoolLifecycle::Running {
                return 0;
            }
            state.lifecycle = PoolLifecycle::Stopped;
            std::mem::take(&mut state.tasks)
        };
        self.shared.available.notify_all();
        self.shared.space.notify_all();

        for handle in workers.drain(..) {
            if handle.join().is_err() {
                error!("Worker thread terminated abnormally");
            }
        }
        drop(workers);

        let count = abandoned.len();
        if count > 0 {
            warn!(abandoned = count, "Worker pool stopped with queued tasks");
        }
        // Dropping the jobs releases anything they captured.
        drop(abandoned);

        info!("Worker pool stopped");
        count
    }

    /// Queue a task for execution
    ///
    /// Higher `priority` values run first; equal priorities run in submission
    /// order. Blocks while the pool already holds `capacity` queued tasks.
    ///
    /// # Errors
    ///
    /// Returns `PoolNotRunning` unless the pool is Running, including when it
    /// stops while this call is waiting for space. The task is dropped without
    /// running.
    pub fn submit<F>(&self, description: &str, priority: i32, task: F) -> Result<(), LedgerError>
    where
        F: FnOnce() -> Result<(), LedgerError> + Send + 'static,
    {
        let mut state = self.shared.state.lock();
        while state.lifecycle == PoolLifecycle::Running && state.tasks.len() >= self.capacity {
            self.shared.space.wait(&mut state);
        }
        if state.lifecycle != PoolLifecycle::Running {
            return Err(LedgerError::PoolNotRunning);
        }

        let sequence = state.next_sequence;
        state.next_sequence += 1;
        state.tasks.push(PrioritizedTask {
            priority,
            sequence,
            description: description.to_string(),
            job: Box::new(task),
        });
        drop(state);

        self.shared.available.notify_one();
        Ok(())
    }

    pub fn lifecycle(&self) -> PoolLifecycle {
        self.shared.state.lock().lifecycle
    }

    pub fn is_running(&self) -> bool {
        self.lifecycle() == PoolLifecycle::Running
    }

    /// Number of worker threads
    pub fn size(&self) -> usize {
        self.size
    }

    /// Most tasks that may wait in the queue at once
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Workers currently executing a task
    pub fn active_workers(&self) -> usize {
        self.shared.active.load(AtomicOrdering::Relaxed)
    }

    /// Tasks waiting for a worker
    pub fn queued_tasks(&self) -> usize {
        self.shared.state.lock().tasks.len()
    }

    /// Tasks that returned `Ok`
    pub fn completed_tasks(&self) -> usize {
        self.shared.completed.load(AtomicOrdering::Relaxed)
    }

    /// Tasks that returned `Err` or panicked
    pub fn failed_tasks(&self) -> usize {
        self.shared.failed.load(AtomicOrdering::Relaxed)
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.stop();
    }
}

fn worker_loop(shared: &PoolShared) {
    loop {
        let task = {
            let mut state = shared.state.lock();
            loop {
                if state.lifecycle != PoolLifecycle::Running {
                    return;
                }
                if let Some(task) = state.tasks.pop() {
                    break task;
                }
                shared.available.wait(&mut state);
            }
        };
        shared.space.notify_one();

        shared.active.fetch_add(1, AtomicOrdering::Relaxed);
        run_task(shared, task);
        shared.active.fetch_sub(1, AtomicOrdering::Relaxed);
    }
}

fn run_task(shared: &PoolShared, task: PrioritizedTask) {
    let PrioritizedTask {
        priority,
        description,
        job,
        ..
    } = task;

    match panic::catch_unwind(AssertUnwindSafe(job)) {
        Ok(Ok(())) => {
            shared.completed.fetch_add(1, AtomicOrdering::Relaxed);
            debug!(task = %description, priority, "Task completed");
        }
        Ok(Err(e)) => {
            shared.failed.fetch_add(1, AtomicOrdering::Relaxed);
            warn!(task = %description, priority, error = %e, "Task failed");
        }
        Err(payload) => {
            shared.failed.fetch_add(1, AtomicOrdering::Relaxed);
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            error!(task = %description, priority, panic = %message, "Task panicked");
        }
    }
}
